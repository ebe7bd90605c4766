//! TCP-backed process group
//!
//! Rank 0 binds the leader address and coordinates every collective; the
//! other ranks connect at startup and stay connected for the life of the
//! run. Frames are newline-delimited JSON. A shared sequence number is
//! carried on every collective frame so that mismatched call orders across
//! ranks surface as protocol violations instead of silent corruption.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{GroupError, ProcessGroup};

const CONNECT_RETRY_MS: u64 = 100;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Frame {
    Join { rank: usize },
    Barrier { seq: u64 },
    Sum { seq: u64, value: i64 },
    SumResult { seq: u64, total: i64 },
}

/// One established connection, with buffered reads on the receive side.
struct Peer {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl Peer {
    fn from_stream(stream: TcpStream) -> Result<Self, GroupError> {
        stream.set_nodelay(true)?;
        let writer = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(stream),
            writer,
        })
    }

    fn send(&mut self, frame: &Frame) -> Result<(), GroupError> {
        let mut line = serde_json::to_string(frame)?;
        line.push('\n');
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }

    fn recv(&mut self) -> Result<Frame, GroupError> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line)?;
        if n == 0 {
            return Err(GroupError::Protocol {
                expected: "collective frame".to_string(),
                got: "closed connection".to_string(),
            });
        }
        Ok(serde_json::from_str(line.trim_end())?)
    }
}

enum Role {
    /// `peers[i]` is the connection to rank `i + 1`.
    Leader { peers: Vec<Peer> },
    Follower { leader: Peer },
}

struct State {
    role: Role,
    /// Collective sequence number, shared by barriers and reductions.
    seq: u64,
}

/// Process group wired over TCP.
pub struct TcpGroup {
    rank: usize,
    size: usize,
    state: Mutex<State>,
}

impl TcpGroup {
    /// Establish the group. Rank 0 binds `leader_addr` and waits for the
    /// other `size - 1` ranks to join; every other rank connects there,
    /// retrying until `connect_timeout` elapses.
    pub fn connect(
        rank: usize,
        size: usize,
        leader_addr: &str,
        connect_timeout: Duration,
    ) -> Result<Self, GroupError> {
        if size == 0 {
            return Err(GroupError::Config("group size must be at least 1".to_string()));
        }
        if rank >= size {
            return Err(GroupError::Config(format!(
                "rank {rank} out of range for group of {size}"
            )));
        }

        let role = if rank == 0 {
            Self::gather(size, leader_addr)?
        } else {
            Self::join(rank, leader_addr, connect_timeout)?
        };

        debug!("rank {rank}/{size} joined group at {leader_addr}");

        Ok(Self {
            rank,
            size,
            state: Mutex::new(State { role, seq: 0 }),
        })
    }

    fn gather(size: usize, addr: &str) -> Result<Role, GroupError> {
        let listener = TcpListener::bind(addr)?;
        let mut slots: Vec<Option<Peer>> = (1..size).map(|_| None).collect();
        let mut joined = 0;

        while joined + 1 < size {
            let (stream, _) = listener.accept()?;
            let mut peer = Peer::from_stream(stream)?;
            match peer.recv()? {
                Frame::Join { rank } if rank >= 1 && rank < size => {
                    if slots[rank - 1].is_some() {
                        return Err(GroupError::Protocol {
                            expected: "unique rank per member".to_string(),
                            got: format!("duplicate join for rank {rank}"),
                        });
                    }
                    debug!("rank {rank} joined");
                    slots[rank - 1] = Some(peer);
                    joined += 1;
                }
                other => return Err(unexpected("join frame", &other)),
            }
        }

        Ok(Role::Leader {
            peers: slots.into_iter().flatten().collect(),
        })
    }

    fn join(rank: usize, addr: &str, timeout: Duration) -> Result<Role, GroupError> {
        let deadline = Instant::now() + timeout;
        let stream = loop {
            match TcpStream::connect(addr) {
                Ok(stream) => break stream,
                Err(source) => {
                    // Followers may start before the leader has bound.
                    if Instant::now() >= deadline {
                        return Err(GroupError::Connect {
                            addr: addr.to_string(),
                            source,
                        });
                    }
                    std::thread::sleep(Duration::from_millis(CONNECT_RETRY_MS));
                }
            }
        };

        let mut leader = Peer::from_stream(stream)?;
        leader.send(&Frame::Join { rank })?;
        Ok(Role::Follower { leader })
    }
}

impl ProcessGroup for TcpGroup {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn barrier(&self) -> Result<(), GroupError> {
        let mut state = self.state.lock().map_err(|_| GroupError::Poisoned)?;
        state.seq += 1;
        let seq = state.seq;

        match &mut state.role {
            Role::Leader { peers } => {
                for peer in peers.iter_mut() {
                    match peer.recv()? {
                        Frame::Barrier { seq: got } if got == seq => {}
                        other => return Err(unexpected(format!("barrier #{seq}"), &other)),
                    }
                }
                for peer in peers.iter_mut() {
                    peer.send(&Frame::Barrier { seq })?;
                }
            }
            Role::Follower { leader } => {
                leader.send(&Frame::Barrier { seq })?;
                match leader.recv()? {
                    Frame::Barrier { seq: got } if got == seq => {}
                    other => return Err(unexpected(format!("barrier #{seq}"), &other)),
                }
            }
        }

        Ok(())
    }

    fn sum_all(&self, local: i64) -> Result<i64, GroupError> {
        let mut state = self.state.lock().map_err(|_| GroupError::Poisoned)?;
        state.seq += 1;
        let seq = state.seq;

        match &mut state.role {
            Role::Leader { peers } => {
                let mut total = local;
                for peer in peers.iter_mut() {
                    match peer.recv()? {
                        Frame::Sum { seq: got, value } if got == seq => total += value,
                        other => return Err(unexpected(format!("sum #{seq}"), &other)),
                    }
                }
                for peer in peers.iter_mut() {
                    peer.send(&Frame::SumResult { seq, total })?;
                }
                Ok(total)
            }
            Role::Follower { leader } => {
                leader.send(&Frame::Sum { seq, value: local })?;
                match leader.recv()? {
                    Frame::SumResult { seq: got, total } if got == seq => Ok(total),
                    other => Err(unexpected(format!("sum result #{seq}"), &other)),
                }
            }
        }
    }
}

fn unexpected(expected: impl Into<String>, got: &Frame) -> GroupError {
    GroupError::Protocol {
        expected: expected.into(),
        got: format!("{got:?}"),
    }
}
