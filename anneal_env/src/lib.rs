//! Anneal Environment Abstraction Layer
//!
//! This crate provides the message-passing substrate the automaton workers
//! run on. Workers never share memory: every byte that crosses a partition
//! boundary goes through a [`RingTransport`].
//!
//! # Transports
//!
//! - [`MemoryTransport`]: all ranks as tasks of one process, linked by
//!   bounded channels. Used by the in-process harness and by tests.
//! - [`TcpTransport`]: one process per rank, linked by framed sockets.
//!
//! # Example
//!
//! ```ignore
//! use anneal_env::{EnvError, Envelope, MessageTag, Rank, RingTransport};
//!
//! async fn pass_down<T: RingTransport>(net: &T, row: Vec<u8>) -> Result<Vec<u8>, EnvError> {
//!     let size = net.size();
//!     let me = net.rank().index();
//!     net.send(Rank((me + 1) % size), Envelope::new(MessageTag::HaloFromUp, row)).await?;
//!     net.recv_tagged(Rank((me + size - 1) % size), MessageTag::HaloFromUp).await
//! }
//! ```

mod error;
mod frame;
mod memory;
mod network;
mod tcp;
mod types;

pub use error::EnvError;
pub use frame::{read_frame, write_frame, HEADER_LEN, MAX_PAYLOAD};
pub use memory::{MemoryTransport, DEFAULT_LINK_CAPACITY};
pub use network::{ensure_in_ring, RingTransport};
pub use tcp::{TcpConfig, TcpTransport};
pub use types::{Envelope, MessageTag, Rank};
