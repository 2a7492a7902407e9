//! Transports for the Genesis consciousness.
//!
//! Every transport maps its own framing onto `Consciousness::interact` with a
//! transport-specific source label, and runs as a task that stops when its
//! cancellation token fires.

pub mod file_channel;
pub mod server;
pub mod socket;

pub use file_channel::{FileChannel, FILE_SOURCE};
pub use server::{router, HttpServer, WEB_SOURCE};
pub use socket::{network_source, SocketListener};
