//! transport layer for remote operations

pub mod client;
pub mod protocol;
pub mod serve;

pub use client::{clone, pull, push};
pub use protocol::{decode, encode, raw_import, PullResponse, PushRequest};
pub use serve::{Daemon, DaemonHandle};
