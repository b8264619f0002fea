//! kit - a minimal distributed version control system
//!
//! a content-addressed object graph (blobs, trees, commits) with branch and
//! HEAD references over a working directory, persisted wholesale to a
//! single state file and synchronized between peers over a small HTTP
//! protocol.
//!
//! # Core concepts
//!
//! - **Blob**: content-addressed file text
//! - **Tree**: one directory level; lines embed the blob or subtree they
//!   reference
//! - **Commit**: a snapshot of the working tree with parent links
//! - **Branch / HEAD**: named movable pointers; HEAD is attached to a
//!   branch or detached at a commit
//!
//! # Example usage
//!
//! ```no_run
//! use kit::{ops, Repository};
//! use std::path::Path;
//!
//! // initialize a repository in a working directory
//! let mut repo = Repository::init(Path::new("/path/to/work")).unwrap();
//!
//! // commit the working tree
//! let id = ops::commit(&mut repo, "initial commit", "author", 0).unwrap();
//!
//! // switch back to it later
//! ops::checkout(&mut repo, &id.to_hex()).unwrap();
//! repo.save().unwrap();
//! ```

mod error;
mod hash;
mod refs;
mod repo;
mod storage;
mod store;

pub mod ops;
pub mod transport;
pub mod types;

pub use error::{Error, Result};
pub use hash::{hash_value, Id};
pub use refs::{Branch, Head, Remote};
pub use repo::Repository;
pub use storage::{Storage, DEFAULT_BRANCH, STATE_FILE};
pub use store::ObjectStore;
pub use types::{Blob, Commit, Tree, TreeLine};
