mod blob;
mod commit;
mod tree;

pub use blob::Blob;
pub use commit::Commit;
pub use tree::{Tree, TreeLine, PATH_SEPARATOR};
