use serde::{Deserialize, Serialize};

/// immutable file content
///
/// payloads are text; binary files are out of scope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    pub content: String,
}

impl Blob {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}
