use serde::{Deserialize, Serialize};

use crate::hash::Id;

/// a named, movable pointer to a commit
///
/// `created` records where the branch was forked, `tip` where it is now.
/// both are null on a freshly-initialized branch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub created: Option<Id>,
    pub tip: Option<Id>,
}

impl Branch {
    /// a branch with no commits yet
    pub fn empty() -> Self {
        Self {
            created: None,
            tip: None,
        }
    }

    /// a branch forked at the given commit
    pub fn at(id: Option<Id>) -> Self {
        Self {
            created: id,
            tip: id,
        }
    }
}

/// the current position pointer
///
/// either attached to a branch (the effective id is the branch tip) or
/// detached at a commit. the tagged representation makes "both set" and
/// "neither set" unrepresentable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Head {
    Attached { branch: String },
    Detached { id: Id },
}

impl Head {
    pub fn attached(branch: impl Into<String>) -> Self {
        Head::Attached {
            branch: branch.into(),
        }
    }

    pub fn detached(id: Id) -> Self {
        Head::Detached { id }
    }

    /// branch name if attached
    pub fn branch(&self) -> Option<&str> {
        match self {
            Head::Attached { branch } => Some(branch),
            Head::Detached { .. } => None,
        }
    }

    /// is HEAD attached to the named branch
    pub fn is_attached_to(&self, name: &str) -> bool {
        self.branch() == Some(name)
    }
}

/// a configured remote repository
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remote {
    pub name: String,
    pub url: String,
}

impl Remote {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}
