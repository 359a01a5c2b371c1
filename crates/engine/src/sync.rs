//! Types exchanged with the synchronizer.

/// One well-formed row of the external feed, already parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedRow {
    pub username: String,
    pub user_id: i64,
    pub active: bool,
}

/// What a synchronization pass did to a single entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    Inserted,
    Updated,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inserted => write!(f, "Inserted"),
            Self::Updated => write!(f, "Updated"),
        }
    }
}

/// Change log entry produced by a synchronization pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Change {
    pub username: String,
    pub user_id: i64,
    pub kind: ChangeKind,
}

/// An active entry with no linked channel yet, eligible for
/// provisioning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub username: String,
    pub user_id: i64,
}
