use std::fmt;

/// Errors returned by a snapshot store.
#[derive(Debug)]
pub enum StoreError {
    /// An object with the same identity already exists.
    AlreadyExists { kind: &'static str, name: String },
    /// The request cannot be served as given.
    InvalidRequest(String),
    /// The backend could not be reached or refused to answer.
    Unavailable(String),
    /// An I/O error occurred.
    Io(std::io::Error),
    /// A stored object could not be encoded or decoded.
    Serialization(serde_json::Error),
}

impl StoreError {
    pub fn already_exists(kind: &'static str, name: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind,
            name: name.into(),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyExists { kind, name } => write!(f, "{kind} {name} already exists"),
            Self::InvalidRequest(msg) => write!(f, "invalid store request: {msg}"),
            Self::Unavailable(msg) => write!(f, "store unavailable: {msg}"),
            Self::Io(err) => write!(f, "store IO error: {err}"),
            Self::Serialization(err) => write!(f, "store serialization error: {err}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err)
    }
}
