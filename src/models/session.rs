use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

/// Identifies one visitor session
///
/// Built once per request from the `x-session-id` header and passed
/// explicitly to anything keyed by visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: Uuid,
}

impl SessionContext {
    /// Starts a fresh session with a random identifier
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
        }
    }

    pub fn from_id(session_id: Uuid) -> Self {
        Self { session_id }
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.session_id)
    }
}
