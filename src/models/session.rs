use super::enums::Role;

/// Caller identity handed to the orchestrator at construction.
///
/// Replaces the old habit of reading the bearer token and role out of
/// cookies inside each popup component. Everything the core needs to act
/// on behalf of a user travels in this one value.
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Opaque bearer token forwarded to the persistence service.
    pub token: String,
    pub role: Role,
    /// Directory id of the signed-in consultant (or acting admin).
    pub consultant_id: String,
}

impl SessionContext {
    pub fn new(token: impl Into<String>, role: Role, consultant_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            role,
            consultant_id: consultant_id.into(),
        }
    }
}
