use crate::error::{PocketbookError, Result};
use crate::settings::Settings;

/// The authenticated user every data operation runs on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

pub fn require_session(settings: &Settings) -> Result<Session> {
    match settings.user.as_deref().map(str::trim) {
        Some(user) if !user.is_empty() => Ok(Session::new(user)),
        _ => Err(PocketbookError::NotAuthenticated),
    }
}
