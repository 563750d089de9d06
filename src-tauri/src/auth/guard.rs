use super::session::SessionData;
use crate::errors::{AppError, AppResult};
use crate::AppState;

/// Helper: validasi session dari AppState dan kembalikan SessionData clone.
pub fn validate_session(state: &AppState, token: &str) -> AppResult<SessionData> {
    let store = state
        .sessions
        .lock()
        .map_err(|e| AppError::Internal(e.to_string()))?;
    store.validate(token).cloned().map_err(AppError::Auth)
}
