use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::user::AuthUserData;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionData {
    pub username: String,
    pub login_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<&SessionData> for AuthUserData {
    fn from(s: &SessionData) -> Self {
        Self {
            username: s.username.clone(),
            login_at: s.login_at.to_rfc3339(),
            expires_at: s.expires_at.to_rfc3339(),
        }
    }
}

#[derive(Default)]
pub struct SessionStore {
    sessions: HashMap<String, SessionData>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Membuat sesi baru dan mengembalikan session token (UUID v4).
    pub fn create(&mut self, username: String, timeout_mins: i64) -> String {
        self.purge_expired();
        let token = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        self.sessions.insert(
            token.clone(),
            SessionData {
                username,
                login_at: now,
                expires_at: now + Duration::minutes(timeout_mins),
            },
        );
        token
    }

    /// Validasi session token — cek ada dan belum expired.
    pub fn validate(&self, token: &str) -> Result<&SessionData, String> {
        match self.sessions.get(token) {
            None => Err("Sesi tidak valid, silakan login ulang".into()),
            Some(s) if Utc::now() > s.expires_at => Err("Sesi expired, silakan login ulang".into()),
            Some(s) => Ok(s),
        }
    }

    /// Hapus sesi (logout).
    pub fn destroy(&mut self, token: &str) -> Option<SessionData> {
        self.sessions.remove(token)
    }

    fn purge_expired(&mut self) {
        let now = Utc::now();
        self.sessions.retain(|_, s| s.expires_at >= now);
    }
}
