use serde::{Deserialize, Serialize};

/// Hasil login yang dikirim ke frontend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResult {
    pub user: AuthUserData,
    pub session_token: String,
    pub login_at: String,
}

/// Data user yang sedang login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUserData {
    pub username: String,
    pub login_at: String,
    pub expires_at: String,
}
