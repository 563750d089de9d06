use sqlx::SqlitePool;

use super::settings_cmd::{get_setting, set_setting};
use crate::auth::guard::validate_session;
use crate::config::get_config;
use crate::errors::{AppError, AppResult};
use crate::models::user::{AuthUserData, LoginResult};
use crate::validation::{validate_password, validate_username};
use crate::{log_info, log_warn, AppState};

const KEY_USERNAME: &str = "auth.username";
const KEY_PASSWORD_HASH: &str = "auth.password_hash";
const KEY_LOGGED_IN: &str = "session.is_logged_in";
const KEY_SESSION_USER: &str = "session.username";

/// Buat akun default saat pertama kali aplikasi dibuka (sekali saja).
pub async fn ensure_default_account(db: &SqlitePool, bcrypt_cost: u32) -> AppResult<()> {
    if get_setting(db, KEY_PASSWORD_HASH).await?.is_some() {
        return Ok(());
    }

    let security = &get_config().security;
    let hashed = bcrypt::hash(&security.default_password, bcrypt_cost)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    set_setting(db, KEY_USERNAME, &security.default_username).await?;
    set_setting(db, KEY_PASSWORD_HASH, &hashed).await?;

    log_info!("AUTH", "Default account created", serde_json::json!({
        "username": security.default_username,
    }));
    Ok(())
}

async fn stored_credentials(db: &SqlitePool) -> AppResult<(String, String)> {
    let username = get_setting(db, KEY_USERNAME)
        .await?
        .ok_or_else(|| AppError::Internal("Akun belum dibuat".into()))?;
    let hash = get_setting(db, KEY_PASSWORD_HASH)
        .await?
        .ok_or_else(|| AppError::Internal("Akun belum dibuat".into()))?;
    Ok((username, hash))
}

/// Login dan buat session.
pub async fn login(state: &AppState, username: &str, password: &str) -> AppResult<LoginResult> {
    let username = username.trim();
    validate_username(username).map_err(AppError::Validation)?;

    if state.login_limiter.is_limited(username) {
        log_warn!("AUTH", "Login blocked", serde_json::json!({ "username": username }));
        return Err(AppError::Auth(
            "Terlalu banyak percobaan login. Coba lagi nanti.".into(),
        ));
    }

    let (stored_username, hash) = stored_credentials(&state.db).await?;
    let valid = username == stored_username
        && bcrypt::verify(password, &hash).map_err(|_| AppError::Internal("Gagal verifikasi password".into()))?;

    if !valid {
        log_warn!("AUTH", "Login failed", serde_json::json!({ "username": username }));
        state.login_limiter.check(username).map_err(AppError::Auth)?;
        return Err(AppError::Auth("Username atau password salah".into()));
    }

    state.login_limiter.reset(username);

    let timeout = get_config().security.session_timeout_mins;
    let (token, user) = {
        let mut sessions = state
            .sessions
            .lock()
            .map_err(|e| AppError::Internal(e.to_string()))?;
        let token = sessions.create(stored_username.clone(), timeout);
        let user = sessions
            .validate(&token)
            .map(AuthUserData::from)
            .map_err(AppError::Internal)?;
        (token, user)
    };

    set_setting(&state.db, KEY_LOGGED_IN, "1").await?;
    set_setting(&state.db, KEY_SESSION_USER, &stored_username).await?;

    log_info!("AUTH", "Login success", serde_json::json!({ "username": stored_username }));

    Ok(LoginResult {
        login_at: user.login_at.clone(),
        user,
        session_token: token,
    })
}

/// Logout: hapus session dan reset status login tersimpan.
pub async fn logout(state: &AppState, session_token: &str) -> AppResult<()> {
    let removed = state
        .sessions
        .lock()
        .map_err(|e| AppError::Internal(e.to_string()))?
        .destroy(session_token);

    set_setting(&state.db, KEY_LOGGED_IN, "0").await?;
    sqlx::query("DELETE FROM settings WHERE key = ?")
        .bind(KEY_SESSION_USER)
        .execute(&state.db)
        .await?;

    if let Some(session) = removed {
        log_info!("AUTH", "Logout", serde_json::json!({ "username": session.username }));
    }
    Ok(())
}

/// Cek apakah session masih valid (untuk auto-login saat app reload).
pub fn check_session(state: &AppState, session_token: &str) -> AppResult<AuthUserData> {
    let session = validate_session(state, session_token)?;
    Ok(AuthUserData::from(&session))
}

/// Status login tersimpan, dipakai layar splash untuk memilih halaman awal.
pub async fn is_logged_in(state: &AppState) -> AppResult<bool> {
    Ok(get_setting(&state.db, KEY_LOGGED_IN).await?.as_deref() == Some("1"))
}

pub async fn change_password(
    state: &AppState,
    session_token: &str,
    old_password: &str,
    new_password: &str,
) -> AppResult<()> {
    let session = validate_session(state, session_token)?;

    let security = &get_config().security;
    validate_password(new_password, security.min_password_length).map_err(AppError::Validation)?;

    let (_, hash) = stored_credentials(&state.db).await?;
    let valid = bcrypt::verify(old_password, &hash)
        .map_err(|_| AppError::Internal("Gagal verifikasi password".into()))?;
    if !valid {
        return Err(AppError::Auth("Password lama salah".into()));
    }

    let hashed = bcrypt::hash(new_password, security.bcrypt_cost)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    set_setting(&state.db, KEY_PASSWORD_HASH, &hashed).await?;

    log_info!("AUTH", "Password changed", serde_json::json!({ "username": session.username }));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{logged_in_state, test_state, TEST_PASSWORD, TEST_USERNAME};

    #[tokio::test]
    async fn default_account_can_login() {
        let (state, _dir) = test_state().await;
        assert!(!is_logged_in(&state).await.unwrap());

        let result = login(&state, TEST_USERNAME, TEST_PASSWORD).await.unwrap();
        assert_eq!(result.user.username, TEST_USERNAME);
        assert!(is_logged_in(&state).await.unwrap());
        assert_eq!(
            check_session(&state, &result.session_token).unwrap().username,
            TEST_USERNAME
        );
    }

    #[tokio::test]
    async fn default_account_is_created_once() {
        let (state, _dir) = test_state().await;
        let (_, first_hash) = stored_credentials(&state.db).await.unwrap();

        ensure_default_account(&state.db, 4).await.unwrap();
        let (_, second_hash) = stored_credentials(&state.db).await.unwrap();
        assert_eq!(first_hash, second_hash);
        assert_ne!(first_hash, TEST_PASSWORD);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let (state, _dir) = test_state().await;
        assert!(matches!(
            login(&state, TEST_USERNAME, "salah123").await,
            Err(AppError::Auth(_))
        ));
        assert!(matches!(
            login(&state, "kasir", TEST_PASSWORD).await,
            Err(AppError::Auth(_))
        ));
        assert!(!is_logged_in(&state).await.unwrap());
    }

    #[tokio::test]
    async fn repeated_failures_lock_the_username() {
        let (state, _dir) = test_state().await;
        let max = get_config().security.max_login_attempts;

        for _ in 0..max {
            let _ = login(&state, TEST_USERNAME, "salah123").await;
        }
        // Password benar pun ditolak selama lockout
        assert!(matches!(
            login(&state, TEST_USERNAME, TEST_PASSWORD).await,
            Err(AppError::Auth(_))
        ));
    }

    #[tokio::test]
    async fn logout_invalidates_session() {
        let (state, token, _dir) = logged_in_state().await;
        logout(&state, &token).await.unwrap();

        assert!(matches!(check_session(&state, &token), Err(AppError::Auth(_))));
        assert!(!is_logged_in(&state).await.unwrap());
    }

    #[tokio::test]
    async fn change_password_requires_old_password() {
        let (state, token, _dir) = logged_in_state().await;

        assert!(matches!(
            change_password(&state, &token, "salah123", "rahasia99").await,
            Err(AppError::Auth(_))
        ));
        assert!(matches!(
            change_password(&state, &token, TEST_PASSWORD, "abc").await,
            Err(AppError::Validation(_))
        ));

        change_password(&state, &token, TEST_PASSWORD, "rahasia99").await.unwrap();
        assert!(login(&state, TEST_USERNAME, TEST_PASSWORD).await.is_err());
        assert!(login(&state, TEST_USERNAME, "rahasia99").await.is_ok());
    }
}
