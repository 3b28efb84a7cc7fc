//! Session keys and helpers over `tower_sessions::Session`.
//!
//! The session id travels in the `id` cookie; everything else lives server-side
//! in the configured store.

use tower_sessions::{
    Expiry, Session, SessionManagerLayer, SessionStore,
    cookie::{SameSite, time::Duration},
};

/// Id of the logged-in user. Absent or zero means anonymous.
pub const AUTHENTICATED_USER_ID_KEY: &str = "authenticatedUserID";
/// One-shot message shown on the next rendered page.
pub const FLASH_KEY: &str = "flash";
/// Synchronizer token checked on state-changing requests.
pub const CSRF_TOKEN_KEY: &str = "csrf_token";

pub fn manager_layer<S>(store: S, secure: bool, lifetime_hours: i64) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_secure(secure)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(Duration::hours(lifetime_hours)))
}

pub async fn put_flash(session: &Session, message: &str) -> Result<(), tower_sessions::session::Error> {
    session.insert(FLASH_KEY, message).await
}

/// Read and clear the flash message.
pub async fn pop_flash(session: &Session) -> Result<Option<String>, tower_sessions::session::Error> {
    session.remove::<String>(FLASH_KEY).await
}

#[cfg(test)]
pub fn memory_session() -> (Session, std::sync::Arc<tower_sessions::MemoryStore>) {
    let store = std::sync::Arc::new(tower_sessions::MemoryStore::default());
    (Session::new(None, store.clone(), None), store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn flash_is_read_once() {
        let (session, _) = memory_session();
        put_flash(&session, "Saved!").await.unwrap();

        assert_eq!(pop_flash(&session).await.unwrap().as_deref(), Some("Saved!"));
        assert_eq!(pop_flash(&session).await.unwrap(), None);
    }
}
