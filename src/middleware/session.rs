//! Postgres-backed session layer. The session table is created by the
//! initial migration; the store never runs its own DDL.

use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::db::DbPool;

pub const SESSION_COOKIE_NAME: &str = "terral_admin_session";

const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

pub fn create_session_layer(pool: &DbPool, secure: bool) -> SessionManagerLayer<PostgresStore> {
    let store = PostgresStore::new(pool.clone());

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(secure)
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
}
