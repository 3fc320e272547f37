//! One-shot flash messages stored in the session: pushed on a redirecting
//! write, drained on the next page render.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::{error::AppResult, middleware::auth::session_keys};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == FlashKind::Error
    }
}

pub async fn push_flash(session: &Session, flash: Flash) -> AppResult<()> {
    let mut queued: Vec<Flash> = session
        .get(session_keys::FLASH)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    queued.push(flash);
    session
        .insert(session_keys::FLASH, queued)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;
    Ok(())
}

/// Drain queued flashes; they display once.
pub async fn take_flash(session: &Session) -> Vec<Flash> {
    session
        .remove::<Vec<Flash>>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}
