use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::{models::UserRole, response::ApiResponse};

pub mod session_keys {
    pub const CURRENT_ADMIN: &str = "current_admin";
    pub const FLASH: &str = "flash";
}

/// Request-scoped auth context carried by the session. Handlers receive it
/// through `RequireAdmin`; nothing reads ambient global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub user_id: i64,
    pub name: String,
    pub role: UserRole,
}

/// Extractor that requires an authenticated admin session.
///
/// Page requests are redirected to the login form; AJAX requests get the
/// JSON unauthorized envelope instead.
pub struct RequireAdmin(pub CurrentAdmin);

pub enum AdminAuthRejection {
    RedirectToLogin,
    Unauthorized,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                axum::Json(ApiResponse::<serde_json::Value>::error("Unauthorized access")),
            )
                .into_response(),
        }
    }
}

fn is_ajax(parts: &Parts) -> bool {
    parts.uri.path().starts_with("/admin/ajax")
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AdminAuthRejection::Unauthorized)?;

        let admin: CurrentAdmin = session
            .get(session_keys::CURRENT_ADMIN)
            .await
            .ok()
            .flatten()
            .ok_or_else(|| {
                if is_ajax(parts) {
                    AdminAuthRejection::Unauthorized
                } else {
                    AdminAuthRejection::RedirectToLogin
                }
            })?;

        if admin.role != UserRole::Admin {
            return Err(if is_ajax(parts) {
                AdminAuthRejection::Unauthorized
            } else {
                AdminAuthRejection::RedirectToLogin
            });
        }

        Ok(Self(admin))
    }
}
