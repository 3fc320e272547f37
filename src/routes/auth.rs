use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tower_sessions::Session;

use crate::{
    dto::auth::LoginForm,
    error::{AppError, AppResult},
    middleware::auth::{CurrentAdmin, session_keys},
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/logout", post(logout))
}

#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub email: String,
}

pub async fn login_page(session: Session) -> AppResult<Response> {
    let current: Option<CurrentAdmin> = session
        .get(session_keys::CURRENT_ADMIN)
        .await
        .ok()
        .flatten();
    if current.is_some() {
        return Ok(Redirect::to("/admin").into_response());
    }

    Ok(LoginTemplate {
        error: None,
        email: String::new(),
    }
    .into_response())
}

pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(payload): Form<LoginForm>,
) -> AppResult<Response> {
    let email = payload.email.clone();
    match auth_service::login_admin(&state.pool, payload).await {
        Ok(admin) => {
            // New session id on privilege change.
            session
                .cycle_id()
                .await
                .map_err(|e| anyhow::anyhow!(e))?;
            session
                .insert(session_keys::CURRENT_ADMIN, admin)
                .await
                .map_err(|e| anyhow::anyhow!(e))?;
            Ok(Redirect::to("/admin").into_response())
        }
        Err(AppError::BadRequest(message)) => Ok(LoginTemplate {
            error: Some(message),
            email,
        }
        .into_response()),
        Err(err) => Err(err),
    }
}

pub async fn logout(session: Session) -> AppResult<Redirect> {
    session.flush().await.map_err(|e| anyhow::anyhow!(e))?;
    Ok(Redirect::to("/login"))
}
