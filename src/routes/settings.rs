use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::State,
    response::Redirect,
    routing::get,
};
use tower_sessions::Session;

use crate::{
    dto::settings::SettingsForm,
    error::{AppError, AppResult},
    middleware::{
        auth::RequireAdmin,
        flash::{Flash, push_flash, take_flash},
    },
    services::settings_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(settings_page).post(update_settings))
}

pub struct SettingView {
    pub key: String,
    pub value: String,
    pub kind: String,
    pub label: String,
    pub description: String,
}

pub struct SettingGroupView {
    pub name: String,
    pub settings: Vec<SettingView>,
}

#[derive(Template, WebTemplate)]
#[template(path = "settings/index.html")]
pub struct SettingsTemplate {
    pub flashes: Vec<Flash>,
    pub groups: Vec<SettingGroupView>,
}

pub async fn settings_page(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
) -> AppResult<SettingsTemplate> {
    let settings = settings_service::all_settings(&state).await?;
    let groups = settings_service::grouped(settings)
        .into_iter()
        .map(|(name, members)| SettingGroupView {
            name,
            settings: members
                .into_iter()
                .map(|s| SettingView {
                    key: s.setting_key,
                    value: s.setting_value.unwrap_or_default(),
                    kind: s.setting_type.as_str().to_string(),
                    label: s.label,
                    description: s.description.unwrap_or_default(),
                })
                .collect(),
        })
        .collect();

    Ok(SettingsTemplate {
        flashes: take_flash(&session).await,
        groups,
    })
}

pub async fn update_settings(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Form(form): Form<SettingsForm>,
) -> AppResult<Redirect> {
    match settings_service::update_settings(&state, &admin, &form).await {
        Ok(updated) => {
            push_flash(
                &session,
                Flash::success(format!("Saved {updated} settings")),
            )
            .await?;
        }
        Err(AppError::BadRequest(message)) => {
            push_flash(&session, Flash::error(message)).await?;
        }
        Err(err) => return Err(err),
    }
    Ok(Redirect::to("/admin/settings"))
}
