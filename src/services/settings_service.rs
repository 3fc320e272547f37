use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::{
    audit::log_audit,
    dto::settings::SettingsForm,
    entity::settings::{
        ActiveModel as SettingActive, Column as SettingCol, Entity as Settings,
        Model as SettingModel,
    },
    error::{AppError, AppResult},
    middleware::auth::CurrentAdmin,
    models::{Setting, SettingType},
    state::AppState,
};

pub async fn all_settings(state: &AppState) -> AppResult<Vec<Setting>> {
    let rows = Settings::find()
        .order_by_asc(SettingCol::SettingGroup)
        .order_by_asc(SettingCol::Id)
        .all(&state.orm)
        .await?;
    rows.into_iter().map(setting_from_entity).collect()
}

/// Group settings for rendering; rows arrive pre-sorted by group.
pub fn grouped(settings: Vec<Setting>) -> Vec<(String, Vec<Setting>)> {
    let mut groups: Vec<(String, Vec<Setting>)> = Vec::new();
    for setting in settings {
        match groups.last_mut() {
            Some((group, members)) if *group == setting.setting_group => members.push(setting),
            _ => groups.push((setting.setting_group.clone(), vec![setting])),
        }
    }
    groups
}

/// Bulk update inside one transaction: a failure mid-sequence leaves no
/// partial state. Boolean settings absent from the form read as unchecked.
pub async fn update_settings(
    state: &AppState,
    admin: &CurrentAdmin,
    form: &SettingsForm,
) -> AppResult<usize> {
    let txn = state.orm.begin().await?;

    let rows = Settings::find().all(&txn).await?;
    let mut updated = 0usize;

    for row in rows {
        let setting_type = SettingType::parse(&row.setting_type)?;
        let submitted = match setting_type {
            SettingType::Boolean => Some(
                form.get(&row.setting_key)
                    .map(|v| (v == "true" || v == "on" || v == "1").to_string())
                    .unwrap_or_else(|| "false".to_string()),
            ),
            _ => form.get(&row.setting_key).cloned(),
        };

        let Some(value) = submitted else { continue };
        if setting_type == SettingType::Number && value.trim().parse::<Decimal>().is_err() {
            return Err(AppError::BadRequest(format!(
                "Setting '{}' must be a number",
                row.label
            )));
        }

        if row.setting_value.as_deref() == Some(value.as_str()) {
            continue;
        }

        let mut active: SettingActive = row.into();
        active.setting_value = Set(Some(value));
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await?;
        updated += 1;
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(admin.user_id),
        "settings_update",
        Some("settings"),
        Some(serde_json::json!({ "updated": updated })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(updated)
}

pub async fn get_value(state: &AppState, key: &str) -> AppResult<Option<String>> {
    let row = Settings::find()
        .filter(SettingCol::SettingKey.eq(key))
        .one(&state.orm)
        .await?;
    Ok(row.and_then(|r| r.setting_value))
}

pub async fn currency_symbol(state: &AppState) -> AppResult<String> {
    Ok(get_value(state, "currency_symbol")
        .await?
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "KSh".to_string()))
}

pub async fn tax_rate(state: &AppState) -> AppResult<Decimal> {
    Ok(get_value(state, "tax_rate")
        .await?
        .and_then(|v| v.trim().parse::<Decimal>().ok())
        .unwrap_or(Decimal::ZERO))
}

fn setting_from_entity(model: SettingModel) -> AppResult<Setting> {
    Ok(Setting {
        id: model.id,
        setting_key: model.setting_key,
        setting_value: model.setting_value,
        setting_type: SettingType::parse(&model.setting_type)?,
        setting_group: model.setting_group,
        label: model.label,
        description: model.description,
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn setting(group: &str, key: &str) -> Setting {
        Setting {
            id: 0,
            setting_key: key.into(),
            setting_value: None,
            setting_type: SettingType::Text,
            setting_group: group.into(),
            label: key.into(),
            description: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn grouping_preserves_order_within_groups() {
        let groups = grouped(vec![
            setting("general", "store_name"),
            setting("general", "store_email"),
            setting("payments", "currency_symbol"),
        ]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "general");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "payments");
    }
}
