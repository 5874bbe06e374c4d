use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use shared_models::{ApiError, OperatingHours, QuotaSettings, QuotaSettingsPatch, Store};
use uuid::Uuid;

use crate::error_map::map_registry;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateStoreRequest {
    pub name: String,
    pub timezone: String,
    #[serde(default)]
    pub operating_hours: OperatingHours,
}

pub async fn create_store(
    State(state): State<AppState>,
    Json(req): Json<CreateStoreRequest>,
) -> Result<Json<Store>, ApiError> {
    let store = Store {
        id: Uuid::new_v4(),
        name: req.name,
        timezone: req.timezone,
        operating_hours: req.operating_hours,
        settings: QuotaSettings::default(),
        is_active: true,
    };
    let created = state.registry.create(store).await.map_err(map_registry)?;
    Ok(Json(created))
}

pub async fn get_store(State(state): State<AppState>, Path(store_id): Path<Uuid>) -> Result<Json<Store>, ApiError> {
    Ok(Json(state.registry.get(store_id).await.map_err(map_registry)?))
}

pub async fn update_settings(
    State(state): State<AppState>,
    Path(store_id): Path<Uuid>,
    Json(patch): Json<QuotaSettingsPatch>,
) -> Result<Json<Store>, ApiError> {
    let updated = state.registry.update_settings(store_id, patch).await.map_err(map_registry)?;
    Ok(Json(updated))
}
