use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use shared_models::{ApiError, Price, RequiredStaffLevel, Resource, ResourceType, Role, StaffLevel, StaffMember, Treatment};
use uuid::Uuid;

use crate::error_map::map_catalog;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateTreatmentRequest {
    pub name: String,
    pub category: String,
    pub duration_minutes: i64,
    pub price: Price,
    #[serde(default = "default_staff_level")]
    pub required_staff_level: RequiredStaffLevel,
    #[serde(default)]
    pub required_resources: Vec<Uuid>,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_bookings: u32,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_staff_level() -> RequiredStaffLevel {
    RequiredStaffLevel::Any
}

fn default_max_concurrent() -> u32 {
    1
}

pub async fn list_treatments(
    State(state): State<AppState>,
    Path(store_id): Path<Uuid>,
) -> Json<Vec<Treatment>> {
    Json(state.catalog.list_treatments(store_id).await)
}

pub async fn get_treatment(
    State(state): State<AppState>,
    Path(treatment_id): Path<Uuid>,
) -> Result<Json<Treatment>, ApiError> {
    Ok(Json(state.catalog.get_treatment(treatment_id).await.map_err(map_catalog)?))
}

pub async fn create_treatment(
    State(state): State<AppState>,
    Path(store_id): Path<Uuid>,
    Json(req): Json<CreateTreatmentRequest>,
) -> Result<Json<Treatment>, ApiError> {
    let treatment = Treatment {
        id: Uuid::new_v4(),
        store_id,
        name: req.name,
        category: req.category,
        duration_minutes: req.duration_minutes,
        price: req.price,
        required_staff_level: req.required_staff_level,
        required_resources: req.required_resources,
        max_concurrent_bookings: req.max_concurrent_bookings,
        tags: req.tags,
        is_active: true,
    };
    let created = state.catalog.create_treatment(treatment).await.map_err(map_catalog)?;
    Ok(Json(created))
}

pub async fn update_treatment(
    State(state): State<AppState>,
    Path(treatment_id): Path<Uuid>,
    Json(mut treatment): Json<Treatment>,
) -> Result<Json<Treatment>, ApiError> {
    treatment.id = treatment_id;
    let updated = state.catalog.update_treatment(treatment).await.map_err(map_catalog)?;
    Ok(Json(updated))
}

pub async fn deactivate_treatment(
    State(state): State<AppState>,
    Path(treatment_id): Path<Uuid>,
) -> Result<Json<Treatment>, ApiError> {
    let updated = state.catalog.deactivate_treatment(treatment_id).await.map_err(map_catalog)?;
    Ok(Json(updated))
}

#[derive(Deserialize)]
pub struct CreateResourceRequest {
    pub resource_type: ResourceType,
    pub capacity: u32,
}

pub async fn list_resources(State(state): State<AppState>, Path(store_id): Path<Uuid>) -> Json<Vec<Resource>> {
    Json(state.catalog.list_resources(store_id).await)
}

pub async fn create_resource(
    State(state): State<AppState>,
    Path(store_id): Path<Uuid>,
    Json(req): Json<CreateResourceRequest>,
) -> Json<Resource> {
    let resource = Resource {
        id: Uuid::new_v4(),
        store_id,
        resource_type: req.resource_type,
        capacity: req.capacity,
        is_active: true,
    };
    Json(state.catalog.create_resource(resource).await)
}

#[derive(Deserialize)]
pub struct CreateStaffRequest {
    #[serde(default = "default_role")]
    pub role: Role,
    pub store_id: Option<Uuid>,
    pub skill_level: Option<StaffLevel>,
}

fn default_role() -> Role {
    Role::Staff
}

pub async fn get_staff(State(state): State<AppState>, Path(staff_id): Path<Uuid>) -> Result<Json<StaffMember>, ApiError> {
    Ok(Json(state.catalog.get_staff(staff_id).await.map_err(map_catalog)?))
}

pub async fn create_staff(State(state): State<AppState>, Json(req): Json<CreateStaffRequest>) -> Json<StaffMember> {
    let staff = StaffMember {
        id: Uuid::new_v4(),
        role: req.role,
        store_id: req.store_id,
        skill_level: req.skill_level,
        is_active: true,
    };
    Json(state.catalog.create_staff(staff).await)
}
