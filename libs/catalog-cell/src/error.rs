use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("treatment not found")]
    TreatmentNotFound,
    #[error("resource not found")]
    ResourceNotFound,
    #[error("staff member not found")]
    StaffNotFound,
    #[error("resource {0} does not belong to store {1}")]
    ResourceNotInStore(uuid::Uuid, uuid::Uuid),
    #[error("treatment is still referenced by an active booking")]
    TreatmentInUse,
}
