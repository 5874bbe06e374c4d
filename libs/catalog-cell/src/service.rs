//! Treatment/Resource/Staff CRUD and the Catalog invariants of §4.2: required-resource
//! existence validation, staff-eligibility ranking, and the soft-delete-with-active-
//! booking guard. Grounded on `doctor-cell`'s service module layout (one service struct
//! per sub-domain, thin CRUD wrapping the backing client) and `appointment-cell`'s
//! models.rs validation-rule idiom, generalized from HTTP/Supabase calls to `shared-store`.

use std::sync::Arc;

use chrono::Utc;
use shared_models::{BookingStatus, Resource, StaffMember, Treatment};
use shared_store::AppStore;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::CatalogError;

pub struct CatalogService {
    store: Arc<AppStore>,
}

impl CatalogService {
    pub fn new(store: Arc<AppStore>) -> Self {
        Self { store }
    }

    pub async fn get_treatment(&self, id: Uuid) -> Result<Treatment, CatalogError> {
        self.store.get_treatment(id).await.ok_or(CatalogError::TreatmentNotFound)
    }

    pub async fn list_treatments(&self, store_id: Uuid) -> Vec<Treatment> {
        self.store.treatments_for_store(store_id).await
    }

    /// Validates every id in `required_resources` exists and belongs to the
    /// treatment's own store (§4.2) before persisting.
    pub async fn create_treatment(&self, treatment: Treatment) -> Result<Treatment, CatalogError> {
        self.validate_required_resources(&treatment).await?;
        self.store.put_treatment(treatment.clone()).await;
        debug!(treatment_id = %treatment.id, "treatment created");
        Ok(treatment)
    }

    /// Re-runs the same required-resource check as creation (§4.2): "updating
    /// resources runs the same check".
    pub async fn update_treatment(&self, treatment: Treatment) -> Result<Treatment, CatalogError> {
        self.get_treatment(treatment.id).await?;
        self.validate_required_resources(&treatment).await?;
        self.store.put_treatment(treatment.clone()).await;
        Ok(treatment)
    }

    async fn validate_required_resources(&self, treatment: &Treatment) -> Result<(), CatalogError> {
        for resource_id in &treatment.required_resources {
            let resource = self
                .store
                .get_resource(*resource_id)
                .await
                .ok_or(CatalogError::ResourceNotFound)?;
            if resource.store_id != treatment.store_id {
                return Err(CatalogError::ResourceNotInStore(*resource_id, treatment.store_id));
            }
        }
        Ok(())
    }

    /// Soft delete: flips `isActive` off, rejected if any `pending`/`confirmed`
    /// booking with `bookingDateTime >= now` still references the treatment (§4.2).
    pub async fn deactivate_treatment(&self, treatment_id: Uuid) -> Result<Treatment, CatalogError> {
        let mut treatment = self.get_treatment(treatment_id).await?;
        let now = Utc::now();

        let blocking = self
            .store
            .bookings_for_treatment(treatment_id)
            .await
            .into_iter()
            .any(|b| {
                matches!(b.status, BookingStatus::Pending | BookingStatus::Confirmed)
                    && b.booking_date_time >= now
            });

        if blocking {
            warn!(treatment_id = %treatment_id, "deactivation rejected: active future bookings remain");
            return Err(CatalogError::TreatmentInUse);
        }

        treatment.is_active = false;
        self.store.put_treatment(treatment.clone()).await;
        Ok(treatment)
    }

    pub async fn get_resource(&self, id: Uuid) -> Result<Resource, CatalogError> {
        self.store.get_resource(id).await.ok_or(CatalogError::ResourceNotFound)
    }

    pub async fn create_resource(&self, resource: Resource) -> Resource {
        self.store.put_resource(resource.clone()).await;
        resource
    }

    pub async fn list_resources(&self, store_id: Uuid) -> Vec<Resource> {
        self.store.resources_for_store(store_id).await
    }

    pub async fn get_staff(&self, id: Uuid) -> Result<StaffMember, CatalogError> {
        self.store.get_staff(id).await.ok_or(CatalogError::StaffNotFound)
    }

    pub async fn create_staff(&self, staff: StaffMember) -> StaffMember {
        self.store.put_staff(staff.clone()).await;
        staff
    }

    pub async fn list_staff(&self, store_id: Uuid) -> Vec<StaffMember> {
        self.store.staff_for_store(store_id).await
    }

    /// `canBePerformedBy` (§4.2): does this staff member meet the treatment's
    /// required skill level?
    pub async fn staff_is_eligible(&self, treatment: &Treatment, staff_id: Uuid) -> Result<bool, CatalogError> {
        let staff = self.get_staff(staff_id).await?;
        Ok(treatment.required_staff_level.is_satisfied_by(staff.skill_level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_models::{Price, RequiredStaffLevel, ResourceType, Role, StaffLevel};

    fn sample_treatment(store_id: Uuid, required_resources: Vec<Uuid>) -> Treatment {
        Treatment {
            id: Uuid::new_v4(),
            store_id,
            name: "Deep Tissue Massage".into(),
            category: "massage".into(),
            duration_minutes: 60,
            price: Price { amount: 8000, currency: "USD".into() },
            required_staff_level: RequiredStaffLevel::Level(StaffLevel::Senior),
            required_resources,
            max_concurrent_bookings: 1,
            tags: vec![],
            is_active: true,
        }
    }

    fn sample_resource(store_id: Uuid) -> Resource {
        Resource {
            id: Uuid::new_v4(),
            store_id,
            resource_type: ResourceType::Room,
            capacity: 1,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn create_rejects_resource_from_other_store() {
        let app = Arc::new(AppStore::new());
        let svc = CatalogService::new(app.clone());
        let store_id = Uuid::new_v4();
        let other_store = Uuid::new_v4();
        let resource = sample_resource(other_store);
        app.put_resource(resource.clone()).await;

        let treatment = sample_treatment(store_id, vec![resource.id]);
        let result = svc.create_treatment(treatment).await;
        assert!(matches!(result, Err(CatalogError::ResourceNotInStore(_, _))));
    }

    #[tokio::test]
    async fn create_accepts_resource_from_same_store() {
        let app = Arc::new(AppStore::new());
        let svc = CatalogService::new(app.clone());
        let store_id = Uuid::new_v4();
        let resource = sample_resource(store_id);
        app.put_resource(resource.clone()).await;

        let treatment = sample_treatment(store_id, vec![resource.id]);
        assert!(svc.create_treatment(treatment).await.is_ok());
    }

    #[tokio::test]
    async fn staff_eligibility_ranks_skill_levels() {
        let app = Arc::new(AppStore::new());
        let svc = CatalogService::new(app.clone());
        let store_id = Uuid::new_v4();
        let treatment = sample_treatment(store_id, vec![]);
        svc.create_treatment(treatment.clone()).await.unwrap();

        let junior = StaffMember {
            id: Uuid::new_v4(),
            role: Role::Staff,
            store_id: Some(store_id),
            skill_level: Some(StaffLevel::Junior),
            is_active: true,
        };
        let expert = StaffMember {
            id: Uuid::new_v4(),
            role: Role::Staff,
            store_id: Some(store_id),
            skill_level: Some(StaffLevel::Expert),
            is_active: true,
        };
        svc.create_staff(junior.clone()).await;
        svc.create_staff(expert.clone()).await;

        assert!(!svc.staff_is_eligible(&treatment, junior.id).await.unwrap());
        assert!(svc.staff_is_eligible(&treatment, expert.id).await.unwrap());
    }

    #[tokio::test]
    async fn deactivation_blocked_by_future_pending_booking() {
        let app = Arc::new(AppStore::new());
        let svc = CatalogService::new(app.clone());
        let store_id = Uuid::new_v4();
        let treatment = sample_treatment(store_id, vec![]);
        svc.create_treatment(treatment.clone()).await.unwrap();

        let booking = shared_models::Booking {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            store_id,
            treatment_id: treatment.id,
            staff_id: None,
            booking_date_time: Utc::now() + chrono::Duration::days(1),
            duration_minutes: 60,
            status: BookingStatus::Pending,
            price: treatment.price.clone(),
            notes: None,
            cancellation_reason: None,
            cancelled_at: None,
            completed_at: None,
            reminder_sent: false,
        };
        app.put_booking(booking).await;

        let result = svc.deactivate_treatment(treatment.id).await;
        assert!(matches!(result, Err(CatalogError::TreatmentInUse)));
    }

    #[tokio::test]
    async fn deactivation_allowed_once_bookings_are_terminal() {
        let app = Arc::new(AppStore::new());
        let svc = CatalogService::new(app.clone());
        let store_id = Uuid::new_v4();
        let treatment = sample_treatment(store_id, vec![]);
        svc.create_treatment(treatment.clone()).await.unwrap();

        let booking = shared_models::Booking {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            store_id,
            treatment_id: treatment.id,
            staff_id: None,
            booking_date_time: Utc::now() + chrono::Duration::days(1),
            duration_minutes: 60,
            status: BookingStatus::Cancelled,
            price: treatment.price.clone(),
            notes: None,
            cancellation_reason: Some("customer request".into()),
            cancelled_at: Some(Utc::now()),
            completed_at: None,
            reminder_sent: false,
        };
        app.put_booking(booking).await;

        let updated = svc.deactivate_treatment(treatment.id).await.unwrap();
        assert!(!updated.is_active);
    }
}
