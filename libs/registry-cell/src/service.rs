use std::sync::Arc;

use shared_models::{QuotaSettingsPatch, Store};
use shared_store::AppStore;
use uuid::Uuid;

use crate::error::RegistryError;
use crate::policy;

/// Thin CRUD + policy surface over `AppStore` for the Store Registry (§4.1).
/// Transport/validation/authorization are collaborators (§1); this service
/// only owns the invariants named in §3/§4.1/§6.
pub struct StoreRegistryService {
    store: Arc<AppStore>,
}

impl StoreRegistryService {
    pub fn new(store: Arc<AppStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, store_id: Uuid) -> Result<Store, RegistryError> {
        self.store.get_store(store_id).await.ok_or(RegistryError::NotFound)
    }

    pub async fn create(&self, store: Store) -> Result<Store, RegistryError> {
        policy::resolve_timezone(&store)?;
        self.store.put_store(store.clone()).await;
        Ok(store)
    }

    /// §6 quota-settings merge: shallow-merge the three named keys; absent
    /// keys preserve prior values, explicit `null` clears them.
    pub async fn update_settings(
        &self,
        store_id: Uuid,
        patch: QuotaSettingsPatch,
    ) -> Result<Store, RegistryError> {
        let mut store = self.get(store_id).await?;
        store.settings.merge(patch);
        self.store.put_store(store.clone()).await;
        Ok(store)
    }

    pub async fn is_open_on_date(
        &self,
        store_id: Uuid,
        local_date: chrono::NaiveDate,
    ) -> Result<bool, RegistryError> {
        let store = self.get(store_id).await?;
        Ok(policy::is_open_on_date(&store, local_date))
    }

    pub async fn is_open_now(&self, store_id: Uuid) -> Result<bool, RegistryError> {
        let store = self.get(store_id).await?;
        policy::is_open_now(&store, chrono::Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use shared_models::{DaySchedule, OperatingHours, QuotaSettings};

    fn sample_store() -> Store {
        let mut hours = OperatingHours::new();
        hours.insert(
            Weekday::Mon,
            DaySchedule::Open {
                open: chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                close: chrono::NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            },
        );
        Store {
            id: Uuid::new_v4(),
            name: "Test Store".into(),
            timezone: "America/New_York".into(),
            operating_hours: hours,
            settings: QuotaSettings::default(),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let app = Arc::new(AppStore::new());
        let svc = StoreRegistryService::new(app);
        let store = sample_store();
        let id = store.id;
        svc.create(store).await.unwrap();
        let fetched = svc.get(id).await.unwrap();
        assert_eq!(fetched.id, id);
    }

    #[tokio::test]
    async fn create_rejects_bad_timezone() {
        let app = Arc::new(AppStore::new());
        let svc = StoreRegistryService::new(app);
        let mut store = sample_store();
        store.timezone = "Not/AZone".into();
        assert!(svc.create(store).await.is_err());
    }

    #[tokio::test]
    async fn settings_merge_preserves_absent_keys_and_clears_null() {
        let app = Arc::new(AppStore::new());
        let svc = StoreRegistryService::new(app);
        let store = sample_store();
        let id = store.id;
        svc.create(store).await.unwrap();

        let patch = QuotaSettingsPatch {
            max_daily_bookings: Some(Some(50)),
            max_concurrent_bookings: None,
            buffer_time_minutes: Some(None),
        };
        let updated = svc.update_settings(id, patch).await.unwrap();
        assert_eq!(updated.settings.max_daily_bookings, Some(50));
        assert_eq!(updated.settings.buffer_time_minutes, 15);
    }
}
