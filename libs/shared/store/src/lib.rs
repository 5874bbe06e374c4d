//! In-process transactional store backing every cell (§12.1 of the full
//! spec). Replaces the ancestor's HTTP-proxy-to-Supabase client: the
//! admission algorithm needs a single serializable transaction across five
//! tables, which a stateless REST proxy cannot give us. Every table is an
//! `RwLock<HashMap<Id, T>>`; cross-table atomicity for the admission
//! transaction is provided by `StoreLocks`, not by the tables themselves.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use shared_models::{Booking, Resource, StaffMember, Store, Timeslot, Treatment, WebhookSubscription};

#[derive(Default)]
struct Table<T> {
    rows: RwLock<HashMap<Uuid, T>>,
}

impl<T: Clone> Table<T> {
    async fn get(&self, id: Uuid) -> Option<T> {
        self.rows.read().await.get(&id).cloned()
    }

    async fn all(&self) -> Vec<T> {
        self.rows.read().await.values().cloned().collect()
    }

    async fn upsert(&self, id: Uuid, value: T) {
        self.rows.write().await.insert(id, value);
    }

    async fn remove(&self, id: Uuid) -> Option<T> {
        self.rows.write().await.remove(&id)
    }
}

/// Per-store advisory lock registry (§5): `Lock(storeId)` held for the
/// duration of the admission transaction. The registry map itself is guarded
/// by a short-lived std mutex; the returned `Arc<tokio::sync::Mutex<()>>` is
/// what callers actually hold across `.await` points.
#[derive(Default)]
pub struct StoreLocks {
    locks: StdMutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl StoreLocks {
    pub fn lock_for(&self, store_id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().expect("store lock registry poisoned");
        locks.entry(store_id).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }
}

#[derive(Default)]
pub struct AppStore {
    pub stores: Table<Store>,
    pub treatments: Table<Treatment>,
    pub resources: Table<Resource>,
    pub staff: Table<StaffMember>,
    pub timeslots: Table<Timeslot>,
    pub bookings: Table<Booking>,
    pub webhook_subscriptions: Table<WebhookSubscription>,
    pub locks: StoreLocks,
}

impl AppStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Acquire the per-store advisory lock for the duration of an admission
    /// transaction, a timeslot regeneration, or any other multi-table
    /// mutation scoped to one store (§5).
    pub async fn lock_store(&self, store_id: Uuid) -> tokio::sync::OwnedMutexGuard<()> {
        self.locks.lock_for(store_id).lock_owned().await
    }

    pub async fn get_store(&self, id: Uuid) -> Option<Store> {
        self.stores.get(id).await
    }

    pub async fn put_store(&self, store: Store) {
        self.stores.upsert(store.id, store).await;
    }

    pub async fn get_treatment(&self, id: Uuid) -> Option<Treatment> {
        self.treatments.get(id).await
    }

    pub async fn put_treatment(&self, treatment: Treatment) {
        self.treatments.upsert(treatment.id, treatment).await;
    }

    pub async fn treatments_for_store(&self, store_id: Uuid) -> Vec<Treatment> {
        self.treatments.all().await.into_iter().filter(|t| t.store_id == store_id).collect()
    }

    pub async fn get_resource(&self, id: Uuid) -> Option<Resource> {
        self.resources.get(id).await
    }

    pub async fn put_resource(&self, resource: Resource) {
        self.resources.upsert(resource.id, resource).await;
    }

    pub async fn resources_for_store(&self, store_id: Uuid) -> Vec<Resource> {
        self.resources.all().await.into_iter().filter(|r| r.store_id == store_id).collect()
    }

    pub async fn get_staff(&self, id: Uuid) -> Option<StaffMember> {
        self.staff.get(id).await
    }

    pub async fn put_staff(&self, staff: StaffMember) {
        self.staff.upsert(staff.id, staff).await;
    }

    pub async fn staff_for_store(&self, store_id: Uuid) -> Vec<StaffMember> {
        self.staff.all().await.into_iter().filter(|s| s.store_id == Some(store_id)).collect()
    }

    pub async fn get_timeslot(&self, id: Uuid) -> Option<Timeslot> {
        self.timeslots.get(id).await
    }

    pub async fn put_timeslot(&self, slot: Timeslot) {
        self.timeslots.upsert(slot.id, slot).await;
    }

    pub async fn remove_timeslot(&self, id: Uuid) -> Option<Timeslot> {
        self.timeslots.remove(id).await
    }

    pub async fn timeslots_for_store(&self, store_id: Uuid) -> Vec<Timeslot> {
        self.timeslots.all().await.into_iter().filter(|t| t.store_id == store_id).collect()
    }

    pub async fn get_booking(&self, id: Uuid) -> Option<Booking> {
        self.bookings.get(id).await
    }

    pub async fn put_booking(&self, booking: Booking) {
        self.bookings.upsert(booking.id, booking).await;
    }

    pub async fn bookings_for_store(&self, store_id: Uuid) -> Vec<Booking> {
        self.bookings.all().await.into_iter().filter(|b| b.store_id == store_id).collect()
    }

    pub async fn bookings_for_treatment(&self, treatment_id: Uuid) -> Vec<Booking> {
        self.bookings.all().await.into_iter().filter(|b| b.treatment_id == treatment_id).collect()
    }

    pub async fn bookings_for_staff(&self, staff_id: Uuid) -> Vec<Booking> {
        self.bookings.all().await.into_iter().filter(|b| b.staff_id == Some(staff_id)).collect()
    }

    pub async fn get_subscription(&self, id: Uuid) -> Option<WebhookSubscription> {
        self.webhook_subscriptions.get(id).await
    }

    pub async fn put_subscription(&self, sub: WebhookSubscription) {
        self.webhook_subscriptions.upsert(sub.id, sub).await;
    }

    pub async fn all_subscriptions(&self) -> Vec<WebhookSubscription> {
        self.webhook_subscriptions.all().await
    }

    pub async fn remove_subscription(&self, id: Uuid) -> Option<WebhookSubscription> {
        self.webhook_subscriptions.remove(id).await
    }
}
