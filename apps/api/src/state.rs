use std::sync::Arc;

use catalog_cell::CatalogService;
use registry_cell::StoreRegistryService;
use reservation_cell::ReservationService;
use shared_config::AppConfig;
use shared_models::EventSink;
use shared_utils::rate_limit::ClientRateLimiter;
use timeslot_cell::TimeslotService;
use webhook_cell::SubscriptionService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub registry: Arc<StoreRegistryService>,
    pub catalog: Arc<CatalogService>,
    pub timeslots: Arc<TimeslotService>,
    pub reservations: Arc<ReservationService>,
    pub subscriptions: Arc<SubscriptionService>,
    pub rate_limiter: Arc<ClientRateLimiter>,
    /// The same sink wired into `reservations` (§4.6): handlers outside the
    /// admission transaction (timeslot generation) use it to emit
    /// `availability.changed` (§6).
    pub events: Arc<dyn EventSink>,
}
