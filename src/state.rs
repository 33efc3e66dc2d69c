use std::sync::Arc;
use crate::domain::ports::{
    BackupSync, BookingCounterRepository, BookingRepository, CustomerRepository, EmailService, SlotRepository,
};
use crate::domain::services::{
    booking_code::BookingCodeGenerator,
    booking_lifecycle::BookingService,
    notification::BookingNotifier,
    slot_ledger::SlotLedger,
};
use crate::config::Config;
use tera::Tera;

/// Storage adapters for one database backend.
pub struct Repositories {
    pub slots: Arc<dyn SlotRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub counters: Arc<dyn BookingCounterRepository>,
    pub customers: Arc<dyn CustomerRepository>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub customer_repo: Arc<dyn CustomerRepository>,
    pub slot_ledger: Arc<SlotLedger>,
    pub booking_service: Arc<BookingService>,
}

impl AppState {
    pub fn assemble(
        config: Config,
        repos: Repositories,
        email_service: Arc<dyn EmailService>,
        backup_sync: Arc<dyn BackupSync>,
        templates: Arc<Tera>,
    ) -> Self {
        let slot_ledger = Arc::new(SlotLedger::new(repos.slots, config.time_grid()));
        let codes = BookingCodeGenerator::new(repos.counters, config.booking_code_prefix.clone(), config.timezone);
        let notifier = Arc::new(BookingNotifier::new(
            email_service,
            backup_sync,
            templates,
            config.timezone,
            config.grid_interval_min,
        ));
        let booking_service = Arc::new(BookingService::new(
            repos.bookings,
            repos.customers.clone(),
            slot_ledger.clone(),
            codes,
            notifier,
        ));

        Self {
            config,
            customer_repo: repos.customers,
            slot_ledger,
            booking_service,
        }
    }
}
