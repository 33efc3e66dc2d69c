use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;
use tera::Tera;

use crate::config::Config;
use crate::domain::ports::BackupSync;
use crate::domain::services::notification::CONFIRMATION_TEMPLATE;
use crate::state::{AppState, Repositories};
use crate::infra::email::http_email_service::HttpEmailService;
use crate::infra::sync::http_backup_sync::{HttpBackupSync, NoopBackupSync};
use crate::infra::repositories::{
    postgres_booking_repo::PostgresBookingRepo, postgres_counter_repo::PostgresCounterRepo,
    postgres_customer_repo::PostgresCustomerRepo, postgres_slot_repo::PostgresSlotRepo,
    sqlite_booking_repo::SqliteBookingRepo, sqlite_counter_repo::SqliteCounterRepo,
    sqlite_customer_repo::SqliteCustomerRepo, sqlite_slot_repo::SqliteSlotRepo,
};

pub fn load_templates() -> Arc<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_template(CONFIRMATION_TEMPLATE, include_str!("../templates/booking_confirmation.html"))
        .expect("Failed to load confirmation template");
    Arc::new(tera)
}

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;
    let email_service = Arc::new(HttpEmailService::new(
        config.mail_service_url.clone(),
        config.mail_service_token.clone(),
    ));

    let backup_sync: Arc<dyn BackupSync> = match &config.backup_sync_url {
        Some(url) => {
            info!("Backup sync enabled");
            Arc::new(HttpBackupSync::new(url.clone()))
        }
        None => Arc::new(NoopBackupSync),
    };

    let repos = if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;

        Repositories {
            slots: Arc::new(PostgresSlotRepo::new(pool.clone())),
            bookings: Arc::new(PostgresBookingRepo::new(pool.clone())),
            counters: Arc::new(PostgresCounterRepo::new(pool.clone())),
            customers: Arc::new(PostgresCustomerRepo::new(pool)),
        }
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;

        Repositories {
            slots: Arc::new(SqliteSlotRepo::new(pool.clone())),
            bookings: Arc::new(SqliteBookingRepo::new(pool.clone())),
            counters: Arc::new(SqliteCounterRepo::new(pool.clone())),
            customers: Arc::new(SqliteCustomerRepo::new(pool)),
        }
    };

    AppState::assemble(config.clone(), repos, email_service, backup_sync, load_templates())
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
