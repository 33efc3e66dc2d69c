use slot_booking::{
    api::router::create_router,
    state::{AppState, Repositories},
    config::Config,
    infra::factory::load_templates,
    infra::repositories::{
        sqlite_booking_repo::SqliteBookingRepo,
        sqlite_counter_repo::SqliteCounterRepo,
        sqlite_customer_repo::SqliteCustomerRepo,
        sqlite_slot_repo::SqliteSlotRepo,
    },
    domain::models::{booking::Booking, customer::Customer},
    domain::ports::{BackupSync, BookingRepository, EmailService},
    error::AppError,
};
use sqlx::{sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions}, Pool, Sqlite};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    Router,
};
use chrono::NaiveTime;
use std::str::FromStr;
use async_trait::async_trait;
use tower::ServiceExt;
use serde_json::{json, Value};

pub const PROVIDER: &str = "provider-1";

#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct SentMail {
    pub recipient: String,
    pub subject: String,
    pub attachment_name: Option<String>,
}

#[derive(Default)]
pub struct MockEmailService {
    pub sent: Mutex<Vec<SentMail>>,
}

#[async_trait]
impl EmailService for MockEmailService {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        _html_body: &str,
        attachment_name: Option<&str>,
        _attachment_data: Option<&[u8]>
    ) -> Result<(), AppError> {
        self.sent.lock().unwrap().push(SentMail {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            attachment_name: attachment_name.map(str::to_string),
        });
        Ok(())
    }
}

#[derive(Default)]
pub struct MockBackupSync {
    pub pushed: Mutex<Vec<String>>,
}

#[async_trait]
impl BackupSync for MockBackupSync {
    async fn push_booking(&self, booking: &Booking, _customer: &Customer) -> Result<(), AppError> {
        self.pushed.lock().unwrap().push(booking.booking_code.clone());
        Ok(())
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub email: Arc<MockEmailService>,
    pub backup: Arc<MockBackupSync>,
}

pub fn test_config(db_url: &str) -> Config {
    Config {
        database_url: db_url.to_string(),
        port: 0,
        mail_service_url: "http://localhost".to_string(),
        mail_service_token: "token".to_string(),
        backup_sync_url: None,
        timezone: chrono_tz::UTC,
        booking_code_prefix: "BK".to_string(),
        grid_opening: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        grid_closing: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        grid_interval_min: 30,
        pending_expiry_hours: 48,
        housekeeping_interval_secs: 300,
    }
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        Self::with_booking_repo(|pool| Arc::new(SqliteBookingRepo::new(pool))).await
    }

    /// Same app, with the booking store built by `make_bookings` over the test pool.
    pub async fn with_booking_repo<F>(make_bookings: F) -> Self
    where
        F: FnOnce(Pool<Sqlite>) -> Arc<dyn BookingRepository>,
    {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let email = Arc::new(MockEmailService::default());
        let backup = Arc::new(MockBackupSync::default());

        let repos = Repositories {
            slots: Arc::new(SqliteSlotRepo::new(pool.clone())),
            bookings: make_bookings(pool.clone()),
            counters: Arc::new(SqliteCounterRepo::new(pool.clone())),
            customers: Arc::new(SqliteCustomerRepo::new(pool.clone())),
        };

        let state = Arc::new(AppState::assemble(
            test_config(&db_url),
            repos,
            email.clone(),
            backup.clone(),
            load_templates(),
        ));

        let router = create_router(state.clone());

        Self { router, pool, db_filename, state, email, backup }
    }

    pub async fn request(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    /// Creates available slots and returns their ids in `times` order.
    pub async fn seed_slots(&self, provider_id: &str, date: &str, times: &[&str]) -> Vec<String> {
        let (status, body) = self.request(
            "POST",
            &format!("/api/v1/providers/{}/slots", provider_id),
            Some(json!({ "dates": [date], "times": times })),
        ).await;
        assert_eq!(status, StatusCode::CREATED, "slot seeding failed: {}", body);

        let created = body["created"].as_array().unwrap();
        times.iter()
            .map(|t| {
                created.iter()
                    .find(|s| s["time"].as_str().unwrap().starts_with(t))
                    .unwrap_or_else(|| panic!("slot {} not created", t))["id"]
                    .as_str().unwrap().to_string()
            })
            .collect()
    }

    pub async fn register_customer(&self, name: &str, phone: &str, email: Option<&str>) -> String {
        let (status, body) = self.request(
            "POST",
            "/api/v1/customers",
            Some(json!({ "name": name, "phone": phone, "email": email })),
        ).await;
        assert_eq!(status, StatusCode::OK, "customer registration failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    pub async fn book(&self, customer_id: &str, slot_ids: &[String], total: i64, deposit: i64) -> (StatusCode, Value) {
        self.request("POST", "/api/v1/bookings", Some(json!({
            "customer_id": customer_id,
            "provider_id": PROVIDER,
            "slot_ids": slot_ids,
            "service": { "type": "Lash Extensions", "location": "Studio", "client_type": "NEW" },
            "total": total,
            "deposit_required": deposit,
        }))).await
    }

    pub async fn slot_status(&self, slot_id: &str) -> String {
        let (status, body) = self.request("GET", &format!("/api/v1/slots/{}", slot_id), None).await;
        assert_eq!(status, StatusCode::OK);
        body["status"].as_str().unwrap().to_string()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}
