use crate::domain::{models::customer::{Customer, CustomerDetails, CustomerStats}, ports::CustomerRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteCustomerRepo {
    pool: SqlitePool,
}

impl SqliteCustomerRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerRepository for SqliteCustomerRepo {
    /// Phone number identifies a customer; a repeat visit refreshes name and email.
    async fn find_or_create(&self, details: &CustomerDetails) -> Result<Customer, AppError> {
        let fresh = Customer::new(details.clone());
        sqlx::query_as::<_, Customer>(
            "INSERT INTO customers (id, name, phone, email, client_type, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT (phone) DO UPDATE SET name = excluded.name, email = COALESCE(excluded.email, customers.email)
             RETURNING *"
        )
            .bind(&fresh.id).bind(&fresh.name).bind(&fresh.phone).bind(&fresh.email)
            .bind(fresh.stats.client_type.as_str()).bind(fresh.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Customer>, AppError> {
        sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = ?").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn update_stats(&self, id: &str, stats: &CustomerStats) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE customers SET total_bookings=?, completed_bookings=?, total_spent=?, total_tips=?, total_discounts=?, last_visit=?, client_type=?
             WHERE id=?"
        )
            .bind(stats.total_bookings).bind(stats.completed_bookings).bind(stats.total_spent)
            .bind(stats.total_tips).bind(stats.total_discounts).bind(stats.last_visit).bind(stats.client_type.as_str())
            .bind(id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 { return Err(AppError::CustomerNotFound(id.to_string())); }
        Ok(())
    }
}
