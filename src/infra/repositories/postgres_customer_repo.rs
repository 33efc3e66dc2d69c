use crate::domain::{models::customer::{Customer, CustomerDetails, CustomerStats}, ports::CustomerRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresCustomerRepo {
    pool: PgPool,
}

impl PostgresCustomerRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerRepository for PostgresCustomerRepo {
    /// Phone number identifies a customer; a repeat visit refreshes name and email.
    async fn find_or_create(&self, details: &CustomerDetails) -> Result<Customer, AppError> {
        let fresh = Customer::new(details.clone());
        sqlx::query_as::<_, Customer>(
            "INSERT INTO customers (id, name, phone, email, client_type, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (phone) DO UPDATE SET name = excluded.name, email = COALESCE(excluded.email, customers.email)
             RETURNING *"
        )
            .bind(&fresh.id).bind(&fresh.name).bind(&fresh.phone).bind(&fresh.email)
            .bind(fresh.stats.client_type.as_str()).bind(fresh.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Customer>, AppError> {
        sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn update_stats(&self, id: &str, stats: &CustomerStats) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE customers SET total_bookings=$1, completed_bookings=$2, total_spent=$3, total_tips=$4, total_discounts=$5, last_visit=$6, client_type=$7
             WHERE id=$8"
        )
            .bind(stats.total_bookings).bind(stats.completed_bookings).bind(stats.total_spent)
            .bind(stats.total_tips).bind(stats.total_discounts).bind(stats.last_visit).bind(stats.client_type.as_str())
            .bind(id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 { return Err(AppError::CustomerNotFound(id.to_string())); }
        Ok(())
    }
}
