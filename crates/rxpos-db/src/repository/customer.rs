//! # Customer Repository
//!
//! Known customers, looked up by phone at the counter. Sales keep their own
//! copy of the customer's name and phone, so nothing here is referenced by
//! the ledger.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use rxpos_core::{Customer, NewCustomer};

const CUSTOMER_COLUMNS: &str = "id, name, phone, email, address, created_at";

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Inserts a validated customer.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - phone already registered
    pub async fn insert(&self, input: &NewCustomer) -> DbResult<Customer> {
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: input.name.clone(),
            phone: input.phone.clone(),
            email: input.email.clone(),
            address: input.address.clone(),
            created_at: Utc::now(),
        };

        debug!(id = %customer.id, "Inserting customer");

        sqlx::query(
            "INSERT INTO customers (id, name, phone, email, address, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&customer.address)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &customer.phone),
            other => other,
        })?;

        Ok(customer)
    }

    pub async fn get_by_phone(&self, phone: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE phone = ?1"
        ))
        .bind(phone.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// All customers, by name.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY name COLLATE NOCASE"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    fn customer(name: &str, phone: &str) -> NewCustomer {
        NewCustomer {
            name: name.to_string(),
            phone: phone.to_string(),
            email: None,
            address: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup_by_phone() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        let created = repo.insert(&customer("Siti", "081234567")).await.unwrap();
        let found = repo.get_by_phone("081234567").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(repo.get_by_phone("000000").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_phone_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.customers();

        repo.insert(&customer("Siti", "081234567")).await.unwrap();
        let err = repo.insert(&customer("Budi", "081234567")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "phone"));

        let all = repo.list().await.unwrap();
        assert_eq!(all.len(), 1);
    }
}
