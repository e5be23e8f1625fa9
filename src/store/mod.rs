//! Persistence boundary for employee records.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::fmt;
use uuid::Uuid;

use crate::models::employee::{Employee, EmployeeChanges, NewEmployeeRecord};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    NotFound(Uuid),
    /// A unique column rejected the write. `field` names the column.
    ConstraintViolation { field: &'static str },
    Database(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "employee not found: {}", id),
            StoreError::ConstraintViolation { field } => {
                write!(f, "unique constraint violated on {}", field)
            }
            StoreError::Database(msg) => write!(f, "database error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

#[async_trait]
pub trait EmployeeStore: Send + Sync {
    /// Every employee, oldest first.
    async fn list_all(&self) -> StoreResult<Vec<Employee>>;

    async fn create(&self, record: NewEmployeeRecord) -> StoreResult<Employee>;

    async fn get(&self, id: Uuid) -> StoreResult<Employee>;

    /// Overwrites only the supplied fields and bumps `updated_at`.
    async fn update(&self, id: Uuid, changes: EmployeeChanges) -> StoreResult<Employee>;

    async fn delete(&self, id: Uuid) -> StoreResult<()>;

    /// Whether an employee other than `except` holds `email`.
    async fn exists_with_email(&self, email: &str, except: Option<Uuid>) -> StoreResult<bool>;

    /// Whether an employee other than `except` holds `number`.
    async fn exists_with_identification_number(
        &self,
        number: &str,
        except: Option<Uuid>,
    ) -> StoreResult<bool>;
}
