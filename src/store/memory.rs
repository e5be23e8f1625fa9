use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{EmployeeStore, StoreError, StoreResult};
use crate::models::employee::{Employee, EmployeeChanges, NewEmployeeRecord};

/// Process-local store with the same unique constraints as the `employees` table.
///
/// Constraint checks and writes happen under one write lock, so concurrent
/// writers observe the same rejections a database would produce.
#[derive(Default)]
pub struct InMemoryEmployeeStore {
    employees: RwLock<Vec<Employee>>,
}

impl InMemoryEmployeeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_unique(
    employees: &[Employee],
    identification_number: &str,
    email: &str,
    except: Option<Uuid>,
) -> StoreResult<()> {
    for other in employees.iter().filter(|e| Some(e.id) != except) {
        if other.identification_number == identification_number {
            return Err(StoreError::ConstraintViolation { field: "identification_number" });
        }
        if other.email == email {
            return Err(StoreError::ConstraintViolation { field: "email" });
        }
    }
    Ok(())
}

#[async_trait]
impl EmployeeStore for InMemoryEmployeeStore {
    async fn list_all(&self) -> StoreResult<Vec<Employee>> {
        Ok(self.employees.read().await.clone())
    }

    async fn create(&self, record: NewEmployeeRecord) -> StoreResult<Employee> {
        let mut employees = self.employees.write().await;
        check_unique(&employees, &record.identification_number, &record.email, None)?;

        let now = Utc::now();
        let employee = Employee {
            id: Uuid::new_v4(),
            first_name: record.first_name,
            last_name: record.last_name,
            second_last_name: record.second_last_name,
            other_names: record.other_names,
            country: record.country,
            identification_type: record.identification_type,
            identification_number: record.identification_number,
            email: record.email,
            entry_date: record.entry_date,
            area: record.area,
            created_at: now,
            updated_at: now,
        };
        employees.push(employee.clone());
        Ok(employee)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Employee> {
        self.employees
            .read()
            .await
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn update(&self, id: Uuid, changes: EmployeeChanges) -> StoreResult<Employee> {
        let mut employees = self.employees.write().await;
        let index = employees
            .iter()
            .position(|e| e.id == id)
            .ok_or(StoreError::NotFound(id))?;

        let mut updated = employees[index].clone();
        changes.apply_to(&mut updated);
        check_unique(&employees, &updated.identification_number, &updated.email, Some(id))?;

        updated.updated_at = Utc::now();
        employees[index] = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let mut employees = self.employees.write().await;
        let index = employees
            .iter()
            .position(|e| e.id == id)
            .ok_or(StoreError::NotFound(id))?;
        employees.remove(index);
        Ok(())
    }

    async fn exists_with_email(&self, email: &str, except: Option<Uuid>) -> StoreResult<bool> {
        Ok(self
            .employees
            .read()
            .await
            .iter()
            .any(|e| e.email == email && Some(e.id) != except))
    }

    async fn exists_with_identification_number(
        &self,
        number: &str,
        except: Option<Uuid>,
    ) -> StoreResult<bool> {
        Ok(self
            .employees
            .read()
            .await
            .iter()
            .any(|e| e.identification_number == number && Some(e.id) != except))
    }
}
