use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{EmployeeStore, StoreError, StoreResult};
use crate::models::employee::{Employee, EmployeeChanges, NewEmployeeRecord};

const EMPLOYEE_COLUMNS: &str = "id, first_name, last_name, second_last_name, other_names, \
     country, identification_type, identification_number, email, entry_date, area, \
     created_at, updated_at";

#[derive(sqlx::FromRow, Debug)]
struct EmployeeRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    second_last_name: String,
    other_names: String,
    country: String,
    identification_type: String,
    identification_number: String,
    email: String,
    entry_date: NaiveDate,
    area: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = StoreError;

    fn try_from(row: EmployeeRow) -> Result<Self, Self::Error> {
        let country = row
            .country
            .parse()
            .map_err(|err| StoreError::Database(format!("row {}: {}", row.id, err)))?;

        Ok(Employee {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            second_last_name: row.second_last_name,
            other_names: row.other_names,
            country,
            identification_type: row.identification_type,
            identification_number: row.identification_number,
            email: row.email,
            entry_date: row.entry_date,
            area: row.area,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Unique constraints declared by the `employees` migration, with the field each guards.
const UNIQUE_CONSTRAINTS: [(&str, &str); 2] = [
    ("employees_email_key", "email"),
    ("employees_identification_number_key", "identification_number"),
];

fn field_for_constraint(constraint: &str) -> Option<&'static str> {
    UNIQUE_CONSTRAINTS
        .iter()
        .find(|(name, _)| *name == constraint)
        .map(|(_, field)| *field)
}

fn map_db_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            if let Some(field) = db_err.constraint().and_then(field_for_constraint) {
                return StoreError::ConstraintViolation { field };
            }
        }
    }
    StoreError::Database(err.to_string())
}

pub struct PgEmployeeStore {
    pool: PgPool,
}

impl PgEmployeeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeStore for PgEmployeeStore {
    async fn list_all(&self) -> StoreResult<Vec<Employee>> {
        let sql = format!("SELECT {} FROM employees ORDER BY created_at ASC, id ASC", EMPLOYEE_COLUMNS);
        let rows = sqlx::query_as::<_, EmployeeRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        rows.into_iter().map(Employee::try_from).collect()
    }

    async fn create(&self, record: NewEmployeeRecord) -> StoreResult<Employee> {
        let sql = format!(
            "INSERT INTO employees (id, first_name, last_name, second_last_name, other_names, \
             country, identification_type, identification_number, email, entry_date, area, \
             created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12) \
             RETURNING {}",
            EMPLOYEE_COLUMNS
        );

        let row = sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&record.first_name)
            .bind(&record.last_name)
            .bind(&record.second_last_name)
            .bind(&record.other_names)
            .bind(record.country.as_str())
            .bind(&record.identification_type)
            .bind(&record.identification_number)
            .bind(&record.email)
            .bind(record.entry_date)
            .bind(&record.area)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        Employee::try_from(row)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Employee> {
        let sql = format!("SELECT {} FROM employees WHERE id = $1", EMPLOYEE_COLUMNS);
        let row = sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?
            .ok_or(StoreError::NotFound(id))?;

        Employee::try_from(row)
    }

    async fn update(&self, id: Uuid, changes: EmployeeChanges) -> StoreResult<Employee> {
        let mut query: QueryBuilder<'_, Postgres> = QueryBuilder::new("UPDATE employees SET ");
        {
            let mut separated = query.separated(", ");
            if let Some(v) = changes.first_name {
                separated.push("first_name = ").push_bind_unseparated(v);
            }
            if let Some(v) = changes.last_name {
                separated.push("last_name = ").push_bind_unseparated(v);
            }
            if let Some(v) = changes.second_last_name {
                separated.push("second_last_name = ").push_bind_unseparated(v);
            }
            if let Some(v) = changes.other_names {
                separated.push("other_names = ").push_bind_unseparated(v);
            }
            if let Some(v) = changes.country {
                separated.push("country = ").push_bind_unseparated(v.as_str());
            }
            if let Some(v) = changes.identification_type {
                separated.push("identification_type = ").push_bind_unseparated(v);
            }
            if let Some(v) = changes.identification_number {
                separated.push("identification_number = ").push_bind_unseparated(v);
            }
            if let Some(v) = changes.email {
                separated.push("email = ").push_bind_unseparated(v);
            }
            if let Some(v) = changes.entry_date {
                separated.push("entry_date = ").push_bind_unseparated(v);
            }
            if let Some(v) = changes.area {
                separated.push("area = ").push_bind_unseparated(v);
            }
            separated.push("updated_at = ").push_bind_unseparated(Utc::now());
        }
        query.push(" WHERE id = ");
        query.push_bind(id);
        query.push(" RETURNING ");
        query.push(EMPLOYEE_COLUMNS);

        let row = query
            .build_query_as::<EmployeeRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?
            .ok_or(StoreError::NotFound(id))?;

        Employee::try_from(row)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM employees WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn exists_with_email(&self, email: &str, except: Option<Uuid>) -> StoreResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM employees WHERE email = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(except)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }

    async fn exists_with_identification_number(
        &self,
        number: &str,
        except: Option<Uuid>,
    ) -> StoreResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM employees WHERE identification_number = $1 AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(number)
        .bind(except)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)
    }
}
