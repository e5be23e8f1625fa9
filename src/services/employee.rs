use std::sync::Arc;

use log::{error, info, warn};
use uuid::Uuid;

use crate::errors::{duplicate_message, AppError, FieldErrors};
use crate::models::employee::Employee;
use crate::models::payload::{EmployeeUpdate, NewEmployee};
use crate::services::email::derive_email;
use crate::store::{EmployeeStore, StoreError};
use crate::utils::validation::{add_field_error, into_result};

/// Writes attempted when a derived email loses a race to a concurrent writer.
pub const MAX_WRITE_ATTEMPTS: usize = 3;

pub const CREATE_FAILED: &str = "Error al registrar el empleado";
pub const UPDATE_FAILED: &str = "Error al actualizar el empleado";

#[derive(Clone)]
pub struct EmployeeService {
    store: Arc<dyn EmployeeStore>,
}

impl EmployeeService {
    pub fn new(store: Arc<dyn EmployeeStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Employee>, AppError> {
        Ok(self.store.list_all().await?)
    }

    pub async fn show(&self, id: Uuid) -> Result<Employee, AppError> {
        Ok(self.store.get(id).await?)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.store.delete(id).await?;
        info!("Deleted employee {}", id);
        Ok(())
    }

    /// Checks the unique columns the payload supplies against other employees.
    async fn check_unique_fields(
        &self,
        errors: &mut FieldErrors,
        identification_number: Option<&str>,
        email: Option<&str>,
        owner: Option<Uuid>,
    ) -> Result<(), AppError> {
        if let Some(number) = identification_number {
            if self.store.exists_with_identification_number(number, owner).await? {
                add_field_error(errors, "identification_number", duplicate_message("identification_number"));
            }
        }
        if let Some(email) = email {
            if self.store.exists_with_email(email, owner).await? {
                add_field_error(errors, "email", duplicate_message("email"));
            }
        }
        Ok(())
    }

    pub async fn create(&self, payload: NewEmployee) -> Result<Employee, AppError> {
        let payload = payload.normalized();

        let mut errors = payload.field_errors();
        self.check_unique_fields(
            &mut errors,
            payload.identification_number.as_deref(),
            payload.email.as_deref(),
            None,
        )
        .await?;
        into_result(CREATE_FAILED, errors)?;

        let derive = payload.email.is_none();
        let mut record = payload
            .into_record()
            .ok_or_else(|| AppError::InternalServerError(CREATE_FAILED.to_string()))?;

        let mut attempt = 1;
        loop {
            if derive {
                record.email = derive_email(
                    self.store.as_ref(),
                    &record.first_name,
                    &record.last_name,
                    record.country,
                    None,
                )
                .await?;
            }

            match self.store.create(record.clone()).await {
                Ok(employee) => {
                    info!("Created employee {} with email {}", employee.id, employee.email);
                    return Ok(employee);
                }
                Err(StoreError::ConstraintViolation { field: "email" })
                    if derive && attempt < MAX_WRITE_ATTEMPTS =>
                {
                    warn!(
                        "Derived email {} was taken before insert (attempt {}), retrying",
                        record.email, attempt
                    );
                    attempt += 1;
                }
                Err(StoreError::Database(detail)) => {
                    error!("Failed to insert employee: {}", detail);
                    return Err(AppError::InternalServerError(CREATE_FAILED.to_string()));
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Applies the supplied fields. When `first_name` or `last_name` is present
    /// the email is rebuilt from the merged names, even if they did not change.
    pub async fn update(&self, id: Uuid, payload: EmployeeUpdate) -> Result<Employee, AppError> {
        let current = self.store.get(id).await?;
        let payload = payload.normalized();
        let regenerate = payload.touches_name();

        // A regenerated email replaces the supplied one, which then needs no uniqueness check.
        let supplied_email = if regenerate { None } else { payload.email.as_deref() };
        let mut errors = payload.field_errors();
        self.check_unique_fields(
            &mut errors,
            payload.identification_number.as_deref(),
            supplied_email,
            Some(id),
        )
        .await?;
        into_result(UPDATE_FAILED, errors)?;

        let mut changes = payload.into_changes();

        let mut attempt = 1;
        loop {
            if regenerate {
                let email = derive_email(
                    self.store.as_ref(),
                    changes.first_name.as_deref().unwrap_or(&current.first_name),
                    changes.last_name.as_deref().unwrap_or(&current.last_name),
                    changes.country.unwrap_or(current.country),
                    Some(id),
                )
                .await?;
                changes.email = Some(email);
            }

            match self.store.update(id, changes.clone()).await {
                Ok(employee) => {
                    info!("Updated employee {}", employee.id);
                    return Ok(employee);
                }
                Err(StoreError::ConstraintViolation { field: "email" })
                    if regenerate && attempt < MAX_WRITE_ATTEMPTS =>
                {
                    warn!("Regenerated email for {} was taken before update, retrying", id);
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::employee::{Country, EmployeeChanges, NewEmployeeRecord};
    use crate::store::memory::InMemoryEmployeeStore;
    use crate::store::StoreResult;
    use actix_web::ResponseError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Reports every email as free for the first `stale_probes` checks, which is
    /// what a probe sees when another writer commits between probe and insert.
    struct StaleProbeStore {
        inner: InMemoryEmployeeStore,
        stale_probes: AtomicUsize,
    }

    #[async_trait]
    impl EmployeeStore for StaleProbeStore {
        async fn list_all(&self) -> StoreResult<Vec<Employee>> {
            self.inner.list_all().await
        }
        async fn create(&self, record: NewEmployeeRecord) -> StoreResult<Employee> {
            self.inner.create(record).await
        }
        async fn get(&self, id: Uuid) -> StoreResult<Employee> {
            self.inner.get(id).await
        }
        async fn update(&self, id: Uuid, changes: EmployeeChanges) -> StoreResult<Employee> {
            self.inner.update(id, changes).await
        }
        async fn delete(&self, id: Uuid) -> StoreResult<()> {
            self.inner.delete(id).await
        }
        async fn exists_with_email(&self, email: &str, except: Option<Uuid>) -> StoreResult<bool> {
            if self.stale_probes.load(Ordering::SeqCst) > 0 {
                self.stale_probes.fetch_sub(1, Ordering::SeqCst);
                return Ok(false);
            }
            self.inner.exists_with_email(email, except).await
        }
        async fn exists_with_identification_number(
            &self,
            number: &str,
            except: Option<Uuid>,
        ) -> StoreResult<bool> {
            self.inner.exists_with_identification_number(number, except).await
        }
    }

    fn payload(first: &str, last: &str, number: &str) -> NewEmployee {
        NewEmployee {
            first_name: Some(first.into()),
            last_name: Some(last.into()),
            second_last_name: Some("GOMEZ".into()),
            other_names: Some("CARLOS".into()),
            country: Some("Colombia".into()),
            identification_type: Some("CC".into()),
            identification_number: Some(number.into()),
            email: None,
            entry_date: Some("2024-01-15".into()),
            area: Some("Ventas".into()),
            ..Default::default()
        }
    }

    fn memory_service() -> EmployeeService {
        EmployeeService::new(Arc::new(InMemoryEmployeeStore::new()))
    }

    #[tokio::test]
    async fn create_derives_and_suffixes_emails() {
        let service = memory_service();

        let first = service.create(payload("JUAN", "PEREZ", "1")).await.unwrap();
        let second = service.create(payload("JUAN", "PEREZ", "2")).await.unwrap();
        let third = service.create(payload("JUAN", "PEREZ", "3")).await.unwrap();

        assert_eq!(first.email, "juan.perez@global.com.co");
        assert_eq!(second.email, "juan.perez.1@global.com.co");
        assert_eq!(third.email, "juan.perez.2@global.com.co");
    }

    #[tokio::test]
    async fn supplied_email_is_kept() {
        let service = memory_service();
        let mut body = payload("JUAN", "PEREZ", "1");
        body.email = Some("jp@example.com".into());

        let employee = service.create(body).await.unwrap();
        assert_eq!(employee.email, "jp@example.com");
    }

    #[tokio::test]
    async fn duplicate_supplied_email_is_a_validation_error() {
        let service = memory_service();
        service.create(payload("JUAN", "PEREZ", "1")).await.unwrap();

        let mut body = payload("ANA", "RUIZ", "2");
        body.email = Some("juan.perez@global.com.co".into());
        let err = service.create(body).await.unwrap_err();

        assert_eq!(err.status_code().as_u16(), 400);
        assert!(err.field_errors().unwrap().contains_key("email"));
    }

    #[tokio::test]
    async fn duplicate_identification_number_is_reported_on_the_field() {
        let service = memory_service();
        service.create(payload("JUAN", "PEREZ", "1")).await.unwrap();

        let err = service.create(payload("ANA", "RUIZ", "1")).await.unwrap_err();
        assert_eq!(err.status_code().as_u16(), 400);
        assert_eq!(
            err.field_errors().unwrap()["identification_number"],
            vec![duplicate_message("identification_number").to_string()]
        );
    }

    #[tokio::test]
    async fn lost_probe_race_is_retried_with_the_next_suffix() {
        let store = Arc::new(StaleProbeStore {
            inner: InMemoryEmployeeStore::new(),
            stale_probes: AtomicUsize::new(0),
        });
        let service = EmployeeService::new(store.clone());
        service.create(payload("JUAN", "PEREZ", "1")).await.unwrap();

        store.stale_probes.store(1, Ordering::SeqCst);
        let second = service.create(payload("JUAN", "PEREZ", "2")).await.unwrap();
        assert_eq!(second.email, "juan.perez.1@global.com.co");
    }

    #[tokio::test]
    async fn exhausted_retries_surface_as_conflict() {
        let store = Arc::new(StaleProbeStore {
            inner: InMemoryEmployeeStore::new(),
            stale_probes: AtomicUsize::new(0),
        });
        let service = EmployeeService::new(store.clone());
        service.create(payload("JUAN", "PEREZ", "1")).await.unwrap();

        store.stale_probes.store(usize::MAX, Ordering::SeqCst);
        let err = service.create(payload("JUAN", "PEREZ", "2")).await.unwrap_err();
        assert_eq!(err.status_code().as_u16(), 409);
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_creates_with_the_same_name_get_distinct_emails() {
        let service = memory_service();

        let (a, b) = tokio::join!(
            service.create(payload("JUAN", "PEREZ", "1")),
            service.create(payload("JUAN", "PEREZ", "2")),
        );
        let mut emails = vec![a.unwrap().email, b.unwrap().email];
        emails.sort();

        assert_eq!(emails, vec!["juan.perez.1@global.com.co", "juan.perez@global.com.co"]);
    }

    #[tokio::test]
    async fn update_regenerates_email_from_merged_names() {
        let service = memory_service();
        let juan = service.create(payload("JUAN", "PEREZ", "1")).await.unwrap();

        let update = EmployeeUpdate { first_name: Some("PEDRO".into()), ..Default::default() };
        let updated = service.update(juan.id, update).await.unwrap();

        assert_eq!(updated.first_name, "PEDRO");
        assert_eq!(updated.last_name, "PEREZ");
        assert_eq!(updated.email, "pedro.perez@global.com.co");
    }

    #[tokio::test]
    async fn update_with_unchanged_name_keeps_its_own_email() {
        let service = memory_service();
        let juan = service.create(payload("JUAN", "PEREZ", "1")).await.unwrap();

        let update = EmployeeUpdate { last_name: Some("PEREZ".into()), ..Default::default() };
        let updated = service.update(juan.id, update).await.unwrap();
        assert_eq!(updated.email, "juan.perez@global.com.co");
    }

    #[tokio::test]
    async fn update_country_alone_does_not_touch_email() {
        let service = memory_service();
        let juan = service.create(payload("JUAN", "PEREZ", "1")).await.unwrap();

        let update = EmployeeUpdate { country: Some("United States".into()), ..Default::default() };
        let updated = service.update(juan.id, update).await.unwrap();
        assert_eq!(updated.country, Country::UnitedStates);
        assert_eq!(updated.email, "juan.perez@global.com.co");
    }

    #[tokio::test]
    async fn null_name_key_regenerates_a_custom_email() {
        let service = memory_service();
        let mut body = payload("JUAN", "PEREZ", "1");
        body.email = Some("jp@example.com".into());
        let juan = service.create(body).await.unwrap();

        let update = EmployeeUpdate::from_json(serde_json::json!({ "first_name": null })).unwrap();
        assert!(update.touches_name());
        let updated = service.update(juan.id, update).await.unwrap();

        assert_eq!(updated.first_name, "JUAN");
        assert_eq!(updated.email, "juan.perez@global.com.co");
    }

    #[tokio::test]
    async fn supplied_email_is_not_checked_when_it_will_be_regenerated() {
        let service = memory_service();
        let juan = service.create(payload("JUAN", "PEREZ", "1")).await.unwrap();
        let ana = service.create(payload("ANA", "RUIZ", "2")).await.unwrap();

        let update = EmployeeUpdate {
            first_name: Some("PEDRO".into()),
            email: Some(juan.email.clone()),
            ..Default::default()
        };
        let updated = service.update(ana.id, update).await.unwrap();
        assert_eq!(updated.email, "pedro.ruiz@global.com.co");
    }

    #[tokio::test]
    async fn non_string_fields_are_reported_per_field() {
        let service = memory_service();
        let body = serde_json::json!({
            "first_name": "JUAN",
            "last_name": "PEREZ",
            "second_last_name": "GOMEZ",
            "other_names": "CARLOS",
            "country": "Colombia",
            "identification_type": "CC",
            "identification_number": 1020304050,
            "entry_date": "2024-01-15",
            "area": ["Ventas"]
        });

        let err = service.create(NewEmployee::from_json(body).unwrap()).await.unwrap_err();
        assert_eq!(err.status_code().as_u16(), 400);
        let errors = err.field_errors().unwrap();
        assert_eq!(
            errors["identification_number"],
            vec!["El número de identificación debe ser una cadena de texto.".to_string()]
        );
        assert_eq!(errors["area"], vec!["El área debe ser una cadena de texto.".to_string()]);
        assert!(!errors.contains_key("first_name"));
    }

    #[tokio::test]
    async fn update_rejects_malformed_fields() {
        let service = memory_service();
        let juan = service.create(payload("JUAN", "PEREZ", "1")).await.unwrap();

        let update = EmployeeUpdate { first_name: Some("pedro".into()), ..Default::default() };
        let err = service.update(juan.id, update).await.unwrap_err();
        assert_eq!(err.status_code().as_u16(), 400);
        assert_eq!(service.show(juan.id).await.unwrap(), juan);
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let service = memory_service();
        let id = Uuid::new_v4();

        assert_eq!(service.show(id).await.unwrap_err().status_code().as_u16(), 404);
        assert_eq!(service.delete(id).await.unwrap_err().status_code().as_u16(), 404);
        assert_eq!(
            service.update(id, EmployeeUpdate::default()).await.unwrap_err().status_code().as_u16(),
            404
        );
    }
}
