use actix_web::{web, HttpResponse};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::errors::{AppError, EMPLOYEE_NOT_FOUND};
use crate::models::employee::Employee;
use crate::models::payload::{EmployeeUpdate, NewEmployee};
use crate::services::employee::EmployeeService;

#[derive(Serialize)]
struct CreatedEmployeeResponse {
    employee: Employee,
    status: u16,
}

/// Unknown and malformed ids are both reported as a missing employee.
fn parse_employee_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(EMPLOYEE_NOT_FOUND.to_string()))
}

pub async fn list_employees(
    service: web::Data<EmployeeService>,
) -> Result<HttpResponse, AppError> {
    let employees = service.list().await?;
    Ok(HttpResponse::Ok().json(employees))
}

pub async fn create_employee(
    service: web::Data<EmployeeService>,
    body: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    let new_employee = NewEmployee::from_json(body.into_inner())?;
    let employee = service.create(new_employee).await?;

    Ok(HttpResponse::Created().json(CreatedEmployeeResponse { employee, status: 201 }))
}

pub async fn show_employee(
    service: web::Data<EmployeeService>,
    employee_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let employee_id = parse_employee_id(&employee_id.into_inner())?;
    let employee = service.show(employee_id).await?;
    Ok(HttpResponse::Ok().json(employee))
}

pub async fn update_employee(
    service: web::Data<EmployeeService>,
    employee_id: web::Path<String>,
    body: web::Json<Value>,
) -> Result<HttpResponse, AppError> {
    let employee_id = parse_employee_id(&employee_id.into_inner())?;
    let updates = EmployeeUpdate::from_json(body.into_inner())?;
    let employee = service.update(employee_id, updates).await?;
    Ok(HttpResponse::Ok().json(employee))
}

pub async fn delete_employee(
    service: web::Data<EmployeeService>,
    employee_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let employee_id = parse_employee_id(&employee_id.into_inner())?;
    service.delete(employee_id).await?;
    Ok(HttpResponse::NoContent().finish())
}
