use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::store::StoreError;

/// Per-field validation messages, keyed by the JSON field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

pub const GENERIC_SERVER_ERROR: &str = "Error interno del servidor";
pub const EMPLOYEE_NOT_FOUND: &str = "Empleado no encontrado";

#[derive(Debug)]
pub enum AppError {
    Validation { message: String, errors: FieldErrors },
    BadRequest(String),
    NotFound(String),
    Conflict { message: String, errors: FieldErrors },
    InternalServerError(String),
    DatabaseError(String),
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a FieldErrors>,
    status: u16,
}

impl AppError {
    pub fn validation(message: &str, errors: FieldErrors) -> Self {
        AppError::Validation { message: message.to_string(), errors }
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            AppError::Validation { errors, .. } | AppError::Conflict { errors, .. } => Some(errors),
            _ => None,
        }
    }

    fn public_message(&self) -> &str {
        match self {
            AppError::Validation { message, .. } => message.as_str(),
            AppError::BadRequest(msg) => msg.as_str(),
            AppError::NotFound(msg) => msg.as_str(),
            AppError::Conflict { message, .. } => message.as_str(),
            AppError::InternalServerError(msg) => msg.as_str(),
            // The detail stays in the logs.
            AppError::DatabaseError(_) => GENERIC_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation { message, errors } => {
                write!(f, "Validation Error: {} ({} fields)", message, errors.len())
            }
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::Conflict { message, .. } => write!(f, "Conflict: {}", message),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::DatabaseError(detail) = self {
            log::error!("Database error: {}", detail);
        }

        let status = self.status_code();
        HttpResponse::build(status).json(ErrorResponse {
            message: self.public_message(),
            errors: self.field_errors(),
            status: status.as_u16(),
        })
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => AppError::NotFound(EMPLOYEE_NOT_FOUND.to_string()),
            StoreError::ConstraintViolation { field } => {
                let mut errors = FieldErrors::new();
                errors.insert(field.to_string(), vec![duplicate_message(field).to_string()]);
                AppError::Conflict {
                    message: "El registro entra en conflicto con un empleado existente".to_string(),
                    errors,
                }
            }
            StoreError::Database(detail) => AppError::DatabaseError(detail),
        }
    }
}

/// Message used whenever a unique field collides with an existing employee.
pub fn duplicate_message(field: &str) -> &'static str {
    match field {
        "identification_number" => "El número de identificación ya ha sido registrado.",
        "email" => "El correo electrónico ya ha sido registrado.",
        _ => "El valor ya ha sido registrado.",
    }
}
