use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use validator::Validate;

use crate::errors::{AppError, FieldErrors};
use crate::models::employee::{EmployeeChanges, NewEmployeeRecord};
use crate::utils::validation::{
    add_field_error, normalize_field, parse_entry_date, validate_country, validate_entry_date,
    validate_payload,
};

pub const BODY_NOT_OBJECT: &str = "El cuerpo de la petición debe ser un objeto JSON";

/// Every body field is text; anything else is reported with these messages.
const STRING_FIELDS: [(&str, &str); 10] = [
    ("first_name", "El nombre debe ser una cadena de texto."),
    ("last_name", "El apellido debe ser una cadena de texto."),
    ("second_last_name", "El segundo apellido debe ser una cadena de texto."),
    ("other_names", "Los otros nombres deben ser una cadena de texto."),
    ("country", "El país debe ser una cadena de texto."),
    ("identification_type", "El tipo de identificación debe ser una cadena de texto."),
    ("identification_number", "El número de identificación debe ser una cadena de texto."),
    ("email", "El correo electrónico debe ser una cadena de texto."),
    ("entry_date", "La fecha de ingreso debe ser una cadena de texto."),
    ("area", "El área debe ser una cadena de texto."),
];

/// Removes fields holding a non-string JSON value and reports them, so the
/// rest of the body still reaches the typed validators.
fn split_body(body: Value) -> Result<(Map<String, Value>, FieldErrors), AppError> {
    let mut fields = match body {
        Value::Object(fields) => fields,
        _ => return Err(AppError::BadRequest(BODY_NOT_OBJECT.to_string())),
    };

    let mut rejected = FieldErrors::new();
    for (field, message) in STRING_FIELDS {
        if matches!(fields.get(field), Some(value) if !value.is_string() && !value.is_null()) {
            fields.remove(field);
            add_field_error(&mut rejected, field, message);
        }
    }
    Ok((fields, rejected))
}

fn from_fields<T: DeserializeOwned>(fields: Map<String, Value>) -> Result<T, AppError> {
    serde_json::from_value(Value::Object(fields)).map_err(|err| {
        log::debug!("Rejected request body: {}", err);
        AppError::BadRequest(BODY_NOT_OBJECT.to_string())
    })
}

#[derive(Deserialize, Validate, Debug, Default, Clone)]
pub struct NewEmployee {
    #[validate(
        required(message = "El nombre es obligatorio."),
        regex(path = "crate::utils::validation::NAME_PATTERN", message = "El nombre no debe contener minúsculas ni acentos"),
        length(max = 20, message = "El nombre no puede tener más de 20 caracteres.")
    )]
    pub first_name: Option<String>,
    #[validate(
        required(message = "El apellido es obligatorio."),
        regex(path = "crate::utils::validation::NAME_PATTERN", message = "El apellido no debe contener minúsculas ni acentos"),
        length(max = 20, message = "El apellido no puede tener más de 20 caracteres.")
    )]
    pub last_name: Option<String>,
    #[validate(
        required(message = "El segundo apellido es obligatorio."),
        regex(path = "crate::utils::validation::NAME_PATTERN", message = "El segundo apellido no debe contener minúsculas ni acentos"),
        length(max = 20, message = "El segundo apellido no puede tener más de 20 caracteres.")
    )]
    pub second_last_name: Option<String>,
    #[validate(
        required(message = "Los otros nombres son obligatorios."),
        regex(path = "crate::utils::validation::NAME_PATTERN", message = "Los otros nombres no deben contener minúsculas ni acentos"),
        length(max = 50, message = "Los otros nombres no pueden tener más de 50 caracteres.")
    )]
    pub other_names: Option<String>,
    #[validate(required(message = "El país es obligatorio."), custom = "validate_country")]
    pub country: Option<String>,
    #[validate(required(message = "El tipo de identificación es obligatorio."))]
    pub identification_type: Option<String>,
    #[validate(
        required(message = "El número de identificación es obligatorio."),
        length(max = 20, message = "El número de identificación no puede tener más de 20 caracteres.")
    )]
    pub identification_number: Option<String>,
    #[validate(
        email(message = "El correo electrónico no es válido."),
        length(max = 300, message = "El correo electrónico no puede tener más de 300 caracteres.")
    )]
    pub email: Option<String>,
    #[validate(required(message = "La fecha de ingreso es obligatoria."), custom = "validate_entry_date")]
    pub entry_date: Option<String>,
    #[validate(required(message = "El área es obligatoria."))]
    pub area: Option<String>,
    /// Fields dropped from the body because they were not strings.
    #[serde(skip)]
    pub rejected: FieldErrors,
}

impl NewEmployee {
    pub fn from_json(body: Value) -> Result<Self, AppError> {
        let (fields, rejected) = split_body(body)?;
        let payload: NewEmployee = from_fields(fields)?;
        Ok(NewEmployee { rejected, ..payload })
    }

    /// Validator messages, with a type error replacing whatever else its field reported.
    pub fn field_errors(&self) -> FieldErrors {
        let mut errors = validate_payload(self);
        errors.extend(self.rejected.clone());
        errors
    }

    /// Trims every field and treats blank input as missing.
    pub fn normalized(self) -> Self {
        NewEmployee {
            first_name: normalize_field(self.first_name, true),
            last_name: normalize_field(self.last_name, true),
            second_last_name: normalize_field(self.second_last_name, true),
            other_names: normalize_field(self.other_names, true),
            country: normalize_field(self.country, true),
            identification_type: normalize_field(self.identification_type, true),
            identification_number: normalize_field(self.identification_number, true),
            email: normalize_field(self.email, true),
            entry_date: normalize_field(self.entry_date, true),
            area: normalize_field(self.area, true),
            rejected: self.rejected,
        }
    }

    /// Converts a validated payload into a store record. The email is left as
    /// supplied (or empty) for the caller to fill in.
    pub fn into_record(self) -> Option<NewEmployeeRecord> {
        Some(NewEmployeeRecord {
            first_name: self.first_name?,
            last_name: self.last_name?,
            second_last_name: self.second_last_name?,
            other_names: self.other_names?,
            country: self.country?.parse().ok()?,
            identification_type: self.identification_type?,
            identification_number: self.identification_number?,
            email: self.email.unwrap_or_default(),
            entry_date: parse_entry_date(&self.entry_date?)?,
            area: self.area?,
        })
    }
}

/// Partial update body. Absent and `null` fields are left unchanged, but a
/// `first_name` or `last_name` key still triggers email regeneration when its
/// value is `null`.
#[derive(Deserialize, Validate, Debug, Default, Clone)]
pub struct EmployeeUpdate {
    #[validate(
        regex(path = "crate::utils::validation::NAME_PATTERN", message = "El nombre no debe contener minúsculas ni acentos"),
        length(max = 20, message = "El nombre no puede tener más de 20 caracteres.")
    )]
    pub first_name: Option<String>,
    #[validate(
        regex(path = "crate::utils::validation::NAME_PATTERN", message = "El apellido no debe contener minúsculas ni acentos"),
        length(max = 20, message = "El apellido no puede tener más de 20 caracteres.")
    )]
    pub last_name: Option<String>,
    #[validate(
        regex(path = "crate::utils::validation::NAME_PATTERN", message = "El segundo apellido no debe contener minúsculas ni acentos"),
        length(max = 20, message = "El segundo apellido no puede tener más de 20 caracteres.")
    )]
    pub second_last_name: Option<String>,
    #[validate(
        regex(path = "crate::utils::validation::NAME_PATTERN", message = "Los otros nombres no deben contener minúsculas ni acentos"),
        length(max = 50, message = "Los otros nombres no pueden tener más de 50 caracteres.")
    )]
    pub other_names: Option<String>,
    #[validate(custom = "validate_country")]
    pub country: Option<String>,
    #[validate(length(min = 1, message = "El tipo de identificación es obligatorio."))]
    pub identification_type: Option<String>,
    #[validate(length(
        min = 1,
        max = 20,
        message = "El número de identificación debe tener entre 1 y 20 caracteres."
    ))]
    pub identification_number: Option<String>,
    #[validate(
        email(message = "El correo electrónico no es válido."),
        length(max = 300, message = "El correo electrónico no puede tener más de 300 caracteres.")
    )]
    pub email: Option<String>,
    #[validate(custom = "validate_entry_date")]
    pub entry_date: Option<String>,
    #[validate(length(min = 1, message = "El área es obligatoria."))]
    pub area: Option<String>,
    #[serde(skip)]
    pub rejected: FieldErrors,
    /// Set when the body carried a `first_name` or `last_name` key, whatever its value.
    #[serde(skip)]
    pub name_key_sent: bool,
}

impl EmployeeUpdate {
    pub fn from_json(body: Value) -> Result<Self, AppError> {
        let (fields, rejected) = split_body(body)?;
        let name_key_sent = fields.contains_key("first_name") || fields.contains_key("last_name");
        let payload: EmployeeUpdate = from_fields(fields)?;
        Ok(EmployeeUpdate { rejected, name_key_sent, ..payload })
    }

    pub fn field_errors(&self) -> FieldErrors {
        let mut errors = validate_payload(self);
        errors.extend(self.rejected.clone());
        errors
    }

    /// Trims every supplied field. Blank values stay present so they fail validation.
    pub fn normalized(self) -> Self {
        EmployeeUpdate {
            first_name: normalize_field(self.first_name, false),
            last_name: normalize_field(self.last_name, false),
            second_last_name: normalize_field(self.second_last_name, false),
            other_names: normalize_field(self.other_names, false),
            country: normalize_field(self.country, false),
            identification_type: normalize_field(self.identification_type, false),
            identification_number: normalize_field(self.identification_number, false),
            email: normalize_field(self.email, false),
            entry_date: normalize_field(self.entry_date, false),
            area: normalize_field(self.area, false),
            rejected: self.rejected,
            name_key_sent: self.name_key_sent,
        }
    }

    pub fn touches_name(&self) -> bool {
        self.name_key_sent || self.first_name.is_some() || self.last_name.is_some()
    }

    pub fn into_changes(self) -> EmployeeChanges {
        EmployeeChanges {
            first_name: self.first_name,
            last_name: self.last_name,
            second_last_name: self.second_last_name,
            other_names: self.other_names,
            country: self.country.and_then(|c| c.parse().ok()),
            identification_type: self.identification_type,
            identification_number: self.identification_number,
            email: self.email,
            entry_date: self.entry_date.as_deref().and_then(parse_entry_date),
            area: self.area,
        }
    }
}
