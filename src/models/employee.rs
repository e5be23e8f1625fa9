use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Country {
    #[serde(rename = "Colombia")]
    Colombia,
    #[serde(rename = "United States", alias = "Estados Unidos")]
    UnitedStates,
}

#[derive(Debug, PartialEq, Eq)]
pub struct UnknownCountry(pub String);

impl fmt::Display for UnknownCountry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown country: {}", self.0)
    }
}

impl std::error::Error for UnknownCountry {}

impl Country {
    pub fn as_str(&self) -> &'static str {
        match self {
            Country::Colombia => "Colombia",
            Country::UnitedStates => "United States",
        }
    }

    pub fn email_domain(&self) -> &'static str {
        match self {
            Country::Colombia => "global.com.co",
            Country::UnitedStates => "global.com.us",
        }
    }
}

impl FromStr for Country {
    type Err = UnknownCountry;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Colombia" => Ok(Country::Colombia),
            "United States" | "Estados Unidos" => Ok(Country::UnitedStates),
            other => Err(UnknownCountry(other.to_string())),
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Employee {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub second_last_name: String,
    pub other_names: String,
    pub country: Country,
    pub identification_type: String,
    pub identification_number: String,
    pub email: String,
    pub entry_date: NaiveDate,
    pub area: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated employee ready to be written by a store.
#[derive(Clone, Debug)]
pub struct NewEmployeeRecord {
    pub first_name: String,
    pub last_name: String,
    pub second_last_name: String,
    pub other_names: String,
    pub country: Country,
    pub identification_type: String,
    pub identification_number: String,
    pub email: String,
    pub entry_date: NaiveDate,
    pub area: String,
}

/// Fields to overwrite on an existing employee. `None` leaves the column untouched.
#[derive(Clone, Debug, Default)]
pub struct EmployeeChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub second_last_name: Option<String>,
    pub other_names: Option<String>,
    pub country: Option<Country>,
    pub identification_type: Option<String>,
    pub identification_number: Option<String>,
    pub email: Option<String>,
    pub entry_date: Option<NaiveDate>,
    pub area: Option<String>,
}

impl EmployeeChanges {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.second_last_name.is_none()
            && self.other_names.is_none()
            && self.country.is_none()
            && self.identification_type.is_none()
            && self.identification_number.is_none()
            && self.email.is_none()
            && self.entry_date.is_none()
            && self.area.is_none()
    }

    pub fn apply_to(self, employee: &mut Employee) {
        if let Some(v) = self.first_name { employee.first_name = v; }
        if let Some(v) = self.last_name { employee.last_name = v; }
        if let Some(v) = self.second_last_name { employee.second_last_name = v; }
        if let Some(v) = self.other_names { employee.other_names = v; }
        if let Some(v) = self.country { employee.country = v; }
        if let Some(v) = self.identification_type { employee.identification_type = v; }
        if let Some(v) = self.identification_number { employee.identification_number = v; }
        if let Some(v) = self.email { employee.email = v; }
        if let Some(v) = self.entry_date { employee.entry_date = v; }
        if let Some(v) = self.area { employee.area = v; }
    }
}
