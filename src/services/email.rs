//! Corporate email derivation.
//!
//! An address is built as `{first}.{last}@{domain}` from the lower-cased names
//! with every whitespace character removed. Collisions are resolved by a
//! linear probe that appends `.1`, `.2`, ... to the local part.

use uuid::Uuid;

use crate::models::employee::Country;
use crate::store::{EmployeeStore, StoreResult};

pub const MAX_EMAIL_LENGTH: usize = 300;

fn compact_lowercase(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Builds the candidate address before any uniqueness check.
///
/// The whole composed string is cut at [`MAX_EMAIL_LENGTH`] characters, which
/// can cut into the domain for absurdly long names.
pub fn candidate_email(first_name: &str, last_name: &str, country: Country) -> String {
    let email = format!(
        "{}.{}@{}",
        compact_lowercase(first_name),
        compact_lowercase(last_name),
        country.email_domain()
    );
    email.chars().take(MAX_EMAIL_LENGTH).collect()
}

/// Address for the `counter`-th collision of `candidate`.
pub fn with_suffix(candidate: &str, counter: u32) -> String {
    match candidate.split_once('@') {
        Some((local, domain)) => format!("{}.{}@{}", local, counter, domain),
        None => format!("{}.{}", candidate, counter),
    }
}

/// Probes the store until an unused address is found.
///
/// `owner` is the employee being updated, whose current email never counts as
/// a collision.
pub async fn resolve_unique_email(
    store: &dyn EmployeeStore,
    candidate: &str,
    owner: Option<Uuid>,
) -> StoreResult<String> {
    let mut email = candidate.to_string();
    let mut counter = 1;

    while store.exists_with_email(&email, owner).await? {
        email = with_suffix(candidate, counter);
        counter += 1;
    }

    if counter > 1 {
        log::debug!("Resolved email collision for {} after {} probes", candidate, counter - 1);
    }
    Ok(email)
}

pub async fn derive_email(
    store: &dyn EmployeeStore,
    first_name: &str,
    last_name: &str,
    country: Country,
    owner: Option<Uuid>,
) -> StoreResult<String> {
    let candidate = candidate_email(first_name, last_name, country);
    resolve_unique_email(store, &candidate, owner).await
}
