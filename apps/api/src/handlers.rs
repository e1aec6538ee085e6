use std::collections::BTreeSet;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde_json::Value;
use turnstile_core::{AppError, AppResult};
use turnstile_domain::{EntityKind, validate_required_fields};

pub mod access_points;
pub mod groups;
pub mod health;
pub mod permissions;
pub mod roles;
pub mod users;


fn parse_id<T>(value: &str) -> AppResult<T>
where
    T: FromStr<Err = AppError>,
{
    T::from_str(value)
}

fn parse_id_set<T>(values: &[String]) -> AppResult<BTreeSet<T>>
where
    T: FromStr<Err = AppError> + Ord,
{
    values.iter().map(|value| parse_id(value.as_str())).collect()
}

/// Checks mandatory fields on the raw body before deserializing it.
fn create_payload<T: DeserializeOwned>(kind: EntityKind, payload: Value) -> AppResult<T> {
    validate_required_fields(kind, &payload)?;
    serde_json::from_value(payload).map_err(|error| {
        AppError::Validation(format!("invalid {} payload: {error}", kind.as_str()))
    })
}
