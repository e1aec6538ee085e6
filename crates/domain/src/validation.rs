//! Validation of human-entered identifiers and create payloads.
//!
//! Every check here is pure and runs before a store call, so a rejected
//! payload never reaches persistence.

use serde_json::Value;
use turnstile_core::{AppError, AppResult};

/// Maximum accepted length for group and role names.
pub const NAME_MAX_LENGTH: usize = 100;

/// Validates a permission group name.
///
/// Accepts ASCII letters, whitespace, hyphens and underscores only. A name
/// made entirely of whitespace counts as empty.
pub fn validate_group_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation(
            "group name must not be empty".to_owned(),
        ));
    }

    if name.chars().count() > NAME_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "group name must not exceed {NAME_MAX_LENGTH} characters"
        )));
    }

    if let Some(invalid) = name.chars().find(|character| !is_group_name_char(*character)) {
        return Err(AppError::Validation(format!(
            "group name '{name}' contains '{invalid}'; only letters, spaces, hyphens and underscores are allowed"
        )));
    }

    Ok(())
}

fn is_group_name_char(character: char) -> bool {
    character.is_ascii_alphabetic() || character.is_whitespace() || matches!(character, '-' | '_')
}

/// Catalog entity kinds with create payload requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Permission rows.
    Permission,
    /// Access point rows.
    AccessPoint,
    /// Permission group rows.
    PermissionGroup,
    /// Role rows.
    Role,
}

impl EntityKind {
    /// Returns the camelCase payload fields that must be present and non-blank.
    #[must_use]
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Permission => &["code"],
            Self::AccessPoint => &["endpointPath", "httpMethod", "module"],
            Self::PermissionGroup => &["name"],
            Self::Role => &["name"],
        }
    }

    /// Returns a stable label used in messages.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Permission => "permission",
            Self::AccessPoint => "access point",
            Self::PermissionGroup => "permission group",
            Self::Role => "role",
        }
    }
}

/// Checks that every mandatory field of `kind` is present in `payload`.
///
/// Strings must be non-blank; `null` counts as missing. All missing fields
/// are reported in one message.
pub fn validate_required_fields(kind: EntityKind, payload: &Value) -> AppResult<()> {
    let Some(object) = payload.as_object() else {
        return Err(AppError::Validation(format!(
            "{} payload must be a JSON object",
            kind.as_str()
        )));
    };

    let missing = kind
        .required_fields()
        .iter()
        .copied()
        .filter(|field| match object.get(*field) {
            None | Some(Value::Null) => true,
            Some(Value::String(value)) => value.trim().is_empty(),
            Some(_) => false,
        })
        .collect::<Vec<_>>();

    if missing.is_empty() {
        return Ok(());
    }

    Err(AppError::Validation(format!(
        "{} is missing required field(s): {}",
        kind.as_str(),
        missing.join(", ")
    )))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use turnstile_core::AppError;

    use super::{EntityKind, validate_group_name, validate_required_fields};

    #[test]
    fn group_name_with_digit_is_rejected() {
        assert!(validate_group_name("Eng1neering").is_err());
    }

    #[test]
    fn group_name_with_ampersand_is_rejected() {
        assert!(validate_group_name("R&D").is_err());
    }

    #[test]
    fn group_name_with_spaces_and_hyphen_is_accepted() {
        assert!(validate_group_name("Engineering - R and D").is_ok());
        assert!(validate_group_name("finance_ops").is_ok());
    }

    #[test]
    fn blank_group_name_is_rejected() {
        assert!(validate_group_name("").is_err());
        assert!(validate_group_name("   ").is_err());
    }

    #[test]
    fn access_point_payload_reports_every_missing_field() {
        let result = validate_required_fields(
            EntityKind::AccessPoint,
            &json!({ "endpointPath": "/api/users", "module": "  " }),
        );

        let Err(AppError::Validation(message)) = result else {
            panic!("expected validation error");
        };
        assert!(message.contains("httpMethod"));
        assert!(message.contains("module"));
        assert!(!message.contains("endpointPath"));
    }

    #[test]
    fn permission_payload_with_null_code_is_rejected() {
        let result = validate_required_fields(EntityKind::Permission, &json!({ "code": null }));
        assert!(result.is_err());
    }

    #[test]
    fn complete_permission_payload_is_accepted() {
        let result = validate_required_fields(
            EntityKind::Permission,
            &json!({ "code": "USER_READ", "description": "Read users" }),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn non_object_payload_is_rejected() {
        assert!(validate_required_fields(EntityKind::Role, &json!(["name"])).is_err());
    }
}
