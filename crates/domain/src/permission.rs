use serde::{Deserialize, Serialize};
use turnstile_core::{AppError, AppResult, NonEmptyString};

use crate::PermissionId;

/// Maximum accepted length for permission codes.
pub const PERMISSION_CODE_MAX_LENGTH: usize = 128;

/// Named capability that authorizes calling access points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    id: PermissionId,
    code: NonEmptyString,
    description: String,
}

impl Permission {
    /// Creates a permission after validating its code.
    pub fn new(
        id: PermissionId,
        code: impl AsRef<str>,
        description: impl Into<String>,
    ) -> AppResult<Self> {
        let code = NonEmptyString::trimmed(code).map_err(|_| {
            AppError::Validation("permission code must not be empty".to_owned())
        })?;

        if code.as_str().chars().any(char::is_whitespace) {
            return Err(AppError::Validation(format!(
                "permission code '{code}' must not contain whitespace"
            )));
        }

        if code.as_str().chars().count() > PERMISSION_CODE_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "permission code must not exceed {PERMISSION_CODE_MAX_LENGTH} characters"
            )));
        }

        Ok(Self {
            id,
            code,
            description: description.into().trim().to_owned(),
        })
    }

    /// Returns the permission identifier.
    #[must_use]
    pub fn id(&self) -> PermissionId {
        self.id
    }

    /// Returns the unique, immutable capability code.
    #[must_use]
    pub fn code(&self) -> &str {
        self.code.as_str()
    }

    /// Returns the human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Replaces the description. The code never changes after creation.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into().trim().to_owned();
    }
}
