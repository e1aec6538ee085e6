use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use turnstile_core::{AppError, AppResult, NonEmptyString};

use crate::{AccessPointId, PermissionId};

/// HTTP methods an access point can protect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
    /// `HEAD`
    Head,
    /// `OPTIONS`
    Options,
}

impl HttpMethod {
    /// Returns the canonical upper-case method name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }

    /// Parses a transport value, ignoring case and surrounding whitespace.
    pub fn from_transport(value: &str) -> AppResult<Self> {
        Self::from_str(value)
    }
}

impl Display for HttpMethod {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            _ => Err(AppError::Validation(format!(
                "unknown http method '{value}'"
            ))),
        }
    }
}

/// Protected resource identified by `(endpoint_path, http_method)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPoint {
    id: AccessPointId,
    endpoint_path: NonEmptyString,
    http_method: HttpMethod,
    module: NonEmptyString,
    is_public: bool,
    permission: Option<PermissionId>,
}

impl AccessPoint {
    /// Creates an unmapped access point.
    pub fn new(
        id: AccessPointId,
        endpoint_path: impl AsRef<str>,
        http_method: HttpMethod,
        module: impl AsRef<str>,
        is_public: bool,
    ) -> AppResult<Self> {
        Ok(Self {
            id,
            endpoint_path: validate_endpoint_path(endpoint_path.as_ref())?,
            http_method,
            module: NonEmptyString::trimmed(module).map_err(|_| {
                AppError::Validation("access point module must not be empty".to_owned())
            })?,
            is_public,
            permission: None,
        })
    }

    /// Returns a copy carrying the given permission mapping.
    #[must_use]
    pub fn with_permission(mut self, permission: Option<PermissionId>) -> Self {
        self.permission = permission;
        self
    }

    /// Returns the access point identifier.
    #[must_use]
    pub fn id(&self) -> AccessPointId {
        self.id
    }

    /// Returns the protected endpoint path.
    #[must_use]
    pub fn endpoint_path(&self) -> &str {
        self.endpoint_path.as_str()
    }

    /// Returns the protected HTTP method.
    #[must_use]
    pub fn http_method(&self) -> HttpMethod {
        self.http_method
    }

    /// Returns the owning module label.
    #[must_use]
    pub fn module(&self) -> &str {
        self.module.as_str()
    }

    /// Returns whether the endpoint is reachable without authentication.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.is_public
    }

    /// Returns the mapped permission, if any.
    #[must_use]
    pub fn permission(&self) -> Option<PermissionId> {
        self.permission
    }

    /// Returns whether no permission gates this access point yet.
    #[must_use]
    pub fn is_unmapped(&self) -> bool {
        self.permission.is_none()
    }

    /// Returns the uniqueness key of the access point.
    #[must_use]
    pub fn endpoint_key(&self) -> (&str, HttpMethod) {
        (self.endpoint_path.as_str(), self.http_method)
    }

    /// Maps a permission, replacing any previous mapping.
    ///
    /// Returns the permission that was replaced.
    pub fn assign_permission(&mut self, permission: PermissionId) -> Option<PermissionId> {
        self.permission.replace(permission)
    }

    /// Removes the mapping and returns the previous permission.
    pub fn clear_permission(&mut self) -> Option<PermissionId> {
        self.permission.take()
    }
}

fn validate_endpoint_path(value: &str) -> AppResult<NonEmptyString> {
    let path = NonEmptyString::trimmed(value)
        .map_err(|_| AppError::Validation("endpoint path must not be empty".to_owned()))?;

    if !path.as_str().starts_with('/') {
        return Err(AppError::Validation(format!(
            "endpoint path '{path}' must start with '/'"
        )));
    }

    if path.as_str().chars().any(char::is_whitespace) {
        return Err(AppError::Validation(format!(
            "endpoint path '{path}' must not contain whitespace"
        )));
    }

    Ok(path)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{AccessPoint, HttpMethod};
    use crate::{AccessPointId, PermissionId};

    fn users_endpoint() -> AccessPoint {
        AccessPoint::new(AccessPointId::new(), "/api/users", HttpMethod::Get, "users", false)
            .unwrap_or_else(|error| panic!("valid access point: {error}"))
    }

    #[test]
    fn http_method_parses_case_insensitively() {
        assert_eq!(HttpMethod::from_str(" get "), Ok(HttpMethod::Get));
        assert!(HttpMethod::from_str("FETCH").is_err());
    }

    #[test]
    fn relative_endpoint_path_is_rejected() {
        let result = AccessPoint::new(
            AccessPointId::new(),
            "api/users",
            HttpMethod::Get,
            "users",
            false,
        );
        assert!(result.is_err());
    }

    #[test]
    fn new_access_point_is_unmapped() {
        assert!(users_endpoint().is_unmapped());
    }

    #[test]
    fn assigning_second_permission_replaces_first() {
        let mut access_point = users_endpoint();
        let read = PermissionId::new();
        let write = PermissionId::new();

        assert_eq!(access_point.assign_permission(read), None);
        assert_eq!(access_point.assign_permission(write), Some(read));
        assert_eq!(access_point.permission(), Some(write));
    }
}
