use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use sha2::{Digest, Sha256};
use turnstile_core::AppError;

use crate::error::ApiResult;
use crate::state::AppState;

/// Digest of the bearer token accepted by the API.
#[derive(Clone)]
pub struct ApiCredential {
    digest: Vec<u8>,
}

impl ApiCredential {
    pub fn new(token: &str) -> Self {
        Self {
            digest: Sha256::digest(token.as_bytes()).to_vec(),
        }
    }

    pub fn matches(&self, token: &str) -> bool {
        Sha256::digest(token.as_bytes()).as_slice() == self.digest.as_slice()
    }
}

/// Rejects requests without the configured bearer token and attaches the
/// bound caller identity to accepted ones.
pub async fn require_api_token(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| AppError::Unauthorized("bearer token required".to_owned()))?;

    if !state.credential.matches(token) {
        return Err(AppError::Unauthorized("invalid bearer token".to_owned()).into());
    }

    request.extensions_mut().insert(state.identity.clone());
    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue, header};

    use super::{ApiCredential, bearer_token};

    #[test]
    fn bearer_token_is_extracted_from_authorization_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer secret-token"),
        );
        assert_eq!(bearer_token(&headers), Some("secret-token"));
    }

    #[test]
    fn credential_matches_only_the_configured_token() {
        let credential = ApiCredential::new("secret-token");
        assert!(credential.matches("secret-token"));
        assert!(!credential.matches("secret-token2"));
    }
}
