// SPDX-FileCopyrightText: 2026 Hotline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer-token check for the `/api/v1` routes.
//!
//! The web form is public by default. When `gateway.bearer_token` is set,
//! every API request must carry `Authorization: Bearer <token>`.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

/// Authentication configuration for the gateway.
#[derive(Clone, Default)]
pub struct AuthConfig {
    /// Expected bearer token. `None` leaves the API open.
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

impl AuthConfig {
    fn accepts(&self, header: Option<&str>) -> bool {
        let Some(expected) = self.bearer_token.as_deref() else {
            return true;
        };
        header
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected)
    }
}

/// Middleware that rejects requests without the configured bearer token.
pub async fn auth_middleware(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let header = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok());

    if auth.accepts(header) {
        Ok(next.run(request).await)
    } else {
        tracing::debug!("gateway request rejected: missing or wrong bearer token");
        Err(StatusCode::UNAUTHORIZED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_without_token() {
        assert!(AuthConfig::default().accepts(None));
    }

    #[test]
    fn token_must_match_exactly() {
        let auth = AuthConfig {
            bearer_token: Some("s3cret".into()),
        };
        assert!(auth.accepts(Some("Bearer s3cret")));
        assert!(!auth.accepts(Some("Bearer s3cret2")));
        assert!(!auth.accepts(Some("bearer s3cret")));
        assert!(!auth.accepts(None));
    }

    #[test]
    fn debug_redacts_token() {
        let auth = AuthConfig {
            bearer_token: Some("s3cret".into()),
        };
        let debug = format!("{auth:?}");
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("[redacted]"));
    }
}
