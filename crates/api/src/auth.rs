//! Bearer token verification.
//!
//! Tokens are issued by the login service; this side only checks the
//! signature, expiry and (optionally) issuer, and reads the subject.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use rollcall_common::{AppError, AppResult, config::AuthConfig};
use serde::{Deserialize, Serialize};

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User directory id of the principal.
    pub sub: String,
    /// Expiry as seconds since the UNIX epoch.
    pub exp: u64,
    /// Issuer, checked only when configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// HS256 token verifier.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Create a verifier from the auth configuration.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        Self {
            key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Verify `token` and return its subject.
    pub fn verify(&self, token: &str) -> AppResult<String> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims.sub)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected bearer token");
                AppError::Unauthorized
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn config(issuer: Option<&str>) -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".to_string(),
            issuer: issuer.map(str::to_string),
        }
    }

    fn token(secret: &str, iss: Option<&str>, exp_offset: i64) -> String {
        let exp = u64::try_from(chrono::Utc::now().timestamp() + exp_offset).unwrap();
        let claims = Claims {
            sub: "u1".to_string(),
            exp,
            iss: iss.map(str::to_string),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_verify_valid_token() {
        let verifier = TokenVerifier::new(&config(None));
        assert_eq!(verifier.verify(&token("test-secret", None, 3600)).unwrap(), "u1");
    }

    #[test]
    fn test_reject_wrong_secret_and_expired() {
        let verifier = TokenVerifier::new(&config(None));
        assert!(matches!(
            verifier.verify(&token("other", None, 3600)),
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            verifier.verify(&token("test-secret", None, -3600)),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_issuer_checked_when_configured() {
        let verifier = TokenVerifier::new(&config(Some("rollcall-auth")));
        assert!(verifier.verify(&token("test-secret", Some("rollcall-auth"), 3600)).is_ok());
        assert!(verifier.verify(&token("test-secret", Some("elsewhere"), 3600)).is_err());
    }
}
