use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use super::AuthError;
use crate::config::Config;
use crate::errors::AppError;

/// Claims carried by an admin session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Verified admin identity, attached to request extensions by the admin middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSubject(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Checks the single configured admin identity and issues/verifies
/// stateless session tokens. There is no revocation list: a token stays
/// valid until its `exp`.
pub struct AdminAuthenticator {
    username: String,
    password: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl AdminAuthenticator {
    pub fn new(config: &Config) -> Self {
        Self {
            username: config.admin_username.clone(),
            password: config.admin_password.clone(),
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            ttl: Duration::hours(config.token_ttl_hours),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Validate credentials and issue a token expiring `ttl` from now.
    pub fn login(&self, username: &str, password: &str) -> Result<IssuedToken, AppError> {
        // Both comparisons always run so timing does not reveal which one failed.
        let user_ok = username.as_bytes().ct_eq(self.username.as_bytes());
        let pass_ok = password.as_bytes().ct_eq(self.password.as_bytes());
        if !bool::from(user_ok & pass_ok) {
            tracing::warn!("admin login rejected");
            return Err(AuthError::InvalidCredentials.into());
        }

        let token = self.issue_at(username, Utc::now())?;
        tracing::info!(subject = %username, "admin session issued");
        Ok(token)
    }

    /// Issue a token as if it had been created at `issued_at`.
    pub fn issue_at(&self, subject: &str, issued_at: DateTime<Utc>) -> Result<IssuedToken, AppError> {
        let expires_at = issued_at + self.ttl;
        let claims = SessionClaims {
            sub: subject.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("token encoding failed: {}", e)))?;
        Ok(IssuedToken {
            access_token,
            expires_at,
        })
    }

    /// Verify signature and expiry; returns the subject.
    pub fn verify(&self, token: &str) -> Result<String, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        match decode::<SessionClaims>(token, &self.decoding_key, &validation) {
            Ok(data) => Ok(data.claims.sub),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(AuthError::ExpiredToken),
                _ => {
                    tracing::debug!("token rejected: {}", e);
                    Err(AuthError::InvalidToken)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticator() -> AdminAuthenticator {
        AdminAuthenticator::new(&Config::for_testing("admin", "s3cret", "unit-test-secret"))
    }

    #[test]
    fn test_login_then_verify_returns_subject() {
        let auth = authenticator();
        let issued = auth.login("admin", "s3cret").unwrap();
        assert_eq!(auth.verify(&issued.access_token).unwrap(), "admin");
    }

    #[test]
    fn test_login_rejects_wrong_password() {
        let auth = authenticator();
        let err = auth.login("admin", "wrong").unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::InvalidCredentials)));
    }

    #[test]
    fn test_login_rejects_wrong_username() {
        let auth = authenticator();
        let err = auth.login("root", "s3cret").unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::InvalidCredentials)));
    }

    #[test]
    fn test_login_rejects_password_prefix() {
        let auth = authenticator();
        assert!(auth.login("admin", "s3cre").is_err());
        assert!(auth.login("admin", "").is_err());
    }

    #[test]
    fn test_expiry_is_ttl_after_issue() {
        let auth = authenticator();
        let now = Utc::now();
        let issued = auth.issue_at("admin", now).unwrap();
        assert_eq!(issued.expires_at - now, Duration::hours(8));
    }

    #[test]
    fn test_token_past_window_is_expired() {
        let auth = authenticator();
        let issued_at = Utc::now() - auth.ttl() - Duration::minutes(1);
        let issued = auth.issue_at("admin", issued_at).unwrap();
        assert_eq!(auth.verify(&issued.access_token), Err(AuthError::ExpiredToken));
    }

    #[test]
    fn test_token_inside_window_is_valid() {
        let auth = authenticator();
        let issued_at = Utc::now() - auth.ttl() + Duration::minutes(5);
        let issued = auth.issue_at("admin", issued_at).unwrap();
        assert_eq!(auth.verify(&issued.access_token).unwrap(), "admin");
    }

    #[test]
    fn test_token_signed_with_other_secret_is_invalid() {
        let other = AdminAuthenticator::new(&Config::for_testing("admin", "s3cret", "another-secret"));
        let issued = other.login("admin", "s3cret").unwrap();
        assert_eq!(authenticator().verify(&issued.access_token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_garbage_token_is_invalid() {
        assert_eq!(authenticator().verify("not.a.jwt"), Err(AuthError::InvalidToken));
        assert_eq!(authenticator().verify(""), Err(AuthError::InvalidToken));
    }
}
