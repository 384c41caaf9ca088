use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

// JWT Claims — identity only. Roles are re-read from the donors
// collection on every moderation call, never trusted from the token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // donor email
    pub email: String,
    pub name: Option<String>,
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
    pub aud: String,
    pub iss: String,
}

fn get_jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or_else(|_| "default-secret-change-me".to_string())
}

fn get_jwt_issuer() -> String {
    std::env::var("JWT_ISSUER").unwrap_or_else(|_| "bloodheros-service".to_string())
}

fn get_jwt_audience() -> String {
    std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "bloodheros-api".to_string())
}

/// Issue a token for the given donor identity. Used by tooling and tests;
/// in production the frontend obtains tokens from the identity provider
/// configured with the same secret.
pub fn issue_token(email: &str, name: Option<&str>) -> Result<String, String> {
    let iat = Utc::now().timestamp() as usize;
    let exp = (Utc::now() + Duration::hours(24)).timestamp() as usize;

    let claims = Claims {
        sub: email.to_string(),
        email: email.to_string(),
        name: name.map(|s| s.to_string()),
        iat,
        exp,
        jti: Uuid::new_v4().to_string(),
        aud: get_jwt_audience(),
        iss: get_jwt_issuer(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(get_jwt_secret().as_ref()),
    )
    .map_err(|e| format!("Failed to generate token: {}", e))
}

/// Verify a bearer token and return its claims.
pub fn verify_token(token: &str) -> Result<Claims, String> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[get_jwt_audience()]);

    let mut issuers = HashSet::new();
    issuers.insert(get_jwt_issuer());
    validation.iss = Some(issuers);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(get_jwt_secret().as_ref()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| format!("Invalid token: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let token = issue_token("donor@example.com", Some("Test Donor")).unwrap();
        let claims = verify_token(&token).unwrap();

        assert_eq!(claims.sub, "donor@example.com");
        assert_eq!(claims.email, "donor@example.com");
        assert_eq!(claims.name.as_deref(), Some("Test Donor"));
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(verify_token("not-a-jwt").is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let foreign = encode(
            &Header::default(),
            &Claims {
                sub: "x@example.com".into(),
                email: "x@example.com".into(),
                name: None,
                iat: Utc::now().timestamp() as usize,
                exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
                jti: Uuid::new_v4().to_string(),
                aud: get_jwt_audience(),
                iss: get_jwt_issuer(),
            },
            &EncodingKey::from_secret(b"some-other-secret"),
        )
        .unwrap();

        assert!(verify_token(&foreign).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let expired = encode(
            &Header::default(),
            &Claims {
                sub: "x@example.com".into(),
                email: "x@example.com".into(),
                name: None,
                iat: (Utc::now() - Duration::hours(2)).timestamp() as usize,
                exp: (Utc::now() - Duration::hours(1)).timestamp() as usize,
                jti: Uuid::new_v4().to_string(),
                aud: get_jwt_audience(),
                iss: get_jwt_issuer(),
            },
            &EncodingKey::from_secret(get_jwt_secret().as_ref()),
        )
        .unwrap();

        assert!(verify_token(&expired).is_err());
    }
}
