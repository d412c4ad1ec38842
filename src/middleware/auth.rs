use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, decode_header, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::error::ApiError;

/// The bearer of a well-formed `Authorization` header.
///
/// The token is only checked for shape unless a [`TokenPolicy`] with a
/// secret is installed, in which case its HS256 signature and expiry are
/// verified as well.
#[derive(Debug, Clone)]
pub struct Caller {
    pub subject: Option<String>,
}

/// Extension type to carry the token policy through request extensions.
#[derive(Debug, Clone, Default)]
pub struct TokenPolicy {
    pub jwt_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: Option<String>,
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| ApiError::Unauthorized("En-tête Authorization manquant".into()))?
            .to_str()
            .map_err(|_| ApiError::InvalidToken("En-tête Authorization illisible".into()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::InvalidToken("Format attendu: Bearer <token>".into()))?;

        let secret = parts
            .extensions
            .get::<TokenPolicy>()
            .and_then(|p| p.jwt_secret.clone());

        verify_token(token, secret.as_deref())
            .map_err(|e| ApiError::InvalidToken(format!("Token invalide: {e}")))
    }
}

pub fn verify_token(token: &str, secret: Option<&str>) -> Result<Caller, jsonwebtoken::errors::Error> {
    if token.split('.').count() != 3 {
        return Err(ErrorKind::InvalidToken.into());
    }

    match secret {
        Some(secret) => {
            let key = DecodingKey::from_secret(secret.as_bytes());
            let mut validation = Validation::new(Algorithm::HS256);
            validation.validate_exp = true;
            let data = decode::<Claims>(token, &key, &validation)?;
            Ok(Caller {
                subject: data.claims.sub,
            })
        }
        None => {
            decode_header(token)?;
            Ok(Caller { subject: None })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestClaims {
        sub: String,
        exp: usize,
    }

    fn signed(secret: &str, exp: usize) -> String {
        encode(
            &Header::default(),
            &TestClaims { sub: "artisan-1".into(), exp },
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn shape_only_without_secret() {
        let token = signed("whatever", 1);
        assert!(verify_token(&token, None).is_ok());
        assert!(verify_token("not-a-jwt", None).is_err());
        assert!(verify_token("a.b.c", None).is_err());
    }

    #[test]
    fn verifies_signature_with_secret() {
        let exp = (chrono::Utc::now().timestamp() + 3600) as usize;
        let token = signed("s3cret", exp);

        let caller = verify_token(&token, Some("s3cret")).unwrap();
        assert_eq!(caller.subject.as_deref(), Some("artisan-1"));
        assert!(verify_token(&token, Some("other")).is_err());
    }

    #[test]
    fn rejects_expired_token_with_secret() {
        let token = signed("s3cret", 1);
        assert!(verify_token(&token, Some("s3cret")).is_err());
    }
}
