use anyhow::{anyhow, Result};
use backend_domain::TokenClaims;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

pub const GUEST_SUBJECT: &str = "guest";

/// Issues and verifies HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expire_minutes: u64,
}

impl TokenService {
    pub fn new(secret: &str, expire_minutes: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expire_minutes,
        }
    }

    pub fn issue(&self, subject: &str, is_admin: bool) -> Result<String> {
        let now = chrono::Utc::now();
        let exp = i64::try_from(self.expire_minutes)
            .ok()
            .and_then(chrono::Duration::try_minutes)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| anyhow!("token lifetime of {} minutes is out of range", self.expire_minutes))?;

        let claims = TokenClaims {
            sub: subject.to_string(),
            is_admin,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(Into::into)
    }

    /// Returns the claims of a valid, unexpired token.
    pub fn verify(&self, token: &str) -> Result<TokenClaims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies() {
        let service = TokenService::new("secret", 60);
        let token = service.issue("admin", true).expect("issue");
        let claims = service.verify(&token).expect("verify");
        assert_eq!(claims.sub, "admin");
        assert!(claims.is_admin);
        let lifetime = claims.exp - claims.iat;
        assert_eq!(lifetime, 3600);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = TokenService::new("secret1", 60)
            .issue(GUEST_SUBJECT, false)
            .expect("issue");
        assert!(TokenService::new("secret2", 60).verify(&token).is_err());
    }

    #[test]
    fn oversized_lifetime_is_an_error() {
        let err = TokenService::new("secret", u64::MAX)
            .issue("admin", true)
            .expect_err("out of range");
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(TokenService::new("secret", 60).verify("not-a-token").is_err());
    }
}
