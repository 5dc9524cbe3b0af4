//! Token Verifier: a pure function from bearer string to
//! `TokenPayload` or a typed failure. Holds a shared secret and no other
//! state; never consults an external store.

use courier_common::types::TokenPayload;
use courier_common::CourierError;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// `algorithm` is the configured string (e.g. `"HS256"`); only HMAC
    /// algorithms are supported, matching `auth.algorithm` in configuration.
    pub fn new(secret: &str, algorithm: &str, leeway_seconds: u64) -> anyhow::Result<Self> {
        let algorithm = match algorithm {
            "HS256" => Algorithm::HS256,
            "HS384" => Algorithm::HS384,
            "HS512" => Algorithm::HS512,
            other => anyhow::bail!("unsupported auth.algorithm: {other}"),
        };
        let mut validation = Validation::new(algorithm);
        validation.leeway = leeway_seconds;
        validation.validate_exp = true;

        Ok(Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Verifies the signature and expiry of `token`, returning the decoded
    /// subject claims. Expiration is checked strictly
    /// against wall-clock time, with `leeway_seconds` of tolerance.
    pub fn verify(&self, token: &str) -> Result<TokenPayload, CourierError> {
        decode::<TokenPayload>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| CourierError::Authentication(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token_for(user_id: &str, secret: &str, exp_offset_secs: i64) -> String {
        let now = Utc::now().timestamp();
        let claims = TokenPayload {
            user_id: user_id.to_string(),
            wallet_address: None,
            exp: now + exp_offset_secs,
            iat: now,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn verify_accepts_well_signed_unexpired_token() {
        let verifier = TokenVerifier::new("shared-secret", "HS256", 0).unwrap();
        let token = token_for("u1", "shared-secret", 3600);
        let payload = verifier.verify(&token).unwrap();
        assert_eq!(payload.user_id, "u1");
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let verifier = TokenVerifier::new("shared-secret", "HS256", 0).unwrap();
        let token = token_for("u1", "wrong-secret", 3600);
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_expired_token() {
        let verifier = TokenVerifier::new("shared-secret", "HS256", 0).unwrap();
        let token = token_for("u1", "shared-secret", -10);
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn verify_applies_configured_leeway() {
        let verifier = TokenVerifier::new("shared-secret", "HS256", 30).unwrap();
        let token = token_for("u1", "shared-secret", -10);
        assert!(verifier.verify(&token).is_ok());
    }
}
