use std::collections::HashSet;

use base64ct::{Base64UrlUnpadded, Encoding};
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::{
    auth::{claims::Claims, error::TokenError},
    config::JwtConfig,
};

const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Signing and verification keys derived from the shared secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: TimeDuration,
    validation: Validation,
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = HMAC_ALGORITHMS.to_vec();
        // exp is checked by hand so that `now == exp` already counts as expired
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            ttl: TimeDuration::hours(cfg.ttl_hours),
            validation,
        }
    }

    pub fn sign(&self, user_id: i64, email: &str, is_admin: bool) -> anyhow::Result<String> {
        self.sign_at(user_id, email, is_admin, OffsetDateTime::now_utc())
    }

    pub(crate) fn sign_at(
        &self,
        user_id: i64,
        email: &str,
        is_admin: bool,
        now: OffsetDateTime,
    ) -> anyhow::Result<String> {
        let exp = now + self.ttl;
        let claims = Claims {
            email: email.to_owned(),
            user_id,
            is_admin,
            exp: exp.unix_timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id, is_admin, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, OffsetDateTime::now_utc().unix_timestamp())
    }

    pub(crate) fn verify_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        if token.is_empty() {
            return Err(TokenError::MalformedToken);
        }

        let header = decode_header(token).map_err(|_| classify_unreadable_header(token))?;
        if !HMAC_ALGORITHMS.contains(&header.alg) {
            return Err(TokenError::InvalidSignature);
        }

        let data = decode::<serde_json::Value>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidAlgorithmName => TokenError::InvalidSignature,
                _ => TokenError::MalformedToken,
            })?;

        let claims: Claims =
            serde_json::from_value(data.claims).map_err(|_| TokenError::MalformedClaims)?;

        if now >= claims.exp {
            return Err(TokenError::Expired);
        }

        debug!(user_id = claims.user_id, is_admin = claims.is_admin, "jwt verified");
        Ok(claims)
    }
}

/// jsonwebtoken refuses headers naming algorithms it does not know (`none`,
/// `HS1`). Such a header is still an algorithm swap, not a parse failure.
fn classify_unreadable_header(token: &str) -> TokenError {
    let alg = token
        .split('.')
        .next()
        .and_then(|segment| Base64UrlUnpadded::decode_vec(segment).ok())
        .and_then(|raw| serde_json::from_slice::<serde_json::Value>(&raw).ok())
        .and_then(|header| header.get("alg")?.as_str().map(str::to_owned));
    match alg {
        Some(alg) if !matches!(alg.as_str(), "HS256" | "HS384" | "HS512") => {
            TokenError::InvalidSignature
        }
        _ => TokenError::MalformedToken,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn make_keys(secret: &str) -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: secret.into(),
            ttl_hours: 8766,
        })
    }

    fn sign_raw(secret: &str, alg: Algorithm, claims: &serde_json::Value) -> String {
        encode(
            &Header::new(alg),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("sign raw")
    }

    fn far_future() -> i64 {
        (OffsetDateTime::now_utc() + TimeDuration::days(1)).unix_timestamp()
    }

    #[test]
    fn sign_and_verify_returns_identity() {
        let keys = make_keys("dev-secret");
        let token = keys.sign(42, "a@b.co", true).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.user_id, 42);
        assert!(claims.is_admin);
        assert_eq!(claims.email, "a@b.co");
    }

    #[test]
    fn expiry_is_ttl_after_issuance() {
        let keys = make_keys("dev-secret");
        let now = OffsetDateTime::now_utc();
        let token = keys.sign_at(1, "a@b.co", false, now).unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.exp, (now + TimeDuration::hours(8766)).unix_timestamp());
    }

    #[test]
    fn accepts_wire_field_names() {
        let keys = make_keys("dev-secret");
        let token = sign_raw(
            "dev-secret",
            Algorithm::HS256,
            &json!({"email": "x@y.io", "userId": 7, "isAdmin": false, "exp": far_future()}),
        );
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.user_id, 7);
        assert!(!claims.is_admin);
    }

    #[test]
    fn expired_token_with_valid_signature_is_rejected() {
        let keys = make_keys("dev-secret");
        let issued = OffsetDateTime::now_utc() - TimeDuration::hours(8767);
        let token = keys.sign_at(1, "a@b.co", false, issued).unwrap();
        assert_eq!(keys.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn token_is_expired_exactly_at_exp() {
        let keys = make_keys("dev-secret");
        let now = OffsetDateTime::now_utc();
        let token = keys.sign_at(1, "a@b.co", false, now).unwrap();
        let exp = (now + TimeDuration::hours(8766)).unix_timestamp();
        assert_eq!(keys.verify_at(&token, exp), Err(TokenError::Expired));
        assert!(keys.verify_at(&token, exp - 1).is_ok());
    }

    #[test]
    fn altered_payload_fails_signature() {
        let keys = make_keys("dev-secret");
        let token = keys.sign(1, "a@b.co", false).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let mut payload: Vec<char> = parts[1].chars().collect();
        let mid = payload.len() / 2;
        payload[mid] = if payload[mid] == 'A' { 'B' } else { 'A' };
        let tampered = format!(
            "{}.{}.{}",
            parts[0],
            payload.into_iter().collect::<String>(),
            parts[2]
        );
        assert_eq!(keys.verify(&tampered), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn wrong_secret_fails_signature() {
        let good = make_keys("good-secret");
        let bad = make_keys("bad-secret");
        let token = good.sign(1, "a@b.co", false).unwrap();
        assert_eq!(bad.verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn other_hmac_variants_are_accepted() {
        let keys = make_keys("dev-secret");
        let claims = json!({"email": "a@b.co", "userId": 3, "isAdmin": false, "exp": far_future()});
        for alg in [Algorithm::HS384, Algorithm::HS512] {
            let token = sign_raw("dev-secret", alg, &claims);
            assert_eq!(keys.verify(&token).unwrap().user_id, 3);
        }
    }

    #[test]
    fn non_hmac_algorithm_is_rejected() {
        let keys = make_keys("dev-secret");
        let token = keys.sign(1, "a@b.co", false).unwrap();
        let rest = token.split_once('.').unwrap().1;
        // {"alg":"RS256","typ":"JWT"}
        let swapped = format!("eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9.{rest}");
        assert_eq!(keys.verify(&swapped), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn alg_none_is_rejected() {
        let keys = make_keys("dev-secret");
        let token = keys.sign(1, "a@b.co", false).unwrap();
        let payload = token.split('.').nth(1).unwrap();
        // {"alg":"none","typ":"JWT"}
        let unsigned = format!("eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.{payload}.");
        assert_eq!(keys.verify(&unsigned), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn unknown_algorithm_name_is_rejected() {
        let keys = make_keys("dev-secret");
        let token = keys.sign(1, "a@b.co", false).unwrap();
        let rest = token.split_once('.').unwrap().1;
        // {"alg":"HS1","typ":"JWT"}
        let swapped = format!("eyJhbGciOiJIUzEiLCJ0eXAiOiJKV1QifQ.{rest}");
        assert_eq!(keys.verify(&swapped), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn header_without_alg_is_malformed() {
        let keys = make_keys("dev-secret");
        let token = keys.sign(1, "a@b.co", false).unwrap();
        let rest = token.split_once('.').unwrap().1;
        // {"typ":"JWT"}
        let headless = format!("eyJ0eXAiOiJKV1QifQ.{rest}");
        assert_eq!(keys.verify(&headless), Err(TokenError::MalformedToken));
    }

    #[test]
    fn garbage_is_malformed() {
        let keys = make_keys("dev-secret");
        for input in ["", "dfvjdsjvdsjvbdsjbvds", "a.b", "a.b.c", "...."] {
            assert_eq!(
                keys.verify(input),
                Err(TokenError::MalformedToken),
                "input {input:?}"
            );
        }
    }

    #[test]
    fn missing_claims_are_reported() {
        let keys = make_keys("dev-secret");
        let token = sign_raw(
            "dev-secret",
            Algorithm::HS256,
            &json!({"email": "a@b.co", "exp": far_future()}),
        );
        assert_eq!(keys.verify(&token), Err(TokenError::MalformedClaims));
    }

    #[test]
    fn mistyped_claims_are_reported() {
        let keys = make_keys("dev-secret");
        let token = sign_raw(
            "dev-secret",
            Algorithm::HS256,
            &json!({"email": "a@b.co", "userId": "1", "isAdmin": "yes", "exp": far_future()}),
        );
        assert_eq!(keys.verify(&token), Err(TokenError::MalformedClaims));
    }
}
