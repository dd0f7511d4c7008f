use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use super::{IdentityError, TokenClaims};

/// Decodes bearer tokens into [`TokenClaims`].
///
/// With a shared secret the token must carry a valid HS256 signature and an
/// unexpired `exp`. Without one, the signature and expiry are not checked:
/// the API Gateway authorizer in front of the function has already verified
/// the token.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: Option<&str>, issuer: Option<&str>) -> Self {
        let (key, mut validation) = match secret {
            Some(secret) => (
                DecodingKey::from_secret(secret.as_bytes()),
                Validation::new(Algorithm::HS256),
            ),
            None => {
                let mut validation = Validation::new(Algorithm::RS256);
                validation.insecure_disable_signature_validation();
                validation.validate_exp = false;
                validation.required_spec_claims.clear();
                (DecodingKey::from_secret(b"unverified"), validation)
            }
        };
        validation.validate_aud = false;
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }

        Self { key, validation }
    }

    /// Decodes `token`, with or without its `Bearer ` prefix.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, IdentityError> {
        let token = token.strip_prefix("Bearer ").unwrap_or(token).trim();
        let data = decode::<TokenClaims>(token, &self.key, &self.validation)?;
        Ok(data.claims)
    }
}
