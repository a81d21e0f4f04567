//! Signed, expiring bearer tokens.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("token expired")]
	Expired,
	#[error("invalid token")]
	Invalid,
	#[error("could not sign token: {0}")]
	Sign(jsonwebtoken::errors::Error),
	#[error("token expiry is out of range")]
	OutOfRange,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
	/// The user the token was issued to.
	pub sub: Uuid,
	pub iat: i64,
	pub exp: i64,
}

/// A freshly issued token.
#[derive(Debug, Serialize)]
pub struct Token {
	pub token: String,
	pub expires_at: DateTime<Utc>,
}

struct Keys {
	encoding: EncodingKey,
	decoding: DecodingKey,
	validation: Validation,
	ttl: Duration,
}

/// Issues and verifies HS256 tokens. Cheap to clone.
#[derive(Clone)]
pub struct Tokens(Arc<Keys>);

impl Tokens {
	pub fn new(secret: &[u8], ttl: Duration) -> Self {
		let mut validation = Validation::default();
		validation.leeway = 0;

		Self(Arc::new(Keys {
			encoding: EncodingKey::from_secret(secret),
			decoding: DecodingKey::from_secret(secret),
			validation,
			ttl,
		}))
	}

	/// Issues a token for `user` that expires after the configured lifetime.
	pub fn issue(&self, user: Uuid) -> Result<Token, Error> {
		let now = Utc::now();
		let expires_at = now.checked_add_signed(self.0.ttl).ok_or(Error::OutOfRange)?;

		let claims = Claims {
			sub: user,
			iat: now.timestamp(),
			exp: expires_at.timestamp(),
		};

		let token = self.sign(&claims)?;

		Ok(Token { token, expires_at })
	}

	fn sign(&self, claims: &Claims) -> Result<String, Error> {
		jsonwebtoken::encode(&Header::default(), claims, &self.0.encoding).map_err(Error::Sign)
	}

	/// Returns the user id embedded in a valid, unexpired token.
	pub fn verify(&self, token: &str) -> Result<Uuid, Error> {
		let data = jsonwebtoken::decode::<Claims>(token, &self.0.decoding, &self.0.validation)
			.map_err(|e| match e.kind() {
				ErrorKind::ExpiredSignature => Error::Expired,
				_ => Error::Invalid,
			})?;

		Ok(data.claims.sub)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

	#[test]
	fn test_issue_then_verify() {
		let tokens = Tokens::new(SECRET, Duration::hours(1));
		let user = Uuid::new_v4();

		let token = tokens.issue(user).unwrap();

		assert!(token.expires_at > Utc::now());
		assert_eq!(tokens.verify(&token.token).unwrap(), user);
	}

	#[test]
	fn test_expired_token() {
		let tokens = Tokens::new(SECRET, Duration::hours(1));
		let past = Utc::now() - Duration::hours(2);

		let token = tokens
			.sign(&Claims {
				sub: Uuid::new_v4(),
				iat: past.timestamp(),
				exp: (past + Duration::minutes(5)).timestamp(),
			})
			.unwrap();

		assert!(matches!(tokens.verify(&token), Err(Error::Expired)));
	}

	#[test]
	fn test_wrong_secret() {
		let issuer = Tokens::new(SECRET, Duration::hours(1));
		let verifier = Tokens::new(b"another-secret-another-secret-xx", Duration::hours(1));

		let token = issuer.issue(Uuid::new_v4()).unwrap();

		assert!(matches!(verifier.verify(&token.token), Err(Error::Invalid)));
	}

	#[test]
	fn test_unrepresentable_expiry() {
		let tokens = Tokens::new(SECRET, Duration::days(365 * 1_000_000));

		assert!(matches!(tokens.issue(Uuid::new_v4()), Err(Error::OutOfRange)));
	}

	#[test]
	fn test_garbage() {
		let tokens = Tokens::new(SECRET, Duration::hours(1));

		assert!(matches!(tokens.verify("not.a.token"), Err(Error::Invalid)));
	}
}
