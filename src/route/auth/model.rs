pub use crate::model::User;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::model::validate_username;

/// Emails are compared case-insensitively, so they are stored lowercased.
fn normalize_email<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	let email = String::deserialize(deserializer)?;

	Ok(email.trim().to_lowercase())
}

#[derive(Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct LoginInput {
	#[validate(email)]
	#[serde(deserialize_with = "normalize_email")]
	pub email: String,
	#[validate(length(min = 8, max = 128))]
	pub password: String,
}

#[derive(Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RegisterInput {
	#[validate(email)]
	#[serde(deserialize_with = "normalize_email")]
	pub email: String,
	#[validate(length(min = 8, max = 128))]
	pub password: String,
	/// The username that is displayed to the public.
	#[validate(length(min = 3, max = 16), custom(function = "validate_username"))]
	pub username: String,
}

/// Returned after registering or logging in.
#[derive(Serialize)]
pub struct AuthSession {
	/// The bearer token to send in the `Authorization` header.
	pub token: String,
	pub expires_at: DateTime<Utc>,
	pub user: User,
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_email_is_normalized() {
		let input: LoginInput = serde_json::from_str(
			r#"{ "email": "  Jane.Doe@Example.COM ", "password": "hunter2hunter" }"#,
		)
		.unwrap();

		assert_eq!(input.email, "jane.doe@example.com");
		assert!(input.validate().is_ok());
	}
}
