use argon2::{
	password_hash::{self, rand_core::OsRng, SaltString},
	Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use axum::{extract::State, http::StatusCode};

use crate::{
	extract::{Json, Session},
	store::{self, NewUser},
	AppState,
};

use super::{model, Error, RouteError};

/// A well-formed hash with the default parameters that matches no password.
/// Verifying against it when an email is unknown costs as much as a real check.
const DUMMY_HASH: &str =
	"$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8";

/// Hashes a password with Argon2 and a fresh random salt, returning
/// the hash in PHC string format.
fn hash_password(hasher: &Argon2, password: &str) -> Result<String, password_hash::Error> {
	let salt = SaltString::generate(&mut OsRng);

	Ok(hasher.hash_password(password.as_bytes(), &salt)?.to_string())
}

/// Checks a password against a stored PHC string.
fn verify_password(
	hasher: &Argon2,
	password: &str,
	hash: &str,
) -> Result<bool, password_hash::Error> {
	let hash = PasswordHash::new(hash)?;

	match hasher.verify_password(password.as_bytes(), &hash) {
		Ok(()) => Ok(true),
		Err(password_hash::Error::Password) => Ok(false),
		Err(e) => Err(e),
	}
}

fn issue(state: &AppState, user: model::User) -> Result<model::AuthSession, Error> {
	let token = state.tokens.issue(user.id)?;

	Ok(model::AuthSession {
		token: token.token,
		expires_at: token.expires_at,
		user,
	})
}

/// Registers a new account, returning a bearer token for it.
pub async fn register(
	State(state): State<AppState>,
	Json(input): Json<model::RegisterInput>,
) -> Result<(StatusCode, Json<model::AuthSession>), RouteError> {
	let password = hash_password(&state.hasher, &input.password).map_err(Error::Hash)?;

	let user = state
		.database
		.create_user(NewUser {
			username: input.username,
			email: input.email,
			password,
		})
		.await
		.map_err(|e| match e {
			store::Error::UsernameTaken => Error::UsernameTaken.into(),
			store::Error::EmailTaken => Error::EmailTaken.into(),
			e => RouteError::from(e),
		})?;

	tracing::info!(user = %user.id, "registered user");

	Ok((StatusCode::CREATED, Json(issue(&state, user)?)))
}

/// Logs in to an account, returning a bearer token for it.
///
/// An unknown email and a wrong password produce the same error.
pub async fn login(
	State(state): State<AppState>,
	Json(input): Json<model::LoginInput>,
) -> Result<Json<model::AuthSession>, RouteError> {
	let Some(user) = state.database.find_user_by_email(&input.email).await? else {
		verify_password(&state.hasher, &input.password, DUMMY_HASH).map_err(Error::Hash)?;

		return Err(Error::InvalidEmailOrPassword.into());
	};

	if !verify_password(&state.hasher, &input.password, &user.password).map_err(Error::Hash)? {
		return Err(Error::InvalidEmailOrPassword.into());
	}

	Ok(Json(issue(&state, user)?))
}

/// Returns the authenticated user.
pub async fn get_me(session: Session) -> Json<model::User> {
	Json(session.user)
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_hash_is_salted_phc() {
		let hasher = Argon2::default();

		let first = hash_password(&hasher, "hunter2hunter").unwrap();
		let second = hash_password(&hasher, "hunter2hunter").unwrap();

		assert!(first.starts_with("$argon2id$"));
		assert_ne!(first, second);

		assert!(verify_password(&hasher, "hunter2hunter", &first).unwrap());
		assert!(!verify_password(&hasher, "hunter3hunter", &first).unwrap());
	}

	#[test]
	fn test_dummy_hash_matches_nothing() {
		let hasher = Argon2::default();

		assert!(!verify_password(&hasher, "hunter2hunter", DUMMY_HASH).unwrap());
		assert!(!verify_password(&hasher, "", DUMMY_HASH).unwrap());
	}

	#[test]
	fn test_malformed_hash_is_an_error() {
		assert!(verify_password(&Argon2::default(), "hunter2hunter", "plaintext").is_err());
	}
}
