use std::borrow::Cow;

use axum::{
	http::StatusCode,
	routing::{get, post},
	Router,
};

use crate::{error, token, AppState};

pub mod model;
pub mod route;

/// An error that can occur during authentication.
///
/// Note that the messages are presented to the client, so they should not contain
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("invalid email or password")]
	InvalidEmailOrPassword,
	#[error("password hashing error: {0}")]
	Hash(#[from] argon2::password_hash::Error),
	#[error("could not issue token: {0}")]
	Sign(token::Error),
	#[error("no bearer token")]
	NoToken,
	#[error("invalid token")]
	InvalidToken,
	#[error("token expired")]
	ExpiredToken,
	#[error("username already taken")]
	UsernameTaken,
	#[error("email already taken")]
	EmailTaken,
}

impl From<token::Error> for Error {
	fn from(error: token::Error) -> Self {
		match error {
			token::Error::Expired => Self::ExpiredToken,
			token::Error::Invalid => Self::InvalidToken,
			error @ (token::Error::Sign(..) | token::Error::OutOfRange) => Self::Sign(error),
		}
	}
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> Router<AppState> {
	use route::*;

	Router::new()
		.route("/register", post(register))
		.route("/login", post(login))
		.route("/me", get(get_me))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::InvalidEmailOrPassword
			| Self::NoToken
			| Self::InvalidToken
			| Self::ExpiredToken => StatusCode::UNAUTHORIZED,
			Self::Hash(..) | Self::Sign(..) => StatusCode::INTERNAL_SERVER_ERROR,
			Self::UsernameTaken | Self::EmailTaken => StatusCode::CONFLICT,
		}
	}

	fn message(&self) -> Cow<'static, str> {
		match self {
			Self::Hash(..) | Self::Sign(..) => "internal server error".into(),
			error => error.to_string().into(),
		}
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_signup_flow() {
		let app = app();

		let response = app
			.post("/auth/register")
			.json(&json!({
				"email": "John@Smith.com ",
				"username": "john",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 201);

		let body = response.json::<Value>();
		assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
		assert!(body["expires_at"].is_string());
		assert_eq!(body["user"]["username"], "john");
		assert!(body["user"].get("password").is_none());
		assert!(body["user"].get("email").is_none());

		let response = app
			.post("/auth/login")
			.json(&json!({
				"email": "john@smith.com",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 200);

		let token = response.json::<Value>()["token"]
			.as_str()
			.unwrap()
			.to_string();

		let response = app
			.get("/auth/me")
			.add_header(AUTHORIZATION, bearer(&token))
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["username"], "john");

		let lowercase = HeaderValue::from_str(&format!("bearer {token}")).unwrap();
		let response = app.get("/auth/me").add_header(AUTHORIZATION, lowercase).await;

		assert_eq!(response.status_code(), 200);
	}

	#[tokio::test]
	async fn test_duplicate_username_and_email() {
		let app = app();

		register(&app, "john").await;

		let response = app
			.post("/auth/register")
			.json(&json!({
				"email": "other@example.com",
				"username": "john",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 409);

		let response = app
			.post("/auth/register")
			.json(&json!({
				"email": "john@example.com",
				"username": "johnny",
				"password": "hunter2hunter",
			}))
			.await;

		assert_eq!(response.status_code(), 409);
		assert_eq!(response.json::<Value>()["message"], "email already taken");
	}

	#[tokio::test]
	async fn test_register_validation() {
		let app = app();

		for body in [
			json!({ "email": "nope", "username": "john", "password": "hunter2hunter" }),
			json!({ "email": "a@b.co", "username": "jo", "password": "hunter2hunter" }),
			json!({ "email": "a@b.co", "username": "john!", "password": "hunter2hunter" }),
			json!({ "email": "a@b.co", "username": "john", "password": "short" }),
			json!({ "email": "a@b.co", "username": "john", "password": "hunter2hunter", "admin": true }),
		] {
			let response = app.post("/auth/register").json(&body).await;

			assert_eq!(response.status_code(), 400, "{body}");
		}
	}

	#[tokio::test]
	async fn test_login_failures_are_indistinguishable() {
		let app = app();

		register(&app, "john").await;

		let wrong_password = app
			.post("/auth/login")
			.json(&json!({ "email": "john@example.com", "password": "wrong-password" }))
			.await;
		let unknown_email = app
			.post("/auth/login")
			.json(&json!({ "email": "nobody@example.com", "password": "hunter2hunter" }))
			.await;

		assert_eq!(wrong_password.status_code(), 401);
		assert_eq!(unknown_email.status_code(), 401);
		assert_eq!(
			wrong_password.json::<Value>(),
			unknown_email.json::<Value>()
		);
	}

	#[tokio::test]
	async fn test_bearer_gate() {
		let app = app();

		let response = app.get("/auth/me").await;
		assert_eq!(response.status_code(), 401);
		assert_eq!(response.json::<Value>()["message"], "no bearer token");

		let response = app
			.get("/auth/me")
			.add_header(AUTHORIZATION, HeaderValue::from_static("Token abc"))
			.await;
		assert_eq!(response.status_code(), 401);

		let response = app
			.get("/auth/me")
			.add_header(AUTHORIZATION, HeaderValue::from_static("Bearer"))
			.await;
		assert_eq!(response.status_code(), 401);

		let response = app
			.get("/auth/me")
			.add_header(AUTHORIZATION, bearer("not.a.token"))
			.await;
		assert_eq!(response.status_code(), 401);
		assert_eq!(response.json::<Value>()["message"], "invalid token");
	}
}
