use axum::{
	extract::{FromRef, FromRequestParts},
	http::{header, request},
};

use crate::{error::RouteError, model, route::auth, store::Database, token::Tokens};

/// Compared case-insensitively.
pub const AUTHORIZATION_SCHEME: &str = "Bearer";

/// Extracts the bearer token and the user it was issued to.
///
/// Every request is verified on its own; nothing is cached between requests.
///
/// If there is no token, a [`auth::Error::NoToken`] is returned.
/// If the token is malformed, expired, badly signed, or its user no longer exists,
/// a [`auth::Error::InvalidToken`] or [`auth::Error::ExpiredToken`] is returned.
///
/// ```rust
/// async fn route(session: Session) {
///   println!("{:?}", session.user);
/// }
/// ```
#[derive(Debug)]
pub struct Session {
	pub user: model::User,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
	Database: FromRef<S>,
	Tokens: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = RouteError<auth::Error>;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let header = parts
			.headers
			.get(header::AUTHORIZATION)
			.ok_or(auth::Error::NoToken)?;

		let token = header
			.to_str()
			.ok()
			.and_then(|value| value.trim().split_once(' '))
			.filter(|(scheme, _)| scheme.eq_ignore_ascii_case(AUTHORIZATION_SCHEME))
			.map(|(_, token)| token.trim())
			.filter(|token| !token.is_empty())
			.ok_or(auth::Error::InvalidToken)?;

		let user_id = Tokens::from_ref(state)
			.verify(token)
			.map_err(auth::Error::from)?;

		let database = Database::from_ref(state);
		let user = database
			.find_user(user_id)
			.await?
			.ok_or(auth::Error::InvalidToken)?;

		Ok(Self { user })
	}
}
