use axum::{
	http::StatusCode,
	routing::{delete, get, post, put},
	Router,
};
use uuid::Uuid;

use crate::{error, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("user {0} not found")]
	UnknownUser(Uuid),
	#[error("already friends")]
	AlreadyFriends,
	#[error("not friends")]
	NotFriends,
	#[error("cannot add yourself as a friend")]
	SelfFriend,
	#[error("username already taken")]
	UsernameTaken,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> Router<AppState> {
	use route::*;

	Router::new()
		.route("/all", get(get_users))
		.route("/profile/edit", put(edit_profile))
		.route("/profile/:user_id", get(get_profile))
		.route("/add-friend/:friend_id", post(add_friend))
		.route("/remove-friend/:friend_id", delete(remove_friend))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownUser(..) => StatusCode::NOT_FOUND,
			Self::AlreadyFriends | Self::NotFriends | Self::SelfFriend => StatusCode::BAD_REQUEST,
			Self::UsernameTaken => StatusCode::CONFLICT,
		}
	}
}
