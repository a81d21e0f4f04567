pub use crate::model::{Post, UpdateUser, User};

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// How a friend is shown on a profile.
#[derive(Debug, Serialize)]
pub struct Friend {
	pub id: Uuid,
	pub username: String,
	pub avatar: String,
	pub bio: String,
}

impl From<User> for Friend {
	fn from(user: User) -> Self {
		Self {
			id: user.id,
			username: user.username,
			avatar: user.avatar,
			bio: user.bio,
		}
	}
}

/// A user with their friend list resolved.
#[derive(Debug, Serialize)]
pub struct ProfileUser {
	pub id: Uuid,
	pub username: String,
	pub bio: String,
	pub avatar: String,
	pub friends: Vec<Friend>,
	pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct Profile {
	pub user: ProfileUser,
	/// The user's posts, newest first.
	pub posts: Vec<Post>,
}

#[derive(Debug, Serialize)]
pub struct ProfileUpdated {
	pub message: Cow<'static, str>,
	pub user: User,
}
