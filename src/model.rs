use chrono::{DateTime, Utc};
use macros::model;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
	if username.chars().any(|c| !(c.is_alphanumeric() || c == '_')) {
		return Err(ValidationError::new("username must be alphanumeric"));
	}

	Ok(())
}

/// A single user.
///
/// Use this when fetching from the store and returning to the client.
/// The `email` and `password` fields are never serialized to the client.
#[model(update)]
#[derive(Debug, Clone, Deserialize, Serialize, Validate, sqlx::FromRow)]
#[serde(deny_unknown_fields)]
pub struct User {
	/// The unique identifier of the user.
	#[serde(skip_deserializing)]
	pub id: Uuid,
	/// The username that is displayed to the public.
	#[validate(length(min = 3, max = 16), custom(function = "validate_username"))]
	pub username: String,
	/// The user's email address, used for logging in.
	#[serde(skip)]
	pub email: String,
	/// Argon2 hash in PHC string format.
	#[serde(skip)]
	pub password: String,
	/// A short public description, empty when unset.
	#[validate(length(max = 280))]
	pub bio: String,
	/// A reference to the user's avatar image, empty when unset.
	#[validate(length(max = 512))]
	pub avatar: String,
	/// Users linked to this one. Always mirrored on the other side.
	#[serde(skip_deserializing)]
	pub friends: Vec<Uuid>,
	/// The creation time of the user.
	#[serde(skip_deserializing)]
	pub created_at: DateTime<Utc>,
}

/// A single photo post, created by a user.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Post {
	pub id: Uuid,
	/// The user that created the post.
	pub user_id: Uuid,
	/// Public path of the uploaded image.
	pub image: String,
	pub caption: String,
	/// Comment ids in creation order.
	pub comments: Vec<Uuid>,
	/// Users that like the post. Each user appears at most once.
	pub likes: Vec<Uuid>,
	pub created_at: DateTime<Utc>,
}

/// A comment left by a user on a post.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Comment {
	pub id: Uuid,
	pub user_id: Uuid,
	pub post_id: Uuid,
	pub content: String,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

/// A user's public handle and avatar, embedded in posts and comments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
	pub id: Uuid,
	pub username: String,
	pub avatar: String,
}

impl From<&User> for Author {
	fn from(user: &User) -> Self {
		Self {
			id: user.id,
			username: user.username.clone(),
			avatar: user.avatar.clone(),
		}
	}
}
