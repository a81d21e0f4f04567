//! Document storage for users, posts and comments.
//!
//! Handlers only see the [`Store`] trait. Two backends exist: [`PgStore`] for
//! deployments and [`MemoryStore`] for local runs and tests.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use std::sync::Arc;

use uuid::Uuid;

use crate::model::{Comment, Post, UpdateUser, User};

/// The shared store handle injected into every handler.
pub type Database = Arc<dyn Store>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("username already taken")]
	UsernameTaken,
	#[error("email already taken")]
	EmailTaken,
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error("migration error: {0}")]
	Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Outcome of a conditional set mutation (likes, friend links).
#[derive(Debug)]
pub enum SetChange<T> {
	/// The set was mutated.
	Changed(T),
	/// The mutation would have been a no-op, so nothing was written.
	Unchanged,
	/// The target document does not exist.
	Missing,
}

#[derive(Debug, Clone)]
pub struct NewUser {
	pub username: String,
	pub email: String,
	pub password: String,
}

#[derive(Debug, Clone)]
pub struct NewPost {
	pub user_id: Uuid,
	pub image: String,
	pub caption: String,
}

#[derive(Debug, Clone)]
pub struct NewComment {
	pub user_id: Uuid,
	pub post_id: Uuid,
	pub content: String,
}

#[axum::async_trait]
pub trait Store: Send + Sync {
	/// Inserts a user, failing with [`Error::UsernameTaken`] or [`Error::EmailTaken`]
	/// if either unique field is in use.
	async fn create_user(&self, user: NewUser) -> Result<User, Error>;
	async fn find_user(&self, id: Uuid) -> Result<Option<User>, Error>;
	async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, Error>;
	/// Fetches every user in `ids` that exists, in no particular order.
	async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>, Error>;
	async fn list_users(&self) -> Result<Vec<User>, Error>;
	/// Replaces only the fields that are `Some`.
	async fn update_user(&self, id: Uuid, update: UpdateUser) -> Result<Option<User>, Error>;

	/// Adds each user to the other's friend set. Both sides are written or neither is.
	async fn link_friends(&self, user: Uuid, friend: Uuid) -> Result<SetChange<()>, Error>;
	/// Removes each user from the other's friend set. Both sides are written or neither is.
	async fn unlink_friends(&self, user: Uuid, friend: Uuid) -> Result<SetChange<()>, Error>;

	async fn create_post(&self, post: NewPost) -> Result<Post, Error>;
	async fn find_post(&self, id: Uuid) -> Result<Option<Post>, Error>;
	/// Every post, newest first.
	async fn list_posts(&self) -> Result<Vec<Post>, Error>;
	/// A single user's posts, newest first.
	async fn list_user_posts(&self, user: Uuid) -> Result<Vec<Post>, Error>;
	async fn add_like(&self, post: Uuid, user: Uuid) -> Result<SetChange<Post>, Error>;
	async fn remove_like(&self, post: Uuid, user: Uuid) -> Result<SetChange<Post>, Error>;

	/// Inserts the comment and appends it to its post. Returns `None` if the post
	/// does not exist, in which case nothing is written.
	async fn create_comment(&self, comment: NewComment) -> Result<Option<Comment>, Error>;
	async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, Error>;
	async fn find_comments(&self, ids: &[Uuid]) -> Result<Vec<Comment>, Error>;
	/// Deletes the comment and removes it from `post`. Returns `None` if no comment
	/// with that id belongs to `post`.
	async fn delete_comment(&self, post: Uuid, comment: Uuid) -> Result<Option<Comment>, Error>;
}
