//! Joins posts with their owners and comments for display.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
	model::{Author, Comment, Post, User},
	store::{self, Store},
};

/// A comment with its author resolved.
#[derive(Debug, Serialize)]
pub struct FeedComment {
	pub id: Uuid,
	pub content: String,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	/// `None` when the author no longer exists.
	pub user: Option<Author>,
}

impl FeedComment {
	pub fn new(comment: Comment, user: Option<Author>) -> Self {
		Self {
			id: comment.id,
			content: comment.content,
			created_at: comment.created_at,
			updated_at: comment.updated_at,
			user,
		}
	}
}

/// A post with its owner and comments resolved.
#[derive(Debug, Serialize)]
pub struct FeedPost {
	pub id: Uuid,
	/// `None` when the owner no longer exists.
	pub user: Option<Author>,
	pub image: String,
	pub caption: String,
	pub likes: Vec<Uuid>,
	pub comments: Vec<FeedComment>,
	pub created_at: DateTime<Utc>,
}

/// Joins already-fetched documents. Post order is preserved; comments follow
/// each post's own list order, and ids without a stored comment are skipped.
pub fn assemble(posts: Vec<Post>, users: &[User], comments: Vec<Comment>) -> Vec<FeedPost> {
	let authors = users
		.iter()
		.map(|user| (user.id, Author::from(user)))
		.collect::<HashMap<_, _>>();

	let mut comments = comments
		.into_iter()
		.map(|comment| (comment.id, comment))
		.collect::<HashMap<_, _>>();

	posts
		.into_iter()
		.map(|post| FeedPost {
			id: post.id,
			user: authors.get(&post.user_id).cloned(),
			image: post.image,
			caption: post.caption,
			likes: post.likes,
			comments: post
				.comments
				.iter()
				.filter_map(|id| comments.remove(id))
				.map(|comment| {
					let user = authors.get(&comment.user_id).cloned();
					FeedComment::new(comment, user)
				})
				.collect(),
			created_at: post.created_at,
		})
		.collect()
}

/// Loads every post, newest first, with owners and comments joined in.
#[tracing::instrument(skip_all)]
pub async fn load(store: &dyn Store) -> Result<Vec<FeedPost>, store::Error> {
	let posts = store.list_posts().await?;

	let comment_ids = posts
		.iter()
		.flat_map(|post| post.comments.iter().copied())
		.collect::<Vec<_>>();
	let comments = store.find_comments(&comment_ids).await?;

	let user_ids = posts
		.iter()
		.map(|post| post.user_id)
		.chain(comments.iter().map(|comment| comment.user_id))
		.collect::<HashSet<_>>()
		.into_iter()
		.collect::<Vec<_>>();
	let users = store.find_users(&user_ids).await?;

	tracing::debug!(
		posts = posts.len(),
		comments = comments.len(),
		"assembled feed"
	);

	Ok(assemble(posts, &users, comments))
}
