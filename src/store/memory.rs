use std::collections::HashMap;

use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{Error, NewComment, NewPost, NewUser, SetChange, Store};
use crate::model::{Comment, Post, UpdateUser, User};

#[derive(Default)]
struct Documents {
	users: HashMap<Uuid, User>,
	/// Kept in insertion order so equal timestamps still sort newest first.
	posts: Vec<Post>,
	comments: HashMap<Uuid, Comment>,
}

impl Documents {
	fn post_mut(&mut self, id: Uuid) -> Option<&mut Post> {
		self.posts.iter_mut().find(|post| post.id == id)
	}

	fn username_taken(&self, username: &str, except: Option<Uuid>) -> bool {
		self.users
			.values()
			.any(|user| user.username == username && Some(user.id) != except)
	}
}

/// A store that keeps every document in process memory.
///
/// Each operation holds a single lock for its whole duration, so multi-document
/// writes are atomic.
#[derive(Default)]
pub struct MemoryStore {
	documents: RwLock<Documents>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}

fn newest_first(mut posts: Vec<Post>) -> Vec<Post> {
	posts.reverse();
	posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
	posts
}

#[axum::async_trait]
impl Store for MemoryStore {
	async fn create_user(&self, user: NewUser) -> Result<User, Error> {
		let mut documents = self.documents.write();

		if documents.username_taken(&user.username, None) {
			return Err(Error::UsernameTaken);
		}

		if documents.users.values().any(|u| u.email == user.email) {
			return Err(Error::EmailTaken);
		}

		let user = User {
			id: Uuid::new_v4(),
			username: user.username,
			email: user.email,
			password: user.password,
			bio: String::new(),
			avatar: String::new(),
			friends: Vec::new(),
			created_at: Utc::now(),
		};

		documents.users.insert(user.id, user.clone());

		Ok(user)
	}

	async fn find_user(&self, id: Uuid) -> Result<Option<User>, Error> {
		Ok(self.documents.read().users.get(&id).cloned())
	}

	async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, Error> {
		Ok(self
			.documents
			.read()
			.users
			.values()
			.find(|user| user.email == email)
			.cloned())
	}

	async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>, Error> {
		let documents = self.documents.read();

		Ok(ids
			.iter()
			.filter_map(|id| documents.users.get(id))
			.cloned()
			.collect())
	}

	async fn list_users(&self) -> Result<Vec<User>, Error> {
		let mut users = self
			.documents
			.read()
			.users
			.values()
			.cloned()
			.collect::<Vec<_>>();

		users.sort_by(|a, b| a.created_at.cmp(&b.created_at));

		Ok(users)
	}

	async fn update_user(&self, id: Uuid, update: UpdateUser) -> Result<Option<User>, Error> {
		let mut documents = self.documents.write();

		if let Some(ref username) = update.username {
			if documents.username_taken(username, Some(id)) {
				return Err(Error::UsernameTaken);
			}
		}

		let Some(user) = documents.users.get_mut(&id) else {
			return Ok(None);
		};

		if let Some(username) = update.username {
			user.username = username;
		}

		if let Some(bio) = update.bio {
			user.bio = bio;
		}

		if let Some(avatar) = update.avatar {
			user.avatar = avatar;
		}

		Ok(Some(user.clone()))
	}

	async fn link_friends(&self, user: Uuid, friend: Uuid) -> Result<SetChange<()>, Error> {
		let mut documents = self.documents.write();

		if !documents.users.contains_key(&user) || !documents.users.contains_key(&friend) {
			return Ok(SetChange::Missing);
		}

		if documents.users[&user].friends.contains(&friend) {
			return Ok(SetChange::Unchanged);
		}

		if let Some(user) = documents.users.get_mut(&user) {
			user.friends.push(friend);
		}

		if let Some(friend) = documents.users.get_mut(&friend) {
			if !friend.friends.contains(&user) {
				friend.friends.push(user);
			}
		}

		Ok(SetChange::Changed(()))
	}

	async fn unlink_friends(&self, user: Uuid, friend: Uuid) -> Result<SetChange<()>, Error> {
		let mut documents = self.documents.write();

		if !documents.users.contains_key(&user) || !documents.users.contains_key(&friend) {
			return Ok(SetChange::Missing);
		}

		if !documents.users[&user].friends.contains(&friend) {
			return Ok(SetChange::Unchanged);
		}

		if let Some(user) = documents.users.get_mut(&user) {
			user.friends.retain(|id| *id != friend);
		}

		if let Some(friend) = documents.users.get_mut(&friend) {
			friend.friends.retain(|id| *id != user);
		}

		Ok(SetChange::Changed(()))
	}

	async fn create_post(&self, post: NewPost) -> Result<Post, Error> {
		let post = Post {
			id: Uuid::new_v4(),
			user_id: post.user_id,
			image: post.image,
			caption: post.caption,
			comments: Vec::new(),
			likes: Vec::new(),
			created_at: Utc::now(),
		};

		self.documents.write().posts.push(post.clone());

		Ok(post)
	}

	async fn find_post(&self, id: Uuid) -> Result<Option<Post>, Error> {
		Ok(self
			.documents
			.read()
			.posts
			.iter()
			.find(|post| post.id == id)
			.cloned())
	}

	async fn list_posts(&self) -> Result<Vec<Post>, Error> {
		Ok(newest_first(self.documents.read().posts.clone()))
	}

	async fn list_user_posts(&self, user: Uuid) -> Result<Vec<Post>, Error> {
		let posts = self
			.documents
			.read()
			.posts
			.iter()
			.filter(|post| post.user_id == user)
			.cloned()
			.collect();

		Ok(newest_first(posts))
	}

	async fn add_like(&self, post: Uuid, user: Uuid) -> Result<SetChange<Post>, Error> {
		let mut documents = self.documents.write();

		let Some(post) = documents.post_mut(post) else {
			return Ok(SetChange::Missing);
		};

		if post.likes.contains(&user) {
			return Ok(SetChange::Unchanged);
		}

		post.likes.push(user);

		Ok(SetChange::Changed(post.clone()))
	}

	async fn remove_like(&self, post: Uuid, user: Uuid) -> Result<SetChange<Post>, Error> {
		let mut documents = self.documents.write();

		let Some(post) = documents.post_mut(post) else {
			return Ok(SetChange::Missing);
		};

		let Some(index) = post.likes.iter().position(|id| *id == user) else {
			return Ok(SetChange::Unchanged);
		};

		post.likes.remove(index);

		Ok(SetChange::Changed(post.clone()))
	}

	async fn create_comment(&self, comment: NewComment) -> Result<Option<Comment>, Error> {
		let mut documents = self.documents.write();
		let now = Utc::now();

		let comment = Comment {
			id: Uuid::new_v4(),
			user_id: comment.user_id,
			post_id: comment.post_id,
			content: comment.content,
			created_at: now,
			updated_at: now,
		};

		let Some(post) = documents.post_mut(comment.post_id) else {
			return Ok(None);
		};

		post.comments.push(comment.id);
		documents.comments.insert(comment.id, comment.clone());

		Ok(Some(comment))
	}

	async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, Error> {
		Ok(self.documents.read().comments.get(&id).cloned())
	}

	async fn find_comments(&self, ids: &[Uuid]) -> Result<Vec<Comment>, Error> {
		let documents = self.documents.read();

		Ok(ids
			.iter()
			.filter_map(|id| documents.comments.get(id))
			.cloned()
			.collect())
	}

	async fn delete_comment(&self, post: Uuid, comment: Uuid) -> Result<Option<Comment>, Error> {
		let mut documents = self.documents.write();

		if !documents
			.comments
			.get(&comment)
			.is_some_and(|c| c.post_id == post)
		{
			return Ok(None);
		}

		let removed = documents.comments.remove(&comment);

		if let Some(post) = documents.post_mut(post) {
			post.comments.retain(|id| *id != comment);
		}

		Ok(removed)
	}
}
