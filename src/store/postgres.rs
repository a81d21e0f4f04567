use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use super::{Error, NewComment, NewPost, NewUser, SetChange, Store};
use crate::model::{Comment, Post, UpdateUser, User};

/// A store backed by PostgreSQL. Set-valued fields are `UUID[]` columns.
#[derive(Clone)]
pub struct PgStore {
	pool: sqlx::PgPool,
}

/// Maps unique constraint violations on the user table to their domain errors.
fn map_user_conflict(error: sqlx::Error) -> Error {
	if let sqlx::Error::Database(ref d) = error {
		match d.constraint() {
			Some("user_email_key") => return Error::EmailTaken,
			Some("user_username_key") => return Error::UsernameTaken,
			_ => {}
		}
	}

	Error::Database(error)
}

impl PgStore {
	/// Connects to the database and applies pending migrations.
	pub async fn connect(url: &str, max_connections: u32) -> Result<Self, Error> {
		let pool = PgPoolOptions::new()
			.max_connections(max_connections)
			.connect(url)
			.await?;

		sqlx::migrate!().run(&pool).await?;

		Ok(Self { pool })
	}

	pub fn from_pool(pool: sqlx::PgPool) -> Self {
		Self { pool }
	}

	async fn post_exists(&self, id: Uuid) -> Result<bool, Error> {
		Ok(
			sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM post WHERE id = $1)")
				.bind(id)
				.fetch_one(&self.pool)
				.await?,
		)
	}

	/// Shared body of [`Store::link_friends`] and [`Store::unlink_friends`].
	///
	/// Both rows are locked in id order first so that two users befriending each
	/// other at the same time cannot deadlock.
	async fn set_friendship(
		&self,
		user: Uuid,
		friend: Uuid,
		linked: bool,
	) -> Result<SetChange<()>, Error> {
		let ids = [user, friend];
		let mut tx = self.pool.begin().await?;

		let locked: Vec<Uuid> =
			sqlx::query_scalar(r#"SELECT id FROM "user" WHERE id = ANY($1) ORDER BY id FOR UPDATE"#)
				.bind(&ids[..])
				.fetch_all(&mut *tx)
				.await?;

		if !locked.contains(&user) || !locked.contains(&friend) {
			return Ok(SetChange::Missing);
		}

		let query = if linked {
			r#"
				UPDATE "user" SET friends = array_append(friends, $2)
				WHERE id = $1 AND NOT ($2 = ANY(friends))
			"#
		} else {
			r#"
				UPDATE "user" SET friends = array_remove(friends, $2)
				WHERE id = $1 AND $2 = ANY(friends)
			"#
		};

		let changed = sqlx::query(query)
			.bind(user)
			.bind(friend)
			.execute(&mut *tx)
			.await?
			.rows_affected();

		if changed == 0 {
			return Ok(SetChange::Unchanged);
		}

		sqlx::query(query)
			.bind(friend)
			.bind(user)
			.execute(&mut *tx)
			.await?;

		tx.commit().await?;

		Ok(SetChange::Changed(()))
	}

	async fn set_like(&self, post: Uuid, user: Uuid, liked: bool) -> Result<SetChange<Post>, Error> {
		let query = if liked {
			r#"
				UPDATE post SET likes = array_append(likes, $2)
				WHERE id = $1 AND NOT ($2 = ANY(likes))
				RETURNING *
			"#
		} else {
			r#"
				UPDATE post SET likes = array_remove(likes, $2)
				WHERE id = $1 AND $2 = ANY(likes)
				RETURNING *
			"#
		};

		let updated = sqlx::query_as::<_, Post>(query)
			.bind(post)
			.bind(user)
			.fetch_optional(&self.pool)
			.await?;

		Ok(match updated {
			Some(post) => SetChange::Changed(post),
			None if self.post_exists(post).await? => SetChange::Unchanged,
			None => SetChange::Missing,
		})
	}
}

#[axum::async_trait]
impl Store for PgStore {
	async fn create_user(&self, user: NewUser) -> Result<User, Error> {
		sqlx::query_as::<_, User>(
			r#"
				INSERT INTO "user" (id, username, email, password)
				VALUES ($1, $2, $3, $4)
				RETURNING *
			"#,
		)
		.bind(Uuid::new_v4())
		.bind(user.username)
		.bind(user.email)
		.bind(user.password)
		.fetch_one(&self.pool)
		.await
		.map_err(map_user_conflict)
	}

	async fn find_user(&self, id: Uuid) -> Result<Option<User>, Error> {
		Ok(
			sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE id = $1"#)
				.bind(id)
				.fetch_optional(&self.pool)
				.await?,
		)
	}

	async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, Error> {
		Ok(
			sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE email = $1"#)
				.bind(email)
				.fetch_optional(&self.pool)
				.await?,
		)
	}

	async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>, Error> {
		Ok(
			sqlx::query_as::<_, User>(r#"SELECT * FROM "user" WHERE id = ANY($1)"#)
				.bind(ids)
				.fetch_all(&self.pool)
				.await?,
		)
	}

	async fn list_users(&self) -> Result<Vec<User>, Error> {
		Ok(
			sqlx::query_as::<_, User>(r#"SELECT * FROM "user" ORDER BY created_at"#)
				.fetch_all(&self.pool)
				.await?,
		)
	}

	async fn update_user(&self, id: Uuid, update: UpdateUser) -> Result<Option<User>, Error> {
		sqlx::query_as::<_, User>(
			r#"
				UPDATE "user"
				SET username = COALESCE($1, username),
					bio = COALESCE($2, bio),
					avatar = COALESCE($3, avatar)
				WHERE id = $4
				RETURNING *
			"#,
		)
		.bind(update.username)
		.bind(update.bio)
		.bind(update.avatar)
		.bind(id)
		.fetch_optional(&self.pool)
		.await
		.map_err(map_user_conflict)
	}

	async fn link_friends(&self, user: Uuid, friend: Uuid) -> Result<SetChange<()>, Error> {
		self.set_friendship(user, friend, true).await
	}

	async fn unlink_friends(&self, user: Uuid, friend: Uuid) -> Result<SetChange<()>, Error> {
		self.set_friendship(user, friend, false).await
	}

	async fn create_post(&self, post: NewPost) -> Result<Post, Error> {
		Ok(sqlx::query_as::<_, Post>(
			r#"
				INSERT INTO post (id, user_id, image, caption)
				VALUES ($1, $2, $3, $4)
				RETURNING *
			"#,
		)
		.bind(Uuid::new_v4())
		.bind(post.user_id)
		.bind(post.image)
		.bind(post.caption)
		.fetch_one(&self.pool)
		.await?)
	}

	async fn find_post(&self, id: Uuid) -> Result<Option<Post>, Error> {
		Ok(
			sqlx::query_as::<_, Post>("SELECT * FROM post WHERE id = $1")
				.bind(id)
				.fetch_optional(&self.pool)
				.await?,
		)
	}

	async fn list_posts(&self) -> Result<Vec<Post>, Error> {
		Ok(
			sqlx::query_as::<_, Post>("SELECT * FROM post ORDER BY created_at DESC")
				.fetch_all(&self.pool)
				.await?,
		)
	}

	async fn list_user_posts(&self, user: Uuid) -> Result<Vec<Post>, Error> {
		Ok(sqlx::query_as::<_, Post>(
			r#"
				SELECT * FROM post
				WHERE user_id = $1
				ORDER BY created_at DESC
			"#,
		)
		.bind(user)
		.fetch_all(&self.pool)
		.await?)
	}

	async fn add_like(&self, post: Uuid, user: Uuid) -> Result<SetChange<Post>, Error> {
		self.set_like(post, user, true).await
	}

	async fn remove_like(&self, post: Uuid, user: Uuid) -> Result<SetChange<Post>, Error> {
		self.set_like(post, user, false).await
	}

	async fn create_comment(&self, comment: NewComment) -> Result<Option<Comment>, Error> {
		let id = Uuid::new_v4();
		let mut tx = self.pool.begin().await?;

		let attached = sqlx::query(
			"UPDATE post SET comments = array_append(comments, $1) WHERE id = $2",
		)
		.bind(id)
		.bind(comment.post_id)
		.execute(&mut *tx)
		.await?
		.rows_affected();

		if attached == 0 {
			return Ok(None);
		}

		let comment = sqlx::query_as::<_, Comment>(
			r#"
				INSERT INTO comment (id, user_id, post_id, content)
				VALUES ($1, $2, $3, $4)
				RETURNING *
			"#,
		)
		.bind(id)
		.bind(comment.user_id)
		.bind(comment.post_id)
		.bind(comment.content)
		.fetch_one(&mut *tx)
		.await?;

		tx.commit().await?;

		Ok(Some(comment))
	}

	async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, Error> {
		Ok(
			sqlx::query_as::<_, Comment>("SELECT * FROM comment WHERE id = $1")
				.bind(id)
				.fetch_optional(&self.pool)
				.await?,
		)
	}

	async fn find_comments(&self, ids: &[Uuid]) -> Result<Vec<Comment>, Error> {
		Ok(
			sqlx::query_as::<_, Comment>("SELECT * FROM comment WHERE id = ANY($1)")
				.bind(ids)
				.fetch_all(&self.pool)
				.await?,
		)
	}

	async fn delete_comment(&self, post: Uuid, comment: Uuid) -> Result<Option<Comment>, Error> {
		let mut tx = self.pool.begin().await?;

		let deleted = sqlx::query_as::<_, Comment>(
			"DELETE FROM comment WHERE id = $1 AND post_id = $2 RETURNING *",
		)
		.bind(comment)
		.bind(post)
		.fetch_optional(&mut *tx)
		.await?;

		if deleted.is_none() {
			return Ok(None);
		}

		sqlx::query("UPDATE post SET comments = array_remove(comments, $1) WHERE id = $2")
			.bind(comment)
			.bind(post)
			.execute(&mut *tx)
			.await?;

		tx.commit().await?;

		Ok(deleted)
	}
}
