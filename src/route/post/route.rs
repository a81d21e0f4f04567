use axum::{
	extract::{multipart::MultipartRejection, Multipart, State},
	http::StatusCode,
};
use uuid::Uuid;

use crate::{
	error::AppError,
	extract::{Json, Path, Session},
	feed,
	model::Author,
	store::{NewComment, NewPost, SetChange},
	AppState, Database,
};

use super::{model, Error, RouteError};

/// Upload post
/// Stores the `image` field on disk and creates a post that references it.
pub async fn upload_post(
	State(state): State<AppState>,
	session: Session,
	multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<model::Post>), RouteError> {
	let mut multipart = multipart.map_err(AppError::from)?;
	let mut image = None;
	let mut caption = String::new();

	while let Some(field) = multipart.next_field().await? {
		let name = field.name().unwrap_or_default().to_owned();

		match name.as_str() {
			"image" => {
				let is_image = field
					.content_type()
					.is_some_and(|mime| mime.starts_with("image/"));

				if !is_image {
					return Err(Error::NotAnImage.into());
				}

				let file_name = field.file_name().map(str::to_owned);
				image = Some((file_name, field.bytes().await?));
			}
			"caption" => caption = field.text().await?,
			_ => {}
		}
	}

	if caption.chars().count() > model::MAX_CAPTION_LENGTH {
		return Err(Error::CaptionTooLong.into());
	}

	let (file_name, bytes) = image
		.filter(|(_, bytes)| !bytes.is_empty())
		.ok_or(Error::MissingImage)?;

	let path = state.uploads.save(file_name.as_deref(), &bytes).await?;

	let post = match state
		.database
		.create_post(NewPost {
			user_id: session.user.id,
			image: path.clone(),
			caption,
		})
		.await
	{
		Ok(post) => post,
		Err(error) => {
			if let Err(error) = state.uploads.remove(&path).await {
				tracing::warn!(%error, %path, "failed to remove orphaned upload");
			}

			return Err(error.into());
		}
	};

	tracing::info!(post = %post.id, user = %session.user.id, "created post");

	Ok((StatusCode::CREATED, Json(post)))
}

/// Get feed
/// Returns every post, newest first, with owners and comments resolved.
pub async fn get_feed(
	State(database): State<Database>,
	_session: Session,
) -> Result<Json<Vec<model::FeedPost>>, RouteError> {
	Ok(Json(feed::load(database.as_ref()).await?))
}

/// Like post
pub async fn like_post(
	State(database): State<Database>,
	session: Session,
	Path(post_id): Path<Uuid>,
) -> Result<Json<model::Post>, RouteError> {
	match database.add_like(post_id, session.user.id).await? {
		SetChange::Changed(post) => Ok(Json(post)),
		SetChange::Unchanged => Err(Error::AlreadyLiked.into()),
		SetChange::Missing => Err(Error::UnknownPost(post_id).into()),
	}
}

/// Unlike post
pub async fn unlike_post(
	State(database): State<Database>,
	session: Session,
	Path(post_id): Path<Uuid>,
) -> Result<Json<model::Post>, RouteError> {
	match database.remove_like(post_id, session.user.id).await? {
		SetChange::Changed(post) => Ok(Json(post)),
		SetChange::Unchanged => Err(Error::NotLiked.into()),
		SetChange::Missing => Err(Error::UnknownPost(post_id).into()),
	}
}

/// Create comment
/// Appends a comment by the authenticated user to the post.
pub async fn create_comment(
	State(database): State<Database>,
	session: Session,
	Path(post_id): Path<Uuid>,
	Json(input): Json<model::CommentInput>,
) -> Result<(StatusCode, Json<model::FeedComment>), RouteError> {
	let comment = database
		.create_comment(NewComment {
			user_id: session.user.id,
			post_id,
			content: input.content,
		})
		.await?
		.ok_or(Error::UnknownPost(post_id))?;

	let author = Author::from(&session.user);

	Ok((
		StatusCode::CREATED,
		Json(model::FeedComment::new(comment, Some(author))),
	))
}

/// Get comment
pub async fn get_comment(
	State(database): State<Database>,
	_session: Session,
	Path(comment_id): Path<Uuid>,
) -> Result<Json<model::FeedComment>, RouteError> {
	let comment = database
		.find_comment(comment_id)
		.await?
		.ok_or(Error::UnknownComment(comment_id))?;

	let author = database
		.find_user(comment.user_id)
		.await?
		.as_ref()
		.map(Author::from);

	Ok(Json(model::FeedComment::new(comment, author)))
}

/// Delete comment
/// Deletes a comment on the post. Only the comment's author may do this.
pub async fn delete_comment(
	State(database): State<Database>,
	session: Session,
	Path((post_id, comment_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<crate::model::Comment>, RouteError> {
	if database.find_post(post_id).await?.is_none() {
		return Err(Error::UnknownPost(post_id).into());
	}

	let comment = database
		.find_comment(comment_id)
		.await?
		.filter(|comment| comment.post_id == post_id)
		.ok_or(Error::UnknownComment(comment_id))?;

	if comment.user_id != session.user.id {
		return Err(Error::NotCommentOwner.into());
	}

	let deleted = database
		.delete_comment(post_id, comment_id)
		.await?
		.ok_or(Error::UnknownComment(comment_id))?;

	Ok(Json(deleted))
}
