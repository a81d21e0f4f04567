use std::collections::HashMap;

use axum::extract::State;
use uuid::Uuid;

use crate::{
	extract::{Json, Path, Session},
	route::model::Message,
	store::{self, SetChange},
	Database,
};

use super::{model, Error, RouteError};

/// Get profile
/// Returns a user with their friends and posts.
pub async fn get_profile(
	State(database): State<Database>,
	_session: Session,
	Path(user_id): Path<Uuid>,
) -> Result<Json<model::Profile>, RouteError> {
	let user = database
		.find_user(user_id)
		.await?
		.ok_or(Error::UnknownUser(user_id))?;

	let mut friends = database
		.find_users(&user.friends)
		.await?
		.into_iter()
		.map(|friend| (friend.id, friend))
		.collect::<HashMap<_, _>>();

	// Keep the order in which the friendships were made
	let friends = user
		.friends
		.iter()
		.filter_map(|id| friends.remove(id))
		.map(model::Friend::from)
		.collect();

	let posts = database.list_user_posts(user.id).await?;

	Ok(Json(model::Profile {
		user: model::ProfileUser {
			id: user.id,
			username: user.username,
			bio: user.bio,
			avatar: user.avatar,
			friends,
			created_at: user.created_at,
		},
		posts,
	}))
}

/// Get all users
pub async fn get_users(
	State(database): State<Database>,
	_session: Session,
) -> Result<Json<Vec<model::User>>, RouteError> {
	Ok(Json(database.list_users().await?))
}

/// Edit profile
/// Updates only the fields present in the body.
pub async fn edit_profile(
	State(database): State<Database>,
	session: Session,
	Json(update): Json<model::UpdateUser>,
) -> Result<Json<model::ProfileUpdated>, RouteError> {
	let user = database
		.update_user(session.user.id, update)
		.await
		.map_err(|e| match e {
			store::Error::UsernameTaken => Error::UsernameTaken.into(),
			e => RouteError::from(e),
		})?
		.ok_or(Error::UnknownUser(session.user.id))?;

	Ok(Json(model::ProfileUpdated {
		message: "profile updated".into(),
		user,
	}))
}

/// Add friend
/// Links both users as friends of each other.
pub async fn add_friend(
	State(database): State<Database>,
	session: Session,
	Path(friend_id): Path<Uuid>,
) -> Result<Json<Message>, RouteError> {
	if friend_id == session.user.id {
		return Err(Error::SelfFriend.into());
	}

	match database.link_friends(session.user.id, friend_id).await? {
		SetChange::Changed(()) => Ok(Json(Message::new("friend added"))),
		SetChange::Unchanged => Err(Error::AlreadyFriends.into()),
		SetChange::Missing => Err(Error::UnknownUser(friend_id).into()),
	}
}

/// Remove friend
/// Unlinks both users.
pub async fn remove_friend(
	State(database): State<Database>,
	session: Session,
	Path(friend_id): Path<Uuid>,
) -> Result<Json<Message>, RouteError> {
	match database.unlink_friends(session.user.id, friend_id).await? {
		SetChange::Changed(()) => Ok(Json(Message::new("friend removed"))),
		SetChange::Unchanged => Err(Error::NotFriends.into()),
		SetChange::Missing => Err(Error::UnknownUser(friend_id).into()),
	}
}
