use axum::{
	http::StatusCode,
	routing::{delete, get, post},
	Router,
};
use uuid::Uuid;

use crate::{error, AppState};

pub mod model;
pub mod route;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("post {0} not found")]
	UnknownPost(Uuid),
	#[error("comment {0} not found")]
	UnknownComment(Uuid),
	#[error("post already liked")]
	AlreadyLiked,
	#[error("post not liked")]
	NotLiked,
	#[error("only the author can delete this comment")]
	NotCommentOwner,
	#[error("an image file is required")]
	MissingImage,
	#[error("the uploaded file is not an image")]
	NotAnImage,
	#[error("caption must be at most {} characters", model::MAX_CAPTION_LENGTH)]
	CaptionTooLong,
}

pub type RouteError = error::RouteError<Error>;

pub fn routes() -> Router<AppState> {
	use route::*;

	Router::new()
		.route("/upload", post(upload_post))
		.route("/feed", get(get_feed))
		.route("/:post_id/like", post(like_post).delete(unlike_post))
		.route("/:post_id/comments", post(create_comment))
		.route("/:post_id/comments/:comment_id", delete(delete_comment))
		.route("/comments/:comment_id", get(get_comment))
}

impl error::ErrorShape for Error {
	fn status(&self) -> StatusCode {
		match self {
			Self::UnknownPost(..) | Self::UnknownComment(..) => StatusCode::NOT_FOUND,
			Self::AlreadyLiked
			| Self::NotLiked
			| Self::MissingImage
			| Self::NotAnImage
			| Self::CaptionTooLong => StatusCode::BAD_REQUEST,
			Self::NotCommentOwner => StatusCode::FORBIDDEN,
		}
	}
}

#[cfg(test)]
mod test {
	use crate::test::*;

	#[tokio::test]
	async fn test_upload_and_serve() {
		let (app, _dir) = app_with_uploads();
		let john = register(&app, "john").await;

		let post = upload(&app, &john.token, "sunset").await;

		assert_eq!(post["user_id"], john.id.to_string());
		assert_eq!(post["caption"], "sunset");
		assert_eq!(post["likes"], json!([]));
		assert_eq!(post["comments"], json!([]));

		let image = post["image"].as_str().unwrap();
		assert!(image.starts_with("/uploads/"));
		assert!(image.ends_with("_cat.png"));

		let response = app.get(image).await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.as_bytes().as_ref(), PNG);
	}

	#[tokio::test]
	async fn test_upload_requires_an_image() {
		let (app, _dir) = app_with_uploads();
		let john = register(&app, "john").await;

		let response = app
			.post("/posts/upload")
			.add_header(AUTHORIZATION, bearer(&john.token))
			.multipart(MultipartForm::new().add_text("caption", "no image"))
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(response.json::<Value>()["message"], "an image file is required");

		let response = app
			.post("/posts/upload")
			.add_header(AUTHORIZATION, bearer(&john.token))
			.multipart(
				MultipartForm::new().add_part(
					"image",
					Part::bytes(b"hello".as_slice())
						.file_name("notes.txt")
						.mime_type("text/plain"),
				),
			)
			.await;

		assert_eq!(response.status_code(), 400);
		assert_eq!(
			response.json::<Value>()["message"],
			"the uploaded file is not an image"
		);

		let response = app
			.post("/posts/upload")
			.multipart(MultipartForm::new().add_text("caption", "anonymous"))
			.await;

		assert_eq!(response.status_code(), 401);
	}

	#[tokio::test]
	async fn test_feed_is_newest_first() {
		let (app, _dir) = app_with_uploads();
		let john = register(&app, "john").await;

		let first = upload(&app, &john.token, "first").await;
		let second = upload(&app, &john.token, "second").await;

		let feed = app
			.get("/posts/feed")
			.add_header(AUTHORIZATION, bearer(&john.token))
			.await
			.json::<Value>();

		assert_eq!(feed[0]["id"], second["id"]);
		assert_eq!(feed[1]["id"], first["id"]);
		assert_eq!(feed[0]["user"]["username"], "john");
		assert!(feed[0]["user"].get("email").is_none());
	}

	#[tokio::test]
	async fn test_like_is_rejected_twice() {
		let (app, _dir) = app_with_uploads();
		let john = register(&app, "john").await;
		let post = upload(&app, &john.token, "").await;
		let like = format!("/posts/{}/like", post["id"].as_str().unwrap());

		let response = app
			.post(&like)
			.add_header(AUTHORIZATION, bearer(&john.token))
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["likes"], json!([john.id]));

		let response = app
			.post(&like)
			.add_header(AUTHORIZATION, bearer(&john.token))
			.await;

		assert_eq!(response.status_code(), 400);

		let response = app
			.delete(&like)
			.add_header(AUTHORIZATION, bearer(&john.token))
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["likes"], json!([]));

		let response = app
			.delete(&like)
			.add_header(AUTHORIZATION, bearer(&john.token))
			.await;

		assert_eq!(response.status_code(), 400);
	}

	#[tokio::test]
	async fn test_like_unknown_or_malformed_post() {
		let (app, _dir) = app_with_uploads();
		let john = register(&app, "john").await;

		let response = app
			.post(&format!("/posts/{}/like", Uuid::new_v4()))
			.add_header(AUTHORIZATION, bearer(&john.token))
			.await;

		assert_eq!(response.status_code(), 404);

		let response = app
			.post("/posts/not-a-uuid/like")
			.add_header(AUTHORIZATION, bearer(&john.token))
			.await;

		assert_eq!(response.status_code(), 400);
	}

	#[tokio::test]
	async fn test_comment_lifecycle() {
		let (app, _dir) = app_with_uploads();
		let john = register(&app, "john").await;
		let jane = register(&app, "jane").await;
		let post = upload(&app, &john.token, "").await;
		let post_id = post["id"].as_str().unwrap();

		let response = app
			.post(&format!("/posts/{post_id}/comments"))
			.add_header(AUTHORIZATION, bearer(&jane.token))
			.json(&json!({ "content": "nice" }))
			.await;

		assert_eq!(response.status_code(), 201);

		let comment = response.json::<Value>();
		let comment_id = comment["id"].as_str().unwrap();
		assert_eq!(comment["content"], "nice");
		assert_eq!(comment["user"]["username"], "jane");

		let response = app
			.get(&format!("/posts/comments/{comment_id}"))
			.add_header(AUTHORIZATION, bearer(&john.token))
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["user"]["id"], jane.id.to_string());

		let feed = app
			.get("/posts/feed")
			.add_header(AUTHORIZATION, bearer(&john.token))
			.await
			.json::<Value>();

		assert_eq!(feed[0]["comments"][0]["id"], comment["id"]);

		// Only the author may delete, not the post owner
		let response = app
			.delete(&format!("/posts/{post_id}/comments/{comment_id}"))
			.add_header(AUTHORIZATION, bearer(&john.token))
			.await;

		assert_eq!(response.status_code(), 403);

		let response = app
			.delete(&format!("/posts/{post_id}/comments/{comment_id}"))
			.add_header(AUTHORIZATION, bearer(&jane.token))
			.await;

		assert_eq!(response.status_code(), 200);
		assert_eq!(response.json::<Value>()["id"], comment["id"]);

		let response = app
			.get(&format!("/posts/comments/{comment_id}"))
			.add_header(AUTHORIZATION, bearer(&john.token))
			.await;

		assert_eq!(response.status_code(), 404);

		let feed = app
			.get("/posts/feed")
			.add_header(AUTHORIZATION, bearer(&john.token))
			.await
			.json::<Value>();

		assert_eq!(feed[0]["comments"], json!([]));
	}

	#[tokio::test]
	async fn test_comment_must_belong_to_post() {
		let (app, _dir) = app_with_uploads();
		let john = register(&app, "john").await;
		let first = upload(&app, &john.token, "").await;
		let second = upload(&app, &john.token, "").await;

		let comment = app
			.post(&format!("/posts/{}/comments", first["id"].as_str().unwrap()))
			.add_header(AUTHORIZATION, bearer(&john.token))
			.json(&json!({ "content": "mine" }))
			.await
			.json::<Value>();

		let response = app
			.delete(&format!(
				"/posts/{}/comments/{}",
				second["id"].as_str().unwrap(),
				comment["id"].as_str().unwrap()
			))
			.add_header(AUTHORIZATION, bearer(&john.token))
			.await;

		assert_eq!(response.status_code(), 404);
	}

	#[tokio::test]
	async fn test_comment_validation() {
		let (app, _dir) = app_with_uploads();
		let john = register(&app, "john").await;
		let post = upload(&app, &john.token, "").await;
		let comments = format!("/posts/{}/comments", post["id"].as_str().unwrap());

		for body in [
			json!({ "content": "" }),
			json!({ "content": "x".repeat(1001) }),
			json!({ "content": "hi", "pinned": true }),
		] {
			let response = app
				.post(&comments)
				.add_header(AUTHORIZATION, bearer(&john.token))
				.json(&body)
				.await;

			assert_eq!(response.status_code(), 400);
		}

		let response = app
			.post(&format!("/posts/{}/comments", Uuid::new_v4()))
			.add_header(AUTHORIZATION, bearer(&john.token))
			.json(&json!({ "content": "hello?" }))
			.await;

		assert_eq!(response.status_code(), 404);
	}
}
