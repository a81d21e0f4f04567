//! Helpers shared by the HTTP tests.

use std::sync::Arc;

use argon2::{Algorithm, Argon2, Params, Version};
use tempfile::TempDir;

pub use axum::http::{header::AUTHORIZATION, HeaderValue};
pub use axum_test::{
	multipart::{MultipartForm, Part},
	TestServer,
};
pub use serde_json::{json, Value};
pub use uuid::Uuid;

use crate::{media::Uploads, store::MemoryStore, token::Tokens, AppState, State};

pub const PASSWORD: &str = "hunter2hunter";

/// Just enough of a PNG header for the bytes to look like an image.
pub const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

const SECRET: &[u8] = b"test-secret-test-secret-test-sec";
const MAX_UPLOAD_BYTES: usize = 1024 * 1024;

pub struct Account {
	pub id: Uuid,
	pub token: String,
}

fn state(uploads: Uploads) -> AppState {
	// Cheap parameters, the defaults make every registration take a while
	let params = Params::new(256, 1, 1, None).expect("valid argon2 params");

	State {
		database: Arc::new(MemoryStore::new()),
		tokens: Tokens::new(SECRET, chrono::Duration::hours(1)),
		hasher: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
		uploads,
	}
}

fn server(uploads: Uploads) -> TestServer {
	TestServer::new(crate::router(state(uploads), MAX_UPLOAD_BYTES, false))
		.expect("failed to build test server")
}

/// A server for tests that never upload.
pub fn app() -> TestServer {
	server(Uploads::new(std::env::temp_dir().join("picshare-test-unused")))
}

/// A server storing uploads in a temporary directory, removed when the
/// returned [`TempDir`] is dropped.
pub fn app_with_uploads() -> (TestServer, TempDir) {
	let dir = tempfile::tempdir().expect("failed to create upload dir");

	(server(Uploads::new(dir.path())), dir)
}

pub fn bearer(token: &str) -> HeaderValue {
	HeaderValue::from_str(&format!("Bearer {token}")).expect("token is a valid header value")
}

/// Registers `username` with the email `<username>@example.com`.
pub async fn register(app: &TestServer, username: &str) -> Account {
	let response = app
		.post("/auth/register")
		.json(&json!({
			"email": format!("{username}@example.com"),
			"username": username,
			"password": PASSWORD,
		}))
		.await;

	assert_eq!(response.status_code(), 201);

	let body = response.json::<Value>();

	Account {
		id: body["user"]["id"].as_str().unwrap().parse().unwrap(),
		token: body["token"].as_str().unwrap().to_owned(),
	}
}

pub async fn login(app: &TestServer, username: &str) -> String {
	let response = app
		.post("/auth/login")
		.json(&json!({
			"email": format!("{username}@example.com"),
			"password": PASSWORD,
		}))
		.await;

	assert_eq!(response.status_code(), 200);

	response.json::<Value>()["token"].as_str().unwrap().to_owned()
}

/// Uploads [`PNG`] as `cat.png` and returns the created post.
pub async fn upload(app: &TestServer, token: &str, caption: &str) -> Value {
	let form = MultipartForm::new().add_text("caption", caption).add_part(
		"image",
		Part::bytes(PNG)
			.file_name("cat.png")
			.mime_type("image/png"),
	);

	let response = app
		.post("/posts/upload")
		.add_header(AUTHORIZATION, bearer(token))
		.multipart(form)
		.await;

	assert_eq!(response.status_code(), 201);

	response.json()
}

#[tokio::test]
async fn test_like_scenario() {
	let (app, _dir) = app_with_uploads();

	register(&app, "alice").await;
	let alice = login(&app, "alice").await;
	let post = upload(&app, &alice, "first light").await;
	let post_id = post["id"].as_str().unwrap();

	let bob = register(&app, "bob").await;
	let bob_token = login(&app, "bob").await;

	let response = app
		.post(&format!("/posts/{post_id}/like"))
		.add_header(AUTHORIZATION, bearer(&bob_token))
		.await;

	assert_eq!(response.status_code(), 200);

	let feed = app
		.get("/posts/feed")
		.add_header(AUTHORIZATION, bearer(&alice))
		.await
		.json::<Value>();

	assert_eq!(feed[0]["id"], post_id);
	assert_eq!(feed[0]["likes"], json!([bob.id]));

	let response = app
		.delete(&format!("/posts/{post_id}/like"))
		.add_header(AUTHORIZATION, bearer(&bob_token))
		.await;

	assert_eq!(response.status_code(), 200);

	let feed = app
		.get("/posts/feed")
		.add_header(AUTHORIZATION, bearer(&alice))
		.await
		.json::<Value>();

	assert_eq!(feed[0]["likes"], json!([]));
}

#[tokio::test]
async fn test_request_id_is_set() {
	let app = app();

	let response = app.get("/posts/feed").await;

	assert_eq!(response.status_code(), 401);
	assert!(!response.header("x-request-id").is_empty());
}

#[tokio::test]
async fn test_unknown_route() {
	let app = app();

	let response = app.get("/nope").await;

	assert_eq!(response.status_code(), 404);
	assert_eq!(response.json::<Value>()["message"], "not found");
}

#[tokio::test]
async fn test_wrong_method() {
	let app = app();

	let response = app.get("/auth/login").await;

	assert_eq!(response.status_code(), 405);
	assert_eq!(response.json::<Value>()["message"], "method not allowed");
	assert!(response.headers().contains_key("allow"));
}

#[tokio::test]
async fn test_missing_upload_is_json() {
	let (app, _dir) = app_with_uploads();

	let response = app.get("/uploads/nothing.png").await;

	assert_eq!(response.status_code(), 404);
	assert_eq!(response.json::<Value>()["message"], "not found");
}
