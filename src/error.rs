use std::borrow::Cow;

use axum::{
	body::Body,
	extract::{
		multipart::{MultipartError, MultipartRejection},
		rejection,
	},
	http::{header, Response, StatusCode},
	response::IntoResponse,
	Json,
};
use serde::Serialize;
use tower_governor::GovernorError;

use crate::store;

/// Shared error type for everything that is not a route-specific rejection.
///
/// The Display trait is not sent to the client, so it can show
/// sensitive information.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
	#[error("validation error: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error("json error: {0}")]
	Json(#[from] rejection::JsonRejection),
	#[error("path error: {0}")]
	Path(#[from] rejection::PathRejection),
	#[error("multipart error: {0}")]
	Multipart(#[from] MultipartRejection),
	#[error("multipart field error: {0}")]
	MultipartField(#[from] MultipartError),
	#[error("store error: {0}")]
	Store(#[from] store::Error),
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
	#[error("rate limit error: {0}")]
	RateLimit(#[from] GovernorError),
}

/// The body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
	pub message: Cow<'static, str>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub errors: Vec<String>,
}

impl ErrorResponse {
	pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
		Self {
			message: message.into(),
			errors: Vec::new(),
		}
	}
}

/// A route-level rejection with a fixed status and a client-safe message.
pub trait ErrorShape: std::error::Error {
	fn status(&self) -> StatusCode;

	/// The message sent to the client. Defaults to the Display output.
	fn message(&self) -> Cow<'static, str> {
		self.to_string().into()
	}
}

/// Either a shared [`AppError`] or a rejection from a single route module.
#[derive(Debug, thiserror::Error)]
pub enum RouteError<T> {
	#[error(transparent)]
	App(AppError),
	#[error(transparent)]
	Route(T),
}

impl<T: ErrorShape> From<T> for RouteError<T> {
	fn from(error: T) -> Self {
		Self::Route(error)
	}
}

impl<T> From<AppError> for RouteError<T> {
	fn from(error: AppError) -> Self {
		Self::App(error)
	}
}

impl<T> From<store::Error> for RouteError<T> {
	fn from(error: store::Error) -> Self {
		Self::App(error.into())
	}
}

impl<T> From<std::io::Error> for RouteError<T> {
	fn from(error: std::io::Error) -> Self {
		Self::App(error.into())
	}
}

impl<T> From<MultipartError> for RouteError<T> {
	fn from(error: MultipartError) -> Self {
		Self::App(error.into())
	}
}

impl AppError {
	pub fn status(&self) -> StatusCode {
		match self {
			Self::Validation(..) | Self::Json(..) | Self::Path(..) | Self::Multipart(..) => {
				StatusCode::BAD_REQUEST
			}
			Self::MultipartField(error) => error.status(),
			Self::RateLimit(GovernorError::TooManyRequests { .. }) => StatusCode::TOO_MANY_REQUESTS,
			Self::RateLimit(..) | Self::Store(..) | Self::Io(..) => {
				StatusCode::INTERNAL_SERVER_ERROR
			}
		}
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response<Body> {
		let status = self.status();

		let body = match self {
			Self::Validation(errors) => ErrorResponse {
				message: "validation failed".into(),
				errors: errors
					.field_errors()
					.into_iter()
					.flat_map(|(field, errors)| {
						errors.iter().map(move |error| match error.message {
							Some(ref message) => format!("{field}: {message}"),
							None => format!("{field}: {}", error.code),
						})
					})
					.collect(),
			},
			Self::Json(error) => ErrorResponse::new(error.body_text()),
			Self::Path(error) => ErrorResponse::new(error.body_text()),
			Self::Multipart(error) => ErrorResponse::new(error.body_text()),
			Self::MultipartField(error) => ErrorResponse::new(error.body_text()),
			Self::RateLimit(GovernorError::TooManyRequests { wait_time, .. }) => {
				ErrorResponse::new(format!("too many requests, retry in {wait_time}s"))
			}
			error => {
				tracing::error!(%error, "request failed");
				ErrorResponse::new("internal server error")
			}
		};

		(status, Json(body)).into_response()
	}
}

/// Fallback for requests that match no route.
pub async fn not_found() -> Response<Body> {
	(StatusCode::NOT_FOUND, Json(ErrorResponse::new("not found"))).into_response()
}

/// Gives client errors produced outside the handlers, such as a 405 from the
/// router or a 404 from the upload directory, the usual JSON body.
pub async fn fill_empty_error(response: Response<Body>) -> Response<Body> {
	let status = response.status();

	if !status.is_client_error() || response.headers().contains_key(header::CONTENT_TYPE) {
		return response;
	}

	let message = status
		.canonical_reason()
		.unwrap_or("request failed")
		.to_lowercase();
	let mut filled = (status, Json(ErrorResponse::new(message))).into_response();

	if let Some(allow) = response.headers().get(header::ALLOW) {
		filled.headers_mut().insert(header::ALLOW, allow.clone());
	}

	filled
}

impl<T> IntoResponse for RouteError<T>
where
	T: ErrorShape,
{
	fn into_response(self) -> Response<Body> {
		match self {
			Self::App(error) => error.into_response(),
			Self::Route(error) => {
				let status = error.status();

				if status.is_server_error() {
					tracing::error!(%error, "request failed");
				}

				(status, Json(ErrorResponse::new(error.message()))).into_response()
			}
		}
	}
}
