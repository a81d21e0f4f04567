#![warn(clippy::pedantic)]

mod config;
mod error;
mod extract;
mod feed;
mod media;
mod model;
mod ratelimit;
mod route;
mod store;
#[cfg(test)]
mod test;
mod token;
mod trace;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use argon2::Argon2;
use axum::{
	body::Body,
	extract::DefaultBodyLimit,
	middleware,
	http::{header, HeaderName, Response},
	Router,
};
use tower_governor::GovernorLayer;
use tower_http::{
	compression::CompressionLayer,
	cors::CorsLayer,
	request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	services::ServeDir,
	trace::TraceLayer,
};

use config::Config;
use media::Uploads;
use store::{MemoryStore, PgStore};
use token::Tokens;

pub use store::Database;

pub type AppState = State;

const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// The shared application state.
///
/// This should contain all shared dependencies that handlers need to access,
/// such as the document store, the token keys, or the password hasher.
#[derive(Clone, axum::extract::FromRef)]
pub struct State {
	pub database: Database,
	pub tokens: Tokens,
	pub hasher: Argon2<'static>,
	pub uploads: Uploads,
}

/// Builds the full application router.
///
/// `rate_limit` needs the peer address, so the router must then be served
/// with [`Router::into_make_service_with_connect_info`].
pub fn router(state: AppState, max_upload_bytes: usize, rate_limit: bool) -> Router {
	let mut auth = route::auth::routes();
	let mut api = Router::new()
		.nest("/posts", route::post::routes())
		.nest("/user", route::user::routes());

	if rate_limit {
		let default = ratelimit::default();
		let secure = ratelimit::secure();

		ratelimit::cleanup_old_limits(&[&default, &secure]);

		auth = auth.layer(GovernorLayer { config: secure });
		api = api.layer(GovernorLayer { config: default });
	}

	let uploads = ServeDir::new(state.uploads.dir());

	Router::new()
		.nest("/auth", auth)
		.merge(api)
		.nest_service(media::PUBLIC_PREFIX, uploads)
		.fallback(error::not_found)
		.layer(middleware::map_response(error::fill_empty_error))
		.layer(DefaultBodyLimit::max(max_upload_bytes))
		.layer(CompressionLayer::new())
		.layer(CorsLayer::permissive().expose_headers([header::CONTENT_TYPE, REQUEST_ID]))
		.layer(PropagateRequestIdLayer::new(REQUEST_ID))
		.layer(TraceLayer::new_for_http().on_response(
			|response: &Response<Body>, latency: Duration, _span: &tracing::Span| {
				tracing::info!(
					histogram.latency_ms = latency.as_secs_f64() * 1000.0,
					status = response.status().as_u16(),
					"finished request"
				);
			},
		))
		.layer(SetRequestIdLayer::new(REQUEST_ID, MakeRequestUuid))
		.with_state(state)
}

async fn shutdown_signal() {
	if let Err(error) = tokio::signal::ctrl_c().await {
		tracing::error!(%error, "failed to listen for shutdown signal");
	}

	tracing::info!("shutting down");
}

#[tokio::main]
async fn main() {
	dotenvy::dotenv().ok();

	let config = Config::from_env().expect("invalid configuration");
	let _guard = trace::init_tracing_subscriber(config.log_level, config.otel);

	let database: Database = match config.database_url {
		Some(ref url) => Arc::new(
			PgStore::connect(url, config.database_max_connections)
				.await
				.expect("failed to connect to database"),
		),
		None => {
			tracing::warn!("DATABASE_URL is not set, documents are kept in memory");

			Arc::new(MemoryStore::new())
		}
	};

	let state = State {
		database,
		tokens: Tokens::new(config.jwt_secret.as_bytes(), config.token_ttl),
		hasher: Argon2::default(),
		uploads: Uploads::new(config.upload_dir.clone()),
	};

	let app = router(state, config.max_upload_bytes, config.rate_limit);

	let listener = tokio::net::TcpListener::bind((config.host, config.port))
		.await
		.expect("failed to bind to port");

	tracing::info!("listening on {}:{}", config.host, config.port);

	axum::serve(
		listener,
		app.into_make_service_with_connect_info::<SocketAddr>(),
	)
	.with_graceful_shutdown(shutdown_signal())
	.await
	.expect("server error");
}
