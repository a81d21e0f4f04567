use std::{net::IpAddr, path::PathBuf, str::FromStr};

use chrono::{Duration, Utc};

use tracing::Level;

/// Minimum length of `JWT_SECRET`, in bytes.
pub const MIN_SECRET_LENGTH: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{0} must be set")]
	Missing(&'static str),
	#[error("{name} has an invalid value {value:?}")]
	Invalid { name: &'static str, value: String },
	#[error("JWT_SECRET must be at least {MIN_SECRET_LENGTH} bytes")]
	ShortSecret,
}

/// Runtime configuration, read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Config {
	pub host: IpAddr,
	pub port: u16,
	/// When unset, documents are kept in memory and lost on restart.
	pub database_url: Option<String>,
	pub database_max_connections: u32,
	pub jwt_secret: String,
	pub token_ttl: Duration,
	pub upload_dir: PathBuf,
	pub max_upload_bytes: usize,
	pub log_level: Level,
	pub otel: bool,
	pub rate_limit: bool,
}

impl Config {
	pub fn from_env() -> Result<Self, Error> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Builds the configuration from an arbitrary variable source.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
		let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

		let jwt_secret = lookup("JWT_SECRET").ok_or(Error::Missing("JWT_SECRET"))?;

		if jwt_secret.len() < MIN_SECRET_LENGTH {
			return Err(Error::ShortSecret);
		}

		let token_ttl = token_ttl(var("TOKEN_TTL_HOURS", "720"))?;

		Ok(Self {
			host: typed("HOST", var("HOST", "127.0.0.1"))?,
			port: typed("PORT", var("PORT", "3000"))?,
			database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
			database_max_connections: typed(
				"DATABASE_MAX_CONNECTIONS",
				var("DATABASE_MAX_CONNECTIONS", "10"),
			)?,
			jwt_secret,
			token_ttl,
			upload_dir: PathBuf::from(var("UPLOAD_DIR", "uploads")),
			max_upload_bytes: typed("MAX_UPLOAD_BYTES", var("MAX_UPLOAD_BYTES", "10485760"))?,
			log_level: typed("LOG_LEVEL", var("LOG_LEVEL", "info"))?,
			otel: typed("OTEL_ENABLED", var("OTEL_ENABLED", "false"))?,
			rate_limit: typed("RATE_LIMIT", var("RATE_LIMIT", "true"))?,
		})
	}
}

/// Token lifetimes must be positive and keep expiry times representable.
fn token_ttl(value: String) -> Result<Duration, Error> {
	let hours: i64 = typed("TOKEN_TTL_HOURS", value)?;

	Duration::try_hours(hours)
		.filter(|ttl| *ttl > Duration::zero())
		.filter(|ttl| Utc::now().checked_add_signed(*ttl).is_some())
		.ok_or(Error::Invalid {
			name: "TOKEN_TTL_HOURS",
			value: hours.to_string(),
		})
}

fn typed<T: FromStr>(name: &'static str, value: String) -> Result<T, Error> {
	value.parse().map_err(|_| Error::Invalid { name, value })
}
