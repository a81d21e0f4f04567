//! Uploaded image files.
//!
//! Images live as plain files in one directory, which the router serves
//! read-only under [`PUBLIC_PREFIX`]. Posts store the public path.

use std::{
	io,
	path::{Path, PathBuf},
	sync::Arc,
};

use uuid::Uuid;

pub const PUBLIC_PREFIX: &str = "/uploads";

const MAX_NAME_LENGTH: usize = 64;

#[derive(Clone, Debug)]
pub struct Uploads {
	dir: Arc<PathBuf>,
}

impl Uploads {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self {
			dir: Arc::new(dir.into()),
		}
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	/// Writes the image to disk and returns its public path.
	pub async fn save(&self, original_name: Option<&str>, bytes: &[u8]) -> io::Result<String> {
		tokio::fs::create_dir_all(self.dir.as_path()).await?;

		let name = format!(
			"{}_{}",
			Uuid::new_v4().simple(),
			sanitize_file_name(original_name.unwrap_or_default())
		);

		tokio::fs::write(self.dir.join(&name), bytes).await?;

		Ok(format!("{PUBLIC_PREFIX}/{name}"))
	}

	/// Removes a file previously returned by [`Uploads::save`].
	pub async fn remove(&self, public_path: &str) -> io::Result<()> {
		let Some(name) = public_path
			.strip_prefix(PUBLIC_PREFIX)
			.and_then(|rest| rest.strip_prefix('/'))
			.filter(|name| !name.contains(['/', '\\']) && !name.starts_with('.'))
		else {
			return Err(io::Error::new(
				io::ErrorKind::InvalidInput,
				"not an upload path",
			));
		};

		tokio::fs::remove_file(self.dir.join(name)).await
	}
}

/// Reduces a client-supplied file name to a safe, short, single path component.
pub fn sanitize_file_name(name: &str) -> String {
	let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

	let cleaned = base
		.chars()
		.map(|c| {
			if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
				c
			} else {
				'_'
			}
		})
		.collect::<String>();

	let cleaned = cleaned.trim_start_matches('.');
	let cleaned = &cleaned[cleaned.len().saturating_sub(MAX_NAME_LENGTH)..];

	if cleaned.is_empty() {
		"image".into()
	} else {
		cleaned.into()
	}
}
