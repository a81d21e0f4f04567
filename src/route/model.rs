use std::borrow::Cow;

use serde::Serialize;

/// A response that only carries a human-readable confirmation.
#[derive(Debug, Serialize)]
pub struct Message {
	pub message: Cow<'static, str>,
}

impl Message {
	pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
		Self {
			message: message.into(),
		}
	}
}
