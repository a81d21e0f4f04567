pub use crate::{
	feed::{FeedComment, FeedPost},
	model::Post,
};

use serde::Deserialize;
use validator::Validate;

/// Maximum caption length, in characters.
pub const MAX_CAPTION_LENGTH: usize = 2200;

#[derive(Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CommentInput {
	#[validate(length(min = 1, max = 1000))]
	pub content: String,
}
