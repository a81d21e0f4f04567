mod model;

use proc_macro::TokenStream;

/// Creates the input structs `CreateX` and `UpdateX` for the model `X`.
/// Every field of `UpdateX` is wrapped in an `Option`.
///
/// Fields with #[serde(skip_deserializing)] or #[serde(skip)] are left out of both.
/// All other fields are copied verbatim (including attributes).
///
/// Pass `create` and/or `update` to only emit those structs, e.g. `#[model(update)]`.
/// With no arguments, both are emitted.
#[proc_macro_attribute]
pub fn model(args: TokenStream, input: TokenStream) -> TokenStream {
	model::from_input(args, input)
}
