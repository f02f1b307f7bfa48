mod error;
mod route;

use proc_macro::TokenStream;
use syn::DeriveInput;
use syn::ItemFn;
use syn::parse_macro_input;

/// Implements `crate::error::NoteblogError` for an error enum
///
/// ```ignore
/// #[derive(Debug, thiserror::Error, NoteblogError)]
/// #[noteblog_error(base_id = "note")]
/// enum NoteError {
///     #[error("Note '{note_id}' could not be found")]
///     #[noteblog_error(status = 404)]
///     NotFound { note_id: i64 },
///     #[error(transparent)]
///     Database(#[from] noteblog_models::Error),
/// }
/// ```
///
/// Each variant gets the type `noteblog:<base_id>:<Variant>` and the given status
/// (`default_status` on the enum, or 500). The named fields of a variant make up the
/// error context unless `no_context` is set. Every variant is registered for the
/// OpenAPI documentation.
#[proc_macro_derive(NoteblogError, attributes(noteblog_error))]
pub fn noteblog_error(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    error::expand(&input)
        .unwrap_or_else(darling::Error::write_errors)
        .into()
}

/// Registers an axum handler documented with `#[utoipa::path]` in the router's OpenAPI routes
///
/// Must be placed above the `#[utoipa::path]` attribute.
#[proc_macro_attribute]
pub fn route(_attr: TokenStream, input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as ItemFn);
    route::route(&input)
        .unwrap_or_else(darling::Error::write_errors)
        .into()
}
