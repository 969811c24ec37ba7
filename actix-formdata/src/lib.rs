//! Decode multipart forms into typed structs.
//!
//! ```ignore
//! use actix_formdata::{File, FormData, Multipart};
//!
//! #[derive(Default, FormData)]
//! struct Upload {
//!     #[form(formdata = "title")]
//!     title: String,
//!     #[form(formdata = "image", max_size = 5MiB)]
//!     image: Option<File>,
//!     #[form(formdata = "-")]
//!     owner: String,
//! }
//!
//! async fn upload(form: Multipart<Upload>) -> String {
//!     form.title.clone()
//! }
//! ```

mod config;
mod error;
mod extractor;

pub mod decode;
pub mod field;
/// Don't implement [`form::FormData`] directly, use [`actix_formdata_derive::FormData`].
pub mod form;

pub use config::*;
pub use decode::{decode, Decoder, FieldTag};
pub use error::*;
pub use extractor::*;
pub use field::{BoxError, File, NativeKind, UnmarshalFormData};
pub use form::ParsedForm;

pub use actix_formdata_derive::FormData;
