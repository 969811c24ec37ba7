use actix_web::HttpResponse;
use serde::Deserialize;

use crate::{decode::DEFAULT_TAG_KEY, Decoder, FormDataError};

type FormDataErrorHandler = Box<dyn Fn(FormDataError) -> HttpResponse + Send + Sync + 'static>;

/// Default limit on buffered multipart bytes (32 MiB).
pub const DEFAULT_MEMORY_LIMIT: usize = 32 << 20;

/// Config for form data, insert with [`actix_web::App::app_data`] to actix
#[derive(Deserialize)]
#[serde(default)]
pub struct FormDataConfig {
    /// Key of the `#[form(...)]` tag holding wire names.
    pub tag_key: String,
    /// Maximum number of bytes buffered from one request body.
    pub memory_limit: usize,
    #[serde(skip)]
    pub error_handler: Option<FormDataErrorHandler>,
}

impl FormDataConfig {
    pub fn set_error_handler<F>(mut self, error_handler: F) -> Self
    where
        F: Fn(FormDataError) -> HttpResponse + Send + Sync + 'static,
    {
        self.error_handler = Some(Box::new(error_handler));
        self
    }

    pub fn tag_key(mut self, tag_key: impl Into<String>) -> Self {
        self.tag_key = tag_key.into();
        self
    }

    pub fn memory_limit(mut self, limit: usize) -> Self {
        self.memory_limit = limit;
        self
    }

    pub fn decoder(&self) -> Decoder {
        Decoder::new(self.tag_key.clone())
    }
}

impl Default for FormDataConfig {
    fn default() -> Self {
        Self {
            tag_key: DEFAULT_TAG_KEY.to_owned(),
            memory_limit: DEFAULT_MEMORY_LIMIT,
            error_handler: None,
        }
    }
}
