use std::collections::HashMap;

use crate::field::{FieldSlot, File};

/// A struct that can be decoded from a multipart form.
///
/// This shouldn't be implemented manually.
/// Use [`actix_formdata_derive::FormData`].
pub trait FormData {
    /// Static description of every field, in declaration order.
    fn schema() -> &'static [FieldSchema];

    /// Writable views of every field, in the same order as [`FormData::schema`].
    fn fields(&mut self) -> Vec<FieldSlot<'_>>;
}

/// Declared metadata of one struct field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSchema {
    /// Field name as written in the struct.
    pub name: &'static str,
    /// `(tag key, tag value)` pairs from `#[form(key = "value")]`.
    pub tags: &'static [(&'static str, &'static str)],
    /// Upload limit from `#[form(max_size = ...)]`.
    pub max_size: Option<usize>,
}

impl FieldSchema {
    /// Tag value registered under `key`, if any.
    pub fn tag(&self, key: &str) -> Option<&'static str> {
        self.tags
            .iter()
            .find(|(tag_key, _)| *tag_key == key)
            .map(|(_, value)| *value)
    }
}

/// Buffered contents of a multipart form.
#[derive(Debug, Clone, Default)]
pub struct ParsedForm {
    values: HashMap<String, Vec<String>>,
    files: HashMap<String, Vec<File>>,
}

impl ParsedForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_value(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.entry(name.into()).or_default().push(value.into());
    }

    pub fn push_file(&mut self, name: impl Into<String>, file: File) {
        self.files.entry(name.into()).or_default().push(file);
    }

    /// Text values submitted under `name`, in submission order.
    pub fn values(&self, name: &str) -> &[String] {
        self.values.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Files submitted under `name`, in submission order.
    pub fn files(&self, name: &str) -> &[File] {
        self.files.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.files.is_empty()
    }
}
