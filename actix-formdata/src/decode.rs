use std::borrow::Cow;

use crate::{
    field::{FieldSlot, File, NativeKind},
    form::{FieldSchema, FormData, ParsedForm},
    CoercionError, FormDataError,
};

/// Tag key looked up when no other is configured.
pub const DEFAULT_TAG_KEY: &str = "formdata";

/// Wire name marking a field as excluded from decoding.
pub const EXCLUDED: &str = "-";

/// Resolved wire name and file-ness of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldTag {
    pub name: &'static str,
    pub is_file: bool,
}

impl FieldTag {
    pub fn is_excluded(&self) -> bool {
        self.name == EXCLUDED
    }
}

/// Wire name of a field under `tag_key`.
pub fn wire_name(schema: &FieldSchema, tag_key: &str) -> Result<&'static str, FormDataError> {
    match schema.tag(tag_key) {
        None => Ok(schema.name),
        Some(tag) if tag.contains(',') => Err(FormDataError::TooManyTags { field: schema.name }),
        Some(tag) => Ok(tag),
    }
}

pub fn classify(schema: &FieldSchema, tag_key: &str, kind: NativeKind) -> Result<FieldTag, FormDataError> {
    Ok(FieldTag {
        name: wire_name(schema, tag_key)?,
        is_file: kind.is_file(),
    })
}

/// Convert a text value into the field behind `slot`.
pub fn coerce_text(slot: FieldSlot<'_>, text: &str) -> Result<(), CoercionError> {
    match slot {
        FieldSlot::Custom(hook) => hook(text).map_err(CoercionError::Custom),
        FieldSlot::Builtin(field) => field.decode_text(text),
        FieldSlot::Unsupported => Ok(()),
    }
}

/// Assign uploaded files to the field behind `slot`.
pub fn coerce_file(slot: FieldSlot<'_>, files: &[File]) {
    if let FieldSlot::Builtin(field) = slot {
        field.assign_files(files);
    }
}

/// Decodes parsed forms into [`FormData`] structs.
#[derive(Debug, Clone)]
pub struct Decoder {
    tag_key: Cow<'static, str>,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(DEFAULT_TAG_KEY)
    }
}

impl Decoder {
    pub fn new(tag_key: impl Into<Cow<'static, str>>) -> Self {
        Self {
            tag_key: tag_key.into(),
        }
    }

    pub fn tag_key(&self) -> &str {
        &self.tag_key
    }

    /// Wire names of every non-excluded field of `T`, paired with its upload limit.
    pub fn wire_names<T: FormData>(&self) -> Result<Vec<(&'static str, Option<usize>)>, FormDataError> {
        let mut names = Vec::new();
        for schema in T::schema() {
            let name = wire_name(schema, &self.tag_key)?;
            if name != EXCLUDED {
                names.push((name, schema.max_size));
            }
        }
        Ok(names)
    }

    /// Fill `out` from `form`.
    ///
    /// Every field is classified before any is written, so a tag error leaves
    /// `out` untouched. A coercion error stops decoding; fields decoded before
    /// it keep their new values.
    pub fn decode<T: FormData>(&self, form: &ParsedForm, out: &mut T) -> Result<(), FormDataError> {
        if form.is_empty() {
            tracing::trace!("empty form, nothing to decode");
            return Ok(());
        }

        let slots = out.fields();
        let tags = T::schema()
            .iter()
            .zip(&slots)
            .map(|(schema, slot)| classify(schema, &self.tag_key, slot.kind()))
            .collect::<Result<Vec<_>, _>>()?;

        for ((schema, slot), tag) in T::schema().iter().zip(slots).zip(tags) {
            if tag.is_excluded() {
                tracing::trace!(field = schema.name, "field excluded");
                continue;
            }

            let values = form.values(tag.name);
            let files = form.files(tag.name);
            if values.is_empty() && files.is_empty() {
                tracing::trace!(field = schema.name, wire_name = tag.name, "no value submitted");
                continue;
            }

            if slot.kind() == NativeKind::Unsupported {
                tracing::trace!(field = schema.name, wire_name = tag.name, "unsupported field type, skipping");
                continue;
            }

            if tag.is_file {
                if files.is_empty() {
                    tracing::trace!(field = schema.name, wire_name = tag.name, "no file submitted");
                    continue;
                }
                coerce_file(slot, files);
            } else if let Some(text) = values.first() {
                coerce_text(slot, text).map_err(|source| {
                    tracing::debug!(field = schema.name, wire_name = tag.name, error = %source, "coercion failed");
                    FormDataError::Coercion {
                        field: schema.name,
                        wire_name: tag.name,
                        source,
                    }
                })?;
            }
        }

        Ok(())
    }
}

/// Decode `form` into `out` using the default `formdata` tag key.
pub fn decode<T: FormData>(form: &ParsedForm, out: &mut T) -> Result<(), FormDataError> {
    Decoder::default().decode(form, out)
}
