use std::cell::Cell;

use actix_web::web::Bytes;
use chrono::{DateTime, FixedOffset, Utc};

use crate::CoercionError;

/// Error type returned by [`UnmarshalFormData`] implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Representing a file in a multipart form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct File {
    pub content_type: String,
    pub name: String,
    pub bytes: Bytes,
}

impl File {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            content_type: content_type.into(),
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Size of the buffered contents in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Custom decoding of a text form value.
///
/// A field whose type implements this trait always goes through it, even when
/// the type would otherwise be handled as a built-in. `Option<T>` fields are
/// filled with `T::default()` before the hook runs.
///
/// ```ignore
/// #[derive(Default)]
/// struct Tags(Vec<String>);
///
/// impl UnmarshalFormData for Tags {
///     fn unmarshal_form_data(&mut self, text: &str) -> Result<(), BoxError> {
///         self.0 = text.split(' ').map(str::to_owned).collect();
///         Ok(())
///     }
/// }
/// ```
pub trait UnmarshalFormData {
    fn unmarshal_form_data(&mut self, text: &str) -> Result<(), BoxError>;
}

/// Native type of a destination field, as seen by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeKind {
    String,
    Int,
    Uint,
    Float,
    Bool,
    Timestamp,
    File,
    OptionalFile,
    FileList,
    Custom,
    Unsupported,
}

impl NativeKind {
    /// Whether values for this kind come from uploaded parts.
    pub fn is_file(self) -> bool {
        matches!(self, Self::File | Self::OptionalFile | Self::FileList)
    }
}

/// Built-in coercion from wire values into a field type.
///
/// Implemented for strings, integers, floats, `bool`, chrono timestamps and
/// the file handle types. Types outside of this set should implement
/// [`UnmarshalFormData`] instead.
pub trait FormField {
    fn kind(&self) -> NativeKind;

    fn decode_text(&mut self, _text: &str) -> Result<(), CoercionError> {
        Ok(())
    }

    fn assign_files(&mut self, _files: &[File]) {}
}

impl FormField for String {
    fn kind(&self) -> NativeKind {
        NativeKind::String
    }

    fn decode_text(&mut self, text: &str) -> Result<(), CoercionError> {
        text.clone_into(self);
        Ok(())
    }
}

macro_rules! impl_form_field_parse {
    ($kind:ident => $($ty:ty),*) => {
        $(
            impl FormField for $ty {
                fn kind(&self) -> NativeKind {
                    NativeKind::$kind
                }

                fn decode_text(&mut self, text: &str) -> Result<(), CoercionError> {
                    *self = text.parse::<$ty>()?;
                    Ok(())
                }
            }
        )*
    };
}

impl_form_field_parse!(Int => i8, i16, i32, i64, i128, isize);
impl_form_field_parse!(Uint => u8, u16, u32, u64, u128, usize);
impl_form_field_parse!(Float => f32, f64);

/// Parse the conventional boolean literals.
pub(crate) fn parse_bool(text: &str) -> Result<bool, CoercionError> {
    match text {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(CoercionError::Bool(text.to_owned())),
    }
}

impl FormField for bool {
    fn kind(&self) -> NativeKind {
        NativeKind::Bool
    }

    fn decode_text(&mut self, text: &str) -> Result<(), CoercionError> {
        *self = parse_bool(text)?;
        Ok(())
    }
}

impl FormField for DateTime<FixedOffset> {
    fn kind(&self) -> NativeKind {
        NativeKind::Timestamp
    }

    fn decode_text(&mut self, text: &str) -> Result<(), CoercionError> {
        *self = DateTime::parse_from_rfc3339(text)?;
        Ok(())
    }
}

impl FormField for DateTime<Utc> {
    fn kind(&self) -> NativeKind {
        NativeKind::Timestamp
    }

    fn decode_text(&mut self, text: &str) -> Result<(), CoercionError> {
        *self = DateTime::parse_from_rfc3339(text)?.with_timezone(&Utc);
        Ok(())
    }
}

impl FormField for File {
    fn kind(&self) -> NativeKind {
        NativeKind::File
    }

    fn assign_files(&mut self, files: &[File]) {
        if let Some(first) = files.first() {
            *self = first.clone();
        }
    }
}

impl FormField for Option<File> {
    fn kind(&self) -> NativeKind {
        NativeKind::OptionalFile
    }

    fn assign_files(&mut self, files: &[File]) {
        if let Some(first) = files.first() {
            *self = Some(first.clone());
        }
    }
}

impl FormField for Vec<File> {
    fn kind(&self) -> NativeKind {
        NativeKind::FileList
    }

    fn assign_files(&mut self, files: &[File]) {
        if !files.is_empty() {
            *self = files.to_vec();
        }
    }
}

type TextHook<'a> = Box<dyn FnOnce(&str) -> Result<(), BoxError> + 'a>;

/// Writable view of one field for a single decode call.
pub enum FieldSlot<'a> {
    Custom(TextHook<'a>),
    Builtin(&'a mut dyn FormField),
    Unsupported,
}

impl FieldSlot<'_> {
    pub fn kind(&self) -> NativeKind {
        match self {
            Self::Custom(_) => NativeKind::Custom,
            Self::Builtin(field) => field.kind(),
            Self::Unsupported => NativeKind::Unsupported,
        }
    }
}

impl std::fmt::Debug for FieldSlot<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("FieldSlot").field(&self.kind()).finish()
    }
}

/// Capability query used by the derive macro.
///
/// Wrap a field borrow and call `resolve` on `&&&&Probe`: method resolution
/// picks the most specific capability the field type has, in order custom
/// hook, optional custom hook, built-in, unsupported.
#[doc(hidden)]
pub struct Probe<'a, T>(Cell<Option<&'a mut T>>);

impl<'a, T> Probe<'a, T> {
    pub fn new(field: &'a mut T) -> Self {
        Self(Cell::new(Some(field)))
    }

    fn take(&self) -> Option<&'a mut T> {
        self.0.take()
    }
}

#[doc(hidden)]
pub trait ResolveCustom<'a> {
    fn resolve(self) -> FieldSlot<'a>;
}

impl<'a, T: UnmarshalFormData + 'a> ResolveCustom<'a> for &&&&Probe<'a, T> {
    fn resolve(self) -> FieldSlot<'a> {
        match self.take() {
            Some(field) => FieldSlot::Custom(Box::new(move |text: &str| field.unmarshal_form_data(text))),
            None => FieldSlot::Unsupported,
        }
    }
}

#[doc(hidden)]
pub trait ResolveOptionalCustom<'a> {
    fn resolve(self) -> FieldSlot<'a>;
}

impl<'a, T: UnmarshalFormData + Default + 'a> ResolveOptionalCustom<'a> for &&&Probe<'a, Option<T>> {
    fn resolve(self) -> FieldSlot<'a> {
        match self.take() {
            Some(field) => FieldSlot::Custom(Box::new(move |text: &str| {
                field.get_or_insert_with(T::default).unmarshal_form_data(text)
            })),
            None => FieldSlot::Unsupported,
        }
    }
}

#[doc(hidden)]
pub trait ResolveBuiltin<'a> {
    fn resolve(self) -> FieldSlot<'a>;
}

impl<'a, T: FormField + 'a> ResolveBuiltin<'a> for &&Probe<'a, T> {
    fn resolve(self) -> FieldSlot<'a> {
        match self.take() {
            Some(field) => FieldSlot::Builtin(field),
            None => FieldSlot::Unsupported,
        }
    }
}

#[doc(hidden)]
pub trait ResolveUnsupported<'a> {
    fn resolve(self) -> FieldSlot<'a>;
}

impl<'a, T> ResolveUnsupported<'a> for &Probe<'a, T> {
    fn resolve(self) -> FieldSlot<'a> {
        FieldSlot::Unsupported
    }
}
