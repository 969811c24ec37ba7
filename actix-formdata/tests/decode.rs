use std::collections::HashMap;

use actix_formdata::{
    decode,
    field::{FormField, NativeKind},
    form::FormData as _,
    BoxError, CoercionError, Decoder, File, FormData, FormDataError, ParsedForm,
    UnmarshalFormData,
};
use chrono::{DateTime, Duration, TimeZone, Utc};

#[derive(Debug, Default, PartialEq)]
struct TestFormData {
    test: i32,
}

impl UnmarshalFormData for TestFormData {
    fn unmarshal_form_data(&mut self, _value: &str) -> Result<(), BoxError> {
        self.test = 9000;
        Ok(())
    }
}

#[derive(Debug, Default, PartialEq)]
struct Celsius(f64);

impl UnmarshalFormData for Celsius {
    fn unmarshal_form_data(&mut self, text: &str) -> Result<(), BoxError> {
        let degrees = text.strip_suffix("°C").ok_or("expected a °C suffix")?;
        self.0 = degrees.parse()?;
        Ok(())
    }
}

#[derive(Debug, Default, FormData)]
struct Object {
    #[form(formdata = "number")]
    number: i64,
    #[form(formdata = "float")]
    float: f64,
    #[form(formdata = "-")]
    ignore: String,
    #[form(formdata = "foo")]
    string: String,
    #[form(formdata = "image")]
    file: Option<File>,
    #[form(formdata = "date")]
    date: DateTime<Utc>,
    #[form(formdata = "test")]
    test: Option<TestFormData>,
    #[form(formdata = "m")]
    m: HashMap<String, String>,
    #[form(formdata = "array")]
    array: Vec<String>,
}

fn image() -> File {
    File::new("README.md", "text/markdown", "# formdata\n")
}

fn full_form() -> ParsedForm {
    let mut form = ParsedForm::new();
    form.push_value("number", "42");
    form.push_value("float", "42.42");
    form.push_value("m", r#"{"fr":"asdsad"}"#);
    form.push_value("ignore", "i must be hidden");
    form.push_value("-", "i must be hidden too");
    form.push_value("foo", "");
    form.push_file("image", image());
    form.push_value("date", "2014-09-03T14:07:59.773Z");
    form.push_value("test", "whatever");
    form.push_value("array", r#"["caca", "popo"]"#);
    form
}

#[test]
fn decodes_every_supported_field() {
    let mut object = Object {
        string: "overwritten".to_owned(),
        ..Default::default()
    };
    decode(&full_form(), &mut object).unwrap();

    assert_eq!(object.number, 42);
    assert!((object.float - 42.42).abs() < f64::EPSILON);
    assert_eq!(object.ignore, "");
    assert_eq!(object.string, "");
    assert_eq!(object.file, Some(image()));
    assert_eq!(
        object.date,
        Utc.with_ymd_and_hms(2014, 9, 3, 14, 7, 59).unwrap() + Duration::milliseconds(773)
    );
    assert_eq!(object.test, Some(TestFormData { test: 9000 }));
    assert!(object.m.is_empty());
    assert!(object.array.is_empty());
}

#[test]
fn excluded_field_is_never_written() {
    let mut object = Object {
        ignore: "kept".to_owned(),
        ..Default::default()
    };
    decode(&full_form(), &mut object).unwrap();
    assert_eq!(object.ignore, "kept");
}

#[derive(Debug, Default, FormData)]
struct Naming {
    title: String,
    #[form(formdata = "subtitle")]
    subtitle: String,
    r#type: String,
    #[form(json = "description")]
    description: String,
}

#[test]
fn untagged_and_self_named_fields_match_declared_names() {
    let mut form = ParsedForm::new();
    form.push_value("title", "Hello");
    form.push_value("subtitle", "World");
    form.push_value("type", "post");
    form.push_value("description", "text");

    let mut naming = Naming::default();
    decode(&form, &mut naming).unwrap();
    assert_eq!(naming.title, "Hello");
    assert_eq!(naming.subtitle, "World");
    assert_eq!(naming.r#type, "post");
    assert_eq!(naming.description, "text");
}

#[test]
fn absent_values_leave_fields_untouched() {
    let mut object = Object {
        number: 7,
        float: 1.5,
        ..Default::default()
    };
    decode(&ParsedForm::new(), &mut object).unwrap();
    assert_eq!(object.number, 7);
    assert!((object.float - 1.5).abs() < f64::EPSILON);
    assert_eq!(object.file, None);
    assert_eq!(object.test, None);
}

#[test]
fn invalid_number_reports_field_and_keeps_value() {
    let mut form = ParsedForm::new();
    form.push_value("number", "forty-two");

    let mut object = Object {
        number: 7,
        ..Default::default()
    };
    let err = decode(&form, &mut object).unwrap_err();
    match err {
        FormDataError::Coercion {
            field,
            wire_name,
            source: CoercionError::Int(_),
        } => {
            assert_eq!(field, "number");
            assert_eq!(wire_name, "number");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(object.number, 7);

    let mut form = ParsedForm::new();
    form.push_value("float", "NaN-ish");
    assert!(decode(&form, &mut object).is_err());
    assert_eq!(object.float, 0.0);
}

#[test]
fn earlier_fields_keep_decoded_values_on_failure() {
    let mut form = ParsedForm::new();
    form.push_value("number", "42");
    form.push_value("float", "not a float");
    form.push_value("foo", "never reached");

    let mut object = Object::default();
    assert!(decode(&form, &mut object).is_err());
    assert_eq!(object.number, 42);
    assert_eq!(object.string, "");
}

#[test]
fn invalid_timestamp_is_an_error() {
    let mut form = ParsedForm::new();
    form.push_value("date", "not-a-date");
    let err = decode(&form, &mut Object::default()).unwrap_err();
    assert!(matches!(
        err,
        FormDataError::Coercion {
            source: CoercionError::Timestamp(_),
            ..
        }
    ));
}

#[derive(Debug, Default, FormData)]
struct Gallery {
    #[form(formdata = "cover")]
    cover: Option<File>,
    #[form(formdata = "photos")]
    photos: Vec<File>,
    #[form(formdata = "photos")]
    first_photo: File,
}

#[test]
fn files_are_assigned_in_submission_order() {
    let first = File::new("a.png", "image/png", &b"\x89PNG-a"[..]);
    let second = File::new("b.png", "image/png", &b"\x89PNG-b"[..]);
    let cover = File::new("cover.jpg", "image/jpeg", &b"jpeg"[..]);

    let mut form = ParsedForm::new();
    form.push_file("cover", cover.clone());
    form.push_file("cover", File::new("extra.jpg", "image/jpeg", &b"extra"[..]));
    form.push_file("photos", first.clone());
    form.push_file("photos", second.clone());

    let mut gallery = Gallery::default();
    decode(&form, &mut gallery).unwrap();
    assert_eq!(gallery.cover, Some(cover));
    assert_eq!(gallery.photos, vec![first.clone(), second]);
    assert_eq!(gallery.first_photo, first);
}

#[test]
fn file_fields_ignore_text_values() {
    let mut form = ParsedForm::new();
    form.push_value("cover", "not a file");

    form.push_value("photos", "not a file either");

    let kept = File::new("keep.png", "image/png", &b"keep"[..]);
    let mut gallery = Gallery {
        photos: vec![kept.clone()],
        first_photo: kept.clone(),
        ..Default::default()
    };
    decode(&form, &mut gallery).unwrap();
    assert_eq!(gallery.cover, None);
    assert_eq!(gallery.photos, vec![kept.clone()]);
    assert_eq!(gallery.first_photo, kept);
}

#[derive(Debug, Default, FormData)]
struct Thermostat {
    #[form(formdata = "target")]
    target: Celsius,
    #[form(formdata = "fallback")]
    fallback: Option<Celsius>,
}

#[test]
fn custom_hook_takes_priority() {
    let mut form = ParsedForm::new();
    form.push_value("target", "21.5°C");
    form.push_value("fallback", "18°C");

    let mut thermostat = Thermostat::default();
    decode(&form, &mut thermostat).unwrap();
    assert_eq!(thermostat.target, Celsius(21.5));
    assert_eq!(thermostat.fallback, Some(Celsius(18.0)));
}

/// Plain number through the built-in path, `N%` through the hook.
#[derive(Debug, Default, PartialEq)]
struct Percent(u8);

impl FormField for Percent {
    fn kind(&self) -> NativeKind {
        NativeKind::Uint
    }

    fn decode_text(&mut self, text: &str) -> Result<(), CoercionError> {
        self.0 = text.parse()?;
        Ok(())
    }
}

impl UnmarshalFormData for Percent {
    fn unmarshal_form_data(&mut self, text: &str) -> Result<(), BoxError> {
        self.0 = text.strip_suffix('%').ok_or("expected a % suffix")?.parse()?;
        Ok(())
    }
}

#[derive(Debug, Default, FormData)]
struct Volume {
    level: Percent,
}

#[test]
fn custom_hook_wins_over_builtin_impl() {
    let mut form = ParsedForm::new();
    form.push_value("level", "75%");

    let mut volume = Volume::default();
    decode(&form, &mut volume).unwrap();
    assert_eq!(volume.level, Percent(75));

    let mut form = ParsedForm::new();
    form.push_value("level", "40");
    let err = decode(&form, &mut volume).unwrap_err();
    assert!(matches!(
        err,
        FormDataError::Coercion {
            source: CoercionError::Custom(_),
            ..
        }
    ));
    assert_eq!(volume.level, Percent(75));
}

#[test]
fn custom_hook_errors_are_reported() {
    let mut form = ParsedForm::new();
    form.push_value("fallback", "21.5");

    let mut thermostat = Thermostat::default();
    let err = decode(&form, &mut thermostat).unwrap_err();
    assert!(matches!(
        err,
        FormDataError::Coercion {
            field: "fallback",
            source: CoercionError::Custom(_),
            ..
        }
    ));
    assert_eq!(thermostat.fallback, Some(Celsius::default()));
}

#[derive(Debug, Default, FormData)]
struct Misconfigured {
    #[form(formdata = "name")]
    name: String,
    #[form(formdata = "a,b", api = "b")]
    broken: String,
}

#[test]
fn multi_segment_tag_fails_before_any_write() {
    let mut form = ParsedForm::new();
    form.push_value("name", "Ferris");
    form.push_value("a", "x");

    for _ in 0..2 {
        let mut record = Misconfigured::default();
        let err = decode(&form, &mut record).unwrap_err();
        assert!(matches!(err, FormDataError::TooManyTags { field: "broken" }));
        assert_eq!(record.name, "");
    }

    let mut form = ParsedForm::new();
    form.push_value("name", "Ferris");
    form.push_value("b", "bee");
    let mut record = Misconfigured::default();
    Decoder::new("api").decode(&form, &mut record).unwrap();
    assert_eq!(record.name, "Ferris");
    assert_eq!(record.broken, "bee");
}

#[test]
fn only_first_text_value_is_used() {
    let mut form = ParsedForm::new();
    form.push_value("number", "1");
    form.push_value("number", "2");
    form.push_value("number", "not even a number");

    let mut object = Object::default();
    decode(&form, &mut object).unwrap();
    assert_eq!(object.number, 1);
}

#[derive(Debug, Default, FormData)]
struct Scalars {
    tiny: i8,
    count: u32,
    ratio: f32,
    enabled: bool,
    size: usize,
}

#[test]
fn scalars_use_native_widths() {
    let mut form = ParsedForm::new();
    form.push_value("tiny", "-12");
    form.push_value("count", "4000000000");
    form.push_value("ratio", "0.25");
    form.push_value("enabled", "T");
    form.push_value("size", "65536");

    let mut scalars = Scalars::default();
    decode(&form, &mut scalars).unwrap();
    assert_eq!(scalars.tiny, -12);
    assert_eq!(scalars.count, 4_000_000_000);
    assert_eq!(scalars.ratio, 0.25);
    assert!(scalars.enabled);
    assert_eq!(scalars.size, 65536);

    let mut form = ParsedForm::new();
    form.push_value("tiny", "200");
    assert!(decode(&form, &mut scalars).is_err());
    assert_eq!(scalars.tiny, -12);

    let mut form = ParsedForm::new();
    form.push_value("enabled", "yes");
    assert!(decode(&form, &mut scalars).is_err());
}

#[derive(Debug, Default, FormData)]
struct Wrapper<T> {
    label: String,
    inner: T,
}

#[test]
fn generic_fields_are_skipped() {
    let mut form = ParsedForm::new();
    form.push_value("label", "boxed");
    form.push_value("inner", "5");

    let mut wrapper = Wrapper::<u8>::default();
    decode(&form, &mut wrapper).unwrap();
    assert_eq!(wrapper.label, "boxed");
    assert_eq!(wrapper.inner, 0);
}

#[derive(Debug, Default, FormData)]
struct Limits {
    #[form(formdata = "avatar", max_size = 2KiB)]
    avatar: Option<File>,
    #[form(formdata = "-", max_size = 1MB)]
    hidden: Option<File>,
}

#[test]
fn schema_records_tags_and_limits() {
    let schema = Limits::schema();
    assert_eq!(schema.len(), 2);
    assert_eq!(schema[0].name, "avatar");
    assert_eq!(schema[0].tag("formdata"), Some("avatar"));
    assert_eq!(schema[0].max_size, Some(2048));
    assert_eq!(schema[1].max_size, Some(1_000_000));

    let names = Decoder::default().wire_names::<Limits>().unwrap();
    assert_eq!(names, vec![("avatar", Some(2048))]);
}
