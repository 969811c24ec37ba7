use std::{
    collections::HashMap,
    ops::{Deref, DerefMut},
    pin::Pin,
};

use actix_web::{
    dev::Payload,
    http::ConnectionType,
    web::BytesMut,
    FromRequest, HttpRequest, HttpResponse,
};
use futures::{Future, TryStreamExt};

use crate::{
    config::DEFAULT_MEMORY_LIMIT, form::FormData, Decoder, File, FormDataConfig, FormDataError, ParsedForm,
};

/// Extractor to decode multipart forms from the request
pub struct Multipart<T>(T);

impl<T> Multipart<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Multipart<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Multipart<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T: FormData + Default + 'static> FromRequest for Multipart<T> {
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let mut multipart = actix_multipart::Multipart::new(req.headers(), payload.take());
        let req_owned = req.to_owned();

        Box::pin(async move {
            let config = req_owned.app_data::<FormDataConfig>();
            let decoder = config.map(FormDataConfig::decoder).unwrap_or_default();
            let memory_limit = config.map_or(DEFAULT_MEMORY_LIMIT, |config| config.memory_limit);

            match extract::<T>(&decoder, memory_limit, &mut multipart).await {
                Ok(parsed) => Ok(Multipart(parsed)),
                Err(err) => Err(handle_error(err, config)),
            }
        })
    }
}

async fn extract<T: FormData + Default>(
    decoder: &Decoder,
    memory_limit: usize,
    multipart: &mut actix_multipart::Multipart,
) -> Result<T, FormDataError> {
    let form = multipart_to_form::<T>(decoder, memory_limit, multipart).await?;
    let mut out = T::default();
    decoder.decode(&form, &mut out)?;
    Ok(out)
}

fn handle_error(error: FormDataError, config: Option<&FormDataConfig>) -> actix_web::Error {
    let mut res = match config {
        Some(config) => match &config.error_handler {
            Some(error_handler) => error_handler(error),
            None => HttpResponse::BadRequest().body(error.to_string()),
        },
        None => HttpResponse::BadRequest().body(error.to_string()),
    };

    // We must do this manually because of a bug in actix_http
    // Ideally we would have all errors be a `actix_web::Error` by default
    // SEE: https://github.com/actix/actix-web/pull/2779
    res.head_mut().set_connection_type(ConnectionType::Close);

    actix_web::error::InternalError::from_response("invalid multipart", res).into()
}

/// Buffer a [`actix_multipart::Multipart`] body into a [`ParsedForm`].
///
/// Only parts named after a wire name of `T` are kept. Parts with a filename
/// become files, everything else must be UTF-8 text.
async fn multipart_to_form<T: FormData>(
    decoder: &Decoder,
    memory_limit: usize,
    multipart: &mut actix_multipart::Multipart,
) -> Result<ParsedForm, FormDataError> {
    let valid_fields: HashMap<&'static str, Option<usize>> = decoder.wire_names::<T>()?.into_iter().collect();
    let mut form = ParsedForm::new();
    let mut buffered = 0;

    while let Some(mut field) = multipart.try_next().await.map_err(FormDataError::Multipart)? {
        let disposition = field.content_disposition().clone();

        let field_name = match disposition.get_name() {
            Some(v) => v,
            None => continue,
        };

        // Make sure the field actually exists on the form
        let max_size = match valid_fields.get(field_name) {
            Some(max_size) => *max_size,
            None => {
                tracing::debug!(field = field_name, "skipping unknown multipart field");
                continue;
            }
        };

        let filename = disposition.get_filename();
        let mut data = BytesMut::new();

        while let Some(bytes) = field.try_next().await.map_err(FormDataError::Multipart)? {
            buffered += bytes.len();
            if buffered > memory_limit {
                return Err(FormDataError::MemoryLimit { limit: memory_limit });
            }

            if let (Some(_), Some(max_size)) = (filename, max_size) {
                if data.len() + bytes.len() > max_size {
                    return Err(FormDataError::FileSizeError {
                        field: field_name.to_string(),
                        limit: max_size,
                    });
                }
            }

            data.extend_from_slice(&bytes);
        }

        match filename {
            Some(filename) => {
                let file = File {
                    content_type: field.content_type().to_string(),
                    name: filename.to_string(),
                    bytes: data.freeze(),
                };
                tracing::debug!(field = field_name, filename = %file.name, size = file.size(), "buffered upload");
                form.push_file(field_name, file);
            }
            None => {
                let text = String::from_utf8(data.to_vec()).map_err(|_| FormDataError::InvalidText {
                    field: field_name.to_string(),
                })?;
                form.push_value(field_name, text);
            }
        }
    }

    Ok(form)
}
