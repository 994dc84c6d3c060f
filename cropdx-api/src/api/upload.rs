//! Multipart form reading shared by history uploads and detection

use axum::body::Bytes;
use axum::extract::Multipart;
use std::collections::HashMap;

use crate::error::{ApiError, ApiResult};

/// Name of the file field carrying the upload
pub const IMAGE_FIELD: &str = "image";

/// Parsed multipart form: the image bytes plus any text fields
#[derive(Debug, Default)]
pub struct UploadForm {
    pub image: Option<Bytes>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    /// Drain a multipart stream; a repeated field keeps its last value
    pub async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == IMAGE_FIELD {
                form.image = Some(field.bytes().await?);
            } else {
                form.fields.insert(name, field.text().await?);
            }
        }
        Ok(form)
    }

    /// Image bytes; missing and empty uploads are both rejected
    pub fn require_image(&self) -> ApiResult<&Bytes> {
        self.image
            .as_ref()
            .filter(|bytes| !bytes.is_empty())
            .ok_or_else(|| ApiError::BadRequest("Image is required".to_string()))
    }

    /// Trimmed, non-empty text field
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }
}
