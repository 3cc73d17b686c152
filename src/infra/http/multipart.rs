//! Multipart upload extraction.
//!
//! The MIME allow-list and size ceiling are enforced here, at the boundary,
//! before any bytes reach storage or the database.

use std::collections::HashMap;

use axum::extract::Multipart;
use bytes::Bytes;

use super::error::ApiError;
use crate::infra::uploads::UploadedFile;

pub struct ParsedUpload {
    fields: HashMap<String, String>,
    pub file: Option<UploadedFile>,
}

impl ParsedUpload {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn require_field(&self, name: &str) -> Result<&str, ApiError> {
        self.field(name)
            .ok_or_else(|| ApiError::bad_request(format!("{name} is required")))
    }

    pub fn require_file(self) -> Result<(UploadedFile, HashMap<String, String>), ApiError> {
        let Self { fields, file } = self;
        let file = file.ok_or_else(|| ApiError::bad_request("No file uploaded"))?;
        Ok((file, fields))
    }
}

/// Drain a multipart body into text fields plus at most one `file` part,
/// validating the file against the allow-list and size limit.
pub async fn parse_upload(
    mut multipart: Multipart,
    allowed_types: &[String],
    max_bytes: usize,
) -> Result<ParsedUpload, ApiError> {
    let mut fields = HashMap::new();
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request(format!("malformed multipart body: {err}")))?
    {
        let name = match field.name() {
            Some(name) => name.to_string(),
            None => continue,
        };

        if name == "file" {
            let original_name = field
                .file_name()
                .map(|value| value.to_string())
                .unwrap_or_else(|| "upload.pdf".to_string());
            let content_type = field.content_type().map(|value| value.to_string());

            match &content_type {
                Some(mime) if allowed_types.iter().any(|allowed| allowed == mime) => {}
                _ => return Err(ApiError::bad_request("Only PDF files are allowed")),
            }

            let bytes: Bytes = field
                .bytes()
                .await
                .map_err(|err| ApiError::bad_request(format!("upload failed: {err}")))?;

            if bytes.len() > max_bytes {
                return Err(ApiError::bad_request("File size too large"));
            }

            file = Some(UploadedFile {
                original_name,
                content_type,
                bytes,
            });
        } else {
            let value = field
                .text()
                .await
                .map_err(|err| ApiError::bad_request(format!("malformed field {name}: {err}")))?;
            fields.insert(name, value);
        }
    }

    Ok(ParsedUpload { fields, file })
}
