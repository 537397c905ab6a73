//! Multipart form parsing for image uploads.

use std::collections::HashMap;

use axum::extract::Multipart;
use borohub_common::{AppError, AppResult};
use borohub_core::MediaUpload;

/// A multipart form split into file parts and text parts.
#[derive(Debug, Default)]
pub struct UploadForm {
    files: Vec<(String, MediaUpload)>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    /// Read every part of the form. Parts with a file name are files.
    pub async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid multipart data: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if let Some(file_name) = field.file_name().map(str::to_string) {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read file: {e}")))?
                    .to_vec();

                form.files.push((
                    name,
                    MediaUpload {
                        file_name,
                        content_type,
                        data,
                    },
                ));
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid form field: {e}")))?;
                form.fields.insert(name, text);
            }
        }

        Ok(form)
    }

    /// Take the files sent under `name`, in form order.
    pub fn take_files(&mut self, name: &str) -> Vec<MediaUpload> {
        let (taken, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|(field, _)| field == name);
        self.files = rest;
        taken.into_iter().map(|(_, upload)| upload).collect()
    }

    /// Take the single file sent under `name`.
    pub fn take_single_file(&mut self, name: &str) -> AppResult<MediaUpload> {
        self.take_files(name)
            .into_iter()
            .next()
            .ok_or_else(|| AppError::BadRequest(format!("No file uploaded in field '{name}'")))
    }

    /// A text field.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}
