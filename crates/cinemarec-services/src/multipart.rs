//! Multipart form assembly for review and quiz uploads.

use crate::error::Result;
use cinemarec_models::ImageUpload;
use reqwest::multipart::{Form, Part};

/// One field of a multipart body, kept inspectable until it is sent
#[derive(Debug, Clone, PartialEq)]
pub enum FormField {
    Text { name: String, value: String },
    File { name: String, upload: ImageUpload },
}

impl FormField {
    pub fn text(name: impl Into<String>, value: impl ToString) -> Self {
        FormField::Text {
            name: name.into(),
            value: value.to_string(),
        }
    }

    pub fn file(name: impl Into<String>, upload: &ImageUpload) -> Self {
        FormField::File {
            name: name.into(),
            upload: upload.clone(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FormField::Text { name, .. } | FormField::File { name, .. } => name,
        }
    }
}

pub fn into_form(fields: Vec<FormField>) -> Result<Form> {
    let mut form = Form::new();
    for field in fields {
        form = match field {
            FormField::Text { name, value } => form.text(name, value),
            FormField::File { name, upload } => {
                let part = Part::bytes(upload.bytes)
                    .file_name(upload.file_name)
                    .mime_str(&upload.content_type)?;
                form.part(name, part)
            }
        };
    }
    Ok(form)
}
