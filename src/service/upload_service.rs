// service/upload_service.rs
use std::path::{Path, PathBuf};

use chrono::Utc;
use rand::Rng;
use tokio::fs;

use crate::{dtos::uploaddtos::UploadedFileDto, service::error::ServiceError};

pub const PUBLIC_PREFIX: &str = "/uploads";

const ALLOWED_TYPES: [(&str, &str); 3] = [
    ("image/jpeg", ".jpg"),
    ("image/png", ".png"),
    ("application/pdf", ".pdf"),
];

/// A file part read from a request, not yet on disk.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub fieldname: String,
    pub original_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct UploadService {
    dir: PathBuf,
    max_bytes: usize,
}

impl UploadService {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn check(&self, mime_type: &str, original_name: &str, size: usize) -> Result<&'static str, ServiceError> {
        let default_ext = canonical_extension(mime_type)
            .ok_or_else(|| ServiceError::UnsupportedMediaType(mime_type.to_string()))?;

        if size > self.max_bytes {
            return Err(ServiceError::FileTooLarge {
                name: original_name.to_string(),
                limit: self.max_bytes,
            });
        }

        Ok(default_ext)
    }

    /// Stores every file or none of them. All parts are checked before the
    /// first write, and files written before a failed write are removed.
    pub async fn store_all(&self, files: Vec<IncomingFile>) -> Result<Vec<UploadedFileDto>, ServiceError> {
        for file in &files {
            self.check(&file.mime_type, &file.original_name, file.data.len())?;
        }

        let mut stored = Vec::with_capacity(files.len());
        for file in &files {
            match self
                .store(&file.fieldname, &file.original_name, &file.mime_type, &file.data)
                .await
            {
                Ok(uploaded) => stored.push(uploaded),
                Err(err) => {
                    self.remove_stored(&stored).await;
                    return Err(err);
                }
            }
        }

        Ok(stored)
    }

    async fn remove_stored(&self, stored: &[UploadedFileDto]) {
        for file in stored {
            if let Err(e) = fs::remove_file(self.dir.join(&file.filename)).await {
                tracing::warn!(filename = %file.filename, "failed to remove partial upload: {}", e);
            }
        }
    }

    pub async fn store(
        &self,
        fieldname: &str,
        original_name: &str,
        mime_type: &str,
        data: &[u8],
    ) -> Result<UploadedFileDto, ServiceError> {
        let default_ext = self.check(mime_type, original_name, data.len())?;

        let ext = original_extension(original_name).unwrap_or_else(|| default_ext.to_string());
        let random = rand::rng().random_range(0..1_000_000_000u32);
        let filename = stored_filename(fieldname, Utc::now().timestamp_millis(), random, &ext);

        fs::create_dir_all(&self.dir).await?;
        fs::write(self.dir.join(&filename), data).await?;

        tracing::info!(
            filename = %filename,
            mime_type = %mime_type,
            size = data.len(),
            "file uploaded"
        );

        Ok(UploadedFileDto {
            fieldname: fieldname.to_string(),
            original_name: original_name.to_string(),
            mime_type: mime_type.to_string(),
            url: format!("{}/{}", PUBLIC_PREFIX, filename),
            filename,
            size: data.len(),
        })
    }
}

pub fn canonical_extension(mime_type: &str) -> Option<&'static str> {
    let essence = mime_type.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    ALLOWED_TYPES
        .iter()
        .find(|(allowed, _)| *allowed == essence)
        .map(|(_, ext)| *ext)
}

/// Extension of the client's filename, including the dot. Only plain
/// alphanumeric extensions are kept so the stored name stays path-safe.
pub fn original_extension(original_name: &str) -> Option<String> {
    let base = original_name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(original_name);
    let (stem, ext) = base.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > 10 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(format!(".{}", ext.to_ascii_lowercase()))
}

pub fn stored_filename(fieldname: &str, timestamp_millis: i64, random: u32, ext: &str) -> String {
    let field: String = fieldname
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    let field = if field.is_empty() { "file".to_string() } else { field };
    format!("{}-{}-{}{}", field, timestamp_millis, random, ext)
}
