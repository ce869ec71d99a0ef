// dtos/uploaddtos.rs
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFileDto {
    pub fieldname: String,
    pub original_name: String,
    pub mime_type: String,
    pub filename: String,
    pub size: usize,
    pub url: String,
}
