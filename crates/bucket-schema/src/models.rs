//! Typed mirrors of the built-in contracts.
//!
//! These structs are the output side of validation: run a contract, then
//! deserialize the accepted value with [`CompiledSchema::parse`] or
//! [`EnvelopeSchema::parse`]. They do not repeat the closed-shape checks
//! themselves.
//!
//! [`CompiledSchema::parse`]: crate::CompiledSchema::parse
//! [`EnvelopeSchema::parse`]: crate::EnvelopeSchema::parse

use bucket_core::{ResourceId, ResourceUrl, Timestamp};
use serde::{Deserialize, Serialize};

use crate::file_data::StoredFile;

/// A stored thumbnail image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub id: u64,
    pub url: ResourceUrl,
    pub name: String,
    #[serde(rename = "createdAt")]
    pub created_at: Timestamp,
    #[serde(rename = "updatedAt")]
    pub updated_at: Timestamp,
    pub reference_thumbnail_id: u64,
}

/// A stored torrent file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Torrent {
    pub id: u64,
    pub url: ResourceUrl,
    pub name: String,
    #[serde(rename = "createdAt")]
    pub created_at: Timestamp,
    #[serde(rename = "updatedAt")]
    pub updated_at: Timestamp,
    pub reference_pack_id: u64,
}

/// A raw upload record. `F` is the file metadata record of the deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upload<F = StoredFile> {
    pub id: ResourceId,
    pub url: ResourceUrl,
    #[serde(rename = "createdAt")]
    pub created_at: Timestamp,
    #[serde(rename = "updatedAt")]
    pub updated_at: Timestamp,
    #[serde(flatten)]
    pub file: F,
}

/// Response data of an upload route that reports the stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile<E, F = StoredFile> {
    pub db: E,
    #[serde(rename = "originalFileData")]
    pub original_file_data: F,
}

/// A video record.
///
/// `original_video_url` is an `Option` so the same type serves deployments
/// where the field is optional. Video ids carry no lower bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_video_url: Option<ResourceUrl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_leaked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_thumbnail_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_leaked_video_id: Option<i64>,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

/// Body of a video create route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoDraft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_video_url: Option<ResourceUrl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_leaked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_thumbnail_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_leaked_video_id: Option<i64>,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

/// Body of a video update route. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_video_url: Option<ResourceUrl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_leaked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_thumbnail_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_leaked_video_id: Option<i64>,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

/// `skip` / `take` of a list route. Any number is accepted, so the
/// store decides what a negative or fractional page means.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take: Option<f64>,
}

/// `/:id` path parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdParams {
    pub id: ResourceId,
}

/// Query of the thumbnail upload route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailUploadQuery {
    pub reference_thumbnail_id: ResourceId,
}

/// Query of the torrent upload route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentUploadQuery {
    pub reference_pack_id: ResourceId,
}
