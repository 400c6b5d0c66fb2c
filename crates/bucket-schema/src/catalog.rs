//! Built-in resource declarations of the default deployment.

use crate::resource::{PaginationSource, ResourceSpec, RouteSpec, UploadPayload};
use crate::shape::{ObjectShape, Shape};

pub const THUMBNAILS: &str = "thumbnails";
pub const TORRENTS: &str = "torrents";
pub const UPLOADS: &str = "uploads";
pub const VIDEOS: &str = "videos";

/// Every built-in resource, in mount order.
pub fn builtin_resources() -> Vec<ResourceSpec> {
    vec![thumbnails(), torrents(), uploads(), videos()]
}

/// A stored file linked to another record through `reference_field`.
fn linked_file(name: &str, reference_field: &str) -> ResourceSpec {
    let entity = ObjectShape::new()
        .required("id", Shape::number_min(0))
        .required("url", Shape::Url)
        .required("name", Shape::text_min(1))
        .required("createdAt", Shape::Timestamp)
        .required("updatedAt", Shape::Timestamp)
        .required(reference_field, Shape::coerced_min(0));

    ResourceSpec::new(name, entity)
        .route(RouteSpec::List {
            path: "/".into(),
            pagination: PaginationSource::Body,
        })
        .route(RouteSpec::Upload {
            path: "/upload".into(),
            reference_field: Some(reference_field.into()),
            payload: UploadPayload::WithFileData,
        })
        .route(RouteSpec::Get { path: "/:id".into() })
        .route(RouteSpec::Delete {
            path: "/delete/:id".into(),
            omit: Vec::new(),
        })
}

pub fn thumbnails() -> ResourceSpec {
    linked_file(THUMBNAILS, "reference_thumbnail_id")
}

pub fn torrents() -> ResourceSpec {
    linked_file(TORRENTS, "reference_pack_id")
}

/// Raw uploads. The entity carries the deployment's file metadata.
pub fn uploads() -> ResourceSpec {
    let entity = ObjectShape::new()
        .required("id", Shape::number_min(1))
        .required("url", Shape::Url)
        .required("createdAt", Shape::Timestamp)
        .required("updatedAt", Shape::Timestamp);

    ResourceSpec::new(UPLOADS, entity)
        .with_file_data()
        .route(RouteSpec::List {
            path: "/list".into(),
            pagination: PaginationSource::Query,
        })
        .route(RouteSpec::Upload {
            path: "/upload".into(),
            reference_field: None,
            payload: UploadPayload::Entity,
        })
        .route(RouteSpec::Delete {
            path: "/delete/:id".into(),
            omit: vec!["url".into()],
        })
        .route(RouteSpec::File {
            path: "/file/:id".into(),
        })
        .route(RouteSpec::Get {
            path: "/info/:id".into(),
        })
}

pub fn videos() -> ResourceSpec {
    let entity = ObjectShape::new()
        .required("id", Shape::number())
        .required("name", Shape::NonBlank)
        .required("original_video_url", Shape::Url)
        .optional("markdown_description", Shape::text())
        .optional("is_leaked", Shape::Boolean)
        .optional("bucket_thumbnail_id", Shape::number())
        .optional("bucket_leaked_video_id", Shape::number())
        .optional("createdAt", Shape::Timestamp)
        .optional("updatedAt", Shape::Timestamp);

    ResourceSpec::new(VIDEOS, entity)
        .route(RouteSpec::List {
            path: "/".into(),
            pagination: PaginationSource::Query,
        })
        .route(RouteSpec::Get { path: "/:id".into() })
        .route(RouteSpec::Create { path: "/".into() })
        .route(RouteSpec::Update { path: "/:id".into() })
        .route(RouteSpec::Delete {
            path: "/:id".into(),
            omit: Vec::new(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_data::FileDataProfile;

    #[test]
    fn builtin_resources_are_consistent() {
        for profile in [FileDataProfile::Compact, FileDataProfile::Multer] {
            for spec in builtin_resources() {
                assert!(spec.problems(profile).is_empty(), "{}: {:?}", spec.name, spec.problems(profile));
            }
        }
    }

    #[test]
    fn linked_files_differ_only_in_reference_field() {
        let thumbs = thumbnails();
        let torrents = torrents();
        assert!(thumbs.entity.contains("reference_thumbnail_id"));
        assert!(torrents.entity.contains("reference_pack_id"));
        assert_eq!(thumbs.routes.len(), torrents.routes.len());
    }

    #[test]
    fn video_draft_keeps_optional_timestamps() {
        let videos = videos();
        let draft = videos.entity.clone().omit(videos.generated.as_slice());
        assert!(!draft.contains("id"));
        assert!(draft.get("createdAt").is_some_and(|f| f.optional));
        assert!(!draft.get("original_video_url").is_some_and(|f| f.optional));
    }
}
