//! # Original File Metadata
//!
//! The upload middleware hands the service a description of the file it
//! just stored. This layer does not produce that object, it only checks
//! it. Two deployments are in use:
//!
//! - [`FileDataProfile::Compact`]: `filename`, `mimetype`, `size`,
//!   `destination`.
//! - [`FileDataProfile::Multer`]: the full multer record (`fieldname`,
//!   `originalname`, `encoding`, `mimetype`, `destination`, `filename`,
//!   `path`, `size`).
//!
//! Every field is mandatory in both profiles and `size` is a byte count
//! `>= 0`.

use serde::{Deserialize, Serialize};

use crate::shape::{ObjectShape, Shape};

/// Which metadata record the upload middleware produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileDataProfile {
    /// Four-field record.
    #[default]
    Compact,
    /// Full multer record.
    Multer,
}

impl FileDataProfile {
    /// The closed shape of the record.
    pub fn shape(self) -> ObjectShape {
        match self {
            FileDataProfile::Compact => ObjectShape::new()
                .required("filename", Shape::text())
                .required("mimetype", Shape::text())
                .required("size", Shape::number_min(0))
                .required("destination", Shape::text()),
            FileDataProfile::Multer => ObjectShape::new()
                .required("fieldname", Shape::text())
                .required("originalname", Shape::text())
                .required("encoding", Shape::text())
                .required("mimetype", Shape::text())
                .required("destination", Shape::text())
                .required("filename", Shape::text())
                .required("path", Shape::text())
                .required("size", Shape::number_min(0)),
        }
    }

    /// Profile name as written in configuration.
    pub fn as_str(self) -> &'static str {
        match self {
            FileDataProfile::Compact => "compact",
            FileDataProfile::Multer => "multer",
        }
    }
}

/// Typed [`FileDataProfile::Compact`] record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub filename: String,
    pub mimetype: String,
    pub size: u64,
    pub destination: String,
}

/// Typed [`FileDataProfile::Multer`] record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MulterFile {
    pub fieldname: String,
    pub originalname: String,
    pub encoding: String,
    pub mimetype: String,
    pub destination: String,
    pub filename: String,
    pub path: String,
    pub size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::{CompiledSchema, Contract, ViolationKind};
    use serde_json::json;

    fn compile(profile: FileDataProfile) -> CompiledSchema {
        CompiledSchema::compile(profile.as_str(), Shape::object(profile.shape())).unwrap()
    }

    fn multer_record() -> serde_json::Value {
        json!({
            "fieldname": "torrent",
            "originalname": "torrent.t3071019.torrent",
            "encoding": "7bit",
            "mimetype": "application/x-bittorrent",
            "destination": "./files/torrents",
            "filename": "1721821659094_-_torrent.t3071019.torrent",
            "path": "files\\torrents\\1721821659094_-_torrent.t3071019.torrent",
            "size": 166164
        })
    }

    #[test]
    fn multer_record_parses_unchanged() {
        let doc = multer_record();
        assert_eq!(compile(FileDataProfile::Multer).validate(&doc).unwrap(), doc);
    }

    #[test]
    fn multer_record_typed() {
        let file: MulterFile = compile(FileDataProfile::Multer).parse(&multer_record()).unwrap();
        assert_eq!(file.size, 166_164);
        assert_eq!(file.encoding, "7bit");
    }

    #[test]
    fn lacking_mandatory_fields_rejected() {
        for profile in [FileDataProfile::Compact, FileDataProfile::Multer] {
            let err = compile(profile).validate(&json!({ "badReq": "" })).unwrap_err();
            let v = err.violations().unwrap();
            assert!(v.contains(ViolationKind::Missing, "/filename"));
            assert!(v.contains(ViolationKind::UnknownKey, "/badReq"));
        }
    }

    #[test]
    fn extra_property_rejected() {
        let mut doc = multer_record();
        doc["a"] = json!(1);
        let err = compile(FileDataProfile::Multer).validate(&doc).unwrap_err();
        assert!(err.violations().unwrap().contains(ViolationKind::UnknownKey, "/a"));
    }

    #[test]
    fn negative_size_rejected() {
        let doc = json!({ "filename": "a", "mimetype": "video", "size": -1, "destination": "./files" });
        let err = compile(FileDataProfile::Compact).validate(&doc).unwrap_err();
        assert!(err.violations().unwrap().contains(ViolationKind::OutOfRange, "/size"));
    }

    #[test]
    fn compact_record_typed() {
        let doc = json!({ "filename": "Hello", "mimetype": "video", "size": 123, "destination": "./files" });
        let file: StoredFile = compile(FileDataProfile::Compact).parse(&doc).unwrap();
        assert_eq!(serde_json::to_value(&file).unwrap(), doc);
    }

    #[test]
    fn profile_names_round_trip_through_yaml() {
        let p: FileDataProfile = serde_yaml::from_str("multer").unwrap();
        assert_eq!(p, FileDataProfile::Multer);
        assert_eq!(p.as_str(), "multer");
    }
}
