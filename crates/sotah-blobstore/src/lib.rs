//! C4: blob object naming, manifest bookkeeping and expiry, and the
//! polymorphic storage capability (spec.md Section 4.4, Section 9).

mod capability;
mod gcs;
mod local;
mod manifest;
mod names;

pub use capability::{ObjectMeta, ObjectStore};
pub use gcs::GcsObjectStore;
pub use local::LocalObjectStore;
pub use manifest::{AuctionManifest, ManifestStore};
pub use names::{icon_object_name, manifest_object_name, raw_auctions_object_name};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("object store transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed object name: {0}")]
    MalformedName(String),
}
