use async_trait::async_trait;
use bytes::Bytes;

use crate::Error;

#[derive(Debug, Clone)]
pub struct ObjectMeta {
    pub name: String,
    pub content_type: &'static str,
    pub content_encoding: Option<&'static str>,
}

/// The single capability set every backend implements, per spec.md
/// Section 9's "Polymorphic storage backends" note: components receive
/// this trait object, never a concrete backend.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn read_object(&self, name: &str) -> Result<Option<Bytes>, Error>;
    async fn write_object(&self, meta: ObjectMeta, body: Bytes) -> Result<(), Error>;
    async fn delete_object(&self, name: &str) -> Result<(), Error>;
    /// Lists every object name under `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, Error>;
}
