use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;

use crate::capability::{ObjectMeta, ObjectStore};
use crate::Error;

const JSON_API_ROOT: &str = "https://storage.googleapis.com/storage/v1";
const UPLOAD_API_ROOT: &str = "https://storage.googleapis.com/upload/storage/v1";

/// Cold-archival capability backed by the GCS JSON API over `reqwest`,
/// the same "fetch by HTTP URL" shape the teacher's gazette fragment
/// reader uses for its storage-backed fragments.
pub struct GcsObjectStore {
    http: reqwest::Client,
    bucket: String,
    bearer_token: String,
}

impl GcsObjectStore {
    pub fn new(http: reqwest::Client, bucket: impl Into<String>, bearer_token: impl Into<String>) -> Self {
        GcsObjectStore {
            http,
            bucket: bucket.into(),
            bearer_token: bearer_token.into(),
        }
    }

    fn auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.bearer_auth(&self.bearer_token)
    }
}

#[derive(Deserialize)]
struct ListObjectsResponse {
    #[serde(default)]
    items: Vec<ListedObject>,
}

#[derive(Deserialize)]
struct ListedObject {
    name: String,
}

#[async_trait]
impl ObjectStore for GcsObjectStore {
    async fn read_object(&self, name: &str) -> Result<Option<Bytes>, Error> {
        let url = format!(
            "{JSON_API_ROOT}/b/{}/o/{}?alt=media",
            self.bucket,
            urlencoding::encode(name)
        );
        let resp = self.auth(self.http.get(&url)).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = resp.error_for_status()?;
        Ok(Some(resp.bytes().await?))
    }

    async fn write_object(&self, meta: ObjectMeta, body: Bytes) -> Result<(), Error> {
        let url = format!(
            "{UPLOAD_API_ROOT}/b/{}/o?uploadType=media&name={}",
            self.bucket,
            urlencoding::encode(&meta.name)
        );
        let mut req = self.auth(self.http.post(&url)).header("Content-Type", meta.content_type);
        if let Some(encoding) = meta.content_encoding {
            req = req.header("Content-Encoding", encoding);
        }
        req.body(body).send().await?.error_for_status()?;
        Ok(())
    }

    async fn delete_object(&self, name: &str) -> Result<(), Error> {
        let url = format!(
            "{JSON_API_ROOT}/b/{}/o/{}",
            self.bucket,
            urlencoding::encode(name)
        );
        let resp = self.auth(self.http.delete(&url)).send().await?;
        if resp.status() != reqwest::StatusCode::NOT_FOUND {
            resp.error_for_status()?;
        }
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, Error> {
        let url = format!("{JSON_API_ROOT}/b/{}/o", self.bucket);
        let resp = self
            .auth(self.http.get(&url))
            .query(&[("prefix", prefix)])
            .send()
            .await?
            .error_for_status()?;
        let parsed: ListObjectsResponse = resp.json().await?;
        Ok(parsed.items.into_iter().map(|o| o.name).collect())
    }
}

/// Minimal percent-encoding so object names with `/` survive as path
/// segments in the JSON API's object-name query parameter. Avoids
/// pulling in a dedicated crate for a handful of reserved characters.
mod urlencoding {
    pub fn encode(raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        for byte in raw.bytes() {
            match byte {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                    out.push(byte as char)
                }
                _ => out.push_str(&format!("%{byte:02X}")),
            }
        }
        out
    }
}
