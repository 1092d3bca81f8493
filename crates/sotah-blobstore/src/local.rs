use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use crate::capability::{ObjectMeta, ObjectStore};
use crate::Error;

/// Disk-backed capability implementation, used as the hot on-disk cache
/// in front of (or in place of) the cold blob store (spec.md Section 9).
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalObjectStore { root: root.into() }
    }

    fn resolve(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn read_object(&self, name: &str) -> Result<Option<Bytes>, Error> {
        let path = self.resolve(name);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(Bytes::from(bytes))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn write_object(&self, meta: ObjectMeta, body: Bytes) -> Result<(), Error> {
        let path = self.resolve(&meta.name);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &body).await?;
        Ok(())
    }

    async fn delete_object(&self, name: &str) -> Result<(), Error> {
        let path = self.resolve(name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, Error> {
        list_dir_recursive(&self.root, &self.root.join(prefix)).await
    }
}

async fn list_dir_recursive(root: &Path, dir: &Path) -> Result<Vec<String>, Error> {
    let mut out = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
            Err(err) => return Err(err.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                stack.push(path);
            } else if let Ok(rel) = path.strip_prefix(root) {
                out.push(rel.to_string_lossy().replace('\\', "/"));
            }
        }
    }
    out.sort();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        let meta = ObjectMeta {
            name: "us/area52/100.json.gz".into(),
            content_type: "application/json",
            content_encoding: Some("gzip"),
        };
        store.write_object(meta, Bytes::from_static(b"hello")).await.unwrap();

        let got = store.read_object("us/area52/100.json.gz").await.unwrap();
        assert_eq!(got.unwrap(), Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn missing_object_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        assert!(store.read_object("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_of_absent_object_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        store.delete_object("missing").await.unwrap();
    }

    #[tokio::test]
    async fn list_returns_objects_under_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path());
        for name in ["us/area52/100.json.gz", "us/area52/200.json.gz", "us/stormrage/1.json.gz"] {
            store
                .write_object(
                    ObjectMeta {
                        name: name.into(),
                        content_type: "application/json",
                        content_encoding: Some("gzip"),
                    },
                    Bytes::from_static(b"x"),
                )
                .await
                .unwrap();
        }

        let mut names = store.list("us/area52").await.unwrap();
        names.sort();
        assert_eq!(names, vec!["us/area52/100.json.gz", "us/area52/200.json.gz"]);
    }
}
