use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ObjectHead, ObjectStore, StoreError, StoreResult, StoredObject};

#[derive(Debug, Clone)]
struct Entry {
    object: StoredObject,
    tags: Vec<(String, String)>,
}

/// In-memory object store. Keys are held in a BTreeMap so prefix listings
/// come back in lexicographic order, matching what a real object store does.
#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<BTreeMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects, for test assertions.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, key: &str, content_type: &str, body: Vec<u8>) -> StoreResult<()> {
        let mut objects = self.objects.write().await;
        objects.insert(
            key.to_string(),
            Entry {
                object: StoredObject { content_type: content_type.to_string(), body },
                tags: Vec::new(),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<StoredObject> {
        let objects = self.objects.read().await;
        objects
            .get(key)
            .map(|e| e.object.clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn head(&self, key: &str) -> StoreResult<ObjectHead> {
        let objects = self.objects.read().await;
        objects
            .get(key)
            .map(|e| ObjectHead { size: e.object.body.len() as u64 })
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn delete_many(&self, keys: &[String]) -> StoreResult<usize> {
        let mut objects = self.objects.write().await;
        let mut deleted = 0;
        for key in keys {
            if objects.remove(key).is_some() {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn list_dirs(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let objects = self.objects.read().await;
        let mut dirs: Vec<String> = Vec::new();
        for key in objects.keys() {
            let Some(rest) = key.strip_prefix(prefix) else { continue };
            if let Some(slash) = rest.find('/') {
                let dir = format!("{}{}/", prefix, &rest[..slash]);
                // Keys are sorted, so duplicates arrive adjacent
                if dirs.last() != Some(&dir) {
                    dirs.push(dir);
                }
            }
        }
        Ok(dirs)
    }

    async fn list_keys(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let objects = self.objects.read().await;
        Ok(objects.keys().filter(|k| k.starts_with(prefix)).cloned().collect())
    }

    async fn put_tags(&self, key: &str, tags: &[(String, String)]) -> StoreResult<()> {
        let mut objects = self.objects.write().await;
        match objects.get_mut(key) {
            Some(entry) => {
                entry.tags = tags.to_vec();
                Ok(())
            }
            None => Err(StoreError::NotFound(key.to_string())),
        }
    }

    async fn get_tags(&self, key: &str) -> StoreResult<Vec<(String, String)>> {
        let objects = self.objects.read().await;
        objects
            .get(key)
            .map(|e| e.tags.clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_head_delete_round_trip() {
        let store = MemoryStore::new();
        store.put("a/b/c.json", "application/json", b"{}".to_vec()).await.unwrap();

        let obj = store.get("a/b/c.json").await.unwrap();
        assert_eq!(obj.content_type, "application/json");
        assert_eq!(store.head("a/b/c.json").await.unwrap().size, 2);

        store.delete("a/b/c.json").await.unwrap();
        assert!(matches!(store.get("a/b/c.json").await, Err(StoreError::NotFound(_))));
        // Deleting again is fine
        store.delete("a/b/c.json").await.unwrap();
    }

    #[tokio::test]
    async fn list_dirs_groups_by_delimiter() {
        let store = MemoryStore::new();
        for key in [
            "applications/2024/app_a/meta.json",
            "applications/2025/app_b/meta.json",
            "applications/2025/app_c/meta.json",
            "submissions/2025/sub_a/meta.json",
        ] {
            store.put(key, "application/json", b"{}".to_vec()).await.unwrap();
        }

        let years = store.list_dirs("applications/").await.unwrap();
        assert_eq!(years, vec!["applications/2024/", "applications/2025/"]);

        let folders = store.list_dirs("applications/2025/").await.unwrap();
        assert_eq!(folders, vec!["applications/2025/app_b/", "applications/2025/app_c/"]);
    }

    #[tokio::test]
    async fn delete_many_skips_missing_keys() {
        let store = MemoryStore::new();
        store.put("x/1", "text/plain", b"1".to_vec()).await.unwrap();
        store.put("x/2", "text/plain", b"2".to_vec()).await.unwrap();

        let deleted = store
            .delete_many(&["x/1".to_string(), "x/2".to_string(), "x/3".to_string()])
            .await
            .unwrap();
        assert_eq!(deleted, 2);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn tagging_is_idempotent_and_requires_object() {
        let store = MemoryStore::new();
        store.put("f.pdf", "application/pdf", b"%PDF-".to_vec()).await.unwrap();

        let tags = vec![("validation_status".to_string(), "passed".to_string())];
        store.put_tags("f.pdf", &tags).await.unwrap();
        store.put_tags("f.pdf", &tags).await.unwrap();
        assert_eq!(store.get_tags("f.pdf").await.unwrap(), tags);

        assert!(store.put_tags("missing.pdf", &tags).await.is_err());
    }
}
