//! In-memory blob references for multi-file glTF loads
//!
//! A `.gltf` names its buffers and images by relative URI. Sibling files from
//! the same batch are registered as blobs and the JSON is rewritten to point
//! at them. Every blob created for an attempt is revoked when its `BlobScope`
//! drops, on success and failure alike.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

const BLOB_PREFIX: &str = "blob:pixelpulse/";

/// Reference to registered bytes, e.g. `blob:pixelpulse/3`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlobUrl(String);

impl BlobUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blob_uri(uri: &str) -> bool {
        uri.starts_with(BLOB_PREFIX)
    }
}

#[derive(Debug, Default)]
pub struct BlobRegistry {
    next_id: u64,
    entries: HashMap<String, Arc<[u8]>>,
}

impl BlobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, bytes: impl Into<Arc<[u8]>>) -> BlobUrl {
        self.next_id += 1;
        let url = format!("{}{}", BLOB_PREFIX, self.next_id);
        self.entries.insert(url.clone(), bytes.into());
        BlobUrl(url)
    }

    pub fn get(&self, uri: &str) -> Option<Arc<[u8]>> {
        self.entries.get(uri).cloned()
    }

    /// Returns false if the blob was already revoked
    pub fn revoke(&mut self, url: &BlobUrl) -> bool {
        self.entries.remove(&url.0).is_some()
    }

    #[cfg(test)]
    pub fn live_count(&self) -> usize {
        self.entries.len()
    }
}

/// Sibling files of one attempt, keyed by file name
#[derive(Debug, Default)]
pub struct ResourceMap {
    by_name: BTreeMap<String, BlobUrl>,
}

impl ResourceMap {
    pub fn insert(&mut self, name: impl Into<String>, url: BlobUrl) {
        self.by_name.insert(name.into(), url);
    }

    /// Match a declared URI by its basename only
    pub fn resolve(&self, uri: &str) -> Option<&BlobUrl> {
        self.by_name.get(&uri_basename(uri))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Last path segment of a relative URI, percent-decoded
pub fn uri_basename(uri: &str) -> String {
    let path = uri.split(&['?', '#'][..]).next().unwrap_or(uri);
    let last = path.rsplit(&['/', '\\'][..]).next().unwrap_or(path);
    match urlencoding::decode(last) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => last.to_string(),
    }
}

/// Blobs created for a single load attempt
///
/// Owns the registry so the background parse can resolve `blob:` URIs;
/// dropping it revokes everything it created.
pub struct BlobScope {
    registry: BlobRegistry,
    created: Vec<BlobUrl>,
    resources: ResourceMap,
}

impl BlobScope {
    pub fn new() -> Self {
        Self {
            registry: BlobRegistry::new(),
            created: Vec::new(),
            resources: ResourceMap::default(),
        }
    }

    /// Register a sibling file under its name
    pub fn add_file(&mut self, name: &str, bytes: Vec<u8>) -> BlobUrl {
        let url = self.registry.create(bytes);
        self.created.push(url.clone());
        self.resources.insert(name, url.clone());
        url
    }

    pub fn resources(&self) -> &ResourceMap {
        &self.resources
    }

    pub fn fetch(&self, uri: &str) -> Option<Arc<[u8]>> {
        self.registry.get(uri)
    }

    #[cfg(test)]
    pub fn live_count(&self) -> usize {
        self.registry.live_count()
    }

    /// Revoke every blob this scope created
    pub fn release(&mut self) {
        for url in self.created.drain(..) {
            self.registry.revoke(&url);
        }
    }
}

impl Default for BlobScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BlobScope {
    fn drop(&mut self) {
        if !self.created.is_empty() {
            tracing::trace!(count = self.created.len(), "revoking blob references");
        }
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_by_basename() {
        let mut scope = BlobScope::new();
        let url = scope.add_file("a.bin", vec![1, 2, 3]);
        assert_eq!(scope.resources().resolve("a.bin"), Some(&url));
        assert_eq!(scope.resources().resolve("./buffers/a.bin"), Some(&url));
        assert_eq!(scope.resources().resolve("other.bin"), None);
        assert_eq!(scope.fetch(url.as_str()).as_deref(), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn test_basename_is_percent_decoded() {
        assert_eq!(uri_basename("textures/my%20tex.png"), "my tex.png");
        assert_eq!(uri_basename("a.bin?v=2"), "a.bin");
        assert_eq!(uri_basename("dir\\b.png"), "b.png");
    }

    #[test]
    fn test_release_revokes_everything() {
        let mut scope = BlobScope::new();
        let a = scope.add_file("a.bin", vec![0]);
        scope.add_file("b.png", vec![0]);
        assert_eq!(scope.live_count(), 2);
        scope.release();
        assert_eq!(scope.live_count(), 0);
        assert!(scope.fetch(a.as_str()).is_none());
        // Second release is a no-op
        scope.release();
    }

    #[test]
    fn test_registry_revoke_once() {
        let mut reg = BlobRegistry::new();
        let url = reg.create(vec![9u8]);
        assert!(BlobUrl::is_blob_uri(url.as_str()));
        assert!(reg.revoke(&url));
        assert!(!reg.revoke(&url));
    }
}
