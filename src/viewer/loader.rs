//! Asset loading: file batch → bytes → glTF document → scene subtree
//!
//! Runs off the UI thread. A `.gltf` has its `buffers[].uri` and
//! `images[].uri` rewritten to blob references for sibling files of the same
//! batch; names that match nothing are logged and left unresolved.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::Engine;
use serde_json::Value;
use thiserror::Error;

use crate::rasterizer::Texture;
use crate::scene::Node;
use crate::task::TaskError;

use super::import::build_scene;
use super::resources::{BlobScope, BlobUrl, ResourceMap};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub const MSG_REJECTED: &str = "Please upload a .glb or .gltf file";
pub const MSG_READ_FAILED: &str = "Error reading file. Please try again.";
pub const MSG_PARSE_FAILED: &str =
    "Error loading 3D model. Please ensure the file is a valid GLB or GLTF format.";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unsupported file type: {0}")]
    Unsupported(String),
    #[error("failed to read {name}")]
    Read {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid glTF JSON")]
    Json(#[from] serde_json::Error),
    #[error("glTF parse failed")]
    Gltf(#[from] gltf::Error),
    #[error("loader task failed")]
    Task(#[from] TaskError),
}

impl LoadError {
    /// Fixed message shown to the user for this failure
    pub fn user_message(&self) -> &'static str {
        match self {
            LoadError::Unsupported(_) => MSG_REJECTED,
            LoadError::Read { .. } => MSG_READ_FAILED,
            LoadError::Json(_) | LoadError::Gltf(_) | LoadError::Task(_) => MSG_PARSE_FAILED,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Glb,
    Gltf,
}

impl AssetKind {
    /// Case-insensitive `.glb` / `.gltf` extension check
    pub fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".glb") {
            Some(AssetKind::Glb)
        } else if lower.ends_with(".gltf") {
            Some(AssetKind::Gltf)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
pub enum FileSource {
    Path(PathBuf),
    Memory(Arc<[u8]>),
}

#[derive(Debug, Clone)]
pub struct BatchFile {
    pub name: String,
    pub source: FileSource,
}

impl BatchFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self {
            name,
            source: FileSource::Path(path),
        }
    }

    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            source: FileSource::Memory(bytes.into()),
        }
    }

    pub fn read(&self) -> Result<Vec<u8>, LoadError> {
        match &self.source {
            FileSource::Path(path) => std::fs::read(path).map_err(|source| LoadError::Read {
                name: self.name.clone(),
                source,
            }),
            FileSource::Memory(bytes) => Ok(bytes.to_vec()),
        }
    }
}

/// Files selected or dropped together
#[derive(Debug, Clone, Default)]
pub struct FileBatch {
    pub files: Vec<BatchFile>,
}

impl FileBatch {
    pub fn new(files: Vec<BatchFile>) -> Self {
        Self { files }
    }

    pub fn from_paths<P: AsRef<Path>>(paths: impl IntoIterator<Item = P>) -> Self {
        Self::new(paths.into_iter().map(|p| BatchFile::from_path(p.as_ref())).collect())
    }

    fn primary_index(&self) -> Option<(usize, AssetKind)> {
        self.files
            .iter()
            .enumerate()
            .find_map(|(i, f)| AssetKind::from_file_name(&f.name).map(|k| (i, k)))
    }

    /// The first `.glb` / `.gltf` file
    pub fn primary(&self) -> Option<(&BatchFile, AssetKind)> {
        self.primary_index().map(|(i, k)| (&self.files[i], k))
    }

    /// Every file other than the primary one
    pub fn siblings(&self) -> impl Iterator<Item = &BatchFile> {
        let primary = self.primary_index().map(|(i, _)| i);
        self.files
            .iter()
            .enumerate()
            .filter(move |(i, _)| Some(*i) != primary)
            .map(|(_, f)| f)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Result of a successful load
#[derive(Debug)]
pub struct LoadedAsset {
    pub file_name: String,
    pub root: Node,
    /// Resource URIs that matched no file in the batch
    pub unresolved: Vec<String>,
}

/// Load the batch's primary asset, resolving siblings in memory
pub fn load_batch(batch: &FileBatch) -> Result<LoadedAsset, LoadError> {
    let mut scope = BlobScope::new();
    load_in_scope(batch, &mut scope)
}

/// Like `load_batch`, with blob references released before returning
pub fn load_in_scope(batch: &FileBatch, scope: &mut BlobScope) -> Result<LoadedAsset, LoadError> {
    let result = load_inner(batch, scope);
    scope.release();
    result
}

fn load_inner(batch: &FileBatch, scope: &mut BlobScope) -> Result<LoadedAsset, LoadError> {
    let (primary, kind) = batch.primary().ok_or_else(|| {
        LoadError::Unsupported(batch.files.first().map(|f| f.name.clone()).unwrap_or_default())
    })?;
    let bytes = primary.read()?;

    for sibling in batch.siblings() {
        let data = sibling.read()?;
        scope.add_file(&sibling.name, data);
    }

    let mut unresolved = Vec::new();
    let bytes = match kind {
        AssetKind::Glb => bytes,
        AssetKind::Gltf => {
            let text = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes.as_slice());
            let mut json: Value = serde_json::from_slice(text)?;
            unresolved = rewrite_resource_uris(&mut json, scope.resources());
            serde_json::to_vec(&json)?
        }
    };

    let gltf = gltf::Gltf::from_slice(&bytes)?;
    let buffers = resolve_buffers(&gltf, scope);
    let images = resolve_images(&gltf, &buffers, scope);
    let root = build_scene(&gltf.document, &buffers, &images, &primary.name);

    tracing::info!(
        file = %primary.name,
        meshes = root.mesh_count(),
        unresolved = unresolved.len(),
        "model parsed"
    );
    Ok(LoadedAsset {
        file_name: primary.name.clone(),
        root,
        unresolved,
    })
}

/// Point `buffers[].uri` and `images[].uri` at sibling blobs
///
/// Returns the URIs that could not be matched. `data:` URIs are left alone.
pub fn rewrite_resource_uris(json: &mut Value, resources: &ResourceMap) -> Vec<String> {
    let mut unresolved = Vec::new();
    for section in ["buffers", "images"] {
        let Some(entries) = json.get_mut(section).and_then(Value::as_array_mut) else {
            continue;
        };
        for entry in entries {
            let Some(uri) = entry.get("uri").and_then(Value::as_str).map(str::to_owned) else {
                continue;
            };
            if uri.starts_with("data:") || BlobUrl::is_blob_uri(&uri) {
                continue;
            }
            match resources.resolve(&uri) {
                Some(url) => {
                    tracing::debug!(%uri, blob = url.as_str(), "resolved glTF resource");
                    entry["uri"] = Value::String(url.as_str().to_string());
                }
                None => {
                    tracing::warn!(%uri, section, "unresolved glTF resource");
                    unresolved.push(uri);
                }
            }
        }
    }
    unresolved
}

/// Bytes for a `data:`, `blob:` or plain relative URI
fn fetch_uri(uri: &str, scope: &BlobScope) -> Option<Vec<u8>> {
    if let Some(rest) = uri.strip_prefix("data:") {
        return decode_data_uri(rest);
    }
    if BlobUrl::is_blob_uri(uri) {
        return scope.fetch(uri).map(|b| b.to_vec());
    }
    let url = scope.resources().resolve(uri)?;
    scope.fetch(url.as_str()).map(|b| b.to_vec())
}

/// Decode the part of a data URI after `data:`
fn decode_data_uri(rest: &str) -> Option<Vec<u8>> {
    let (meta, payload) = rest.split_once(',')?;
    if meta.ends_with(";base64") {
        match base64::engine::general_purpose::STANDARD.decode(payload) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!(error = %e, "invalid base64 data URI");
                None
            }
        }
    } else {
        Some(urlencoding::decode_binary(payload.as_bytes()).into_owned())
    }
}

fn resolve_buffers(gltf: &gltf::Gltf, scope: &BlobScope) -> Vec<Option<Vec<u8>>> {
    gltf.buffers()
        .map(|buffer| {
            let data = match buffer.source() {
                gltf::buffer::Source::Bin => gltf.blob.clone(),
                gltf::buffer::Source::Uri(uri) => fetch_uri(uri, scope),
            };
            match data {
                Some(bytes) if bytes.len() >= buffer.length() => Some(bytes),
                Some(bytes) => {
                    tracing::warn!(
                        buffer = buffer.index(),
                        expected = buffer.length(),
                        actual = bytes.len(),
                        "glTF buffer shorter than declared"
                    );
                    None
                }
                None => None,
            }
        })
        .collect()
}

fn resolve_images(
    gltf: &gltf::Gltf,
    buffers: &[Option<Vec<u8>>],
    scope: &BlobScope,
) -> Vec<Option<Arc<Texture>>> {
    gltf.images()
        .map(|image| {
            let name = image.name().unwrap_or("").to_string();
            let bytes = match image.source() {
                gltf::image::Source::View { view, .. } => {
                    buffers.get(view.buffer().index()).and_then(Option::as_ref).and_then(|buf| {
                        buf.get(view.offset()..view.offset() + view.length()).map(<[u8]>::to_vec)
                    })
                }
                gltf::image::Source::Uri { uri, .. } => fetch_uri(uri, scope),
            }?;
            match Texture::decode(&bytes, name) {
                Ok(texture) => Some(Arc::new(texture)),
                Err(e) => {
                    tracing::warn!(image = image.index(), error = %e, "failed to decode glTF image");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Minimal glTF assets built in code

    use base64::Engine;
    use serde_json::json;

    /// One triangle spanning x 0..4, y 0..2 as a little-endian position buffer
    pub fn triangle_bin() -> Vec<u8> {
        let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [4.0, 0.0, 0.0], [0.0, 2.0, 0.0]];
        positions
            .iter()
            .flatten()
            .flat_map(|v| v.to_le_bytes())
            .collect()
    }

    pub fn png_bytes() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 0, 255]));
        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn document(buffer_uri: Option<String>, image_uri: Option<&str>) -> serde_json::Value {
        let mut buffer = json!({ "byteLength": 36 });
        if let Some(uri) = buffer_uri {
            buffer["uri"] = json!(uri);
        }
        let mut doc = json!({
            "asset": { "version": "2.0" },
            "scene": 0,
            "scenes": [{ "nodes": [0] }],
            "nodes": [{ "mesh": 0, "name": "tri" }],
            "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 }, "material": 0 }] }],
            "materials": [{ "pbrMetallicRoughness": { "baseColorFactor": [1.0, 1.0, 1.0, 1.0] } }],
            "buffers": [buffer],
            "bufferViews": [{ "buffer": 0, "byteLength": 36 }],
            "accessors": [{
                "bufferView": 0,
                "componentType": 5126,
                "count": 3,
                "type": "VEC3",
                "min": [0.0, 0.0, 0.0],
                "max": [4.0, 2.0, 0.0]
            }]
        });
        if let Some(uri) = image_uri {
            doc["images"] = json!([{ "uri": uri }]);
            doc["textures"] = json!([{ "source": 0 }]);
            doc["materials"][0]["pbrMetallicRoughness"]["baseColorTexture"] = json!({ "index": 0 });
        }
        doc
    }

    /// `.gltf` JSON referencing external `a.bin` and `b.png`
    pub fn gltf_external() -> Vec<u8> {
        serde_json::to_vec(&document(Some("a.bin".into()), Some("b.png"))).unwrap()
    }

    /// `.gltf` JSON with the buffer embedded as a base64 data URI
    pub fn gltf_embedded() -> Vec<u8> {
        let uri = format!(
            "data:application/octet-stream;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(triangle_bin())
        );
        serde_json::to_vec(&document(Some(uri), None)).unwrap()
    }

    /// Binary glTF with the triangle in the BIN chunk
    pub fn glb_triangle() -> Vec<u8> {
        let mut json = serde_json::to_vec(&document(None, None)).unwrap();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }
        let bin = triangle_bin();
        let total = 12 + 8 + json.len() + 8 + bin.len();

        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(b"glTF");
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&(json.len() as u32).to_le_bytes());
        out.extend_from_slice(b"JSON");
        out.extend_from_slice(&json);
        out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        out.extend_from_slice(b"BIN\0");
        out.extend_from_slice(&bin);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    fn external_batch(with_png: bool) -> FileBatch {
        let mut files = vec![
            BatchFile::from_bytes("model.gltf", gltf_external()),
            BatchFile::from_bytes("a.bin", triangle_bin()),
        ];
        if with_png {
            files.push(BatchFile::from_bytes("b.png", png_bytes()));
        }
        FileBatch::new(files)
    }

    #[test]
    fn test_asset_kind_is_case_insensitive() {
        assert_eq!(AssetKind::from_file_name("Robot.GLB"), Some(AssetKind::Glb));
        assert_eq!(AssetKind::from_file_name("scene.GlTf"), Some(AssetKind::Gltf));
        assert_eq!(AssetKind::from_file_name("model.obj"), None);
        assert_eq!(AssetKind::from_file_name("glb"), None);
    }

    #[test]
    fn test_primary_is_first_asset() {
        let batch = FileBatch::new(vec![
            BatchFile::from_bytes("a.bin", vec![]),
            BatchFile::from_bytes("model.gltf", vec![]),
            BatchFile::from_bytes("other.glb", vec![]),
        ]);
        let (primary, kind) = batch.primary().unwrap();
        assert_eq!(primary.name, "model.gltf");
        assert_eq!(kind, AssetKind::Gltf);
        let siblings: Vec<_> = batch.siblings().map(|f| f.name.as_str()).collect();
        assert_eq!(siblings, ["a.bin", "other.glb"]);
    }

    #[test]
    fn test_rewrite_resolves_both_resources() {
        let mut scope = BlobScope::new();
        let bin = scope.add_file("a.bin", triangle_bin());
        let png = scope.add_file("b.png", png_bytes());

        let mut json: Value = serde_json::from_slice(&gltf_external()).unwrap();
        let unresolved = rewrite_resource_uris(&mut json, scope.resources());
        assert!(unresolved.is_empty());
        assert_eq!(json["buffers"][0]["uri"], bin.as_str());
        assert_eq!(json["images"][0]["uri"], png.as_str());
    }

    #[test]
    fn test_external_gltf_loads_with_texture() {
        let asset = load_batch(&external_batch(true)).unwrap();
        assert!(asset.unresolved.is_empty());
        assert_eq!(asset.root.mesh_count(), 1);

        let mut textured = false;
        let mut root = asset.root;
        root.traverse_meshes_mut(&mut |m| {
            textured = m.material.as_standard().is_some_and(|s| s.map.is_some());
        });
        assert!(textured);
    }

    #[test]
    fn test_missing_texture_is_not_fatal() {
        let asset = load_batch(&external_batch(false)).unwrap();
        assert_eq!(asset.unresolved, ["b.png"]);
        assert_eq!(asset.root.mesh_count(), 1);
    }

    #[test]
    fn test_missing_buffer_drops_primitives() {
        let batch = FileBatch::new(vec![BatchFile::from_bytes("model.gltf", gltf_external())]);
        let asset = load_batch(&batch).unwrap();
        assert_eq!(asset.unresolved, ["a.bin", "b.png"]);
        assert_eq!(asset.root.mesh_count(), 0);
    }

    #[test]
    fn test_blobs_released_on_success_and_failure() {
        let mut scope = BlobScope::new();
        load_in_scope(&external_batch(true), &mut scope).unwrap();
        assert_eq!(scope.live_count(), 0);

        let broken = FileBatch::new(vec![
            BatchFile::from_bytes("model.gltf", b"{ not json".to_vec()),
            BatchFile::from_bytes("a.bin", triangle_bin()),
        ]);
        let mut scope = BlobScope::new();
        let err = load_in_scope(&broken, &mut scope).unwrap_err();
        assert!(matches!(err, LoadError::Json(_)));
        assert_eq!(err.user_message(), MSG_PARSE_FAILED);
        assert_eq!(scope.live_count(), 0);
    }

    #[test]
    fn test_glb_and_data_uri_load() {
        let glb = FileBatch::new(vec![BatchFile::from_bytes("tri.glb", glb_triangle())]);
        assert_eq!(load_batch(&glb).unwrap().root.mesh_count(), 1);

        let embedded = FileBatch::new(vec![BatchFile::from_bytes("tri.gltf", gltf_embedded())]);
        assert_eq!(load_batch(&embedded).unwrap().root.mesh_count(), 1);
    }

    #[test]
    fn test_gltf_with_byte_order_mark() {
        let mut bytes = b"\xEF\xBB\xBF".to_vec();
        bytes.extend(gltf_embedded());
        let batch = FileBatch::new(vec![BatchFile::from_bytes("bom.gltf", bytes)]);
        assert_eq!(load_batch(&batch).unwrap().root.mesh_count(), 1);
    }

    #[test]
    fn test_invalid_glb_is_parse_error() {
        let batch = FileBatch::new(vec![BatchFile::from_bytes("bad.glb", b"glTFgarbage".to_vec())]);
        let err = load_batch(&batch).unwrap_err();
        assert!(matches!(err, LoadError::Gltf(_)));
    }

    #[test]
    fn test_read_failure_message() {
        let dir = tempfile::tempdir().unwrap();
        let batch = FileBatch::from_paths([dir.path().join("missing.glb")]);
        let err = load_batch(&batch).unwrap_err();
        assert!(matches!(err, LoadError::Read { .. }));
        assert_eq!(err.user_message(), MSG_READ_FAILED);
    }

    #[test]
    fn test_unsupported_batch() {
        let batch = FileBatch::new(vec![BatchFile::from_bytes("notes.txt", vec![])]);
        let err = load_batch(&batch).unwrap_err();
        assert_eq!(err.user_message(), MSG_REJECTED);
    }
}
