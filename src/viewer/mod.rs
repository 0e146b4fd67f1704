//! 3D model viewer
//!
//! Owns the scene, the orbit camera and the single attached model. Loads run
//! on a background task; results are applied on the UI thread from `poll`.
//!
//! Overlapping loads: every accepted batch bumps a monotonic attempt counter.
//! Only the newest attempt's result is applied; older results are discarded
//! when they arrive.

mod controls;
mod frame;
mod import;
pub mod loader;
mod normalize;
mod orbit;
mod resources;

pub use controls::{HexColor, MaterialControls, ModelControls, ParseHexColorError};
pub use frame::FrameLoop;
pub use loader::{AssetKind, BatchFile, FileBatch, LoadError, LoadedAsset};
pub use orbit::OrbitControls;
pub use resources::{BlobRegistry, BlobScope, BlobUrl, ResourceMap};

use crate::config::ViewerConfig;
use crate::rasterizer::{Camera, Framebuffer, ShadowMap, Vec3};
use crate::scene::{render_scene, Node, ObjectHandle, SceneGraph};
use crate::task::AsyncOp;

const CAMERA_START: Vec3 = Vec3::new(0.0, 2.0, 5.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerState {
    /// No model, controls hidden
    Empty,
    /// Newest attempt still in flight
    Loading,
    /// Model attached
    Ready,
    /// Last read or parse failed and no model is attached
    Error,
}

/// Renderer switches owned by the dashboard settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOptions {
    pub show_grid: bool,
    pub shadows: bool,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            show_grid: true,
            shadows: true,
        }
    }
}

struct PendingLoad {
    attempt: u64,
    file_name: String,
    op: AsyncOp<Result<LoadedAsset, LoadError>>,
}

pub struct Viewer {
    scene: SceneGraph,
    camera: Camera,
    orbit: OrbitControls,
    frame_loop: FrameLoop,
    framebuffer: Framebuffer,
    shadow_map: ShadowMap,
    target_size: f32,

    pub model_controls: ModelControls,
    pub material_controls: MaterialControls,

    model: Option<ObjectHandle>,
    model_file: Option<String>,
    error_message: Option<String>,
    /// Set by a failed read or parse, not by a rejected file type
    load_failed: bool,
    attempt: u64,
    in_flight: Vec<PendingLoad>,
}

impl Viewer {
    pub fn new(config: &ViewerConfig) -> Self {
        let material_controls = MaterialControls::default();
        let mut orbit = OrbitControls::new(CAMERA_START, Vec3::ZERO);
        orbit.save_state();
        let mut camera = Camera::perspective(75.0, 0.1, 1000.0);
        orbit.apply(&mut camera);

        Self {
            scene: SceneGraph::with_default_lights(material_controls.background.to_color()),
            camera,
            orbit,
            frame_loop: FrameLoop::register(),
            framebuffer: Framebuffer::new(1, 1),
            shadow_map: ShadowMap::new(config.shadow_map_size.max(1)),
            target_size: config.target_size,
            model_controls: ModelControls::default(),
            material_controls,
            model: None,
            model_file: None,
            error_message: None,
            load_failed: false,
            attempt: 0,
            in_flight: Vec::new(),
        }
    }

    pub fn state(&self) -> ViewerState {
        if self.is_loading() {
            ViewerState::Loading
        } else if self.model.is_some() {
            ViewerState::Ready
        } else if self.load_failed {
            ViewerState::Error
        } else {
            ViewerState::Empty
        }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.iter().any(|p| p.attempt == self.attempt)
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Name of the file being loaded, else of the attached model
    pub fn file_name(&self) -> Option<&str> {
        self.in_flight
            .iter()
            .find(|p| p.attempt == self.attempt)
            .map(|p| p.file_name.as_str())
            .or(self.model_file.as_deref())
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn orbit_mut(&mut self) -> &mut OrbitControls {
        &mut self.orbit
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// The attached model's pivot node
    pub fn model(&self) -> Option<&Node> {
        self.model.and_then(|h| self.scene.get(h))
    }

    /// Accept a dropped or selected batch and start loading its primary asset
    ///
    /// A batch with no `.glb` / `.gltf` file only sets the rejection message.
    /// Returns the attempt number.
    pub fn submit_batch(&mut self, batch: FileBatch) -> Result<u64, LoadError> {
        let Some((primary, _)) = batch.primary() else {
            let name = batch.files.first().map(|f| f.name.clone()).unwrap_or_default();
            tracing::warn!(file = %name, "rejected file type");
            let err = LoadError::Unsupported(name);
            self.error_message = Some(err.user_message().to_string());
            return Err(err);
        };
        let file_name = primary.name.clone();

        self.attempt += 1;
        let attempt = self.attempt;
        self.error_message = None;
        self.load_failed = false;
        tracing::info!(attempt, file = %file_name, siblings = batch.files.len() - 1, "loading model");

        let op = AsyncOp::spawn(move || loader::load_batch(&batch));
        self.in_flight.push(PendingLoad { attempt, file_name, op });
        Ok(attempt)
    }

    /// Apply finished loads. Returns true if the viewer state changed.
    pub fn poll(&mut self) -> bool {
        let mut finished = Vec::new();
        self.in_flight.retain_mut(|p| match p.op.poll() {
            Some(result) => {
                finished.push((p.attempt, p.file_name.clone(), result));
                false
            }
            None => true,
        });

        let mut changed = false;
        for (attempt, file_name, result) in finished {
            let result = result.map_err(LoadError::from).and_then(|r| r);
            changed |= self.complete_attempt(attempt, &file_name, result);
        }
        changed
    }

    fn complete_attempt(&mut self, attempt: u64, file_name: &str, result: Result<LoadedAsset, LoadError>) -> bool {
        if attempt != self.attempt {
            tracing::info!(attempt, current = self.attempt, file = %file_name, "stale load discarded");
            return false;
        }
        match result {
            Ok(asset) => self.attach(asset),
            Err(err) => {
                tracing::error!(attempt, file = %file_name, error = %err, source = ?std::error::Error::source(&err), "model load failed");
                self.error_message = Some(err.user_message().to_string());
                self.load_failed = true;
            }
        }
        true
    }

    /// Replace the current model with `asset`
    fn attach(&mut self, asset: LoadedAsset) {
        if let Some(previous) = self.model.take() {
            self.scene.remove(previous);
        }

        let mut root = asset.root;
        let controls = self.material_controls;
        root.traverse_meshes_mut(&mut |mesh| {
            mesh.cast_shadow = true;
            mesh.receive_shadow = true;
            if let Some(mat) = mesh.material.as_standard_mut() {
                mat.color = controls.color.to_color().to_linear();
                apply_material_controls(mat, &controls);
            }
        });

        let mut pivot = normalize::normalize(root, self.target_size);
        self.model_controls = ModelControls::default();
        self.apply_live_transform_to(&mut pivot);

        if !asset.unresolved.is_empty() {
            tracing::warn!(file = %asset.file_name, missing = ?asset.unresolved, "model attached without some resources");
        }
        tracing::info!(file = %asset.file_name, meshes = pivot.mesh_count(), "model attached");
        self.model = Some(self.scene.add(pivot));
        self.model_file = Some(asset.file_name);
        self.error_message = None;
        self.load_failed = false;
    }

    fn apply_live_transform_to(&self, pivot: &mut Node) {
        let c = &self.model_controls;
        normalize::apply_live_transform(pivot, Vec3::new(c.rotation_x, c.rotation_y, c.rotation_z), c.scale);
    }

    fn for_each_standard(&mut self, f: impl Fn(&mut crate::scene::StandardMaterial)) {
        let Some(node) = self.model.and_then(|h| self.scene.get_mut(h)) else {
            return;
        };
        node.traverse_meshes_mut(&mut |mesh| {
            if let Some(mat) = mesh.material.as_standard_mut() {
                f(mat);
            }
        });
    }

    /// Push the color control to the model's standard materials
    pub fn update_model_color(&mut self) {
        let color = self.material_controls.color.to_color().to_linear();
        self.for_each_standard(|mat| mat.color = color);
    }

    /// Push metalness, roughness, opacity and wireframe to the model
    pub fn update_material(&mut self) {
        let controls = self.material_controls;
        self.for_each_standard(|mat| apply_material_controls(mat, &controls));
    }

    pub fn update_background_color(&mut self) {
        self.scene.background = self.material_controls.background.to_color();
    }

    /// Restore every control to its default and reset the camera
    ///
    /// The model stays attached.
    pub fn reset_model(&mut self) {
        self.model_controls = ModelControls::default();
        self.material_controls = MaterialControls::default();
        self.update_model_color();
        self.update_material();
        self.update_background_color();
        self.orbit.reset();
        self.orbit.apply(&mut self.camera);
        tracing::debug!("viewer controls reset");
    }

    /// Detach the current model. Returns false if there was none.
    pub fn remove_model(&mut self) -> bool {
        let Some(handle) = self.model.take() else {
            return false;
        };
        self.scene.remove(handle);
        let file = self.model_file.take();
        tracing::info!(file = file.as_deref().unwrap_or(""), "model removed");
        true
    }

    pub fn clear_error(&mut self) {
        self.error_message = None;
        self.load_failed = false;
    }

    /// Resize the internal render target
    pub fn resize(&mut self, width: usize, height: usize) {
        let (width, height) = (width.max(1), height.max(1));
        if self.framebuffer.width != width || self.framebuffer.height != height {
            self.framebuffer.resize(width, height);
        }
    }

    /// One frame: live transform, orbit damping, render
    ///
    /// Does nothing after `teardown`.
    pub fn frame(&mut self, options: FrameOptions) {
        if !self.frame_loop.tick() {
            return;
        }

        if let Some(handle) = self.model {
            let c = self.model_controls;
            if let Some(pivot) = self.scene.get_mut(handle) {
                normalize::apply_live_transform(pivot, Vec3::new(c.rotation_x, c.rotation_y, c.rotation_z), c.scale);
            }
        }

        self.orbit.update();
        self.orbit.apply(&mut self.camera);

        self.scene.show_grid = options.show_grid;
        render_scene(
            &mut self.framebuffer,
            &self.scene,
            &self.camera,
            Some(&mut self.shadow_map),
            options.shadows,
        );
    }

    /// Cancel the frame loop. Safe to call more than once.
    pub fn teardown(&mut self) {
        self.frame_loop.teardown();
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.frame_loop.is_active()
    }
}

fn apply_material_controls(mat: &mut crate::scene::StandardMaterial, controls: &MaterialControls) {
    mat.metalness = controls.metalness;
    mat.roughness = controls.roughness;
    mat.opacity = controls.opacity;
    mat.transparent = controls.opacity < 1.0;
    mat.wireframe = controls.wireframe;
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::loader::fixtures;
    use super::loader::{MSG_PARSE_FAILED, MSG_REJECTED};
    use super::*;
    use crate::rasterizer::Rgb;

    fn viewer() -> Viewer {
        Viewer::new(&ViewerConfig::default())
    }

    fn settle(viewer: &mut Viewer) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !viewer.in_flight.is_empty() {
            viewer.poll();
            assert!(Instant::now() < deadline, "load did not finish");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    fn glb_batch(name: &str) -> FileBatch {
        FileBatch::new(vec![BatchFile::from_bytes(name, fixtures::glb_triangle())])
    }

    fn model_color(viewer: &Viewer) -> Option<Rgb> {
        let mut color = None;
        let mut node = viewer.model()?.clone();
        node.traverse_meshes_mut(&mut |m| color = m.material.as_standard().map(|s| s.color));
        color
    }

    fn model_materials(viewer: &Viewer) -> Vec<crate::scene::StandardMaterial> {
        let mut materials = Vec::new();
        if let Some(node) = viewer.model() {
            let mut node = node.clone();
            node.traverse_meshes_mut(&mut |m| materials.extend(m.material.as_standard().cloned()));
        }
        materials
    }

    #[test]
    fn test_rejected_file_keeps_state() {
        let mut v = viewer();
        let batch = FileBatch::new(vec![BatchFile::from_bytes("model.OBJ", vec![1, 2])]);
        assert!(v.submit_batch(batch).is_err());
        assert_eq!(v.error_message(), Some(MSG_REJECTED));
        assert_eq!(v.state(), ViewerState::Empty);
        assert!(!v.has_model());

        v.submit_batch(glb_batch("a.glb")).unwrap();
        settle(&mut v);
        let bad = FileBatch::new(vec![BatchFile::from_bytes("notes.txt", vec![])]);
        assert!(v.submit_batch(bad).is_err());
        assert_eq!(v.state(), ViewerState::Ready);
        assert_eq!(v.file_name(), Some("a.glb"));
    }

    #[test]
    fn test_glb_load_fits_to_two_units() {
        let mut v = viewer();
        v.model_controls.rotation_y = 45.0;
        v.model_controls.scale = 3.0;
        v.submit_batch(glb_batch("tri.GLB")).unwrap();
        assert_eq!(v.state(), ViewerState::Loading);
        assert_eq!(v.file_name(), Some("tri.GLB"));
        settle(&mut v);

        assert_eq!(v.state(), ViewerState::Ready);
        assert_eq!(v.model_controls, ModelControls::default());
        let size = v.model().unwrap().bounds().size();
        assert!((size.max_element() - 2.0).abs() < 1e-4);

        let mut shadows = true;
        let mut node = v.model().unwrap().clone();
        node.traverse_meshes_mut(&mut |m| shadows &= m.cast_shadow && m.receive_shadow);
        assert!(shadows);
    }

    #[test]
    fn test_material_controls_apply_on_load_and_persist() {
        let mut v = viewer();
        v.material_controls.color = HexColor(0xff0000);
        v.material_controls.opacity = 0.5;
        v.submit_batch(glb_batch("tri.glb")).unwrap();
        settle(&mut v);

        let color = model_color(&v).unwrap();
        assert!((color.r - 1.0).abs() < 1e-4 && color.g.abs() < 1e-4);
        let mut node = v.model().unwrap().clone();
        node.traverse_meshes_mut(&mut |m| {
            let s = m.material.as_standard().unwrap();
            assert!(s.transparent);
            assert_eq!(s.metalness, 0.5);
        });
        assert_eq!(v.material_controls.color, HexColor(0xff0000));
    }

    #[test]
    fn test_update_calls_touch_only_their_properties() {
        let mut v = viewer();
        v.submit_batch(glb_batch("tri.glb")).unwrap();
        settle(&mut v);

        v.material_controls.color = HexColor(0x00ff00);
        v.material_controls.metalness = 0.9;
        v.update_model_color();
        let mut node = v.model().unwrap().clone();
        node.traverse_meshes_mut(&mut |m| {
            let s = m.material.as_standard().unwrap();
            assert!((s.color.g - 1.0).abs() < 1e-4);
            assert_eq!(s.metalness, 0.5);
        });

        v.update_material();
        let mut node = v.model().unwrap().clone();
        node.traverse_meshes_mut(&mut |m| assert_eq!(m.material.as_standard().unwrap().metalness, 0.9));

        v.material_controls.background = HexColor(0x000000);
        v.update_background_color();
        assert_eq!(v.scene().background, crate::rasterizer::Color::from_hex(0x000000));
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut v = viewer();
        v.reset_model();

        v.submit_batch(glb_batch("tri.glb")).unwrap();
        settle(&mut v);
        v.material_controls.color = HexColor(0x123456);
        v.material_controls.metalness = 0.1;
        v.material_controls.roughness = 0.9;
        v.material_controls.opacity = 0.4;
        v.material_controls.wireframe = true;
        v.material_controls.background = HexColor(0x000000);
        v.model_controls.rotation_x = 30.0;
        v.update_model_color();
        v.update_material();
        v.update_background_color();
        v.orbit_mut().zoom(4.0);
        assert!(model_materials(&v).iter().all(|m| m.wireframe && m.transparent));

        v.reset_model();
        assert_eq!(v.model_controls, ModelControls::default());
        assert_eq!(v.material_controls, MaterialControls::default());
        assert!(v.has_model());
        let expected = HexColor(0x8b5cf6).to_color().to_linear();
        assert_eq!(model_color(&v), Some(expected));

        let materials = model_materials(&v);
        assert!(!materials.is_empty());
        for m in &materials {
            assert_eq!(m.metalness, 0.5);
            assert_eq!(m.roughness, 0.5);
            assert_eq!(m.opacity, 1.0);
            assert!(!m.transparent);
            assert!(!m.wireframe);
        }
        assert_eq!(v.scene().background, HexColor(0x1a1a2e).to_color());
        assert!((v.camera().position - CAMERA_START).len() < 1e-4);
    }

    #[test]
    fn test_remove_twice_is_safe() {
        let mut v = viewer();
        assert!(!v.remove_model());

        v.submit_batch(glb_batch("tri.glb")).unwrap();
        settle(&mut v);
        assert_eq!(v.scene().len(), 1);
        assert!(v.remove_model());
        assert!(!v.remove_model());
        assert_eq!(v.scene().len(), 0);
        assert_eq!(v.state(), ViewerState::Empty);
        assert_eq!(v.file_name(), None);
    }

    #[test]
    fn test_newer_attempt_wins() {
        let mut v = viewer();
        let first = v.submit_batch(glb_batch("first.glb")).unwrap();
        let second = v.submit_batch(glb_batch("second.glb")).unwrap();
        assert!(second > first);
        settle(&mut v);
        assert_eq!(v.file_name(), Some("second.glb"));
        assert_eq!(v.scene().len(), 1);
    }

    #[test]
    fn test_stale_failure_is_ignored() {
        let mut v = viewer();
        v.submit_batch(glb_batch("good.glb")).unwrap();
        settle(&mut v);
        let stale = v.attempt;
        v.submit_batch(glb_batch("next.glb")).unwrap();
        assert!(!v.complete_attempt(stale, "old.glb", Err(LoadError::Unsupported("old.glb".into()))));
        assert_eq!(v.error_message(), None);
        settle(&mut v);
        assert_eq!(v.file_name(), Some("next.glb"));
    }

    #[test]
    fn test_parse_failure_then_clear() {
        let mut v = viewer();
        let batch = FileBatch::new(vec![BatchFile::from_bytes("broken.glb", b"not a model".to_vec())]);
        v.submit_batch(batch).unwrap();
        settle(&mut v);
        assert_eq!(v.state(), ViewerState::Error);
        assert_eq!(v.error_message(), Some(MSG_PARSE_FAILED));
        v.clear_error();
        assert_eq!(v.state(), ViewerState::Empty);
    }

    #[test]
    fn test_failure_keeps_prior_model() {
        let mut v = viewer();
        v.submit_batch(glb_batch("good.glb")).unwrap();
        settle(&mut v);
        let batch = FileBatch::new(vec![BatchFile::from_bytes("broken.glb", b"nope".to_vec())]);
        v.submit_batch(batch).unwrap();
        settle(&mut v);
        assert_eq!(v.state(), ViewerState::Ready);
        assert_eq!(v.file_name(), Some("good.glb"));
        assert_eq!(v.error_message(), Some(MSG_PARSE_FAILED));
    }

    #[test]
    fn test_frame_applies_live_transform_until_teardown() {
        let mut v = viewer();
        v.resize(32, 24);
        v.submit_batch(glb_batch("tri.glb")).unwrap();
        settle(&mut v);

        v.model_controls.scale = 2.0;
        v.frame(FrameOptions::default());
        let size = v.model().unwrap().bounds().size();
        assert!((size.max_element() - 4.0).abs() < 1e-4);

        v.teardown();
        v.teardown();
        assert!(!v.is_running());
        v.model_controls.scale = 1.0;
        v.frame(FrameOptions::default());
        let size = v.model().unwrap().bounds().size();
        assert!((size.max_element() - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_frame_without_model_clears_to_background() {
        let mut v = viewer();
        v.resize(16, 16);
        v.frame(FrameOptions {
            show_grid: false,
            shadows: false,
        });
        assert_eq!(v.framebuffer().get_pixel(0, 0), Some(HexColor(0x1a1a2e).to_color()));
    }
}
