use crate::camera::{CameraController, CameraState, CameraTransition};
use crate::loader::{LoadError, LoadedScene, SceneLoader};
use splatview_gpu::PipelineBuildError;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// The control surface of one viewer window.
///
/// Owns the camera, the background loader and any in-flight reset
/// animation. GPU work stays with the window state, which uploads the
/// scenes returned by [`Viewer::poll_scene`].
pub struct Viewer {
    camera: CameraController,
    loader: SceneLoader,
    transition: Option<CameraTransition>,
    current_scene: Option<PathBuf>,
    pipeline_error: Option<PipelineBuildError>,
}

impl Viewer {
    pub fn new(drag_sensitivity: f32) -> Self {
        Self {
            camera: CameraController::new(drag_sensitivity),
            loader: SceneLoader::new(),
            transition: None,
            current_scene: None,
            pipeline_error: None,
        }
    }

    /// Start loading a scene. The current scene stays on screen until the new
    /// one has been parsed.
    pub fn load_scene(&mut self, path: impl Into<PathBuf>) -> Result<u64, LoadError> {
        self.loader.load(path)
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_loading()
    }

    pub fn apply_drag(&mut self, dx: f32, dy: f32) {
        self.transition = None;
        self.camera.apply_drag(dx, dy);
    }

    pub fn apply_zoom(&mut self, factor: f32) {
        self.transition = None;
        self.camera.apply_zoom(factor);
    }

    /// Jump straight to the default camera.
    pub fn reset_camera(&mut self) {
        self.transition = None;
        self.camera.reset();
    }

    /// Ease back to the default camera over `duration` seconds.
    pub fn animate_reset(&mut self, duration: f32) {
        self.transition = Some(CameraTransition::new(
            self.camera.state(),
            CameraState::RESET,
            duration,
        ));
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    /// Advance any running animation by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        let Some(transition) = self.transition.as_mut() else {
            return;
        };
        let state = transition.advance(dt);
        if transition.is_finished() {
            self.reset_camera();
        } else {
            self.camera.set_state(state);
        }
    }

    /// Collect a finished load, if any. Failed loads keep the current scene.
    pub fn poll_scene(&mut self) -> Option<LoadedScene> {
        match self.loader.poll()? {
            Ok(scene) => {
                let bounds = scene.batch.bounds();
                info!(
                    "Loaded {} splats from {} (center={:?}, radius={})",
                    scene.batch.len(),
                    scene.path.display(),
                    bounds.center,
                    bounds.radius
                );
                self.current_scene = Some(scene.path.clone());
                Some(scene)
            }
            Err(err) => {
                error!("Keeping current scene: {err}");
                None
            }
        }
    }

    pub fn current_scene(&self) -> Option<&Path> {
        self.current_scene.as_deref()
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    /// Why the splat pipeline is unavailable, if it is.
    pub fn pipeline_error(&self) -> Option<&PipelineBuildError> {
        self.pipeline_error.as_ref()
    }

    pub fn set_pipeline_error(&mut self, err: PipelineBuildError) {
        self.pipeline_error = Some(err);
    }

    pub fn take_pipeline_error(&mut self) -> Option<PipelineBuildError> {
        self.pipeline_error.take()
    }
}
