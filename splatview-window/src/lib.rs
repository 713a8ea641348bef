//! Splatview Window Crate
//!
//! The interactive viewer: winit event loop, orbit camera, gesture controls
//! and background scene loading.

mod app;
mod camera;
mod config;
mod controls;
mod error;
mod loader;
mod viewer;

pub use app::run;
pub use camera::{
    CameraController, CameraState, CameraTransition, DEFAULT_DISTANCE, DEFAULT_DRAG_SENSITIVITY,
    MAX_DISTANCE, MIN_DISTANCE, Projection,
};
pub use config::ViewerConfig;
pub use controls::{ControlAction, Controls, InputState, pinch_zoom_factor, wheel_zoom_factor};
pub use error::ViewerError;
pub use loader::{LoadError, LoadedScene, SceneLoader, read_scene};
pub use viewer::Viewer;
