use std::collections::HashSet;
use std::path::PathBuf;

use glam::Vec2;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Pixel-precise scroll deltas are converted to wheel lines at this rate.
const LINES_PER_PIXEL: f32 = 0.1;

/// What the viewer should do in response to an input event.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlAction {
    /// Rotate by a drag delta in pixels.
    Drag { dx: f32, dy: f32 },
    /// Magnify by a factor; values above 1 move the camera closer.
    Zoom(f32),
    AnimateReset,
    OpenFile,
    LoadScene(PathBuf),
    Exit,
}

/// Mouse state tracked between events.
#[derive(Debug, Default)]
pub struct InputState {
    mouse_position: Option<Vec2>,
    mouse_down: HashSet<MouseButton>,
}

impl InputState {
    pub fn mouse_position(&self) -> Option<Vec2> {
        self.mouse_position
    }

    pub fn mouse_button_down(&self, button: MouseButton) -> bool {
        self.mouse_down.contains(&button)
    }
}

/// Translates winit window events into [`ControlAction`]s.
#[derive(Debug)]
pub struct Controls {
    input: InputState,
    rotate_button: MouseButton,
    zoom_step: f32,
}

impl Controls {
    /// `zoom_step` is the magnification applied per wheel line.
    pub fn new(zoom_step: f32) -> Self {
        Self {
            input: InputState::default(),
            rotate_button: MouseButton::Left,
            zoom_step,
        }
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn handle_event(&mut self, event: &WindowEvent) -> Option<ControlAction> {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(Vec2::new(position.x as f32, position.y as f32))
            }
            WindowEvent::CursorLeft { .. } => {
                self.input.mouse_position = None;
                None
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.mouse_input(*state, *button);
                None
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * LINES_PER_PIXEL,
                };
                self.wheel(lines)
            }
            WindowEvent::PinchGesture { delta, .. } => self.pinch(*delta),
            WindowEvent::DroppedFile(path) => Some(ControlAction::LoadScene(path.clone())),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(code),
                        repeat: false,
                        ..
                    },
                ..
            } => self.key_pressed(*code),
            _ => None,
        }
    }

    /// Track the cursor; emits a drag while the rotate button is held.
    pub fn cursor_moved(&mut self, position: Vec2) -> Option<ControlAction> {
        let previous = self.input.mouse_position.replace(position);
        if !self.input.mouse_button_down(self.rotate_button) {
            return None;
        }
        let delta = position - previous?;
        if delta == Vec2::ZERO {
            return None;
        }
        Some(ControlAction::Drag {
            dx: delta.x,
            dy: delta.y,
        })
    }

    pub fn mouse_input(&mut self, state: ElementState, button: MouseButton) {
        match state {
            ElementState::Pressed => {
                self.input.mouse_down.insert(button);
            }
            ElementState::Released => {
                self.input.mouse_down.remove(&button);
            }
        }
    }

    pub fn wheel(&self, lines: f32) -> Option<ControlAction> {
        (lines != 0.0).then(|| ControlAction::Zoom(wheel_zoom_factor(self.zoom_step, lines)))
    }

    pub fn pinch(&self, delta: f64) -> Option<ControlAction> {
        (delta != 0.0).then(|| ControlAction::Zoom(pinch_zoom_factor(delta)))
    }

    pub fn key_pressed(&self, code: KeyCode) -> Option<ControlAction> {
        match code {
            KeyCode::KeyR => Some(ControlAction::AnimateReset),
            KeyCode::KeyO => Some(ControlAction::OpenFile),
            KeyCode::Escape => Some(ControlAction::Exit),
            _ => None,
        }
    }
}

/// `step^lines`: scrolling up (positive lines) zooms in.
pub fn wheel_zoom_factor(step: f32, lines: f32) -> f32 {
    step.powf(lines)
}

/// Pinch gestures report incremental magnification around zero.
pub fn pinch_zoom_factor(delta: f64) -> f32 {
    (1.0 + delta) as f32
}
