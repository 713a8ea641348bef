use crate::config::ViewerConfig;
use crate::controls::{ControlAction, Controls};
use crate::error::ViewerError;
use crate::loader::LoadedScene;
use crate::viewer::Viewer;
use splatview_gpu::{FrameOutcome, FrameRenderer, Renderer, SplatBuffer, SurfaceWrapper};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Instant;
use tracing::{debug, error, warn};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowId};

/// Open a viewer window and run until it is closed.
///
/// If the splat pipeline could not be built the window still runs, showing
/// only the clear color, and the build error is returned once it closes.
pub fn run(config: ViewerConfig) -> Result<(), ViewerError> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);
    let run_result = event_loop.run_app(&mut app);
    let app_result = app.finish();
    run_result?;
    app_result
}

struct App {
    config: ViewerConfig,
    state: Option<ViewerState>,
    error: Option<ViewerError>,
}

impl App {
    fn new(config: ViewerConfig) -> Self {
        Self {
            config,
            state: None,
            error: None,
        }
    }

    fn finish(self) -> Result<(), ViewerError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        match self
            .state
            .and_then(|mut state| state.viewer.take_pipeline_error())
        {
            Some(err) => Err(ViewerError::Pipeline(err)),
            None => Ok(()),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() || self.error.is_some() {
            return;
        }

        match ViewerState::new(event_loop, &self.config) {
            Ok(state) => self.state = Some(state),
            Err(err) => {
                error!("Failed to initialize viewer: {err}");
                self.error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if state.window.id() != window_id {
            return;
        }

        if let Some(action) = state.controls.handle_event(&event) {
            state.handle_action(event_loop, action);
            return;
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size),
            WindowEvent::RedrawRequested => state.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = self.state.as_ref() {
            state.window.request_redraw();
        }
    }
}

struct ViewerState {
    window: Arc<Window>,
    renderer: Renderer,
    surface: SurfaceWrapper,
    frame: FrameRenderer,
    viewer: Viewer,
    controls: Controls,
    title: String,
    reset_duration: f32,
    dialog_tx: Sender<Option<PathBuf>>,
    dialog_rx: Receiver<Option<PathBuf>>,
    dialog_open: bool,
    last_frame: Instant,
    last_outcome: Option<FrameOutcome>,
}

impl ViewerState {
    fn new(event_loop: &ActiveEventLoop, config: &ViewerConfig) -> Result<Self, ViewerError> {
        let window_attributes = Window::default_attributes()
            .with_title(config.title.as_str())
            .with_inner_size(PhysicalSize::new(config.width, config.height));
        let window = Arc::new(event_loop.create_window(window_attributes)?);

        let renderer = pollster::block_on(Renderer::new())?;
        let size = window.inner_size();

        let surface = renderer
            .instance()
            .create_surface(window.clone())
            .map_err(splatview_gpu::RendererError::from)?;
        let surface = renderer.create_surface(surface, size.width.max(1), size.height.max(1))?;

        let mut frame = FrameRenderer::new(&renderer, config.wgpu_clear_color())?;
        let mut viewer = Viewer::new(config.drag_sensitivity);

        if let Err(err) = frame.install_pipeline(&renderer, surface.format()) {
            warn!("Presenting clear color only");
            viewer.set_pipeline_error(err);
        }

        if let Some(path) = config.initial_scene.clone() {
            viewer.load_scene(path)?;
        }

        let (dialog_tx, dialog_rx) = mpsc::channel();

        Ok(Self {
            window,
            renderer,
            surface,
            frame,
            viewer,
            controls: Controls::new(config.zoom_step),
            title: config.title.clone(),
            reset_duration: config.reset_duration,
            dialog_tx,
            dialog_rx,
            dialog_open: false,
            last_frame: Instant::now(),
            last_outcome: None,
        })
    }

    fn handle_action(&mut self, event_loop: &ActiveEventLoop, action: ControlAction) {
        match action {
            ControlAction::Drag { dx, dy } => self.viewer.apply_drag(dx, dy),
            ControlAction::Zoom(factor) => self.viewer.apply_zoom(factor),
            ControlAction::AnimateReset => self.viewer.animate_reset(self.reset_duration),
            ControlAction::OpenFile => self.open_file_dialog(),
            ControlAction::LoadScene(path) => self.load_scene(path),
            ControlAction::Exit => event_loop.exit(),
        }
    }

    fn load_scene(&mut self, path: PathBuf) {
        if let Err(err) = self.viewer.load_scene(path) {
            error!("{err}");
        }
    }

    /// Show the native file picker on a helper thread; the choice arrives on
    /// `dialog_rx` and is loaded on the next frame.
    fn open_file_dialog(&mut self) {
        if self.dialog_open {
            return;
        }
        let sender = self.dialog_tx.clone();
        let spawned = std::thread::Builder::new()
            .name("file-dialog".into())
            .spawn(move || {
                let picked = rfd::FileDialog::new()
                    .add_filter("PLY Files", &["ply"])
                    .add_filter("All Files", &["*"])
                    .pick_file();
                let _ = sender.send(picked);
            });
        match spawned {
            Ok(_) => self.dialog_open = true,
            Err(err) => error!("Failed to open file dialog: {err}"),
        }
    }

    fn poll_file_dialog(&mut self) {
        while let Ok(picked) = self.dialog_rx.try_recv() {
            self.dialog_open = false;
            match picked {
                Some(path) => self.load_scene(path),
                None => debug!("File dialog cancelled"),
            }
        }
    }

    fn install_scene(&mut self, scene: LoadedScene) {
        match SplatBuffer::build(&self.renderer, &scene.batch) {
            Ok(buffer) => {
                // The previous buffer is dropped only after the new one is installed.
                let previous = self.frame.replace_splats(buffer);
                drop(previous);

                let name = scene
                    .path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| scene.path.display().to_string());
                self.window.set_title(&format!(
                    "{} - {} ({} splats)",
                    self.title,
                    name,
                    scene.batch.len()
                ));
            }
            Err(err) => error!("Failed to upload {}: {err}", scene.path.display()),
        }
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.surface
            .resize(self.renderer.device(), new_size.width, new_size.height);
        debug!("Resized to {}x{}", new_size.width, new_size.height);
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.poll_file_dialog();
        self.viewer.advance(dt);
        if let Some(scene) = self.viewer.poll_scene() {
            self.install_scene(scene);
        }

        match self
            .frame
            .render(&self.renderer, &self.surface, self.viewer.camera())
        {
            Ok(outcome) => {
                if self.last_outcome != Some(outcome) {
                    debug!(?outcome, "Frame outcome changed");
                    self.last_outcome = Some(outcome);
                }
            }
            Err(
                splatview_gpu::wgpu::SurfaceError::Lost | splatview_gpu::wgpu::SurfaceError::Outdated,
            ) => {
                let size = self.window.inner_size();
                self.resize(size);
            }
            Err(splatview_gpu::wgpu::SurfaceError::OutOfMemory) => {
                error!("GPU Out of Memory - exiting");
                event_loop.exit();
            }
            Err(e) => error!("Render error: {:?}", e),
        }
    }
}
