use std::{rc::Rc, sync::Arc};

use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes},
};

use crate::{
    config::ViewerConfig,
    error::{Result, ViewerError},
    gfx::{
        assets::AssetLibrary,
        camera::{CameraManager, FocusHandle, SharedCamera},
        rendering::RenderEngine,
        scene::Scene,
    },
    input::{DoubleClickDetector, ListenerGuard, PointerRouter, ViewportRect},
    interaction::FocusResolver,
};

/// Scene viewer application: owns the event loop until `run` is called.
pub struct ViewerApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    config: ViewerConfig,
    viewport: Option<Viewport>,
    error: Option<ViewerError>,
}

/// Everything that lives between mount and unmount of the render surface.
///
/// Field order is drop order: the focus listener detaches before the scene
/// and camera it points at are released.
struct Viewport {
    _focus_guard: ListenerGuard,
    router: PointerRouter,
    camera: SharedCamera,
    scene: Rc<Scene>,
    render_engine: RenderEngine,
    window: Arc<Window>,
}

impl ViewerApp {
    pub fn new(config: ViewerConfig) -> Result<Self> {
        let event_loop = EventLoop::new()?;
        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                config,
                viewport: None,
                error: None,
            },
        })
    }

    /// Runs the event loop until the window closes.
    ///
    /// Returns the first fatal error raised inside the loop, if any.
    pub fn run(mut self) -> Result<()> {
        let Some(event_loop) = self.event_loop.take() else {
            return Ok(());
        };
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self.app_state)?;

        match self.app_state.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: ViewerError) {
        log::error!("{error}");
        self.viewport = None;
        self.error.get_or_insert(error);
        event_loop.exit();
    }
}

impl Viewport {
    fn mount(event_loop: &ActiveEventLoop, config: &ViewerConfig) -> Result<Self> {
        let window = Arc::new(
            event_loop.create_window(
                WindowAttributes::default()
                    .with_title(config.window.title.clone())
                    .with_inner_size(LogicalSize::new(config.window.width, config.window.height)),
            )?,
        );
        let (width, height) = window.inner_size().into();

        let render_engine = pollster::block_on(RenderEngine::new(
            window.clone(),
            width,
            height,
            &config.lighting,
        ))?;

        let mut library = AssetLibrary::new(&config.scene);
        let mut scene = Scene::from_options(&config.scene, &mut library)?;
        scene.init_gpu_resources(render_engine.device(), render_engine.node_bind_group_layout());
        let scene = Rc::new(scene);

        let aspect = width.max(1) as f32 / height.max(1) as f32;
        let camera = CameraManager::from_options(&config.camera, aspect).into_shared();

        let router = PointerRouter::new(DoubleClickDetector::from_options(&config.input));
        let focus_guard =
            FocusResolver::new(FocusHandle::new(&camera), &scene).attach(router.listeners());

        log::info!("Viewport mounted ({width}x{height})");
        Ok(Self {
            _focus_guard: focus_guard,
            router,
            camera,
            scene,
            render_engine,
            window,
        })
    }

    fn handle_event(&mut self, event: &WindowEvent) {
        let moved = self.camera.borrow_mut().process_event(event);

        let (width, height) = self.window.inner_size().into();
        let focused = self
            .router
            .handle_event(event, ViewportRect::from_size(width, height));

        match event {
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.camera
                    .borrow_mut()
                    .camera
                    .resize_projection(*width, *height);
                self.render_engine.resize(*width, *height);
            }
            _ => {}
        }

        if moved || focused {
            self.window.request_redraw();
        }
    }

    fn redraw(&mut self) -> Result<()> {
        let uniform = {
            let mut manager = self.camera.borrow_mut();
            manager.camera.update_view_proj();
            manager.camera.uniform
        };
        self.render_engine.update(uniform);
        self.render_engine.render_frame(&self.scene)
    }
}

impl Drop for Viewport {
    fn drop(&mut self) {
        log::info!("Viewport unmounted");
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewport.is_some() {
            return;
        }

        match Viewport::mount(event_loop, &self.config) {
            Ok(viewport) => self.viewport = Some(viewport),
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(viewport) = self.viewport.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = viewport.redraw() {
                    self.fail(event_loop, e);
                }
            }
            event => viewport.handle_event(&event),
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        self.viewport = None;
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.viewport = None;
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(viewport) = &self.viewport {
            viewport.window.request_redraw();
        }
    }
}
