//! Overlay window.
//!
//! Runs the render loop at display refresh rate: every `RedrawRequested`
//! event runs one tick, presents the composite and requests the next redraw.
//! Closing the window unmounts the session.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::classifier::GestureClassifier;
use crate::error::OverlayError;
use crate::frame::FrameSource;
use crate::gpu::Presenter;
use crate::lifecycle::LifecycleManager;
use crate::render_loop::{RenderLoop, TickOutcome};
use crate::session::Session;
use crate::surface::ImageSurface;
use crate::time::Clock;

struct OverlayApp<F: FrameSource, C: GestureClassifier, K> {
    manager: LifecycleManager,
    session: Session<F, C, ImageSurface, K>,
    render_loop: RenderLoop,
    window: Option<Arc<Window>>,
    presenter: Option<Presenter>,
    error: Option<OverlayError>,
}

impl<F, C, K> OverlayApp<F, C, K>
where
    F: FrameSource,
    C: GestureClassifier,
    K: Clock,
{
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.render_loop.stop(&mut self.session);
        self.manager.unmount(&mut self.session);
        event_loop.exit();
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<(), OverlayError> {
        let size = self.session.surface().image().dimensions();
        let window_attrs = Window::default_attributes()
            .with_title("palmburst - open your palm")
            .with_inner_size(winit::dpi::PhysicalSize::new(size.0, size.1));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let presenter = pollster::block_on(Presenter::new(
            window.clone(),
            size,
            self.manager.config().mirror,
        ))
        .map_err(OverlayError::from)?;

        self.window = Some(window);
        self.presenter = Some(presenter);
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        if self.render_loop.tick(&mut self.session) == TickOutcome::Stopped {
            event_loop.exit();
            return;
        }

        let composite = match self.session.last_frame() {
            Some(frame) => self.session.surface().composite_over(&frame.image),
            None => self.session.surface().image().clone(),
        };

        if let Some(presenter) = &mut self.presenter {
            match presenter.present(&composite) {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    presenter.reconfigure()
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("GPU out of memory; closing overlay");
                    self.shutdown(event_loop);
                    return;
                }
                Err(e) => log::warn!("present failed: {:?}", e),
            }
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl<F, C, K> ApplicationHandler for OverlayApp<F, C, K>
where
    F: FrameSource,
    C: GestureClassifier,
    K: Clock,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.create_window(event_loop) {
            log::error!("failed to open overlay: {}", e);
            self.error = Some(e);
            self.shutdown(event_loop);
            return;
        }
        if !self.render_loop.start(&mut self.session) {
            log::error!("render loop could not start");
            self.shutdown(event_loop);
            return;
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
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
                self.shutdown(event_loop);
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(presenter) = &mut self.presenter {
                    presenter.resize(physical_size);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // Idempotent; covers exits that did not go through `shutdown`.
        self.render_loop.stop(&mut self.session);
        self.manager.unmount(&mut self.session);
    }
}

/// Open the overlay window and drive `session` until it is closed.
///
/// The session is unmounted on every exit path.
pub fn run_overlay<F, C, K>(
    manager: LifecycleManager,
    mut session: Session<F, C, ImageSurface, K>,
) -> Result<(), OverlayError>
where
    F: FrameSource,
    C: GestureClassifier,
    K: Clock,
{
    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            manager.unmount(&mut session);
            return Err(e.into());
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = OverlayApp {
        manager,
        session,
        render_loop: RenderLoop::new(),
        window: None,
        presenter: None,
        error: None,
    };
    let result = event_loop.run_app(&mut app);
    app.manager.unmount(&mut app.session);
    result?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
