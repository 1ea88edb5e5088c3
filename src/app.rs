//! Application state and main loop
//!
//! The frame loop is driven by winit's `RedrawRequested`: each invocation
//! runs exactly one frame's work and re-arms itself by requesting the next
//! redraw at the end of the frame body — a self-perpetuating loop with no
//! recursion growth, paced only by the surface present mode.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Fullscreen, Window, WindowId};

use crate::config::Config;
use crate::graphics::StreamGraphics;
use crate::source::FrameSource;

/// Application state
pub struct App {
    /// User configuration
    config: Config,
    /// Window handle (created during resumed event)
    window: Option<Arc<Window>>,
    /// Graphics backend (initialized after window creation)
    graphics: Option<StreamGraphics>,
    /// Frame payload source (runs on its own timer)
    source: FrameSource,
    /// Whether frame scheduling should stop
    should_exit: bool,
}

impl App {
    pub fn new(config: Config) -> Self {
        let source = FrameSource::start(Duration::from_millis(
            config.stream.source_period_ms.max(1),
        ));
        Self {
            config,
            window: None,
            graphics: None,
            source,
            should_exit: false,
        }
    }

    /// Render one frame and re-arm the redraw.
    fn render(&mut self) {
        let Some(graphics) = &mut self.graphics else {
            return;
        };

        let payload = self.source.current();
        if let Err(e) = graphics.render_frame(&payload) {
            // Allocation failure or device error: stop scheduling frames
            // rather than proceeding with an undefined buffer.
            tracing::error!("Frame failed, stopping frame scheduling: {e:#}");
            self.should_exit = true;
            return;
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        let window_attributes = Window::default_attributes()
            .with_title("texstream")
            .with_inner_size(LogicalSize::new(1280, 720));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                tracing::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        if self.config.video.fullscreen {
            window.set_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        match StreamGraphics::new(window.clone(), &self.config) {
            Ok(graphics) => {
                self.graphics = Some(graphics);
                // Kick off the self-perpetuating frame loop
                window.request_redraw();
                self.window = Some(window);
            }
            Err(e) => {
                tracing::error!("Failed to initialize graphics: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("Window close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(graphics) = &mut self.graphics {
                    graphics.resize(new_size.width, new_size.height);
                }
            }
            WindowEvent::KeyboardInput {
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
                self.render();
                if self.should_exit {
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }
}

/// Run the event loop until the window closes or a frame fails.
pub fn run(config: Config) -> Result<()> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;
    Ok(())
}
