// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The winit event loop that owns the window, the renderer and the user application.

use crate::config::EngineConfig;
use crate::orchestrator::FrameOrchestrator;
use crate::overlay::KeyboardOverlay;
use anyhow::{Context, Result};
use umbra_core::platform::input::InputSnapshot;
use umbra_core::platform::window::UmbraWindow;
use umbra_core::renderer::api::common::Extent2D;
use umbra_core::renderer::traits::DebugOverlay;
use umbra_core::scene::{CameraMode, Scene};
use umbra_infra::{InputState, VulkanRenderer, WinitWindow, WinitWindowBuilder};
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::WindowId;

/// What an application can see while it builds its scene.
pub struct EngineContext<'a> {
    /// The running configuration.
    pub config: &'a EngineConfig,
    /// Name of the selected physical device.
    pub device_name: &'a str,
}

/// A program driven by the engine.
pub trait Application: Sized + 'static {
    /// Called once the window and the renderer exist.
    fn new(context: &EngineContext<'_>) -> Result<Self>;

    /// Builds the scene to draw. Called once, right after [`Application::new`].
    fn build_scene(&mut self, context: &EngineContext<'_>) -> Result<Scene>;

    /// Called every frame before drawing, after the camera has consumed the input.
    fn update(&mut self, _scene: &mut Scene, _input: &InputSnapshot) {}

    /// The debug overlay layered over the main pass.
    fn overlay(&mut self) -> Box<dyn DebugOverlay> {
        Box::new(KeyboardOverlay::new())
    }
}

/// The internal state of the running engine, managed by the winit event loop.
///
/// Field order matters for teardown: the renderer is released before the window.
struct EngineState<A: Application> {
    config: EngineConfig,
    app: Option<A>,
    scene: Option<Scene>,
    overlay: Option<Box<dyn DebugOverlay>>,
    orchestrator: FrameOrchestrator,
    input: InputState,
    renderer: Option<VulkanRenderer>,
    window: Option<WinitWindow>,
    error: Option<anyhow::Error>,
}

impl<A: Application> EngineState<A> {
    fn new(config: EngineConfig) -> Self {
        Self {
            config,
            app: None,
            scene: None,
            overlay: None,
            orchestrator: FrameOrchestrator::new(),
            input: InputState::new(),
            renderer: None,
            window: None,
            error: None,
        }
    }

    fn initialize(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        // --- 1. Window ---
        let window = WinitWindowBuilder::new()
            .with_title(self.config.title.clone())
            .with_dimensions(self.config.width, self.config.height)
            .build(event_loop)
            .context("Failed to create the window")?;

        // --- 2. Renderer ---
        let renderer = VulkanRenderer::new(&window, &self.config.renderer_config())
            .context("Failed to initialize the Vulkan renderer")?;

        // --- 3. Application and scene ---
        let context = EngineContext {
            config: &self.config,
            device_name: renderer.device_name(),
        };
        let mut app = A::new(&context).context("Application setup failed")?;
        let scene = app
            .build_scene(&context)
            .context("Failed to build the scene")?;
        let overlay = app.overlay();

        self.app = Some(app);
        self.scene = Some(scene);
        self.overlay = Some(overlay);
        self.renderer = Some(renderer);
        self.window = Some(window);
        Ok(())
    }

    fn redraw(&mut self) -> Result<()> {
        let Self {
            app: Some(app),
            scene: Some(scene),
            overlay: Some(overlay),
            renderer: Some(renderer),
            window: Some(window),
            orchestrator,
            input,
            ..
        } = self
        else {
            return Ok(());
        };

        let snapshot = input.snapshot();
        if scene.camera.update(&snapshot) {
            window.set_cursor_captured(scene.camera.mode == CameraMode::Mouse);
        }
        app.update(scene, &snapshot);

        let (width, height) = window.inner_size();
        orchestrator
            .draw_frame(
                renderer,
                scene,
                overlay.as_mut(),
                &snapshot,
                Extent2D::new(width, height),
            )
            .context("Frame rendering failed")?;
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.error = Some(error);
        event_loop.exit();
    }
}

impl<A: Application> Drop for EngineState<A> {
    fn drop(&mut self) {
        log::info!("Shutting down...");
        // Device objects go before the surface's window.
        drop(self.renderer.take());
        drop(self.window.take());
        log::info!("Shutdown complete.");
    }
}

impl<A: Application> ApplicationHandler for EngineState<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.error.is_some() {
            return;
        }
        log::info!("Application resumed. Initializing window and renderer...");
        if let Err(e) = self.initialize(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        if window.winit().id() != id {
            return;
        }
        self.input.handle_window_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting event loop...");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                log::info!("Window resized to {}x{}", size.width, size.height);
                self.orchestrator.request_resize();
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    self.fail(event_loop, e);
                }
            }
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        self.input.handle_device_event(&event);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// The public entry point of the Umbra renderer.
pub struct Engine;

impl Engine {
    /// Opens a window, brings up the renderer and runs `A` until the window is closed.
    ///
    /// Blocks the calling thread. Returns the first fatal error, if any.
    pub fn run<A: Application>(config: EngineConfig) -> Result<()> {
        log::info!("Umbra: starting '{}'", config.title);
        let event_loop = EventLoop::new().context("Failed to create the event loop")?;
        let mut state = EngineState::<A>::new(config);
        event_loop
            .run_app(&mut state)
            .context("Event loop terminated abnormally")?;
        match state.error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
