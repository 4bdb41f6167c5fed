use std::time::Instant;

use wgpu::SurfaceError;
use winit::{
    dpi::PhysicalSize,
    event::*,
    event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget},
    window::{Window, WindowBuilder},
};

use crate::error::{TracerError, TracerResult};

#[derive(Debug)]
pub struct AppState {
    previous_time: Instant,
    /// Seconds since the previous frame.
    elapsed_time: f32,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            previous_time: Instant::now(),
            elapsed_time: 0.0,
        }
    }

    pub fn update(&mut self) {
        let current_time = Instant::now();
        self.elapsed_time = current_time
            .duration_since(self.previous_time)
            .as_secs_f32();
        self.previous_time = current_time;
    }

    pub fn elapsed_time(&self) -> f32 {
        self.elapsed_time
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// What the event loop does after a frame fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRecovery {
    /// Reconfigure the surface to the window size and draw on the next frame.
    Reconfigure,
    Exit(i32),
    Skip,
}

impl FrameRecovery {
    pub fn for_error(err: &TracerError) -> Self {
        match err {
            TracerError::Surface(SurfaceError::Lost | SurfaceError::Outdated) => Self::Reconfigure,
            TracerError::Surface(SurfaceError::OutOfMemory) => Self::Exit(137),
            _ => Self::Skip,
        }
    }
}

pub struct Application<L: Layer + 'static> {
    config: Option<L::Config>,
    layer: Option<L>,
    screen: Screen,
    state: AppState,
}

impl<L: Layer + 'static> Application<L> {
    pub fn new(config: L::Config, screen: Screen) -> Self {
        Self {
            config: Some(config),
            screen,
            layer: None,
            state: AppState::new(),
        }
    }

    fn shutdown(&mut self, control_flow: &mut ControlFlow) {
        control_flow.set_exit_with_code(0);
        if let Some(layer) = self.layer.take() {
            if let Err(err) = layer.shutdown(&self.state, &mut self.screen) {
                tracing::error!("shutdown failed: {err}");
                control_flow.set_exit_with_code(1);
            }
        }
    }

    fn run(
        &mut self,
        event: Event<()>,
        _event_loop: &EventLoopWindowTarget<()>,
        control_flow: &mut ControlFlow,
    ) {
        control_flow.set_wait();

        if let Some(layer) = self.layer.as_mut() {
            layer.process_event(&event, &mut self.screen);
        }

        match event {
            Event::NewEvents(StartCause::Init) => {
                let Some(config) = self.config.take() else {
                    return;
                };
                match L::start(config, &mut self.screen, &self.state) {
                    Ok(layer) => self.layer = Some(layer),
                    Err(err) => {
                        tracing::error!("failed to start: {err}");
                        control_flow.set_exit_with_code(1);
                    }
                }
            }
            Event::WindowEvent {
                window_id,
                ref event,
            } if self.screen.window().id() == window_id => match event {
                WindowEvent::CloseRequested => self.shutdown(control_flow),
                WindowEvent::Resized(physical_size) => {
                    self.screen.resize(*physical_size);
                    if let Some(layer) = self.layer.as_mut() {
                        layer.resize(*physical_size, &self.state, &mut self.screen);
                    }
                }
                WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                    self.screen.resize(**new_inner_size);
                    if let Some(layer) = self.layer.as_mut() {
                        layer.resize(**new_inner_size, &self.state, &mut self.screen);
                    }
                }
                _ => {}
            },
            Event::MainEventsCleared => {
                self.state.update();
                self.screen.window().request_redraw();
            }
            Event::RedrawRequested(window_id) if self.screen.window().id() == window_id => {
                let Some(layer) = self.layer.as_mut() else {
                    return;
                };
                layer.update(&self.state, &mut self.screen);

                if let Err(err) = layer.render(&self.state, &mut self.screen) {
                    match FrameRecovery::for_error(&err) {
                        FrameRecovery::Reconfigure => self.screen.resize_to_current(),
                        FrameRecovery::Exit(code) => control_flow.set_exit_with_code(code),
                        FrameRecovery::Skip => tracing::error!("frame dropped: {err}"),
                    }
                }
            }
            Event::LoopDestroyed => {
                if let Some(layer) = self.layer.take() {
                    if let Err(err) = layer.shutdown(&self.state, &mut self.screen) {
                        tracing::error!("shutdown failed: {err}");
                    }
                }
            }
            _ => {}
        }
    }

    /// Open the window and hand control to the event loop. Only returns
    /// when start-up fails.
    pub async fn init(config: L::Config, title: &str) -> TracerResult<()> {
        let event_loop = EventLoop::new();
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let screen = Screen::new(&event_loop, &instance, title).await?;
        let mut application = Self::new(config, screen);
        event_loop.run(move |event, event_loop, control_flow| {
            application.run(event, event_loop, control_flow);
        });
    }
}

pub struct Screen {
    pub surface: wgpu::Surface,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    window: Window,
}

impl Screen {
    pub async fn new(
        event_loop: &EventLoopWindowTarget<()>,
        instance: &wgpu::Instance,
        title: &str,
    ) -> TracerResult<Self> {
        let window = WindowBuilder::new().with_title(title).build(event_loop)?;

        // SAFETY:
        // The surface needs to live as long as the window that created it.
        // Screen owns the window so this should be safe.
        let surface = unsafe { instance.create_surface(&window) }.map_err(TracerError::device)?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| TracerError::device("no compatible GPU adapter"))?;
        tracing::info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    features: wgpu::Features::empty(),
                    limits: wgpu::Limits::default(),
                    label: None,
                },
                None,
            )
            .await
            .map_err(TracerError::device)?;
        let size = window.inner_size();
        let config = surface
            .get_default_config(&adapter, size.width.max(1), size.height.max(1))
            .ok_or_else(|| TracerError::device("surface is not supported by the adapter"))?;
        surface.configure(&device, &config);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Resize the screen to new window size.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Resize the screen to current window inner size.
    pub fn resize_to_current(&mut self) {
        self.resize(self.window.inner_size());
    }
}

pub trait Layer: Sized {
    type Config: 'static;

    fn start(config: Self::Config, screen: &mut Screen, app: &AppState) -> TracerResult<Self>;
    fn process_event(&mut self, event: &Event<()>, screen: &mut Screen);
    fn resize(&mut self, new_size: PhysicalSize<u32>, app: &AppState, screen: &mut Screen);
    fn update(&mut self, app: &AppState, screen: &mut Screen);
    fn render(&mut self, app: &AppState, screen: &mut Screen) -> TracerResult<()>;
    /// Release GPU resources. Consumes the layer.
    fn shutdown(self, app: &AppState, screen: &mut Screen) -> TracerResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_surfaces_are_reconfigured() {
        for err in [SurfaceError::Lost, SurfaceError::Outdated] {
            assert_eq!(
                FrameRecovery::for_error(&TracerError::Surface(err)),
                FrameRecovery::Reconfigure
            );
        }
    }

    #[test]
    fn out_of_memory_exits() {
        assert_eq!(
            FrameRecovery::for_error(&TracerError::Surface(SurfaceError::OutOfMemory)),
            FrameRecovery::Exit(137)
        );
    }

    #[test]
    fn other_failures_drop_the_frame() {
        assert_eq!(
            FrameRecovery::for_error(&TracerError::Surface(SurfaceError::Timeout)),
            FrameRecovery::Skip
        );
        assert_eq!(
            FrameRecovery::for_error(&TracerError::device("lost adapter")),
            FrameRecovery::Skip
        );
    }
}
