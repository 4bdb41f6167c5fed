use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, KeyboardInput, VirtualKeyCode, WindowEvent},
    window::CursorGrabMode,
};

use crate::{
    accumulation::AccumulationController,
    application::{AppState, Layer, Screen},
    camera::{Camera, CameraController, CursorRequest},
    compositor::{Compositor, CompositorBindings},
    config::{clamp_bounces, TracerConfig},
    error::TracerResult,
    kernel::{KernelParams, TracingKernel},
    light::DirectionalLight,
    renderer::SceneUpload,
    scene::{Scene, ScenePlacement},
    target::{RenderTarget, RenderTargetManager},
    texture::Skybox,
    tracker::ChangeTracker,
};

struct FrameBindings {
    trace: wgpu::BindGroup,
    compositor: CompositorBindings,
}

/// Progressive path tracer: regenerates nothing per frame, traces one
/// jittered sample, and folds it into the running mean until something
/// invalidates it.
pub struct ProgressiveTracer {
    placement: ScenePlacement,
    scene: Scene,
    upload: SceneUpload,

    camera: Camera,
    camera_controller: CameraController,
    light: DirectionalLight,
    max_bounces: u32,

    tracker: ChangeTracker,
    accumulation: AccumulationController,
    targets: RenderTargetManager<RenderTarget>,

    kernel: TracingKernel,
    compositor: Compositor,
    skybox: Skybox,
    bindings: Option<FrameBindings>,
    jitter: Pcg32,
}

impl ProgressiveTracer {
    pub fn init(config: TracerConfig, screen: &Screen) -> TracerResult<Self> {
        let (width, height) = screen.size();
        let camera = Camera::new(&config.camera, width as f32 / height.max(1) as f32);
        let light = DirectionalLight::new(&config.light);
        let max_bounces = config.bounces();

        let mut tracker = ChangeTracker::new(camera.fov_y(), max_bounces);
        tracker.watch(camera.transform.change_flag());
        tracker.watch(light.transform.change_flag());

        let skybox = Skybox::load(&screen.device, &screen.queue, config.skybox.as_deref())?;

        let placement = ScenePlacement::from(&config);
        let mut tracer = Self {
            placement,
            scene: Scene::default(),
            upload: SceneUpload::empty(),
            camera_controller: CameraController::new(&config.camera),
            camera,
            light,
            max_bounces,
            tracker,
            accumulation: AccumulationController::new(),
            targets: RenderTargetManager::new(),
            kernel: TracingKernel::new(&screen.device),
            compositor: Compositor::new(&screen.device, screen.config.format),
            skybox,
            bindings: None,
            jitter: Pcg32::from_entropy(),
        };
        tracer.set_up_scene(&screen.device, placement);

        Ok(tracer)
    }

    /// Rebuild the scene from scratch and start accumulating again.
    pub fn set_up_scene(&mut self, device: &wgpu::Device, placement: ScenePlacement) {
        self.placement = placement;
        self.scene = Scene::generate(&placement);
        let records = self.scene.gpu_records();
        self.upload.replace(device, records.as_deref());
        if self.upload.count() == 0 {
            tracing::warn!("scene is empty, tracing ground and sky only");
        }
        self.bindings = None;
        self.accumulation.reset();
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn sample_count(&self) -> u32 {
        self.accumulation.sample_count()
    }

    pub fn set_max_bounces(&mut self, bounces: i64) {
        self.max_bounces = clamp_bounces(bounces);
    }

    fn kernel_params(&mut self) -> KernelParams {
        KernelParams {
            camera_to_world: self.camera.camera_to_world().to_cols_array_2d(),
            inverse_projection: self.camera.inverse_projection().to_cols_array_2d(),
            directional_light: self.light.packed(),
            pixel_offset: [self.jitter.gen(), self.jitter.gen()],
            max_bounces: self.max_bounces,
            sphere_count: self.kernel.scene_input(&self.upload).1,
        }
    }

    /// Trace, blend and present one frame at `width` x `height`.
    pub fn render(&mut self, screen: &Screen, width: u32, height: u32) -> TracerResult<()> {
        let _span = tracing::debug_span!("frame", sample = self.accumulation.sample_count()).entered();

        let dirty = self.tracker.poll(self.camera.fov_y(), self.max_bounces);
        let params = self.kernel_params();

        let (target, resized) = self.targets.ensure(&screen.device, width, height)?;
        let weight = self.accumulation.tick(dirty, resized);

        if resized || self.bindings.is_none() {
            self.bindings = Some(FrameBindings {
                trace: self
                    .kernel
                    .bind(&screen.device, &self.upload, &self.skybox.view, target),
                compositor: self.compositor.bind(&screen.device, target),
            });
        }
        let Some(bindings) = self.bindings.as_ref() else {
            return Ok(());
        };

        let output = screen.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = screen
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        self.kernel
            .dispatch(&screen.queue, &mut encoder, &bindings.trace, &params, width, height);
        self.compositor
            .blend(&screen.queue, &mut encoder, &bindings.compositor, weight, width, height);
        self.compositor.present(
            &screen.queue,
            &mut encoder,
            &bindings.compositor,
            &view,
            width,
            height,
        );

        screen.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        self.accumulation.advance();
        Ok(())
    }

    /// Free every GPU resource this tracer owns.
    pub fn teardown(mut self, device: &wgpu::Device) {
        self.bindings = None;
        self.targets.release(device);
        self.upload.release();
        self.kernel.release();
        self.compositor.release();
        self.skybox.texture.destroy();
        tracing::info!(
            "released render resources after {} samples",
            self.accumulation.sample_count()
        );
    }

    fn process_key(&mut self, keycode: VirtualKeyCode, screen: &Screen) {
        match keycode {
            VirtualKeyCode::F5 => {
                let placement = ScenePlacement {
                    seed: self.placement.seed.wrapping_add(1),
                    ..self.placement
                };
                tracing::info!("regenerating scene with seed {}", placement.seed);
                self.set_up_scene(&screen.device, placement);
            }
            VirtualKeyCode::Equals | VirtualKeyCode::Plus | VirtualKeyCode::NumpadAdd => {
                self.set_max_bounces(i64::from(self.max_bounces) + 1);
                tracing::info!("max bounces {}", self.max_bounces);
            }
            VirtualKeyCode::Minus | VirtualKeyCode::NumpadSubtract => {
                self.set_max_bounces(i64::from(self.max_bounces) - 1);
                tracing::info!("max bounces {}", self.max_bounces);
            }
            _ => {}
        }
    }
}

fn apply_cursor_request(request: CursorRequest, screen: &Screen) {
    let window = screen.window();
    match request {
        CursorRequest::Capture => {
            let grabbed = window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
            if let Err(err) = grabbed {
                tracing::warn!("could not capture cursor: {err}");
            }
            window.set_cursor_visible(false);
        }
        CursorRequest::Release => {
            if let Err(err) = window.set_cursor_grab(CursorGrabMode::None) {
                tracing::warn!("could not release cursor: {err}");
            }
            window.set_cursor_visible(true);
        }
    }
}

impl Layer for ProgressiveTracer {
    type Config = TracerConfig;

    fn start(config: TracerConfig, screen: &mut Screen, _app: &AppState) -> TracerResult<Self> {
        Self::init(config, screen)
    }

    fn process_event(&mut self, event: &Event<()>, screen: &mut Screen) {
        match event {
            Event::WindowEvent { event, .. } => {
                if let Some(request) = self.camera_controller.process_window_event(event) {
                    apply_cursor_request(request, screen);
                }
                self.light.process_events(event);

                if let WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            state: ElementState::Pressed,
                            virtual_keycode: Some(keycode),
                            ..
                        },
                    ..
                } = event
                {
                    self.process_key(*keycode, screen);
                }
            }
            Event::DeviceEvent { event, .. } => {
                self.camera_controller.process_device_event(event);
            }
            _ => {}
        }
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>, _app: &AppState, _screen: &mut Screen) {
        if new_size.width > 0 && new_size.height > 0 {
            self.camera.aspect = new_size.width as f32 / new_size.height as f32;
        }
    }

    fn update(&mut self, app: &AppState, _screen: &mut Screen) {
        let dt = app.elapsed_time();
        self.camera_controller.update_camera(&mut self.camera, dt);
        self.light.update(dt);
    }

    fn render(&mut self, _app: &AppState, screen: &mut Screen) -> TracerResult<()> {
        let (width, height) = screen.size();
        ProgressiveTracer::render(self, screen, width, height)
    }

    fn shutdown(self, _app: &AppState, screen: &mut Screen) -> TracerResult<()> {
        self.teardown(&screen.device);
        tracing::info!("exiting");
        Ok(())
    }
}
