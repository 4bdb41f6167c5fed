//! Drives the tracker, accumulation controller and render target manager
//! through the same order the renderer uses each frame, with a fake GPU.

use std::cell::Cell;

use progressive_tracer_lib::{
    accumulation::AccumulationController,
    target::{RenderTargetManager, TargetAllocator},
    tracker::ChangeTracker,
    transform::Transform,
    TracerResult,
};

#[derive(Default)]
struct FakeGpu {
    allocated: Cell<u32>,
    released: Cell<u32>,
}

impl TargetAllocator for FakeGpu {
    type Target = (u32, u32);

    fn allocate(&self, width: u32, height: u32) -> TracerResult<(u32, u32)> {
        self.allocated.set(self.allocated.get() + 1);
        Ok((width, height))
    }

    fn release(&self, _target: (u32, u32)) {
        self.released.set(self.released.get() + 1);
    }
}

struct Frame {
    camera: Transform,
    light: Transform,
    fov: f32,
    bounces: u32,
    tracker: ChangeTracker,
    accumulation: AccumulationController,
    targets: RenderTargetManager<(u32, u32)>,
    gpu: FakeGpu,
    image: Vec<f32>,
}

impl Frame {
    fn new() -> Self {
        let camera = Transform::new(glam::Vec3::new(0.0, 10.0, 50.0), 0.0, 0.0);
        let light = Transform::new(glam::Vec3::ZERO, 30.0, -50.0);
        let mut tracker = ChangeTracker::new(60.0, 8);
        tracker.watch(camera.change_flag());
        tracker.watch(light.change_flag());
        Self {
            camera,
            light,
            fov: 60.0,
            bounces: 8,
            tracker,
            accumulation: AccumulationController::new(),
            targets: RenderTargetManager::new(),
            gpu: FakeGpu::default(),
            image: Vec::new(),
        }
    }

    /// Returns the blend weight used for `sample`.
    fn render(&mut self, width: u32, height: u32, sample: f32) -> f32 {
        let dirty = self.tracker.poll(self.fov, self.bounces);
        let (_, resized) = self.targets.ensure(&self.gpu, width, height).unwrap();
        if resized {
            self.image = vec![0.0; (width * height) as usize];
        }
        let weight = self.accumulation.tick(dirty, resized);
        for pixel in &mut self.image {
            *pixel = *pixel * (1.0 - weight) + sample * weight;
        }
        self.accumulation.advance();
        weight
    }
}

#[test]
fn still_scene_converges_to_mean() {
    let mut frame = Frame::new();
    let samples = [0.2, 0.9, 0.4, 0.4, 1.3, 0.0, 0.7];
    for sample in samples {
        frame.render(4, 4, sample);
    }
    let mean = samples.iter().sum::<f32>() / samples.len() as f32;
    assert!(frame.image.iter().all(|p| (p - mean).abs() < 1e-5));
    assert_eq!(frame.accumulation.sample_count(), samples.len() as u32);
}

#[test]
fn moving_camera_restarts_accumulation() {
    let mut frame = Frame::new();
    for _ in 0..5 {
        frame.render(4, 4, 1.0);
    }
    frame.camera.translate(glam::Vec3::X);
    assert_eq!(frame.render(4, 4, 3.0), 1.0);
    assert_eq!(frame.accumulation.sample_count(), 1);
    assert!(frame.image.iter().all(|p| *p == 3.0));
}

#[test]
fn rotating_light_restarts_accumulation() {
    let mut frame = Frame::new();
    frame.render(4, 4, 1.0);
    frame.render(4, 4, 1.0);
    frame.light.set_orientation(45.0, -50.0);
    assert_eq!(frame.render(4, 4, 1.0), 1.0);
    assert_eq!(frame.render(4, 4, 1.0), 0.5);
}

#[test]
fn fov_and_bounce_changes_restart_accumulation() {
    let mut frame = Frame::new();
    frame.render(4, 4, 1.0);
    frame.render(4, 4, 1.0);

    frame.fov = 45.0;
    assert_eq!(frame.render(4, 4, 1.0), 1.0);
    frame.render(4, 4, 1.0);

    frame.bounces = 3;
    assert_eq!(frame.render(4, 4, 1.0), 1.0);
}

#[test]
fn resize_reallocates_and_restarts() {
    let mut frame = Frame::new();
    assert_eq!(frame.render(4, 4, 1.0), 1.0);
    assert_eq!(frame.render(4, 4, 1.0), 0.5);
    assert_eq!(frame.gpu.allocated.get(), 1);

    assert_eq!(frame.render(8, 6, 1.0), 1.0);
    assert_eq!(frame.gpu.allocated.get(), 2);
    assert_eq!(frame.gpu.released.get(), 1);
    assert_eq!(frame.targets.size(), Some((8, 6)));
    assert_eq!(frame.image.len(), 48);
}
