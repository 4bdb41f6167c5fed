use progressive_tracer_lib::{
    compositor::Compositor,
    config::RadiusRange,
    kernel::TracingKernel,
    renderer::SceneUpload,
    scene::{GpuSphere, Scene, ScenePlacement},
};

fn device() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
    let adapter =
        pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()))?;
    pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default(), None)).ok()
}

#[test]
fn empty_upload_reports_no_spheres() {
    let Some((device, _queue)) = device() else {
        return;
    };
    let kernel = TracingKernel::new(&device);
    let upload = SceneUpload::empty();
    assert_eq!(kernel.scene_input(&upload).1, 0);

    let mut upload = SceneUpload::empty();
    let records: Vec<GpuSphere> = Scene::generate(&ScenePlacement {
        seed: 1,
        count_max: 10,
        radius_range: RadiusRange { min: 1.0, max: 2.0 },
        placement_radius: 40.0,
    })
    .gpu_records()
    .unwrap();
    upload.replace(&device, Some(&records));
    assert_eq!(kernel.scene_input(&upload).1, records.len() as u32);

    upload.release();
    assert_eq!(kernel.scene_input(&upload).1, 0);
    kernel.release();
}

#[test]
fn pipelines_release_their_buffers_cleanly() {
    let Some((device, _queue)) = device() else {
        return;
    };
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let kernel = TracingKernel::new(&device);
    let compositor = Compositor::new(&device, wgpu::TextureFormat::Bgra8UnormSrgb);
    kernel.release();
    compositor.release();
    device.poll(wgpu::Maintain::Wait);
    assert!(pollster::block_on(device.pop_error_scope()).is_none());
}
