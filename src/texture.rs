use std::path::Path;

use image::{Rgba, Rgba32FImage};

use crate::error::TracerResult;

const GRADIENT_WIDTH: u32 = 256;
const GRADIENT_HEIGHT: u32 = 128;

/// Equirectangular environment map sampled by the kernel on a miss.
pub struct Skybox {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl Skybox {
    /// Load `path`, or build a gradient sky when there is none.
    pub fn load(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: Option<&Path>,
    ) -> TracerResult<Self> {
        let image = match path {
            Some(path) => {
                tracing::info!("loading skybox {}", path.display());
                image::open(path)?.to_rgba32f()
            }
            None => gradient_sky(GRADIENT_WIDTH, GRADIENT_HEIGHT),
        };
        Ok(Self::from_image(device, queue, &image, Some("skybox")))
    }

    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &Rgba32FImage,
        label: Option<&str>,
    ) -> Self {
        let (width, height) = image.dimensions();
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba32Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(image.as_raw()),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(16 * width),
                rows_per_image: Some(height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self { texture, view }
    }
}

/// Horizon-to-zenith blue over a darker ground.
pub fn gradient_sky(width: u32, height: u32) -> Rgba32FImage {
    let zenith = glam::Vec3::new(0.25, 0.45, 0.85);
    let horizon = glam::Vec3::new(0.85, 0.9, 1.0);
    let ground = glam::Vec3::new(0.3, 0.28, 0.25);

    Rgba32FImage::from_fn(width, height, |_, y| {
        // Row 0 looks straight up.
        let elevation = 1.0 - 2.0 * (y as f32 + 0.5) / height as f32;
        let color = if elevation >= 0.0 {
            horizon.lerp(zenith, elevation.powf(0.6))
        } else {
            horizon.lerp(ground, (-elevation).powf(0.4))
        };
        Rgba([color.x, color.y, color.z, 1.0])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_is_brighter_at_horizon_than_ground() {
        let sky = gradient_sky(8, 64);
        let horizon = sky.get_pixel(0, 31)[0];
        let nadir = sky.get_pixel(0, 63)[0];
        assert!(horizon > nadir);
        assert!(sky.pixels().all(|p| p[3] == 1.0));
    }
}
