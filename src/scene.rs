use bytemuck::{Pod, Zeroable};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::config::{RadiusRange, TracerConfig};

/// Reflectance of every dielectric sphere.
pub const DIELECTRIC_SPECULAR: f32 = 0.04;

const MAX_RESERVED_SPHERES: u32 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Material {
    /// Colored specular, no diffuse.
    Metal,
    /// Colored diffuse with a faint gray specular.
    Dielectric,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub position: glam::Vec3,
    pub radius: f32,

    pub albedo: glam::Vec3,
    pub specular: glam::Vec3,
    pub material: Material,
}

impl Sphere {
    fn new(position: glam::Vec3, radius: f32, color: glam::Vec3, material: Material) -> Self {
        let (albedo, specular) = match material {
            Material::Metal => (glam::Vec3::ZERO, color),
            Material::Dielectric => (color, glam::Vec3::splat(DIELECTRIC_SPECULAR)),
        };
        Self {
            position,
            radius,
            albedo,
            specular,
            material,
        }
    }

    pub fn to_gpu(&self) -> GpuSphere {
        GpuSphere {
            position: self.position.to_array(),
            radius: self.radius,
            albedo: self.albedo.to_array(),
            _pad0: 0.0,
            specular: self.specular.to_array(),
            _pad1: 0.0,
        }
    }
}

/// Sphere record as laid out in the kernel's storage buffer.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct GpuSphere {
    pub position: [f32; 3],
    pub radius: f32,
    pub albedo: [f32; 3],
    pub _pad0: f32,
    pub specular: [f32; 3],
    pub _pad1: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenePlacement {
    pub seed: u64,
    pub count_max: u32,
    pub radius_range: RadiusRange,
    pub placement_radius: f32,
}

impl From<&TracerConfig> for ScenePlacement {
    fn from(config: &TracerConfig) -> Self {
        Self {
            seed: config.seed as u64,
            count_max: config.sphere_count_max,
            radius_range: config.radius_range,
            placement_radius: config.placement_radius,
        }
    }
}

/// Spheres resting on the ground plane, built in one go and never edited.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Scene {
    spheres: Vec<Sphere>,
}

impl Scene {
    /// Scatter up to `count_max` non-overlapping spheres over a disk.
    ///
    /// A candidate that overlaps an accepted sphere is dropped and its index
    /// is spent, so dense placements end up with fewer spheres than asked for.
    pub fn generate(placement: &ScenePlacement) -> Self {
        let mut rng = Pcg32::seed_from_u64(placement.seed);
        let RadiusRange { min, max } = placement.radius_range;
        let mut spheres: Vec<Sphere> = Vec::with_capacity(initial_capacity(placement.count_max));

        for _ in 0..placement.count_max {
            let radius = min + rng.gen::<f32>() * (max - min);
            let ground = sample_disk(&mut rng) * placement.placement_radius;
            let position = glam::Vec3::new(ground.x, radius, ground.y);

            let candidate_overlaps = spheres.iter().any(|other| {
                let min_distance = radius + other.radius;
                position.distance_squared(other.position) < min_distance * min_distance
            });
            if candidate_overlaps {
                continue;
            }

            let color = hsv_to_rgb(rng.gen(), rng.gen(), rng.gen());
            let material = if rng.gen::<f32>() < 0.5 {
                Material::Metal
            } else {
                Material::Dielectric
            };
            spheres.push(Sphere::new(position, radius, color, material));
        }

        tracing::info!(
            "generated {} spheres (seed {}, {} rejected)",
            spheres.len(),
            placement.seed,
            placement.count_max as usize - spheres.len()
        );

        Self { spheres }
    }

    pub fn spheres(&self) -> &[Sphere] {
        &self.spheres
    }

    pub fn len(&self) -> usize {
        self.spheres.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spheres.is_empty()
    }

    /// Records for upload, `None` when there is nothing to upload.
    pub fn gpu_records(&self) -> Option<Vec<GpuSphere>> {
        if self.spheres.is_empty() {
            return None;
        }
        Some(self.spheres.iter().map(Sphere::to_gpu).collect())
    }
}

/// Most candidates are rejected at high counts, so only a bounded number of
/// slots is reserved up front.
fn initial_capacity(count_max: u32) -> usize {
    count_max.min(MAX_RESERVED_SPHERES) as usize
}

/// Uniform point in the unit disk.
fn sample_disk(rng: &mut impl Rng) -> glam::Vec2 {
    // sqrt keeps the density uniform over the area rather than the radius.
    let r = rng.gen::<f32>().sqrt();
    let theta = rng.gen::<f32>() * std::f32::consts::TAU;
    glam::Vec2::new(r * theta.cos(), r * theta.sin())
}

/// All components in [0, 1].
pub fn hsv_to_rgb(hue: f32, saturation: f32, value: f32) -> glam::Vec3 {
    let h = (hue.fract() * 6.0).clamp(0.0, 6.0);
    let sector = h.floor();
    let f = h - sector;
    let p = value * (1.0 - saturation);
    let q = value * (1.0 - saturation * f);
    let t = value * (1.0 - saturation * (1.0 - f));
    let (r, g, b) = match sector as u32 {
        0 => (value, t, p),
        1 => (q, value, p),
        2 => (p, value, t),
        3 => (p, q, value),
        4 => (t, p, value),
        _ => (value, p, q),
    };
    glam::Vec3::new(r, g, b)
}
