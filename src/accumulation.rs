/// Progressive sample counter.
///
/// Each frame calls [`tick`](Self::tick) before blending and
/// [`advance`](Self::advance) after, which makes the blended image the plain
/// running mean of every sample since the last reset.
#[derive(Debug, Default)]
pub struct AccumulationController {
    sample_count: u32,
}

impl AccumulationController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn reset(&mut self) {
        self.sample_count = 0;
    }

    /// Blend weight of the incoming sample, `1 / (n + 1)`.
    pub fn tick(&mut self, dirty: bool, target_resized: bool) -> f32 {
        if dirty || target_resized {
            if self.sample_count > 0 {
                tracing::debug!(
                    dirty,
                    target_resized,
                    "restarting accumulation after {} samples",
                    self.sample_count
                );
            }
            self.sample_count = 0;
        }
        blend_weight(self.sample_count)
    }

    /// Count the sample blended this frame.
    pub fn advance(&mut self) {
        self.sample_count = self.sample_count.saturating_add(1);
    }
}

pub fn blend_weight(sample_count: u32) -> f32 {
    1.0 / (sample_count as f32 + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// CPU copy of the blend pass.
    fn blend(accumulated: &mut [f32], sample: &[f32], weight: f32) {
        for (a, s) in accumulated.iter_mut().zip(sample) {
            *a = *a * (1.0 - weight) + s * weight;
        }
    }

    #[test]
    fn first_frame_overwrites() {
        let mut controller = AccumulationController::new();
        assert_eq!(controller.tick(false, false), 1.0);
        controller.advance();
        assert_eq!(controller.tick(false, false), 0.5);
        controller.advance();
        assert_eq!(controller.sample_count(), 2);
    }

    #[test]
    fn dirty_resets_running_controller() {
        let mut controller = AccumulationController::new();
        for _ in 0..5 {
            controller.tick(false, false);
            controller.advance();
        }
        assert_eq!(controller.sample_count(), 5);

        assert_eq!(controller.tick(true, false), 1.0);
        assert_eq!(controller.sample_count(), 0);
        controller.advance();
        assert_eq!(controller.sample_count(), 1);
    }

    #[test]
    fn resize_resets_running_controller() {
        let mut controller = AccumulationController::new();
        controller.tick(false, false);
        controller.advance();
        assert_eq!(controller.tick(false, true), 1.0);
    }

    #[test]
    fn running_blend_is_the_mean() {
        let samples: [[f32; 3]; 6] = [
            [0.9, 0.1, 4.0],
            [0.2, 0.3, 0.0],
            [0.5, 0.8, 1.0],
            [1.5, 0.0, 2.0],
            [0.1, 0.6, 0.5],
            [0.7, 0.2, 3.5],
        ];
        // Garbage from a previous run must not leak into the mean.
        let mut image = [100.0_f32; 3];
        let mut controller = AccumulationController::new();
        controller.tick(true, false);

        for (k, sample) in samples.iter().enumerate() {
            let weight = controller.tick(false, false);
            blend(&mut image, sample, weight);
            controller.advance();

            let n = (k + 1) as f32;
            for channel in 0..3 {
                let mean: f32 = samples[..=k].iter().map(|s| s[channel]).sum::<f32>() / n;
                assert!(
                    (image[channel] - mean).abs() < 1e-5,
                    "frame {k} channel {channel}: {} vs {mean}",
                    image[channel]
                );
            }
        }
    }
}
