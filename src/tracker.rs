use crate::transform::ChangeFlag;

/// Detects anything that invalidates the accumulated image: watched
/// transforms moving, the field of view changing, or the bounce depth changing.
///
/// Meant to be polled once per frame from the render thread.
#[derive(Debug)]
pub struct ChangeTracker {
    watched: Vec<ChangeFlag>,
    last_fov: f32,
    last_max_bounces: u32,
}

impl ChangeTracker {
    pub fn new(fov: f32, max_bounces: u32) -> Self {
        Self {
            watched: Vec::new(),
            last_fov: fov,
            last_max_bounces: max_bounces,
        }
    }

    pub fn watch(&mut self, flag: ChangeFlag) {
        self.watched.push(flag);
    }

    pub fn watched(&self) -> usize {
        self.watched.len()
    }

    /// True when anything changed since the previous poll. Every watched flag
    /// is cleared, whether or not an earlier check already reported dirty.
    pub fn poll(&mut self, fov: f32, max_bounces: u32) -> bool {
        let mut dirty = false;

        if fov != self.last_fov {
            tracing::debug!("field of view {} -> {}", self.last_fov, fov);
            self.last_fov = fov;
            dirty = true;
        }

        for flag in &self.watched {
            if flag.take() {
                dirty = true;
            }
        }

        if max_bounces != self.last_max_bounces {
            tracing::debug!("max bounces {} -> {}", self.last_max_bounces, max_bounces);
            self.last_max_bounces = max_bounces;
            dirty = true;
        }

        dirty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_frame_is_clean() {
        let mut tracker = ChangeTracker::new(60.0, 8);
        tracker.watch(ChangeFlag::default());
        assert!(!tracker.poll(60.0, 8));
    }

    #[test]
    fn fov_change_is_reported_once() {
        let mut tracker = ChangeTracker::new(60.0, 8);
        assert!(tracker.poll(45.0, 8));
        assert!(!tracker.poll(45.0, 8));
    }

    #[test]
    fn bounce_change_is_reported_once() {
        let mut tracker = ChangeTracker::new(60.0, 8);
        assert!(tracker.poll(60.0, 4));
        assert!(!tracker.poll(60.0, 4));
    }

    #[test]
    fn every_flag_is_cleared_in_one_poll() {
        let camera = ChangeFlag::default();
        let light = ChangeFlag::default();
        let mut tracker = ChangeTracker::new(60.0, 8);
        tracker.watch(camera.clone());
        tracker.watch(light.clone());

        camera.mark();
        light.mark();
        // fov also dirty: flags still have to be consumed.
        assert!(tracker.poll(30.0, 8));
        assert!(!camera.is_set());
        assert!(!light.is_set());
        assert!(!tracker.poll(30.0, 8));
    }

    #[test]
    fn mark_between_polls_is_not_lost() {
        let light = ChangeFlag::default();
        let mut tracker = ChangeTracker::new(60.0, 8);
        tracker.watch(light.clone());

        assert!(!tracker.poll(60.0, 8));
        light.mark();
        assert!(tracker.poll(60.0, 8));
    }
}
