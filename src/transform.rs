use std::{cell::Cell, rc::Rc};

/// "Changed since last check" bit shared between a transform and whoever
/// watches it. Owners [`mark`](Self::mark), watchers [`take`](Self::take).
#[derive(Debug, Clone, Default)]
pub struct ChangeFlag(Rc<Cell<bool>>);

impl ChangeFlag {
    pub fn mark(&self) {
        self.0.set(true);
    }

    /// Read and clear.
    pub fn take(&self) -> bool {
        self.0.replace(false)
    }

    pub fn is_set(&self) -> bool {
        self.0.get()
    }
}

/// Position plus yaw/pitch orientation (degrees). Roll is never used.
#[derive(Debug, Clone)]
pub struct Transform {
    position: glam::Vec3,
    yaw: f32,
    pitch: f32,
    changed: ChangeFlag,
}

impl Transform {
    pub fn new(position: glam::Vec3, yaw: f32, pitch: f32) -> Self {
        Self {
            position,
            yaw,
            pitch,
            changed: ChangeFlag::default(),
        }
    }

    pub fn position(&self) -> glam::Vec3 {
        self.position
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn set_position(&mut self, position: glam::Vec3) {
        if position != self.position {
            self.position = position;
            self.changed.mark();
        }
    }

    pub fn translate(&mut self, offset: glam::Vec3) {
        self.set_position(self.position + offset);
    }

    pub fn set_orientation(&mut self, yaw: f32, pitch: f32) {
        if yaw != self.yaw || pitch != self.pitch {
            self.yaw = yaw;
            self.pitch = pitch;
            self.changed.mark();
        }
    }

    /// Handle for a change tracker. Does not grant mutation.
    pub fn change_flag(&self) -> ChangeFlag {
        self.changed.clone()
    }

    pub fn rotation(&self) -> glam::Quat {
        glam::Quat::from_euler(
            glam::EulerRot::YXZ,
            self.yaw.to_radians(),
            self.pitch.to_radians(),
            0.0,
        )
    }

    /// Looking direction; -Z at zero yaw and pitch.
    pub fn forward(&self) -> glam::Vec3 {
        self.rotation() * glam::Vec3::NEG_Z
    }

    pub fn right(&self) -> glam::Vec3 {
        self.rotation() * glam::Vec3::X
    }

    pub fn to_matrix(&self) -> glam::Mat4 {
        glam::Mat4::from_rotation_translation(self.rotation(), self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_clears_flag() {
        let flag = ChangeFlag::default();
        assert!(!flag.take());
        flag.mark();
        assert!(flag.is_set());
        assert!(flag.take());
        assert!(!flag.take());
    }

    #[test]
    fn only_real_changes_mark() {
        let mut transform = Transform::new(glam::Vec3::ZERO, 0.0, 0.0);
        let flag = transform.change_flag();

        transform.set_position(glam::Vec3::ZERO);
        transform.set_orientation(0.0, 0.0);
        assert!(!flag.take());

        transform.translate(glam::Vec3::X);
        assert!(flag.take());

        transform.set_orientation(10.0, 0.0);
        assert!(flag.take());
    }

    #[test]
    fn forward_follows_yaw_and_pitch() {
        let level = Transform::new(glam::Vec3::ZERO, 0.0, 0.0);
        assert!(level.forward().abs_diff_eq(glam::Vec3::NEG_Z, 1e-6));

        let turned = Transform::new(glam::Vec3::ZERO, 90.0, 0.0);
        assert!(turned.forward().abs_diff_eq(glam::Vec3::NEG_X, 1e-6));

        let down = Transform::new(glam::Vec3::ZERO, 0.0, -90.0);
        assert!(down.forward().abs_diff_eq(glam::Vec3::NEG_Y, 1e-6));
    }
}
