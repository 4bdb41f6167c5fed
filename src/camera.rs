use winit::event::{
    DeviceEvent, ElementState, KeyboardInput, MouseButton, MouseScrollDelta, VirtualKeyCode,
    WindowEvent,
};

use crate::{config::CameraConfig, transform::Transform};

pub const MIN_FOV_Y: f32 = 10.0;
pub const MAX_FOV_Y: f32 = 120.0;
const PITCH_LIMIT: f32 = 89.0;

pub struct Camera {
    pub transform: Transform,
    pub aspect: f32,
    /// Degrees.
    fov_y: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Camera {
    pub fn new(config: &CameraConfig, aspect: f32) -> Self {
        Self {
            transform: Transform::new(
                glam::Vec3::from_array(config.position),
                config.yaw,
                config.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            ),
            aspect,
            fov_y: config.fov_y,
            z_near: 0.1,
            z_far: 1000.0,
        }
    }

    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }

    pub fn set_fov_y(&mut self, degrees: f32) {
        self.fov_y = degrees.clamp(MIN_FOV_Y, MAX_FOV_Y);
    }

    pub fn camera_to_world(&self) -> glam::Mat4 {
        self.transform.to_matrix()
    }

    pub fn projection(&self) -> glam::Mat4 {
        glam::Mat4::perspective_rh(
            self.fov_y.to_radians(),
            self.aspect,
            self.z_near,
            self.z_far,
        )
    }

    pub fn inverse_projection(&self) -> glam::Mat4 {
        self.projection().inverse()
    }
}

/// Fly camera: WASD to move, Q/E down/up, shift to hurry, mouse to look
/// while the cursor is captured, wheel to zoom.
pub struct CameraController {
    speed: f32,
    sensitivity: f32,
    shift_multiplier: f32,
    forward: f32,
    backward: f32,
    left: f32,
    right: f32,
    up: f32,
    down: f32,
    shift: bool,
    look: glam::Vec2,
    zoom: f32,
    cursor_captured: bool,
}

/// Cursor capture requests the window should honor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorRequest {
    Capture,
    Release,
}

impl CameraController {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            speed: config.movement_speed,
            sensitivity: config.sensitivity,
            shift_multiplier: config.shift_multiplier,
            forward: 0.0,
            backward: 0.0,
            left: 0.0,
            right: 0.0,
            up: 0.0,
            down: 0.0,
            shift: false,
            look: glam::Vec2::ZERO,
            zoom: 0.0,
            cursor_captured: false,
        }
    }

    pub fn cursor_captured(&self) -> bool {
        self.cursor_captured
    }

    /// Returns a cursor request when the capture state flips.
    pub fn process_window_event(&mut self, event: &WindowEvent) -> Option<CursorRequest> {
        match event {
            WindowEvent::KeyboardInput {
                input:
                    KeyboardInput {
                        state,
                        virtual_keycode: Some(keycode),
                        ..
                    },
                ..
            } => {
                let amount = if *state == ElementState::Pressed { 1.0 } else { 0.0 };
                match keycode {
                    VirtualKeyCode::W => self.forward = amount,
                    VirtualKeyCode::S => self.backward = amount,
                    VirtualKeyCode::A => self.left = amount,
                    VirtualKeyCode::D => self.right = amount,
                    VirtualKeyCode::E => self.up = amount,
                    VirtualKeyCode::Q => self.down = amount,
                    VirtualKeyCode::LShift => self.shift = amount > 0.0,
                    VirtualKeyCode::Escape if *state == ElementState::Pressed => {
                        if self.cursor_captured {
                            self.cursor_captured = false;
                            return Some(CursorRequest::Release);
                        }
                    }
                    _ => {}
                }
                None
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } if !self.cursor_captured => {
                self.cursor_captured = true;
                Some(CursorRequest::Capture)
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.zoom += match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(position) => position.y as f32 / 40.0,
                };
                None
            }
            _ => None,
        }
    }

    pub fn process_device_event(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if self.cursor_captured {
                self.look += glam::Vec2::new(*dx as f32, *dy as f32);
            }
        }
    }

    /// Apply accumulated input to the camera. `dt` in seconds.
    pub fn update_camera(&mut self, camera: &mut Camera, dt: f32) {
        let look = std::mem::take(&mut self.look) * self.sensitivity;
        if look != glam::Vec2::ZERO {
            let transform = &mut camera.transform;
            let yaw = transform.yaw() - look.x;
            let pitch = (transform.pitch() - look.y).clamp(-PITCH_LIMIT, PITCH_LIMIT);
            transform.set_orientation(yaw, pitch);
        }

        let zoom = std::mem::take(&mut self.zoom);
        if zoom != 0.0 {
            camera.set_fov_y(camera.fov_y() - zoom * 2.0);
        }

        let mut speed = self.speed;
        if self.shift {
            speed *= self.shift_multiplier;
        }
        let transform = &mut camera.transform;
        let mut movement = transform.forward() * (self.forward - self.backward)
            + transform.right() * (self.right - self.left);
        movement.y += self.up - self.down;
        if movement != glam::Vec3::ZERO {
            transform.translate(movement * speed * dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fov_is_clamped() {
        let mut camera = Camera::new(&CameraConfig::default(), 1.0);
        camera.set_fov_y(500.0);
        assert_eq!(camera.fov_y(), MAX_FOV_Y);
        camera.set_fov_y(0.0);
        assert_eq!(camera.fov_y(), MIN_FOV_Y);
    }

    #[test]
    fn inverse_projection_round_trips() {
        let camera = Camera::new(&CameraConfig::default(), 16.0 / 9.0);
        let product = camera.projection() * camera.inverse_projection();
        assert!(product.abs_diff_eq(glam::Mat4::IDENTITY, 1e-4));
    }

    #[test]
    fn idle_controller_leaves_camera_untouched() {
        let config = CameraConfig::default();
        let mut camera = Camera::new(&config, 1.0);
        let flag = camera.transform.change_flag();
        let mut controller = CameraController::new(&config);
        controller.update_camera(&mut camera, 0.016);
        assert!(!flag.take());
    }

    #[test]
    fn mouse_look_clamps_pitch() {
        let config = CameraConfig::default();
        let mut camera = Camera::new(&config, 1.0);
        let mut controller = CameraController::new(&config);
        controller.cursor_captured = true;
        controller.process_device_event(&DeviceEvent::MouseMotion {
            delta: (0.0, -100_000.0),
        });
        controller.update_camera(&mut camera, 0.016);
        assert_eq!(camera.transform.pitch(), PITCH_LIMIT);
    }
}
