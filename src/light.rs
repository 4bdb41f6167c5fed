use winit::event::{ElementState, KeyboardInput, VirtualKeyCode, WindowEvent};

use crate::{config::LightConfig, transform::Transform};

/// Degrees per second while an arrow key is held.
const ROTATE_SPEED: f32 = 45.0;

pub struct DirectionalLight {
    pub transform: Transform,
    pub intensity: f32,
    spin: glam::Vec2,
}

impl DirectionalLight {
    pub fn new(config: &LightConfig) -> Self {
        Self {
            transform: Transform::new(glam::Vec3::ZERO, config.yaw, config.pitch),
            intensity: config.intensity,
            spin: glam::Vec2::ZERO,
        }
    }

    /// Direction the light travels in.
    pub fn direction(&self) -> glam::Vec3 {
        self.transform.forward()
    }

    /// `xyz` direction, `w` intensity.
    pub fn packed(&self) -> [f32; 4] {
        self.direction().extend(self.intensity).to_array()
    }

    /// Arrow keys rotate the light.
    pub fn process_events(&mut self, event: &WindowEvent) -> bool {
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
                    VirtualKeyCode::Left => self.spin.x = amount,
                    VirtualKeyCode::Right => self.spin.x = -amount,
                    VirtualKeyCode::Up => self.spin.y = amount,
                    VirtualKeyCode::Down => self.spin.y = -amount,
                    _ => return false,
                }
                true
            }
            _ => false,
        }
    }

    pub fn update(&mut self, dt: f32) {
        if self.spin == glam::Vec2::ZERO {
            return;
        }
        let yaw = self.transform.yaw() + self.spin.x * ROTATE_SPEED * dt;
        let pitch = (self.transform.pitch() + self.spin.y * ROTATE_SPEED * dt).clamp(-90.0, 90.0);
        self.transform.set_orientation(yaw, pitch);
    }
}
