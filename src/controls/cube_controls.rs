extern crate nalgebra as na;

use bytemuck::{Pod, Zeroable};
use winit::event::VirtualKeyCode;

use crate::transforms::{self, Axis};

/// Degrees added or removed per arrow key press.
pub const CUBE_STEP: f32 = 6.0;

/// Accumulated rotation of the cube, one angle per axis, in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CubeAngles {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl CubeAngles {
    /// Arrow keys turn the cube; anything else is ignored.
    pub fn apply_key(&mut self, key: VirtualKeyCode) {
        match key {
            VirtualKeyCode::Left => self.z += CUBE_STEP,
            VirtualKeyCode::Right => self.z -= CUBE_STEP,
            VirtualKeyCode::Up => self.x -= CUBE_STEP,
            VirtualKeyCode::Down => self.x += CUBE_STEP,
            _ => (),
        }
    }

    /// `[Rx, Ry, Rz]` for the current angles.
    pub fn matrices(&self) -> [na::Matrix4<f32>; 3] {
        [
            transforms::rotation4(Axis::X, self.x),
            transforms::rotation4(Axis::Y, self.y),
            transforms::rotation4(Axis::Z, self.z),
        ]
    }

    /// Rotation about x first, then y, then z.
    pub fn model(&self) -> na::Matrix4<f32> {
        let [x, y, z] = self.matrices();
        z * y * x
    }
}

/// Push constant block of `cube.vert`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CubeConstants {
    pub model: [[f32; 4]; 4],
}

impl From<&CubeAngles> for CubeConstants {
    fn from(angles: &CubeAngles) -> Self {
        Self {
            model: transforms::mat4_columns(&angles.model()),
        }
    }
}

#[derive(Debug, Default)]
pub struct CubeControls {
    angles: CubeAngles,
}

impl CubeControls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn angles(&self) -> CubeAngles {
        self.angles
    }
}

impl super::Controls for CubeControls {
    type Constants = CubeConstants;

    fn key_pressed(&mut self, key: VirtualKeyCode) {
        self.angles.apply_key(key);
        log::debug!("cube angles: {:?}", self.angles);
    }

    fn constants(&self) -> CubeConstants {
        CubeConstants::from(&self.angles)
    }
}
