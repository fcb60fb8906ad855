use bytemuck::{Pod, Zeroable};
use winit::event::VirtualKeyCode;

use crate::transforms::{self, Axis};

/// Degrees the triangle turns every frame.
pub const SPIN_STEP: f32 = 2.0;

/// Push constant block of `triangle.vert`: a `mat3` in std430 layout.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SpinConstants {
    pub rotation: [[f32; 4]; 3],
}

impl SpinConstants {
    pub fn at(degrees: f32) -> Self {
        Self {
            rotation: transforms::mat3_padded_columns(&transforms::rotation3(Axis::Z, degrees)),
        }
    }
}

/// Spins in the plane at a fixed step per frame, independent of input.
#[derive(Debug, Default)]
pub struct SpinControls {
    theta: f32,
}

impl SpinControls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn theta(&self) -> f32 {
        self.theta
    }
}

impl super::Controls for SpinControls {
    type Constants = SpinConstants;

    fn key_pressed(&mut self, _key: VirtualKeyCode) {}

    fn advance(&mut self) {
        self.theta += SPIN_STEP;
    }

    fn constants(&self) -> SpinConstants {
        SpinConstants::at(self.theta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::Controls;
    use approx::assert_relative_eq;

    #[test]
    fn advances_two_degrees_per_frame() {
        let mut controls = SpinControls::new();
        for _ in 0..45 {
            controls.advance();
        }
        assert_eq!(controls.theta(), 90.0);

        let rotation = controls.constants().rotation;
        // x axis maps onto y after a quarter turn.
        assert_relative_eq!(rotation[0][0], 0.0, epsilon = 1e-5);
        assert_relative_eq!(rotation[0][1], 1.0, epsilon = 1e-5);
    }

    #[test]
    fn keys_leave_the_spin_alone() {
        let mut controls = SpinControls::new();
        controls.key_pressed(VirtualKeyCode::Left);
        assert_eq!(controls.theta(), 0.0);
    }

    #[test]
    fn constants_fill_three_padded_columns() {
        let constants = SpinConstants::at(0.0);
        assert_eq!(
            constants.rotation,
            [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
            ]
        );
        assert_eq!(bytemuck::bytes_of(&constants).len(), 48);
    }
}
