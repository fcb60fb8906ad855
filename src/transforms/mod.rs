//! Axis rotations built from an angle in degrees.
//!
//! Angles are taken as-is: nothing wraps them, so an accumulator that has
//! been turning for a while simply hands in large values.

extern crate nalgebra as na;

use std::f32::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

pub fn radians(degrees: f32) -> f32 {
    degrees * PI / 180.0
}

/// Right-handed rotation about `axis`, for the 2D demo.
#[rustfmt::skip]
pub fn rotation3(axis: Axis, degrees: f32) -> na::Matrix3<f32> {
    let (s, c) = radians(degrees).sin_cos();
    match axis {
        Axis::X => na::Matrix3::new(
            1.0, 0.0, 0.0,
            0.0,   c,  -s,
            0.0,   s,   c,
        ),
        Axis::Y => na::Matrix3::new(
              c, 0.0,   s,
            0.0, 1.0, 0.0,
             -s, 0.0,   c,
        ),
        Axis::Z => na::Matrix3::new(
              c,  -s, 0.0,
              s,   c, 0.0,
            0.0, 0.0, 1.0,
        ),
    }
}

/// Homogeneous form of [`rotation3`], for the 3D demo.
pub fn rotation4(axis: Axis, degrees: f32) -> na::Matrix4<f32> {
    rotation3(axis, degrees).to_homogeneous()
}

/// Column-major `mat4` as GLSL reads it from a push constant block.
pub fn mat4_columns(m: &na::Matrix4<f32>) -> [[f32; 4]; 4] {
    (*m).into()
}

/// Column-major `mat3` with each column padded to 16 bytes, which is how
/// std430 lays out a `mat3` inside a push constant block.
pub fn mat3_padded_columns(m: &na::Matrix3<f32>) -> [[f32; 4]; 3] {
    let columns: [[f32; 3]; 3] = (*m).into();
    columns.map(|[x, y, z]| [x, y, z, 0.0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra as na;

    const AXES: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];
    const ANGLES: [f32; 7] = [-270.0, -45.0, 0.0, 30.0, 90.0, 181.5, 725.0];

    #[test]
    fn zero_angle_is_identity() {
        for axis in AXES {
            assert_relative_eq!(rotation3(axis, 0.0), na::Matrix3::identity());
            assert_relative_eq!(rotation4(axis, 0.0), na::Matrix4::identity());
        }
    }

    #[test]
    fn rotations_are_orthogonal_with_unit_determinant() {
        for axis in AXES {
            for angle in ANGLES {
                let m = rotation3(axis, angle);
                assert_relative_eq!(m.transpose() * m, na::Matrix3::identity(), epsilon = 1e-5);
                assert_relative_eq!(m.determinant(), 1.0, epsilon = 1e-5);

                let h = rotation4(axis, angle);
                assert_relative_eq!(h.transpose() * h, na::Matrix4::identity(), epsilon = 1e-5);
                assert_relative_eq!(h.determinant(), 1.0, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn same_axis_rotations_add_up() {
        for axis in AXES {
            for (a, b) in [(30.0, 60.0), (-45.0, 120.0), (350.0, 25.0), (6.0, 6.0)] {
                assert_relative_eq!(
                    rotation3(axis, a) * rotation3(axis, b),
                    rotation3(axis, a + b),
                    epsilon = 1e-5
                );
                assert_relative_eq!(
                    rotation4(axis, a) * rotation4(axis, b),
                    rotation4(axis, a + b),
                    epsilon = 1e-5
                );
            }
        }
    }

    #[test]
    fn quarter_turn_about_z() {
        #[rustfmt::skip]
        let expected = na::Matrix3::new(
            0.0, -1.0, 0.0,
            1.0,  0.0, 0.0,
            0.0,  0.0, 1.0,
        );
        assert_relative_eq!(rotation3(Axis::Z, 90.0), expected, epsilon = 1e-5);
    }

    #[test]
    fn quarter_turns_move_basis_vectors() {
        let x = na::Vector3::x();
        let y = na::Vector3::y();
        let z = na::Vector3::z();
        assert_relative_eq!(rotation3(Axis::X, 90.0) * y, z, epsilon = 1e-5);
        assert_relative_eq!(rotation3(Axis::Y, 90.0) * z, x, epsilon = 1e-5);
        assert_relative_eq!(rotation3(Axis::Z, 90.0) * x, y, epsilon = 1e-5);
    }

    #[test]
    fn homogeneous_row_and_column_are_untouched() {
        let h = rotation4(Axis::Y, 37.0);
        for i in 0..3 {
            assert_eq!(h[(3, i)], 0.0);
            assert_eq!(h[(i, 3)], 0.0);
        }
        assert_eq!(h[(3, 3)], 1.0);
    }

    #[test]
    fn unwrapped_angles_match_their_wrapped_equivalent() {
        assert_relative_eq!(rotation3(Axis::Z, 722.0), rotation3(Axis::Z, 2.0), epsilon = 1e-4);
    }

    #[test]
    fn gpu_layouts_are_column_major() {
        let m = rotation4(Axis::Z, 90.0);
        let columns = mat4_columns(&m);
        // First column is the image of the x axis.
        assert_relative_eq!(columns[0][0], 0.0, epsilon = 1e-5);
        assert_relative_eq!(columns[0][1], 1.0, epsilon = 1e-5);
        assert_eq!(columns[3], [0.0, 0.0, 0.0, 1.0]);

        let padded = mat3_padded_columns(&rotation3(Axis::Z, 90.0));
        assert_relative_eq!(padded[1][0], -1.0, epsilon = 1e-5);
        assert!(padded.iter().all(|column| column[3] == 0.0));
    }
}
