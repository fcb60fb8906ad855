use super::{Color, Point3, Vertex};

/// Six faces, two counter-clockwise triangles each, over the eight corners
/// laid out as front quad (0..4) then back quad (4..8).
#[rustfmt::skip]
pub const CUBE_INDICES: [u16; 36] = [
    // front
    0, 1, 2, 2, 3, 0,
    // right
    1, 5, 6, 6, 2, 1,
    // back
    7, 6, 5, 5, 4, 7,
    // left
    4, 0, 3, 3, 7, 4,
    // bottom
    4, 5, 1, 1, 0, 4,
    // top
    3, 2, 6, 6, 7, 3,
];

const HALF: f32 = 0.5;

/// One planar face.
///
/// ```text
///  3 ----- 2
///  |       |
///  0 ----- 1
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    vertices: [Vertex; 4],
}

impl Quad {
    /// Pairs corner `i` with color `i`, corners given bottom-left,
    /// bottom-right, top-right, top-left.
    pub fn new(corners: [Point3; 4], colors: [Color; 4]) -> Self {
        Self {
            vertices: [
                Vertex::new(corners[0], colors[0]),
                Vertex::new(corners[1], colors[1]),
                Vertex::new(corners[2], colors[2]),
                Vertex::new(corners[3], colors[3]),
            ],
        }
    }

    pub fn vertices(&self) -> &[Vertex; 4] {
        &self.vertices
    }
}

/// Front and back faces of a unit cube centred on the origin. The other four
/// faces come from [`CUBE_INDICES`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cube {
    quads: [Quad; 2],
}

impl Cube {
    pub fn new(colors: [Color; 4]) -> Self {
        let face = |z: f32| {
            Quad::new(
                [
                    Point3::new(-HALF, -HALF, z),
                    Point3::new(HALF, -HALF, z),
                    Point3::new(HALF, HALF, z),
                    Point3::new(-HALF, HALF, z),
                ],
                colors,
            )
        };

        Self {
            quads: [face(HALF), face(-HALF)],
        }
    }

    pub fn front(&self) -> &Quad {
        &self.quads[0]
    }

    pub fn back(&self) -> &Quad {
        &self.quads[1]
    }

    pub fn vertices(&self) -> Vec<Vertex> {
        self.quads
            .iter()
            .flat_map(|quad| quad.vertices().iter().copied())
            .collect()
    }

    pub fn indices(&self) -> &'static [u16] {
        &CUBE_INDICES
    }
}

impl Default for Cube {
    fn default() -> Self {
        Cube::new([Color::RED, Color::GREEN, Color::BLUE, Color::YELLOW])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{flatten, FLOATS_PER_VERTEX};

    #[test]
    fn cube_has_eight_corners_and_thirty_six_indices() {
        let cube = Cube::default();
        assert_eq!(cube.vertices().len(), 8);
        assert_eq!(cube.indices().len(), 36);
        assert!(cube.indices().iter().all(|&i| i < 8));
        assert_eq!(flatten(&cube.vertices()).len(), 8 * FLOATS_PER_VERTEX);
    }

    #[test]
    fn faces_sit_half_a_unit_from_the_origin() {
        let cube = Cube::default();
        assert!(cube.front().vertices().iter().all(|v| v.position.z == 0.5));
        assert!(cube.back().vertices().iter().all(|v| v.position.z == -0.5));
    }

    #[test]
    fn quad_winds_bottom_left_first() {
        let quad = *Cube::default().front();
        let corners: Vec<(f32, f32)> = quad
            .vertices()
            .iter()
            .map(|v| (v.position.x, v.position.y))
            .collect();
        assert_eq!(
            corners,
            vec![(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)]
        );
    }

    #[test]
    fn colors_are_assigned_per_corner() {
        let colors = [Color::WHITE, Color::BLUE, Color::GREEN, Color::RED];
        let cube = Cube::new(colors);
        for quad in [cube.front(), cube.back()] {
            let got: Vec<Color> = quad.vertices().iter().map(|v| v.color).collect();
            assert_eq!(got, colors.to_vec());
        }
    }

    #[test]
    fn every_corner_is_used() {
        let mut seen = [false; 8];
        for &i in CUBE_INDICES.iter() {
            seen[i as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }
}
