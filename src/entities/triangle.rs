use super::{Color, Point3, Vertex};

/// A flat triangle in the z = 0 plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    vertices: [Vertex; 3],
}

impl Triangle {
    /// Colors go to bottom-left, bottom-right and top, in that order.
    pub fn new(colors: [Color; 3]) -> Self {
        Self {
            vertices: [
                Vertex::new(Point3::new(-0.5, -0.5, 0.0), colors[0]),
                Vertex::new(Point3::new(0.5, -0.5, 0.0), colors[1]),
                Vertex::new(Point3::new(0.0, 0.5, 0.0), colors[2]),
            ],
        }
    }

    pub fn vertices(&self) -> &[Vertex; 3] {
        &self.vertices
    }
}

impl Default for Triangle {
    fn default() -> Self {
        Triangle::new([Color::RED, Color::GREEN, Color::BLUE])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::flatten;

    #[test]
    fn triangle_is_planar_and_counter_clockwise() {
        let [a, b, c] = *Triangle::default().vertices();
        assert!([a, b, c].iter().all(|v| v.position.z == 0.0));

        let ab = b.position - a.position;
        let ac = c.position - a.position;
        assert!(ab.cross(&ac).z > 0.0);
    }

    #[test]
    fn flattened_triangle_starts_with_first_corner() {
        let floats = flatten(Triangle::default().vertices());
        assert_eq!(floats.len(), 21);
        assert_eq!(&floats[..7], &[-0.5, -0.5, 0.0, 1.0, 0.0, 0.0, 1.0]);
    }
}
