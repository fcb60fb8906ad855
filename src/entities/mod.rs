mod cube;
pub use cube::{Cube, Quad, CUBE_INDICES};

mod triangle;
pub use triangle::Triangle;

extern crate nalgebra as na;

pub type Point3 = na::Point3<f32>;

/// Floats per vertex once flattened: position (3) then color (4).
pub const FLOATS_PER_VERTEX: usize = 7;

/// Byte offset of the color inside a flattened vertex.
pub const COLOR_OFFSET: u32 = 3 * std::mem::size_of::<f32>() as u32;

/// Byte stride of a flattened vertex.
pub const VERTEX_STRIDE: u32 = (FLOATS_PER_VERTEX * std::mem::size_of::<f32>()) as u32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const RED: Color = Color::new(1.0, 0.0, 0.0, 1.0);
    pub const GREEN: Color = Color::new(0.0, 1.0, 0.0, 1.0);
    pub const BLUE: Color = Color::new(0.0, 0.0, 1.0, 1.0);
    pub const YELLOW: Color = Color::new(1.0, 1.0, 0.0, 1.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3,
    pub color: Color,
}

impl Vertex {
    pub fn new(position: Point3, color: Color) -> Self {
        Self { position, color }
    }

    pub fn to_floats(&self) -> [f32; FLOATS_PER_VERTEX] {
        let p = &self.position;
        let c = &self.color;
        [p.x, p.y, p.z, c.r, c.g, c.b, c.a]
    }
}

/// Interleaves position then color of every vertex, in input order.
pub fn flatten(vertices: &[Vertex]) -> Vec<f32> {
    let mut floats = Vec::with_capacity(vertices.len() * FLOATS_PER_VERTEX);
    for vertex in vertices {
        log::trace!("{:?}", vertex);
        floats.extend_from_slice(&vertex.to_floats());
    }
    floats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_vertex_flattens_position_then_color() {
        let vertex = Vertex::new(Point3::new(1.0, 2.0, 3.0), Color::new(0.0, 1.0, 0.0, 1.0));
        assert_eq!(flatten(&[vertex]), vec![1.0, 2.0, 3.0, 0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn flattening_keeps_count_and_order() {
        let vertices: Vec<Vertex> = (0..5)
            .map(|i| {
                let f = i as f32;
                Vertex::new(
                    Point3::new(f, f + 0.5, -f),
                    Color::new(f / 10.0, 0.25, 0.5, 1.0),
                )
            })
            .collect();

        let floats = flatten(&vertices);
        assert_eq!(floats.len(), FLOATS_PER_VERTEX * vertices.len());

        for (i, vertex) in vertices.iter().enumerate() {
            let chunk = &floats[i * FLOATS_PER_VERTEX..(i + 1) * FLOATS_PER_VERTEX];
            assert_eq!(chunk, &vertex.to_floats()[..]);
        }
    }

    #[test]
    fn empty_input_flattens_to_nothing() {
        assert!(flatten(&[]).is_empty());
    }

    #[test]
    fn stride_and_offset_match_the_float_layout() {
        assert_eq!(VERTEX_STRIDE, 28);
        assert_eq!(COLOR_OFFSET, 12);
    }
}
