//! # Block Side Module
//!
//! Defines the six axis-aligned faces of a voxel block and the direction
//! data the mesher and lighting propagator derive from them.

use cgmath::Vector3;

/// Represents the six possible faces of a voxel block.
///
/// Each variant is assigned a fixed integer value; the per-face texture
/// tables in the registry are indexed by it, so the order is part of the
/// registry contract: [FRONT, BACK, BOTTOM, TOP, LEFT, RIGHT].
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum BlockSide {
    /// The front face (facing positive Z).
    FRONT = 0,

    /// The back face (facing negative Z).
    BACK = 1,

    /// The bottom face (facing negative Y).
    BOTTOM = 2,

    /// The top face (facing positive Y).
    TOP = 3,

    /// The left face (facing negative X).
    LEFT = 4,

    /// The right face (facing positive X).
    RIGHT = 5,
}

impl BlockSide {
    /// Returns all six block faces in registry order.
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::FRONT,
            BlockSide::BACK,
            BlockSide::BOTTOM,
            BlockSide::TOP,
            BlockSide::LEFT,
            BlockSide::RIGHT,
        ]
    }

    /// Returns the integer offset from a voxel to the neighbor this face
    /// borders. Used by the mesher's 6-neighbor culling probe and the
    /// lighting flood fill.
    pub fn offset(self) -> Vector3<i32> {
        match self {
            BlockSide::FRONT => Vector3::new(0, 0, 1),
            BlockSide::BACK => Vector3::new(0, 0, -1),
            BlockSide::BOTTOM => Vector3::new(0, -1, 0),
            BlockSide::TOP => Vector3::new(0, 1, 0),
            BlockSide::LEFT => Vector3::new(-1, 0, 0),
            BlockSide::RIGHT => Vector3::new(1, 0, 0),
        }
    }

    /// Returns the outward unit normal of this face as render-ready floats.
    pub fn normal(self) -> Vector3<f32> {
        let o = self.offset();
        Vector3::new(o.x as f32, o.y as f32, o.z as f32)
    }

    /// Returns the two tangent axes spanning this face's plane.
    ///
    /// The smooth-lighting pass steps along these to find the up-to-4
    /// voxels sharing each face vertex.
    pub fn tangents(self) -> (Vector3<i32>, Vector3<i32>) {
        match self {
            BlockSide::FRONT | BlockSide::BACK => {
                (Vector3::new(1, 0, 0), Vector3::new(0, 1, 0))
            }
            BlockSide::BOTTOM | BlockSide::TOP => {
                (Vector3::new(1, 0, 0), Vector3::new(0, 0, 1))
            }
            BlockSide::LEFT | BlockSide::RIGHT => {
                (Vector3::new(0, 0, 1), Vector3::new(0, 1, 0))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_cover_all_six_directions_exactly_once() {
        let mut sum = Vector3::new(0, 0, 0);
        for side in BlockSide::all() {
            let o = side.offset();
            assert_eq!(o.x.abs() + o.y.abs() + o.z.abs(), 1);
            sum += o;
        }
        assert_eq!(sum, Vector3::new(0, 0, 0));
    }

    #[test]
    fn tangents_are_perpendicular_to_the_normal() {
        for side in BlockSide::all() {
            let o = side.offset();
            let (t1, t2) = side.tangents();
            assert_eq!(o.x * t1.x + o.y * t1.y + o.z * t1.z, 0);
            assert_eq!(o.x * t2.x + o.y * t2.y + o.z * t2.z, 0);
        }
    }
}
