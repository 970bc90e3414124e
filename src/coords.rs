//! # Coordinate Mapper
//!
//! Pure conversions between the three coordinate spaces of the voxel world:
//!
//! * **world space** - continuous `f32` positions (player, camera)
//! * **voxel space** - integer coordinates, one unit per block
//! * **chunk space** - integer coordinates, one unit per chunk
//!
//! plus the canonical, invertible chunk-name encoding used to key render
//! attach/detach signals.
//!
//! All functions here are total: every input maps to a value, negative
//! coordinates included. Chunk conversion uses *floored* (Euclidean)
//! division, so `voxel_to_chunk(-1, 8) == -1` rather than `0`; truncating
//! division would fold the two chunks around the origin into one.

use cgmath::Point3;

/// Separator used by [`chunk_name`]. A colon can never occur inside the
/// decimal representation of a coordinate (unlike `-`), so the encoding
/// stays unambiguous for negative values.
const CHUNK_NAME_SEPARATOR: char = ':';

/// Converts a continuous world-space position to the voxel containing it.
///
/// # Arguments
/// * `world_pos` - Position in world units
/// * `block_dimension` - Edge length of one block in world units
///
/// # Returns
/// The integer voxel coordinate whose cube contains `world_pos`.
pub fn world_to_voxel(world_pos: Point3<f32>, block_dimension: f32) -> Point3<i32> {
    Point3::new(
        (world_pos.x / block_dimension).floor() as i32,
        (world_pos.y / block_dimension).floor() as i32,
        (world_pos.z / block_dimension).floor() as i32,
    )
}

/// Converts a voxel coordinate to the coordinate of its owning chunk.
///
/// Uses floored division so that negative voxels land in the correct
/// negative chunk (`floor(-1 / 8) == -1`).
pub fn voxel_to_chunk(voxel: Point3<i32>, chunk_size: i32) -> Point3<i32> {
    Point3::new(
        voxel.x.div_euclid(chunk_size),
        voxel.y.div_euclid(chunk_size),
        voxel.z.div_euclid(chunk_size),
    )
}

/// Returns the voxel coordinate of a chunk's origin corner.
///
/// Inverse of [`voxel_to_chunk`] in the sense that
/// `voxel_to_chunk(chunk_to_voxel(c, s), s) == c` for all integers.
pub fn chunk_to_voxel(chunk: Point3<i32>, chunk_size: i32) -> Point3<i32> {
    Point3::new(
        chunk.x * chunk_size,
        chunk.y * chunk_size,
        chunk.z * chunk_size,
    )
}

/// Converts a voxel coordinate to its position local to the owning chunk.
///
/// # Returns
/// A coordinate with every component in `[0, chunk_size)`, satisfying
/// `chunk_to_voxel(voxel_to_chunk(v, s), s) + local == v`.
pub fn voxel_to_local(voxel: Point3<i32>, chunk_size: i32) -> Point3<i32> {
    Point3::new(
        voxel.x.rem_euclid(chunk_size),
        voxel.y.rem_euclid(chunk_size),
        voxel.z.rem_euclid(chunk_size),
    )
}

/// Encodes a chunk coordinate as its canonical name, e.g. `"4:-1:12"`.
///
/// The name is deterministic and invertible via [`parse_chunk_name`]; it is
/// the key the rendering collaborator uses to pair attach and detach
/// signals.
pub fn chunk_name(chunk: Point3<i32>) -> String {
    format!(
        "{}{sep}{}{sep}{}",
        chunk.x,
        chunk.y,
        chunk.z,
        sep = CHUNK_NAME_SEPARATOR
    )
}

/// Decodes a name produced by [`chunk_name`] back into a chunk coordinate.
///
/// # Returns
/// `None` if the string is not exactly three separated integers.
pub fn parse_chunk_name(name: &str) -> Option<Point3<i32>> {
    let mut parts = name.split(CHUNK_NAME_SEPARATOR);
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;
    let z = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Point3::new(x, y, z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::EuclideanSpace;

    #[test]
    fn floored_division_handles_negative_voxels() {
        assert_eq!(
            voxel_to_chunk(Point3::new(-1, -8, -9), 8),
            Point3::new(-1, -1, -2)
        );
        assert_eq!(
            voxel_to_chunk(Point3::new(0, 7, 8), 8),
            Point3::new(0, 0, 1)
        );
    }

    #[test]
    fn local_and_chunk_recompose_the_voxel() {
        let size = 8;
        for x in -20..20 {
            for y in [-17, -8, -1, 0, 5, 16] {
                let voxel = Point3::new(x, y, x * 3 - y);
                let chunk = voxel_to_chunk(voxel, size);
                let local = voxel_to_local(voxel, size);
                assert!(local.x >= 0 && local.x < size);
                assert!(local.y >= 0 && local.y < size);
                assert!(local.z >= 0 && local.z < size);
                let recomposed = chunk_to_voxel(chunk, size) + local.to_vec();
                assert_eq!(recomposed, voxel);
            }
        }
    }

    #[test]
    fn chunk_to_voxel_round_trips_through_voxel_to_chunk() {
        for s in [1, 4, 8, 16] {
            for c in -5..5 {
                let chunk = Point3::new(c, -c, c * 2);
                assert_eq!(voxel_to_chunk(chunk_to_voxel(chunk, s), s), chunk);
            }
        }
    }

    #[test]
    fn world_positions_floor_into_voxels() {
        assert_eq!(
            world_to_voxel(Point3::new(-0.5, 0.5, 1.9), 1.0),
            Point3::new(-1, 0, 1)
        );
        assert_eq!(
            world_to_voxel(Point3::new(3.9, -3.9, 0.0), 2.0),
            Point3::new(1, -2, 0)
        );
    }

    #[test]
    fn chunk_names_are_invertible() {
        for chunk in [
            Point3::new(0, 0, 0),
            Point3::new(-1, 2, -3),
            Point3::new(105, -99, 7),
        ] {
            assert_eq!(parse_chunk_name(&chunk_name(chunk)), Some(chunk));
        }
        assert_eq!(parse_chunk_name("1:2"), None);
        assert_eq!(parse_chunk_name("1:2:3:4"), None);
        assert_eq!(parse_chunk_name("a:b:c"), None);
    }
}
