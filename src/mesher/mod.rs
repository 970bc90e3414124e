//! # Mesher
//!
//! Converts a padded voxel grid plus its light grid into renderable
//! geometry using exposed-face culling: every non-empty voxel in the
//! chunk's logical bounds probes its 6 axis neighbors (margin cells make
//! the probe valid at chunk edges) and emits a quad wherever the face is
//! visible per the registry rules.
//!
//! The output is a set of flat numeric buffers (positions, normals, UVs,
//! per-vertex light and indices) so the rendering collaborator can take
//! them without any deep copies. Given identical grid and light snapshots
//! the buffers are byte-identical, which the caching and test layers rely
//! on.
//!
//! This is deliberately the simple O(voxels × 6) culling strategy; greedy
//! run-length merging of coplanar faces is a known open optimization that
//! trades simplicity for vertex density.

use cgmath::{Point3, Vector3};

use crate::block::block_side::BlockSide;
use crate::block::block_type::BlockType;
use crate::block::{self, ATLAS_COLUMNS};
use crate::chunk::{LightGrid, VoxelGrid};
use crate::coords;
use crate::lighting::{self, LightingConfig};

/// Flat geometry buffers for one chunk, ready for transfer to the
/// rendering collaborator.
///
/// Layout: `positions`/`normals` hold 3 floats per vertex, `uvs` 2 floats
/// per vertex, `vertex_light` 1 float per vertex, and `indices` 6 entries
/// per quad (two triangles).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffers {
    /// Vertex positions in world units (scaled by the block dimension).
    pub positions: Vec<f32>,
    /// Per-vertex face normals, one of the six axis directions.
    pub normals: Vec<f32>,
    /// Per-vertex atlas coordinates selecting the face's material sub-image.
    pub uvs: Vec<f32>,
    /// Per-vertex smooth-lighting intensity in `[0, 1]`.
    pub vertex_light: Vec<f32>,
    /// Triangle indices into the vertex buffers.
    pub indices: Vec<u32>,
}

impl MeshBuffers {
    /// Number of vertices in the buffers.
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Number of emitted quads.
    pub fn quad_count(&self) -> usize {
        self.indices.len() / 6
    }

    /// Whether the mesh carries no geometry at all (an all-air chunk).
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// The four corner offsets of each face, in the order
/// (lower-left, lower-right, upper-left, upper-right) used by
/// [`push_quad_indices`]'s winding. Corner components are 0 or 1 relative
/// to the voxel's origin corner.
fn face_corners(side: BlockSide) -> [Vector3<i32>; 4] {
    match side {
        BlockSide::FRONT => [
            Vector3::new(0, 0, 1),
            Vector3::new(1, 0, 1),
            Vector3::new(0, 1, 1),
            Vector3::new(1, 1, 1),
        ],
        BlockSide::BACK => [
            Vector3::new(1, 0, 0),
            Vector3::new(0, 0, 0),
            Vector3::new(1, 1, 0),
            Vector3::new(0, 1, 0),
        ],
        BlockSide::BOTTOM => [
            Vector3::new(0, 0, 0),
            Vector3::new(1, 0, 0),
            Vector3::new(0, 0, 1),
            Vector3::new(1, 0, 1),
        ],
        BlockSide::TOP => [
            Vector3::new(0, 1, 1),
            Vector3::new(1, 1, 1),
            Vector3::new(0, 1, 0),
            Vector3::new(1, 1, 0),
        ],
        BlockSide::LEFT => [
            Vector3::new(0, 0, 0),
            Vector3::new(0, 0, 1),
            Vector3::new(0, 1, 0),
            Vector3::new(0, 1, 1),
        ],
        BlockSide::RIGHT => [
            Vector3::new(1, 0, 1),
            Vector3::new(1, 0, 0),
            Vector3::new(1, 1, 1),
            Vector3::new(1, 1, 0),
        ],
    }
}

/// The smooth-lighting tangent corner for each of the four face corners,
/// aligned with [`face_corners`] order.
fn corner_tangent_steps(side: BlockSide, corner: Vector3<i32>) -> (i32, i32) {
    let (t1, t2) = side.tangents();
    let along = |axis: Vector3<i32>| -> i32 {
        // Project the corner offset onto the tangent axis; 1 means the
        // corner sits at the far end of that axis.
        corner.x * axis.x.abs() + corner.y * axis.y.abs() + corner.z * axis.z.abs()
    };
    (along(t1), along(t2))
}

/// Appends the two triangles of one quad, given the index of its first
/// vertex. Winding matches the corner order of [`face_corners`] so every
/// face is counter-clockwise when seen from outside.
fn push_quad_indices(indices: &mut Vec<u32>, first_vertex: u32) {
    indices.extend_from_slice(&[
        first_vertex,
        first_vertex + 1,
        first_vertex + 3,
        first_vertex,
        first_vertex + 3,
        first_vertex + 2,
    ]);
}

/// Appends the UV coordinates of one quad for a texture atlas cell.
///
/// Vertex order follows [`face_corners`]: lower-left, lower-right,
/// upper-left, upper-right. V grows downward in the atlas, so the "upper"
/// corners take the cell's smaller v.
fn push_quad_uvs(uvs: &mut Vec<f32>, texture_index: u8) {
    let step = 1.0 / ATLAS_COLUMNS as f32;
    let u0 = (texture_index % ATLAS_COLUMNS) as f32 * step;
    let v0 = (texture_index / ATLAS_COLUMNS) as f32 * step;
    let (u1, v1) = (u0 + step, v0 + step);
    uvs.extend_from_slice(&[u0, v1, u1, v1, u0, v0, u1, v0]);
}

/// Builds the geometry buffers for one chunk.
///
/// # Arguments
/// * `chunk_pos` - Chunk coordinate, used to place vertices in world space
/// * `grid` - The chunk's padded voxel grid snapshot
/// * `light` - Light grid computed for the same snapshot
/// * `block_dimension` - Edge length of one block in world units
/// * `lighting` - Lighting parameters for per-vertex normalization
///
/// # Determinism
/// Iteration order is fixed (z, then y, then x, then face order), so the
/// same inputs always produce byte-identical buffers.
pub fn mesh_chunk(
    chunk_pos: Point3<i32>,
    grid: &VoxelGrid,
    light: &LightGrid,
    block_dimension: f32,
    lighting: &LightingConfig,
) -> MeshBuffers {
    let size = grid.size();
    let origin = coords::chunk_to_voxel(chunk_pos, size);
    let mut buffers = MeshBuffers::default();

    for z in 0..size {
        for y in 0..size {
            for x in 0..size {
                let local = Point3::new(x, y, z);
                let id = grid.get(local);
                let Some(current) = BlockType::from_id(id) else {
                    continue;
                };
                if current == BlockType::AIR {
                    continue;
                }
                let textures = block::face_textures(id);

                for side in BlockSide::all() {
                    let neighbor_local = local + side.offset();
                    let neighbor = BlockType::from_id(grid.get(neighbor_local))
                        .unwrap_or(BlockType::AIR);
                    if !block::face_visible(current, neighbor) {
                        continue;
                    }

                    let first_vertex = buffers.vertex_count() as u32;
                    let normal = side.normal();
                    for corner in face_corners(side) {
                        let vx = (origin.x + x + corner.x) as f32 * block_dimension;
                        let vy = (origin.y + y + corner.y) as f32 * block_dimension;
                        let vz = (origin.z + z + corner.z) as f32 * block_dimension;
                        buffers.positions.extend_from_slice(&[vx, vy, vz]);
                        buffers
                            .normals
                            .extend_from_slice(&[normal.x, normal.y, normal.z]);
                        buffers.vertex_light.push(lighting::vertex_light(
                            grid,
                            light,
                            neighbor_local,
                            side,
                            corner_tangent_steps(side, corner),
                            lighting,
                        ));
                    }
                    push_quad_uvs(&mut buffers.uvs, textures[side as usize]);
                    push_quad_indices(&mut buffers.indices, first_vertex);
                }
            }
        }
    }

    buffers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lighting::compute_chunk_light;

    fn mesh(grid: &VoxelGrid) -> MeshBuffers {
        let config = LightingConfig::default();
        let light = compute_chunk_light(grid, &config);
        mesh_chunk(Point3::new(0, 0, 0), grid, &light, 1.0, &config)
    }

    #[test]
    fn isolated_voxel_produces_exactly_six_quads() {
        let mut grid = VoxelGrid::new(8);
        grid.set(Point3::new(3, 3, 3), BlockType::STONE.id());
        let buffers = mesh(&grid);
        assert_eq!(buffers.quad_count(), 6);
        assert_eq!(buffers.vertex_count(), 24);
        assert_eq!(buffers.indices.len(), 36);
        assert_eq!(buffers.uvs.len(), 48);
        assert_eq!(buffers.vertex_light.len(), 24);
    }

    #[test]
    fn adjacent_solid_voxels_cull_the_shared_face() {
        let mut grid = VoxelGrid::new(8);
        grid.set(Point3::new(3, 3, 3), BlockType::DIRT.id());
        grid.set(Point3::new(4, 3, 3), BlockType::DIRT.id());
        let buffers = mesh(&grid);
        // 12 faces minus the shared face culled from both sides.
        assert_eq!(buffers.quad_count(), 10);
    }

    #[test]
    fn water_does_not_cull_the_opaque_neighbor_face() {
        let mut grid = VoxelGrid::new(8);
        grid.set(Point3::new(3, 3, 3), BlockType::DIRT.id());
        grid.set(Point3::new(4, 3, 3), BlockType::WATER.id());
        let buffers = mesh(&grid);
        // Dirt emits all 6 faces (water neighbor is transparent); water
        // emits 5 (its face against dirt is culled).
        assert_eq!(buffers.quad_count(), 11);
    }

    #[test]
    fn margin_blocks_cull_faces_at_the_chunk_edge() {
        let mut grid = VoxelGrid::new(8);
        grid.set(Point3::new(0, 3, 3), BlockType::STONE.id());
        // A neighbor-chunk voxel mirrored into the margin.
        grid.set(Point3::new(-1, 3, 3), BlockType::STONE.id());
        let buffers = mesh(&grid);
        // The -x face is hidden by the neighbor chunk's voxel; the margin
        // voxel itself is outside logical bounds and emits nothing.
        assert_eq!(buffers.quad_count(), 5);
    }

    #[test]
    fn identical_snapshots_mesh_to_byte_identical_buffers() {
        let mut grid = VoxelGrid::new(8);
        for x in 0..8 {
            for z in 0..8 {
                grid.set(Point3::new(x, 0, z), BlockType::STONE.id());
                grid.set(Point3::new(x, 1, z), BlockType::GRASS.id());
            }
        }
        grid.set(Point3::new(4, 2, 4), BlockType::LAMP.id());

        let a = mesh(&grid);
        let b = mesh(&grid);
        assert_eq!(
            bytemuck::cast_slice::<f32, u8>(&a.positions),
            bytemuck::cast_slice::<f32, u8>(&b.positions)
        );
        assert_eq!(
            bytemuck::cast_slice::<f32, u8>(&a.normals),
            bytemuck::cast_slice::<f32, u8>(&b.normals)
        );
        assert_eq!(
            bytemuck::cast_slice::<f32, u8>(&a.uvs),
            bytemuck::cast_slice::<f32, u8>(&b.uvs)
        );
        assert_eq!(
            bytemuck::cast_slice::<f32, u8>(&a.vertex_light),
            bytemuck::cast_slice::<f32, u8>(&b.vertex_light)
        );
        assert_eq!(
            bytemuck::cast_slice::<u32, u8>(&a.indices),
            bytemuck::cast_slice::<u32, u8>(&b.indices)
        );
    }

    #[test]
    fn positions_scale_with_block_dimension_and_chunk_offset() {
        let mut grid = VoxelGrid::new(4);
        grid.set(Point3::new(0, 0, 0), BlockType::STONE.id());
        let config = LightingConfig::default();
        let light = compute_chunk_light(&grid, &config);
        let buffers = mesh_chunk(Point3::new(1, 0, 0), &grid, &light, 2.0, &config);
        // Chunk (1,0,0) with size 4 starts at voxel x = 4; block dimension
        // 2.0 puts the smallest vertex x at 8.0.
        let min_x = buffers
            .positions
            .chunks(3)
            .map(|v| v[0])
            .fold(f32::INFINITY, f32::min);
        assert_eq!(min_x, 8.0);
    }
}
