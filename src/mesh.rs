//! Planar surface geometry.
//!
//! The surface is a static triangulated unit square; all motion comes from
//! the displacement field sampled in the vertex shader. No UVs or normals
//! are stored (the normalized position doubles as the texture coordinate,
//! normals come from the field).

/// One mesh point. Padded to 16 bytes for WGSL-friendly layout.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointVertex {
    pub position: [f32; 3],
    pub _padding: f32,
}

/// Generate the point list for a `resolution` x `resolution` grid tiling
/// [0,1]x[0,1]: (resolution-1)^2 cells, two triangles per cell, 6 points per
/// cell, plain triangle list (no index buffer).
pub fn planar_points(resolution: u32) -> Vec<PointVertex> {
    assert!(resolution >= 2, "resolution must be at least 2");

    let cells = (resolution - 1) as usize;
    let mut points = Vec::with_capacity(cells * cells * 6);
    let step = 1.0 / (resolution - 1) as f32;

    let at = |x: u32, y: u32| PointVertex {
        position: [x as f32 * step, 0.0, y as f32 * step],
        _padding: 0.0,
    };

    for y in 0..resolution - 1 {
        for x in 0..resolution - 1 {
            // triangle 1: bottom-left, top-left, top-right
            points.push(at(x, y));
            points.push(at(x, y + 1));
            points.push(at(x + 1, y + 1));
            // triangle 2: bottom-left, top-right, bottom-right
            points.push(at(x, y));
            points.push(at(x + 1, y + 1));
            points.push(at(x + 1, y));
        }
    }

    points
}

/// GPU-side provisioner for the surface geometry. Rebuilds the point buffer
/// only when the resolution changes; release is idempotent.
pub struct SurfaceMesh {
    buffer: Option<wgpu::Buffer>,
    resolution: u32,
    point_count: u32,
    rebuilds: u32,
}

impl SurfaceMesh {
    pub fn new() -> Self {
        Self {
            buffer: None,
            resolution: 0,
            point_count: 0,
            rebuilds: 0,
        }
    }

    /// Provision the point buffer for `resolution`. No-op when already
    /// correctly sized; otherwise the old buffer is released first.
    pub fn ensure(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, resolution: u32) {
        assert!(resolution >= 2, "resolution must be at least 2");
        if self.buffer.is_some() && self.resolution == resolution {
            return;
        }
        self.release();

        let points = planar_points(resolution);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Surface Point Buffer"),
            size: (points.len() * std::mem::size_of::<PointVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(&buffer, 0, bytemuck::cast_slice(&points));

        log::debug!(
            "surface mesh rebuilt: resolution {} ({} points)",
            resolution,
            points.len()
        );

        self.point_count = points.len() as u32;
        self.resolution = resolution;
        self.buffer = Some(buffer);
        self.rebuilds += 1;
    }

    /// Drop the point buffer. Safe to call when already released.
    pub fn release(&mut self) {
        self.buffer = None;
        self.resolution = 0;
        self.point_count = 0;
    }

    pub fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }

    pub fn point_count(&self) -> u32 {
        self.point_count
    }

    pub fn rebuilds(&self) -> u32 {
        self.rebuilds
    }
}

impl Default for SurfaceMesh {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_count() {
        // (resolution - 1)^2 cells * 6 points
        assert_eq!(planar_points(2).len(), 6);
        assert_eq!(planar_points(3).len(), 24);
        assert_eq!(planar_points(10).len(), 81 * 6);
    }

    #[test]
    fn test_points_stay_inside_unit_square() {
        for p in planar_points(7) {
            assert!(p.position[0] >= 0.0 && p.position[0] <= 1.0);
            assert!(p.position[2] >= 0.0 && p.position[2] <= 1.0);
            assert_eq!(p.position[1], 0.0);
        }
    }

    #[test]
    fn test_minimum_resolution_spans_full_square() {
        let points = planar_points(2);
        assert_eq!(points.len(), 6);

        // One quad: bl, tl, tr / bl, tr, br
        assert_eq!(points[0].position, [0.0, 0.0, 0.0]);
        assert_eq!(points[1].position, [0.0, 0.0, 1.0]);
        assert_eq!(points[2].position, [1.0, 0.0, 1.0]);
        assert_eq!(points[3].position, [0.0, 0.0, 0.0]);
        assert_eq!(points[4].position, [1.0, 0.0, 1.0]);
        assert_eq!(points[5].position, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_consistent_winding_across_cells() {
        let points = planar_points(3);
        // Every cell's first triangle starts at its bottom-left corner
        for cell in 0..4 {
            let tri1 = &points[cell * 6..cell * 6 + 3];
            let tri2 = &points[cell * 6 + 3..cell * 6 + 6];
            assert_eq!(tri1[0].position, tri2[0].position);
            assert_eq!(tri1[2].position, tri2[1].position);
        }
    }

    #[test]
    #[should_panic(expected = "resolution must be at least 2")]
    fn test_resolution_one_is_a_precondition_violation() {
        planar_points(1);
    }

    #[test]
    #[should_panic(expected = "resolution must be at least 2")]
    fn test_resolution_zero_is_a_precondition_violation() {
        planar_points(0);
    }

    #[test]
    fn test_point_vertex_layout() {
        assert_eq!(std::mem::size_of::<PointVertex>(), 16);
    }
}
