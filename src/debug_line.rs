//! Debug line rendering: accumulate line segments over a frame, submit
//! them as one transient line-list draw.
//!
//! Grounded on `src/world/debug_line.h`'s `DebugLine` struct (`add_line`,
//! `add_axes`, `add_circle`, `add_cone`, `add_sphere`, `add_obb`,
//! `reset`, `submit`) and its Lua binding in `src/lua/lua_debug_line.cpp`
//! (which fixes the segment counts this module defaults to). `add_arc`,
//! `add_frustum`, and `add_mesh` are not ported: they are not exercised
//! by the Lua binding the integration-surface scope is taken from, and
//! `add_mesh` in particular would require arbitrary-topology debug
//! geometry this module's line-list-only draw can't express.

use crate::context::VertexSource;
use crate::handle::ProgramHandle;
use crate::math::{transform_point, Mat4};
use crate::renderer::Renderer;
use crate::state::{PrimitiveTopology, RenderState};
use crate::vertex::VertexFormat;
use crate::backend::Backend;

pub const NUM_SEGMENTS: u32 = 36;

type Vec3 = [f32; 3];
type Color4 = [f32; 4];

fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn add_v(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

fn scale(a: Vec3, s: f32) -> Vec3 {
    [a[0] * s, a[1] * s, a[2] * s]
}

fn dot(a: Vec3, b: Vec3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [a[1] * b[2] - a[2] * b[1], a[2] * b[0] - a[0] * b[2], a[0] * b[1] - a[1] * b[0]]
}

fn normalize(a: Vec3) -> Vec3 {
    let len = dot(a, a).sqrt();
    if len < 1e-8 {
        a
    } else {
        scale(a, 1.0 / len)
    }
}

/// Two unit vectors orthogonal to `normal` and to each other, picked the
/// way most debug-draw circle routines do: cross against whichever world
/// axis is least parallel to `normal`.
fn orthonormal_basis(normal: Vec3) -> (Vec3, Vec3) {
    let n = normalize(normal);
    let helper = if n[1].abs() < 0.99 { [0.0, 1.0, 0.0] } else { [1.0, 0.0, 0.0] };
    let u = normalize(cross(helper, n));
    let v = cross(n, u);
    (u, v)
}

/// Accumulates colored line segments across a frame and flushes them as
/// one transient `Lines`-topology draw. Not thread-safe; owned by the
/// submit thread like every other producer in this crate.
pub struct DebugLineRenderer {
    program: ProgramHandle,
    segments: Vec<(Vec3, Vec3, Color4)>,
}

impl DebugLineRenderer {
    pub fn new(program: ProgramHandle) -> Self {
        DebugLineRenderer { program, segments: Vec::new() }
    }

    pub fn add_line(&mut self, start: Vec3, end: Vec3, color: Color4) {
        self.segments.push((start, end, color));
    }

    /// Draws the three basis axes of `transform`, scaled by `length`,
    /// colored red/green/blue for x/y/z.
    pub fn add_axes(&mut self, transform: &Mat4, length: f32) {
        let origin = transform_point(transform, [0.0, 0.0, 0.0]);
        let x = transform_point(transform, [length, 0.0, 0.0]);
        let y = transform_point(transform, [0.0, length, 0.0]);
        let z = transform_point(transform, [0.0, 0.0, length]);
        self.add_line(origin, x, [1.0, 0.0, 0.0, 1.0]);
        self.add_line(origin, y, [0.0, 1.0, 0.0, 1.0]);
        self.add_line(origin, z, [0.0, 0.0, 1.0, 1.0]);
    }

    pub fn add_circle(&mut self, center: Vec3, radius: f32, normal: Vec3, color: Color4, segments: u32) {
        let (u, v) = orthonormal_basis(normal);
        let segments = segments.max(3);
        let mut prev = add_v(center, scale(u, radius));
        for i in 1..=segments {
            let theta = (i as f32 / segments as f32) * (2.0 * std::f32::consts::PI);
            let point = add_v(center, add_v(scale(u, radius * theta.cos()), scale(v, radius * theta.sin())));
            self.add_line(prev, point, color);
            prev = point;
        }
    }

    /// Base circle plus `segments` rays from the circle up to `tip`.
    pub fn add_cone(&mut self, base_center: Vec3, tip: Vec3, radius: f32, color: Color4, segments: u32) {
        let axis = sub(tip, base_center);
        self.add_circle(base_center, radius, axis, color, segments);
        let (u, v) = orthonormal_basis(axis);
        let segments = segments.max(3);
        for i in 0..segments {
            let theta = (i as f32 / segments as f32) * (2.0 * std::f32::consts::PI);
            let rim = add_v(base_center, add_v(scale(u, radius * theta.cos()), scale(v, radius * theta.sin())));
            self.add_line(rim, tip, color);
        }
    }

    /// Three orthogonal great circles, a common cheap sphere wireframe.
    pub fn add_sphere(&mut self, center: Vec3, radius: f32, color: Color4, segments: u32) {
        self.add_circle(center, radius, [1.0, 0.0, 0.0], color, segments);
        self.add_circle(center, radius, [0.0, 1.0, 0.0], color, segments);
        self.add_circle(center, radius, [0.0, 0.0, 1.0], color, segments);
    }

    /// The 12 edges of a box transformed by `tm`, half-extents
    /// `half_extents` in `tm`'s local space.
    pub fn add_obb(&mut self, tm: &Mat4, half_extents: Vec3, color: Color4) {
        let (hx, hy, hz) = (half_extents[0], half_extents[1], half_extents[2]);
        let local_corners = [
            [-hx, -hy, -hz], [hx, -hy, -hz], [hx, hy, -hz], [-hx, hy, -hz],
            [-hx, -hy, hz], [hx, -hy, hz], [hx, hy, hz], [-hx, hy, hz],
        ];
        let corners: Vec<Vec3> = local_corners.iter().map(|&c| transform_point(tm, c)).collect();
        const EDGES: [(usize, usize); 12] = [
            (0, 1), (1, 2), (2, 3), (3, 0),
            (4, 5), (5, 6), (6, 7), (7, 4),
            (0, 4), (1, 5), (2, 6), (3, 7),
        ];
        for &(a, b) in &EDGES {
            self.add_line(corners[a], corners[b], color);
        }
    }

    /// Drops all accumulated segments without submitting them.
    pub fn reset(&mut self) {
        self.segments.clear();
    }

    /// Uploads the accumulated segments into a transient vertex buffer
    /// (`P3C4`, one vertex pair per line) and records one `Lines`-topology
    /// draw on `layer`. Does not call [`DebugLineRenderer::reset`] — the
    /// original keeps `reset()` a separate call so callers can submit the
    /// same lines across multiple views before clearing them.
    pub fn submit<B: Backend + Send + 'static>(&self, renderer: &mut Renderer<B>, layer: u8) {
        if self.segments.is_empty() {
            return;
        }
        let vertex_count = self.segments.len() as u32 * 2;
        let mut bytes = Vec::with_capacity(vertex_count as usize * 28);
        for (p0, p1, color) in &self.segments {
            for p in [p0, p1] {
                bytes.extend_from_slice(&p[0].to_le_bytes());
                bytes.extend_from_slice(&p[1].to_le_bytes());
                bytes.extend_from_slice(&p[2].to_le_bytes());
                bytes.extend_from_slice(&color[0].to_le_bytes());
                bytes.extend_from_slice(&color[1].to_le_bytes());
                bytes.extend_from_slice(&color[2].to_le_bytes());
                bytes.extend_from_slice(&color[3].to_le_bytes());
            }
        }

        let source = renderer.reserve_transient_vertex_buffer(vertex_count, VertexFormat::P3C4);
        let reservation = match source {
            VertexSource::Transient(r) => r,
            VertexSource::Static(_) => unreachable!("reserve_transient_vertex_buffer always returns Transient"),
        };
        renderer.update_vertex_buffer(reservation.buffer, reservation.byte_offset, &bytes);

        renderer.set_state(RenderState::default().with_primitive_topology(PrimitiveTopology::Lines));
        renderer.set_program(self.program);
        renderer.set_vertex_buffer(VertexSource::Transient(reservation), vertex_count);
        renderer.commit(layer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_line_accumulates_a_segment() {
        let mut dl = DebugLineRenderer::new(ProgramHandle::invalid());
        assert!(dl.segments.is_empty());
        dl.add_line([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(dl.segments.len(), 1);
        dl.reset();
        assert!(dl.segments.is_empty());
    }

    #[test]
    fn add_axes_draws_three_segments() {
        let mut dl = DebugLineRenderer::new(ProgramHandle::invalid());
        dl.add_axes(&crate::math::identity(), 2.0);
        assert_eq!(dl.segments.len(), 3);
    }

    #[test]
    fn add_circle_closes_the_loop() {
        let mut dl = DebugLineRenderer::new(ProgramHandle::invalid());
        dl.add_circle([0.0, 0.0, 0.0], 1.0, [0.0, 0.0, 1.0], [1.0, 0.0, 0.0, 1.0], 8);
        assert_eq!(dl.segments.len(), 8);
        let (first_start, _, _) = dl.segments[0];
        let (_, last_end, _) = dl.segments[dl.segments.len() - 1];
        for i in 0..3 {
            assert!((first_start[i] - last_end[i]).abs() < 1e-4);
        }
    }

    #[test]
    fn add_obb_draws_twelve_edges() {
        let mut dl = DebugLineRenderer::new(ProgramHandle::invalid());
        dl.add_obb(&crate::math::identity(), [1.0, 1.0, 1.0], [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(dl.segments.len(), 12);
    }
}
