//! Closest-point queries against bone segments

use glam::Vec3;

/// Distance from `point` to the segment `[seg_start, seg_end]`, together with
/// the clamped projection parameter `t` (0 at `seg_start`, 1 at `seg_end`).
///
/// A segment whose squared length is exactly zero is treated as a point:
/// the result is `(|point - seg_start|, 0.0)`. No epsilon is applied, so very
/// short but non-zero segments still project normally.
pub fn segment_distance(point: Vec3, seg_start: Vec3, seg_end: Vec3) -> (f32, f32) {
    let seg = seg_end - seg_start;
    let len_sq = seg.length_squared();
    if len_sq == 0.0 {
        return (point.distance(seg_start), 0.0);
    }

    let t = ((point - seg_start).dot(seg) / len_sq).clamp(0.0, 1.0);
    let projection = seg_start + seg * t;
    (point.distance(projection), t)
}

/// Linear interpolation of an envelope radius at projection parameter `t`
#[inline]
pub fn interpolate_radius(head_radius: f32, tail_radius: f32, t: f32) -> f32 {
    (1.0 - t) * head_radius + t * tail_radius
}
