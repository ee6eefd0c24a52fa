use super::*;

/// Twice the signed area of the triangle (p0, p1, p2); positive for counter-clockwise winding.
pub fn signed_area2(p0: Vec2, p1: Vec2, p2: Vec2) -> f32 {
    -p1.y * p2.x + p0.y * (p2.x - p1.x) + p0.x * (p1.y - p2.y) + p1.x * p2.y
}

/// Inclusive point-in-triangle test based on the signs of two edge functions.
///
/// `s` and `t` are the unnormalized barycentric weights of `p2` and `p1`. After flipping them by the
/// sign of the triangle area, the point is inside iff both are non-negative and their sum does not
/// exceed the area. Triangles with zero area contain nothing.
pub fn is_point_in_triangle(p: Vec2, p0: Vec2, p1: Vec2, p2: Vec2) -> bool {
    let area = signed_area2(p0, p1, p2);
    if area == 0.0 {
        return false;
    }

    let mut s = p0.y * p2.x - p0.x * p2.y + (p2.y - p0.y) * p.x + (p0.x - p2.x) * p.y;
    let mut t = p0.x * p1.y - p0.y * p1.x + (p0.y - p1.y) * p.x + (p1.x - p0.x) * p.y;
    let mut area = area;
    if area < 0.0 {
        s = -s;
        t = -t;
        area = -area;
    }
    s >= 0.0 && t >= 0.0 && s + t <= area
}

/// Maps a point given in UV space onto the 3D triangle (v0, v1, v2) sharing the same barycentric
/// coordinates. Returns `None` for UV triangles with no area.
pub fn barycentric_interpolate(uv: Vec2, uv0: Vec2, uv1: Vec2, uv2: Vec2, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<Vec3> {
    let denom = (uv1.y - uv2.y) * (uv0.x - uv2.x) + (uv2.x - uv1.x) * (uv0.y - uv2.y);
    if denom == 0.0 {
        return None;
    }
    let a = ((uv1.y - uv2.y) * (uv.x - uv2.x) + (uv2.x - uv1.x) * (uv.y - uv2.y)) / denom;
    let b = ((uv2.y - uv0.y) * (uv.x - uv2.x) + (uv0.x - uv2.x) * (uv.y - uv2.y)) / denom;
    let c = 1.0 - a - b;
    Some(a * v0 + b * v1 + c * v2)
}

/// Integer grid cell of a quantized position, usable as a hash key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuantizedPosition {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl QuantizedPosition {
    pub fn new(p: Vec3, precision: f32) -> Self {
        Self {
            x: (p.x / precision).round() as i64,
            y: (p.y / precision).round() as i64,
            z: (p.z / precision).round() as i64,
        }
    }
}
