use super::*;

/// Hue, saturation and value, each in [0, 1]. Hue wraps around at 1.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Hsv {
    pub h: f32,
    pub s: f32,
    pub v: f32,
}

impl Hsv {
    /// Converts the RGB part of `color`; alpha is ignored.
    pub fn from_rgb(color: Vec4) -> Self {
        let (r, g, b) = (color.x, color.y, color.z);
        if b > g && b > r {
            hsv_from_dominant(4.0, b, r, g)
        } else if g > r {
            hsv_from_dominant(2.0, g, b, r)
        } else {
            hsv_from_dominant(0.0, r, g, b)
        }
    }
}

fn hsv_from_dominant(offset: f32, dominant: f32, c1: f32, c2: f32) -> Hsv {
    if dominant == 0.0 {
        return Hsv { h: 0.0, s: 0.0, v: 0.0 };
    }
    let smallest = c1.min(c2);
    let diff = dominant - smallest;
    let (s, mut h) = if diff != 0.0 { (diff / dominant, offset + (c1 - c2) / diff) } else { (0.0, offset + (c1 - c2)) };
    h /= 6.0;
    if h < 0.0 {
        h += 1.0;
    }
    Hsv { h, s, v: dominant }
}

/// Distance between two colors in HSV space: the Euclidean norm of the circular hue difference
/// (at most 0.5), the saturation difference and the value difference. Ranges over [0, sqrt(3)].
pub fn hsv_distance(a: Vec4, b: Vec4) -> f32 {
    let a = Hsv::from_rgb(a);
    let b = Hsv::from_rgb(b);
    let raw = (a.h - b.h).abs();
    let dh = raw.min(1.0 - raw);
    let ds = (a.s - b.s).abs();
    let dv = (a.v - b.v).abs();
    (dh * dh + ds * ds + dv * dv).sqrt()
}

pub fn is_color_similar(a: Vec4, b: Vec4, threshold: f32) -> bool {
    hsv_distance(a, b) <= threshold
}
