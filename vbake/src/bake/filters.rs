use crate::config::PostProcessConfig;
use crate::math::*;
use crate::progress::ProgressSink;

/// Pulls every color towards the mean of all colors.
pub fn average_colors(colors: &mut [Vec4], strength: f32) {
    if colors.is_empty() {
        return;
    }
    let mut sum = Vec4::ZERO;
    for &c in colors.iter() {
        sum += c;
    }
    let mean = sum / colors.len() as f32;
    for c in colors.iter_mut() {
        *c = lerp(*c, mean, strength);
    }
}

/// Pulls every color towards the mean of itself and all vertices within `radius` (inclusive).
///
/// Brute force over all pairs. Lookups read a snapshot taken up front so the result does not depend
/// on iteration order. Progress is reported once per vertex.
pub fn average_neighbor_colors(
    positions: &[Vec3],
    colors: &mut [Vec4],
    radius: f32,
    strength: f32,
    progress: &mut dyn ProgressSink,
) {
    assert_eq!(positions.len(), colors.len());
    let snapshot = colors.to_vec();
    let radius2 = radius * radius;
    for (i, &pi) in positions.iter().enumerate() {
        let mut sum = snapshot[i];
        let mut count = 1;
        for (j, &pj) in positions.iter().enumerate() {
            if i != j && pi.distance_squared(pj) <= radius2 {
                sum += snapshot[j];
                count += 1;
            }
        }
        colors[i] = lerp(snapshot[i], sum / count as f32, strength);
        progress.report("Averaging neighbour colors", (i + 1) as f32 / positions.len() as f32);
    }
}

pub fn tint_colors(colors: &mut [Vec4], tint: Vec4) {
    for c in colors.iter_mut() {
        *c = *c * tint;
    }
}

/// Global average, neighbour average, tint, each when enabled. Every phase sees the previous one's
/// output.
pub fn apply_filter_chain(
    positions: &[Vec3],
    colors: &mut [Vec4],
    config: &PostProcessConfig,
    progress: &mut dyn ProgressSink,
) {
    if config.average_colors {
        average_colors(colors, config.average_strength);
    }
    if config.average_neighbors {
        average_neighbor_colors(positions, colors, config.neighbor_radius, config.neighbor_strength, progress);
    }
    if config.tint_enabled {
        tint_colors(colors, config.tint_color());
    }
}
