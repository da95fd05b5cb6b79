//! Approximating laid-out edge curves for the renderer.
//!
//! Layout gives each edge a run of control points. The renderer instead
//! wants, per control point, a signed perpendicular distance from the
//! straight source-target line and a weight saying how far along that line
//! the point projects. Edges whose points all hug the line are drawn
//! straight.
use crate::layout::Point;

/// Control points closer than this to the source-target line are ignored
pub const CTRL_PT_DIST_EPSILON: f64 = 5.0;

/// Weights of exactly 0 or 1 collide with the implicit endpoints of the
/// renderer's curve model and are moved to these values
pub const MIN_CTRL_PT_WEIGHT: f64 = 0.01;
pub const MAX_CTRL_PT_WEIGHT: f64 = 0.99;

#[derive(Debug, Clone, PartialEq)]
pub enum EdgeShape {
    Straight,
    Curved { weights: Vec<f64>, distances: Vec<f64> },
}

impl EdgeShape {
    pub fn is_curved(&self) -> bool {
        matches!(self, EdgeShape::Curved { .. })
    }
}

/// Signed distance of `p` from the line through `source` and `target`, and
/// the weight of its projection onto it.
pub fn distance_and_weight(source: Point, target: Point, p: Point) -> (f64, f64) {
    let dx = target.x - source.x;
    let dy = target.y - source.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq <= f64::EPSILON {
        // Degenerate line (self-loops): measure from the source itself
        let dist = ((p.x - source.x).powi(2) + (p.y - source.y).powi(2)).sqrt();
        return (dist, 0.5);
    }
    let distance = (dx * (p.y - source.y) - dy * (p.x - source.x)) / len_sq.sqrt();
    let weight = ((p.x - source.x) * dx + (p.y - source.y) * dy) / len_sq;
    (distance, nudge_weight(weight))
}

fn nudge_weight(weight: f64) -> f64 {
    if weight == 0.0 {
        MIN_CTRL_PT_WEIGHT
    } else if weight == 1.0 {
        MAX_CTRL_PT_WEIGHT
    } else {
        weight
    }
}

/// Decide how an edge from `source` to `target` through `control_points`
/// should be drawn.
pub fn classify_edge(source: Point, target: Point, control_points: &[Point]) -> EdgeShape {
    let mut weights = Vec::with_capacity(control_points.len());
    let mut distances = Vec::with_capacity(control_points.len());
    let mut straight = true;
    for &p in control_points {
        let (distance, weight) = distance_and_weight(source, target, p);
        if distance.abs() >= CTRL_PT_DIST_EPSILON {
            straight = false;
        }
        weights.push(weight);
        distances.push(distance);
    }
    if straight {
        EdgeShape::Straight
    } else {
        EdgeShape::Curved { weights, distances }
    }
}
