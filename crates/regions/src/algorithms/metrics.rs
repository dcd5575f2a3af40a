//! Shape measurements on traced contours, built on the `geo` algorithms.

use geo::{Area, BoundingRect, EuclideanLength, MinimumRotatedRect};
use geo_types::{Coord, LineString, Polygon};
use imageproc::point::Point;

use crate::types::RotatedRect;

/// Area, perimeter, circularity and rotated bounding box of one contour
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeMetrics {
    pub area: f64,
    pub perimeter: f64,
    pub circularity: f64,
    pub rect: RotatedRect,
}

impl ShapeMetrics {
    pub fn measure(polygon: &Polygon<f64>) -> Self {
        let area = polygon.unsigned_area();
        let perimeter = polygon.exterior().euclidean_length();
        Self {
            area,
            perimeter,
            circularity: circularity(area, perimeter),
            rect: min_area_rect(polygon),
        }
    }
}

/// Closed polygon through the contour points; the exterior ring is closed
/// automatically.
pub fn polygon_of(points: &[Point<i32>]) -> Polygon<f64> {
    let ring: LineString<f64> = points
        .iter()
        .map(|p| Coord {
            x: p.x as f64,
            y: p.y as f64,
        })
        .collect();
    Polygon::new(ring, vec![])
}

/// `4π·area / perimeter²`, 1.0 for a circle and 0 when the perimeter vanishes
pub fn circularity(area: f64, perimeter: f64) -> f64 {
    if perimeter == 0.0 {
        return 0.0;
    }
    4.0 * std::f64::consts::PI * area / (perimeter * perimeter)
}

pub fn aspect_ratio(width: f64, height: f64, epsilon: f64) -> f64 {
    width.max(height) / (width.min(height) + epsilon)
}

/// Smallest rectangle, at any rotation, enclosing the polygon.
///
/// Falls back to the axis-aligned bounding box when no rotated rectangle can
/// be built, and to a zero rectangle for an empty polygon.
pub fn min_area_rect(polygon: &Polygon<f64>) -> RotatedRect {
    let rotated = polygon.minimum_rotated_rect().and_then(|rect| {
        let coords: Vec<Coord<f64>> = rect.exterior().coords().take(4).copied().collect();
        <[Coord<f64>; 4]>::try_from(coords).ok()
    });

    let corners = rotated.or_else(|| {
        polygon.bounding_rect().map(|bounds| {
            let (min, max) = (bounds.min(), bounds.max());
            [
                min,
                Coord { x: max.x, y: min.y },
                max,
                Coord { x: min.x, y: max.y },
            ]
        })
    });

    match corners {
        Some(corners) => rect_from_corners(corners),
        None => RotatedRect {
            center: [0.0, 0.0],
            width: 0.0,
            height: 0.0,
            angle_degrees: 90.0,
            corners: [[0.0; 2]; 4],
        },
    }
}

/// Describe a rectangle given its corners in ring order.
///
/// `width` is the side whose direction, folded into (0°, 90°], gives the angle;
/// `height` is the other side.
fn rect_from_corners(corners: [Coord<f64>; 4]) -> RotatedRect {
    let center = corners.iter().fold([0.0, 0.0], |acc, c| {
        [acc[0] + c.x / 4.0, acc[1] + c.y / 4.0]
    });

    let first = corners[1] - corners[0];
    let second = corners[2] - corners[1];
    let first_len = first.x.hypot(first.y);
    let second_len = second.x.hypot(second.y);

    // Snap away float noise so axis-aligned boxes land exactly on 90.
    let raw = first.y.atan2(first.x).to_degrees().rem_euclid(180.0);
    let angle = (raw * 1e9).round() / 1e9 % 180.0;

    let (width, height, angle_degrees) = if angle > 0.0 && angle <= 90.0 {
        (first_len, second_len, angle)
    } else if angle > 90.0 {
        (second_len, first_len, angle - 90.0)
    } else {
        (second_len, first_len, 90.0)
    };

    RotatedRect {
        center,
        width,
        height,
        angle_degrees,
        corners: corners.map(|c| [c.x, c.y]),
    }
}
