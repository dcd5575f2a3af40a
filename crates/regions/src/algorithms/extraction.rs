use image::{imageops, GrayImage};
use imageproc::{
    contours::{find_contours, BorderType},
    point::Point,
};

use crate::{
    error::Result,
    traits::BoundaryTracer,
    types::{BinaryMask, BoundaryKind, TracedContour},
};

/// Imageproc-based border follower.
///
/// Returns outer and hole borders in discovery order with their parent links,
/// each compressed to the endpoints of its straight runs. Pixels outside the
/// mask count as background, so regions touching the edge get an outer border.
#[derive(Debug, Clone, Default)]
pub struct ImageprocBoundaryTracer;

impl BoundaryTracer for ImageprocBoundaryTracer {
    fn trace(&self, mask: &BinaryMask) -> Result<Vec<TracedContour>> {
        // find_contours never opens an outer border in column 0, so trace
        // inside a one pixel background frame and shift back.
        let mut framed = GrayImage::new(mask.width() + 2, mask.height() + 2);
        imageops::replace(&mut framed, mask.as_image(), 1, 1);
        let contours = find_contours::<i32>(&framed);

        let result = contours
            .into_iter()
            .map(|contour| {
                let shifted: Vec<Point<i32>> = contour
                    .points
                    .iter()
                    .map(|p| Point::new(p.x - 1, p.y - 1))
                    .collect();
                TracedContour {
                    points: compress_runs(&shifted),
                    kind: match contour.border_type {
                        BorderType::Outer => BoundaryKind::Outer,
                        BorderType::Hole => BoundaryKind::Hole,
                    },
                    parent: contour.parent,
                }
            })
            .collect();

        Ok(result)
    }
}

/// Drop every point that sits inside a straight run of a closed chain.
///
/// Consecutive border pixels are 8-neighbours, so a point is redundant
/// exactly when the step into it equals the step out of it. Horizontal,
/// vertical and diagonal runs collapse to their two endpoints.
pub fn compress_runs(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let mut ring = points.to_vec();
    ring.dedup();
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }

    let n = ring.len();
    if n < 3 {
        return ring;
    }

    let step = |from: Point<i32>, to: Point<i32>| (to.x - from.x, to.y - from.y);
    (0..n)
        .filter(|&i| {
            let prev = ring[(i + n - 1) % n];
            let next = ring[(i + 1) % n];
            step(prev, ring[i]) != step(ring[i], next)
        })
        .map(|i| ring[i])
        .collect()
}
