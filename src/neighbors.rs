//! Neighbor selection for the dispersion factor.
//!
//! Both strategies return the summed great-circle distance over a set of
//! distinct clinic pairs; they differ only in which pairs are chosen.

use crate::config::NeighborStrategy;
use crate::geodesy::haversine_km;
use geo::Point;
use rstar::primitives::GeomWithData;
use rstar::RTree;
use std::collections::HashSet;

type IndexedPoint = GeomWithData<[f64; 2], usize>;

pub fn neighbor_distance_sum(points: &[Point<f64>], window: usize, strategy: NeighborStrategy) -> f64 {
    match strategy {
        NeighborStrategy::IndexWindow => index_window_sum(points, window),
        NeighborStrategy::Nearest => nearest_sum(points, window),
    }
}

/// Pairs each point with the next `window` points in list order. This is not a
/// spatial search; list order decides who counts as a neighbor.
fn index_window_sum(points: &[Point<f64>], window: usize) -> f64 {
    let mut total = 0.0;
    for (i, &a) in points.iter().enumerate() {
        let end = (i + 1 + window).min(points.len());
        for &b in &points[i + 1..end] {
            total += haversine_km(a, b);
        }
    }
    total
}

/// Pairs each point with its `window` closest points. The R-tree ranks by
/// planar lon/lat distance; the sum itself is great-circle. A pair found from
/// both ends is counted once.
fn nearest_sum(points: &[Point<f64>], window: usize) -> f64 {
    let tree = RTree::bulk_load(
        points.iter().enumerate()
            .map(|(i, p)| IndexedPoint::new([p.x(), p.y()], i))
            .collect(),
    );

    let mut pairs: HashSet<(usize, usize)> = HashSet::new();
    for (i, p) in points.iter().enumerate() {
        let nearest = tree.nearest_neighbor_iter(&[p.x(), p.y()])
            .filter(|candidate| candidate.data != i)
            .take(window);
        for candidate in nearest {
            let j = candidate.data;
            pairs.insert((i.min(j), i.max(j)));
        }
    }

    pairs.into_iter()
        .map(|(i, j)| haversine_km(points[i], points[j]))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize) -> Vec<Point<f64>> {
        (0..n).map(|i| Point::new(30.0 + i as f64 * 0.1, 0.0)).collect()
    }

    #[test]
    fn index_window_counts_following_points_only() {
        let points = line(4);
        let with_all = neighbor_distance_sum(&points, 10, NeighborStrategy::IndexWindow);
        let expected: f64 = (0..4)
            .flat_map(|i| (i + 1..4).map(move |j| (i, j)))
            .map(|(i, j)| haversine_km(points[i], points[j]))
            .sum();
        assert!((with_all - expected).abs() < 1e-9);

        let adjacent = neighbor_distance_sum(&points, 1, NeighborStrategy::IndexWindow);
        let step = haversine_km(points[0], points[1]);
        assert!((adjacent - 3.0 * step).abs() < 1e-6);
    }

    #[test]
    fn index_window_depends_on_order() {
        let near = Point::new(30.0, 0.0);
        let near2 = Point::new(30.01, 0.0);
        let far = Point::new(35.0, 0.0);

        let a = neighbor_distance_sum(&[near, near2, far], 1, NeighborStrategy::IndexWindow);
        let b = neighbor_distance_sum(&[near, far, near2], 1, NeighborStrategy::IndexWindow);
        assert!(b > a);
    }

    #[test]
    fn nearest_ignores_order() {
        let near = Point::new(30.0, 0.0);
        let near2 = Point::new(30.01, 0.0);
        let far = Point::new(35.0, 0.0);

        let a = neighbor_distance_sum(&[near, near2, far], 1, NeighborStrategy::Nearest);
        let b = neighbor_distance_sum(&[near, far, near2], 1, NeighborStrategy::Nearest);
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn strategies_agree_when_window_covers_everything() {
        let points = line(5);
        let a = neighbor_distance_sum(&points, 10, NeighborStrategy::IndexWindow);
        let b = neighbor_distance_sum(&points, 10, NeighborStrategy::Nearest);
        assert!((a - b).abs() < 1e-6);
    }

    #[test]
    fn single_point_has_no_pairs() {
        let points = line(1);
        assert_eq!(neighbor_distance_sum(&points, 10, NeighborStrategy::IndexWindow), 0.0);
        assert_eq!(neighbor_distance_sum(&points, 10, NeighborStrategy::Nearest), 0.0);
    }
}
