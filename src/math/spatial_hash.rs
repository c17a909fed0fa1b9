use std::cmp::Ordering;
use std::collections::HashMap;

use super::Point3;

type Cell = (i64, i64, i64);

/// Uniform grid over a point set for tolerance-radius nearest lookups.
///
/// Cells are twice the tolerance wide, so every point within tolerance of a
/// query lies in the query's cell or one of its 26 neighbours.
#[derive(Debug, Clone)]
pub struct SpatialHash<K> {
    tolerance: f64,
    cell_size: f64,
    cells: HashMap<Cell, Vec<(K, Point3)>>,
}

impl<K: Copy + Ord> SpatialHash<K> {
    /// Creates an empty hash for lookups within `tolerance`.
    ///
    /// A zero tolerance is allowed and matches identical coordinates only.
    #[must_use]
    pub fn new(tolerance: f64) -> Self {
        let cell_size = if tolerance > 0.0 { tolerance * 2.0 } else { 1.0 };
        Self {
            tolerance,
            cell_size,
            cells: HashMap::new(),
        }
    }

    /// Builds a hash from `(key, point)` pairs.
    pub fn from_points(tolerance: f64, points: impl IntoIterator<Item = (K, Point3)>) -> Self {
        let mut hash = Self::new(tolerance);
        for (key, point) in points {
            hash.insert(key, point);
        }
        hash
    }

    /// Adds a point.
    pub fn insert(&mut self, key: K, point: Point3) {
        let cell = self.cell_of(&point);
        self.cells.entry(cell).or_default().push((key, point));
    }

    /// Returns the number of stored points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    /// Returns `true` if no points are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Finds the stored point nearest to `point` with distance `<= tolerance`.
    ///
    /// Equal distances resolve to the smallest key. Returns the key and the
    /// distance.
    #[must_use]
    pub fn nearest_within(&self, point: &Point3) -> Option<(K, f64)> {
        let (cx, cy, cz) = self.cell_of(point);
        let mut best: Option<(K, f64)> = None;

        for dx in -1..=1_i64 {
            for dy in -1..=1_i64 {
                for dz in -1..=1_i64 {
                    let cell = (
                        cx.saturating_add(dx),
                        cy.saturating_add(dy),
                        cz.saturating_add(dz),
                    );
                    let Some(bucket) = self.cells.get(&cell) else {
                        continue;
                    };
                    for &(key, candidate) in bucket {
                        let dist = (candidate - *point).norm();
                        if dist > self.tolerance {
                            continue;
                        }
                        let better = match best {
                            None => true,
                            Some((best_key, best_dist)) => {
                                dist.total_cmp(&best_dist).then(key.cmp(&best_key))
                                    == Ordering::Less
                            }
                        };
                        if better {
                            best = Some((key, dist));
                        }
                    }
                }
            }
        }

        best
    }

    #[allow(clippy::cast_possible_truncation)]
    fn cell_of(&self, p: &Point3) -> Cell {
        (
            (p.x / self.cell_size).floor() as i64,
            (p.y / self.cell_size).floor() as i64,
            (p.z / self.cell_size).floor() as i64,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn exact_match_with_zero_tolerance() {
        let hash = SpatialHash::from_points(0.0, [(1_u32, p(1.0, 2.0, 3.0))]);
        assert_eq!(hash.nearest_within(&p(1.0, 2.0, 3.0)).unwrap().0, 1);
        assert!(hash.nearest_within(&p(1.0, 2.0, 3.000_001)).is_none());
    }

    #[test]
    fn picks_nearest_not_first() {
        let hash = SpatialHash::from_points(
            0.5,
            [(1_u32, p(0.4, 0.0, 0.0)), (2, p(0.1, 0.0, 0.0)), (3, p(-0.3, 0.0, 0.0))],
        );
        let (key, dist) = hash.nearest_within(&p(0.0, 0.0, 0.0)).unwrap();
        assert_eq!(key, 2);
        approx::assert_relative_eq!(dist, 0.1);
    }

    #[test]
    fn equal_distance_prefers_smallest_key() {
        let hash = SpatialHash::from_points(1.0, [(7_u32, p(0.5, 0.0, 0.0)), (3, p(-0.5, 0.0, 0.0))]);
        assert_eq!(hash.nearest_within(&p(0.0, 0.0, 0.0)).unwrap().0, 3);
    }

    #[test]
    fn distance_equal_to_tolerance_matches() {
        let hash = SpatialHash::from_points(0.25, [(1_u32, p(0.25, 0.0, 0.0))]);
        assert!(hash.nearest_within(&p(0.0, 0.0, 0.0)).is_some());
        assert!(hash.nearest_within(&p(-0.001, 0.0, 0.0)).is_none());
    }

    #[test]
    fn neighbours_across_cell_boundary() {
        // 0.999 and 1.001 fall into different cells for tolerance 0.5
        let hash = SpatialHash::from_points(0.5, [(1_u32, p(0.999, 0.999, 0.999))]);
        assert!(hash.nearest_within(&p(1.001, 1.001, 1.001)).is_some());
    }

    #[test]
    fn len_and_empty() {
        let mut hash: SpatialHash<u32> = SpatialHash::new(1e-5);
        assert!(hash.is_empty());
        hash.insert(0, p(0.0, 0.0, 0.0));
        hash.insert(1, p(0.0, 0.0, 0.0));
        assert_eq!(hash.len(), 2);
    }

    fn arb_point() -> impl Strategy<Value = Point3> {
        prop::array::uniform3(-10.0..10.0f64).prop_map(|[x, y, z]| p(x, y, z))
    }

    proptest! {
        #[test]
        fn match_iff_within_tolerance(a in arb_point(), b in arb_point(), tol in 0.0..20.0f64) {
            let hash = SpatialHash::from_points(tol, [(0_u32, a)]);
            let found = hash.nearest_within(&b).is_some();
            prop_assert_eq!(found, (a - b).norm() <= tol);
        }

        #[test]
        fn raising_tolerance_only_adds_matches(
            stored in prop::collection::vec(arb_point(), 1..20),
            queries in prop::collection::vec(arb_point(), 1..20),
            tol in 0.0..5.0f64,
            extra in 0.0..5.0f64,
        ) {
            let indexed = || stored.iter().copied().enumerate();
            let tight = SpatialHash::from_points(tol, indexed());
            let loose = SpatialHash::from_points(tol + extra, indexed());
            for q in &queries {
                if tight.nearest_within(q).is_some() {
                    prop_assert!(loose.nearest_within(q).is_some());
                }
            }
        }
    }
}
