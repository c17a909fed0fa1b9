use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, info};

use crate::error::{ConfigError, Result, TopologyError};
use crate::math::{Point3, SpatialHash};
use crate::store::{MeshSetId, MeshStore, TriangleId, VertexId};
use crate::topology::{GeomModel, Sense, Surface};

/// Merges the coincident surface patches of adjacent isovolumes.
///
/// For each pair of neighbouring bands, every unmerged shell of the lower
/// band is compared with every unmerged shell of the upper band. Triangles
/// whose vertices all match within `merge_tol` form a shared surface that is
/// kept once (the lower band's copy), registered on both volumes, and valued
/// at `boundary_level * norm`. The upper band's duplicates are deleted and
/// its remaining triangles are stitched onto the kept vertices.
pub struct ImprintMerge {
    norm: f64,
    merge_tol: f64,
}

/// Result of merging one pair of shells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Imprint {
    shared: MeshSetId,
    lower_consumed: bool,
}

impl ImprintMerge {
    /// Creates a new `ImprintMerge` operation.
    #[must_use]
    pub fn new(norm: f64, merge_tol: f64) -> Self {
        Self { norm, merge_tol }
    }

    /// Executes the merge, returning the number of shared surfaces created.
    ///
    /// # Errors
    ///
    /// Returns an error if `merge_tol` is negative or not finite, if `norm`
    /// is not finite, or if a referenced entity is missing from the store.
    pub fn execute(&self, store: &mut MeshStore, model: &mut GeomModel) -> Result<usize> {
        self.validate()?;

        let mut merged = 0;
        for i in 0..model.isovolumes.len().saturating_sub(1) {
            let (lower, upper) = (&model.isovolumes[i], &model.isovolumes[i + 1]);
            if lower.surfaces.is_empty() || upper.surfaces.is_empty() {
                debug!("isovolumes {i}/{}: no shells to compare", i + 1);
                continue;
            }
            let boundary = lower.bounds.upper.or(upper.bounds.lower).ok_or_else(|| {
                TopologyError::InvalidTopology(format!(
                    "isovolumes {i} and {} share no level",
                    i + 1
                ))
            })?;
            let count = self.compare_surfs(store, model, i, boundary)?;
            debug!("isovolumes {i}/{}: {count} shared surfaces at {boundary}", i + 1);
            merged += count;
        }

        for surface in model.surfaces_mut() {
            if !surface.sense.is_merged() {
                surface.value = 0.0;
            }
        }

        info!("merged {merged} shared surfaces");
        Ok(merged)
    }

    fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !self.merge_tol.is_finite() || self.merge_tol < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "merge_tol",
                value: self.merge_tol,
                reason: "must be a finite, non-negative distance",
            });
        }
        if !self.norm.is_finite() {
            return Err(ConfigError::InvalidParameter {
                name: "norm",
                value: self.norm,
                reason: "must be finite",
            });
        }
        Ok(())
    }

    /// Compares all unmerged shells of isovolume `i` with those of `i + 1`.
    fn compare_surfs(
        &self,
        store: &mut MeshStore,
        model: &mut GeomModel,
        i: usize,
        boundary: f64,
    ) -> Result<usize> {
        let unmerged = |model: &GeomModel, idx: usize| -> Vec<MeshSetId> {
            model.isovolumes[idx]
                .surfaces
                .iter()
                .copied()
                .filter(|&s| model.surface(s).is_ok_and(|r| !r.sense.is_merged()))
                .collect()
        };
        let lower_shells = unmerged(model, i);
        let upper_shells = unmerged(model, i + 1);

        let mut merged = 0;
        for &a in &lower_shells {
            for &b in &upper_shells {
                if store.set(b).is_err() {
                    continue;
                }
                let coords_a = list_coords(store, a)?;
                let coords_b = list_coords(store, b)?;
                let matches = get_matches(&coords_a, &coords_b, self.merge_tol);
                if matches.is_empty() {
                    continue;
                }
                let shared = get_surf_triangles(store, a, b, &matches)?;
                if shared.is_empty() {
                    continue;
                }

                let imprint = imprint(store, model, i, a, b, &shared, &matches)?;
                let record = model.surface_mut(imprint.shared)?;
                record.value = boundary * self.norm;
                merged += 1;
                debug!(
                    "shell pair: {} shared triangles, {} matched vertices",
                    shared.len(),
                    matches.len()
                );
                if imprint.lower_consumed {
                    break;
                }
            }
        }
        Ok(merged)
    }
}

/// Coordinates of every vertex of a set.
///
/// # Errors
///
/// Returns an error if the set or one of its vertices is missing.
pub fn list_coords(
    store: &MeshStore,
    set: MeshSetId,
) -> std::result::Result<BTreeMap<VertexId, Point3>, TopologyError> {
    store
        .set(set)?
        .vertices
        .iter()
        .map(|&v| Ok((v, store.point(v)?)))
        .collect()
}

/// Matches each `b` vertex to its nearest `a` vertex within `tol`.
///
/// Equal distances resolve to the smallest `a` key. Unmatched `b` vertices
/// are absent from the result.
pub fn get_matches<KA, KB>(
    a: &BTreeMap<KA, Point3>,
    b: &BTreeMap<KB, Point3>,
    tol: f64,
) -> BTreeMap<KB, KA>
where
    KA: Copy + Ord,
    KB: Copy + Ord,
{
    let hash = SpatialHash::from_points(tol, a.iter().map(|(&k, &p)| (k, p)));
    b.iter()
        .filter_map(|(&kb, p)| hash.nearest_within(p).map(|(ka, _)| (kb, ka)))
        .collect()
}

/// Pairs each triangle of `b` whose vertices all match with the triangle of
/// `a` spanning the matched vertices, as `(a, b)` triangle pairs.
///
/// # Errors
///
/// Returns an error if a set or triangle is missing.
fn get_surf_triangles(
    store: &MeshStore,
    a: MeshSetId,
    b: MeshSetId,
    matches: &BTreeMap<VertexId, VertexId>,
) -> std::result::Result<Vec<(TriangleId, TriangleId)>, TopologyError> {
    let mut by_vertices = HashMap::new();
    for &tri in &store.set(a)?.triangles {
        by_vertices.insert(store.triangle(tri)?.sorted_vertices(), tri);
    }

    let mut used = BTreeSet::new();
    let mut pairs = Vec::new();
    for &tri in &store.set(b)?.triangles {
        let verts = store.triangle(tri)?.vertices;
        let (Some(&x), Some(&y), Some(&z)) =
            (matches.get(&verts[0]), matches.get(&verts[1]), matches.get(&verts[2]))
        else {
            continue;
        };
        let mut key = [x, y, z];
        key.sort_unstable();
        if let Some(&ta) = by_vertices.get(&key) {
            if used.insert(ta) {
                pairs.push((ta, tri));
            }
        }
    }
    Ok(pairs)
}

/// Splits the shared patch out of `a`, removes it from `b` and stitches `b`
/// onto `a`'s vertices.
fn imprint(
    store: &mut MeshStore,
    model: &mut GeomModel,
    i: usize,
    a: MeshSetId,
    b: MeshSetId,
    shared: &[(TriangleId, TriangleId)],
    matches: &BTreeMap<VertexId, VertexId>,
) -> Result<Imprint> {
    let lower_vol = model.isovolumes[i].set;
    let upper_vol = model.isovolumes[i + 1].set;
    let tris_a: BTreeSet<TriangleId> = shared.iter().map(|&(ta, _)| ta).collect();
    let tris_b: BTreeSet<TriangleId> = shared.iter().map(|&(_, tb)| tb).collect();
    let lower_consumed = store.set(a)?.triangles.len() == tris_a.len();
    let upper_consumed = store.set(b)?.triangles.len() == tris_b.len();

    let shared_set = if lower_consumed {
        a
    } else {
        let set = store.create_set();
        store.set_mut(a)?.triangles.retain(|t| !tris_a.contains(t));
        store.refresh_set_vertices(a)?;
        store.add_triangles_to_set(set, tris_a.iter().copied())?;
        model.isovolumes[i].surfaces.push(set);
        set
    };

    store.set_mut(b)?.triangles.retain(|t| !tris_b.contains(t));
    for &tri in &tris_b {
        store.remove_triangle(tri);
    }

    let kept = store.set(shared_set)?.vertices.clone();
    let remaining: Vec<TriangleId> = store.set(b)?.triangles.iter().copied().collect();
    for tri in remaining {
        for v in &mut store.triangle_mut(tri)?.vertices {
            if let Some(&target) = matches.get(&*v) {
                if kept.contains(&target) {
                    *v = target;
                }
            }
        }
    }

    let old_vertices = store.set(b)?.vertices.clone();
    store.refresh_set_vertices(b)?;
    let still_used = &store.set(b)?.vertices;
    let orphaned: Vec<VertexId> = old_vertices
        .into_iter()
        .filter(|v| !still_used.contains(v) && !kept.contains(v))
        .collect();
    for v in orphaned {
        store.remove_vertex(v);
    }

    let upper_surfaces = &mut model.isovolumes[i + 1].surfaces;
    if upper_consumed {
        if let Some(slot) = upper_surfaces.iter_mut().find(|s| **s == b) {
            *slot = shared_set;
        }
        store.remove_set(b)?;
        model.remove_surface(b);
    } else {
        upper_surfaces.push(shared_set);
    }

    let sense = Sense::merged(lower_vol, upper_vol);
    if lower_consumed {
        model.surface_mut(a)?.sense = sense;
    } else {
        let mut surface = Surface::unmerged(shared_set, lower_vol);
        surface.sense = sense;
        model.insert_surface(surface);
    }

    Ok(Imprint {
        shared: shared_set,
        lower_consumed,
    })
}
