use std::collections::{BTreeMap, HashMap, VecDeque};

use tracing::{debug, info};

use crate::error::{Result, TopologyError};
use crate::store::{MeshSetId, MeshStore, VertexId};
use crate::topology::{Curve, GeomDimension, GeomModel, GeomTags};

type EdgeKey = (VertexId, VertexId);

/// Counts produced by a family build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FamilySummary {
    pub volumes: usize,
    pub surfaces: usize,
    pub curves: usize,
}

/// Builds the volume → surface → curve hierarchy and tags every entity.
///
/// Curves are the boundary polylines of the surfaces: edges used by exactly
/// one triangle of a surface, grouped by the set of surfaces sharing them and
/// split into connected runs. A closed surface gets a single curve without
/// edges. Rebuilding reuses existing curves, so running twice is a no-op.
pub struct MakeFamily;

#[derive(Default)]
struct IdCounter {
    volume: u32,
    surface: u32,
    curve: u32,
}

impl IdCounter {
    fn next(&mut self, dimension: GeomDimension) -> GeomTags {
        let slot = match dimension {
            GeomDimension::Volume => &mut self.volume,
            GeomDimension::Surface => &mut self.surface,
            GeomDimension::Curve => &mut self.curve,
        };
        *slot = slot.saturating_add(1);
        GeomTags::new(dimension, *slot)
    }
}

/// Edges shared by one group of surfaces.
struct EdgeGroup {
    surfaces: Vec<MeshSetId>,
    edges: Vec<EdgeKey>,
}

impl MakeFamily {
    /// Creates a new `MakeFamily` operation.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Executes the build.
    ///
    /// # Errors
    ///
    /// Returns an error if no isovolumes are loaded, if an entity is missing
    /// from the store, or if the finished hierarchy is inconsistent (a surface
    /// without one or two parent volumes or without curves, or a curve
    /// without parents).
    pub fn execute(&self, store: &mut MeshStore, model: &mut GeomModel) -> Result<FamilySummary> {
        if model.isovolumes.is_empty() {
            return Err(TopologyError::InvalidTopology("no isovolumes loaded".into()).into());
        }
        let order = model.surface_order();

        let groups = group_boundary_edges(store, &order)?;
        let mut curve_order = Vec::new();
        for group in groups {
            for edges in polylines(&group.edges) {
                curve_order.push(find_or_create_curve(store, model, edges, &group.surfaces)?);
            }
        }
        remove_stale_curves(store, model, &curve_order)?;

        for surface in model.surfaces_mut() {
            surface.curves.clear();
        }
        for &c in &curve_order {
            let parents = model.curve(c)?.surfaces.clone();
            for s in parents {
                let surface = model.surface_mut(s)?;
                if !surface.curves.contains(&c) {
                    surface.curves.push(c);
                }
            }
        }

        let mut ids = IdCounter::default();
        for iv in &mut model.isovolumes {
            iv.tags = Some(ids.next(GeomDimension::Volume));
        }
        for &s in &order {
            model.surface_mut(s)?.tags = Some(ids.next(GeomDimension::Surface));
        }
        for &c in &curve_order {
            model.curve_mut(c)?.tags = Some(ids.next(GeomDimension::Curve));
        }

        for iv in &model.isovolumes {
            for &s in &iv.surfaces {
                store.add_parent_child(iv.set, s)?;
            }
        }
        for &s in &order {
            for &c in &model.surface(s)?.curves {
                store.add_parent_child(s, c)?;
            }
        }

        check_family(store, model)?;

        let summary = FamilySummary {
            volumes: model.isovolumes.len(),
            surfaces: order.len(),
            curves: curve_order.len(),
        };
        info!(
            "family built: {} volumes, {} surfaces, {} curves",
            summary.volumes, summary.surfaces, summary.curves
        );
        Ok(summary)
    }
}

impl Default for MakeFamily {
    fn default() -> Self {
        Self::new()
    }
}

/// Edges used by exactly one triangle of the set, sorted.
///
/// # Errors
///
/// Returns an error if the set or one of its triangles is missing.
pub fn boundary_edges(
    store: &MeshStore,
    set: MeshSetId,
) -> std::result::Result<Vec<EdgeKey>, TopologyError> {
    let mut uses: BTreeMap<EdgeKey, usize> = BTreeMap::new();
    for &tri in &store.set(set)?.triangles {
        for key in store.triangle(tri)?.edge_keys() {
            *uses.entry(key).or_default() += 1;
        }
    }
    Ok(uses
        .into_iter()
        .filter_map(|(key, n)| (n == 1).then_some(key))
        .collect())
}

/// Groups boundary edges by the surfaces sharing them, in discovery order.
///
/// Closed surfaces yield an edge-less group of their own.
fn group_boundary_edges(
    store: &MeshStore,
    order: &[MeshSetId],
) -> std::result::Result<Vec<EdgeGroup>, TopologyError> {
    let mut per_surface = Vec::with_capacity(order.len());
    let mut owners: BTreeMap<EdgeKey, Vec<MeshSetId>> = BTreeMap::new();
    for &s in order {
        let edges = boundary_edges(store, s)?;
        for &e in &edges {
            owners.entry(e).or_default().push(s);
        }
        per_surface.push((s, edges));
    }

    let mut groups: Vec<EdgeGroup> = Vec::new();
    let mut group_of: HashMap<Vec<MeshSetId>, usize> = HashMap::new();
    for (s, edges) in per_surface {
        if edges.is_empty() {
            groups.push(EdgeGroup {
                surfaces: vec![s],
                edges: Vec::new(),
            });
            continue;
        }
        for e in edges {
            let Some(sharing) = owners.get(&e) else {
                continue;
            };
            // the first owner in discovery order claims the edge
            if sharing.first() != Some(&s) {
                continue;
            }
            let mut key = sharing.clone();
            key.sort_unstable();
            let idx = *group_of.entry(key.clone()).or_insert_with(|| {
                groups.push(EdgeGroup {
                    surfaces: key,
                    edges: Vec::new(),
                });
                groups.len() - 1
            });
            groups[idx].edges.push(e);
        }
    }
    Ok(groups)
}

/// Splits edges into vertex-connected runs, each sorted.
///
/// An empty input yields one empty run.
fn polylines(edges: &[EdgeKey]) -> Vec<Vec<EdgeKey>> {
    if edges.is_empty() {
        return vec![Vec::new()];
    }
    let mut at_vertex: HashMap<VertexId, Vec<usize>> = HashMap::new();
    for (i, &(a, b)) in edges.iter().enumerate() {
        at_vertex.entry(a).or_default().push(i);
        at_vertex.entry(b).or_default().push(i);
    }

    let mut visited = vec![false; edges.len()];
    let mut runs = Vec::new();
    for start in 0..edges.len() {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        let mut run = Vec::new();
        let mut queue = VecDeque::from([start]);
        while let Some(i) = queue.pop_front() {
            let (a, b) = edges[i];
            run.push(edges[i]);
            for v in [a, b] {
                for &j in at_vertex.get(&v).into_iter().flatten() {
                    if !visited[j] {
                        visited[j] = true;
                        queue.push_back(j);
                    }
                }
            }
        }
        run.sort_unstable();
        runs.push(run);
    }
    runs
}

fn find_or_create_curve(
    store: &mut MeshStore,
    model: &mut GeomModel,
    edges: Vec<EdgeKey>,
    surfaces: &[MeshSetId],
) -> std::result::Result<MeshSetId, TopologyError> {
    if let Some(curve) = model.curves().find(|c| c.matches(&edges, surfaces)) {
        return Ok(curve.set);
    }
    let set = store.create_set();
    for &(a, b) in &edges {
        let edge = store.add_edge(a, b);
        store.add_edge_to_set(set, edge)?;
    }
    debug!(
        "new curve: {} edges shared by {} surfaces",
        edges.len(),
        surfaces.len()
    );
    model.insert_curve(Curve {
        set,
        edges,
        surfaces: surfaces.to_vec(),
        tags: None,
    });
    Ok(set)
}

fn remove_stale_curves(
    store: &mut MeshStore,
    model: &mut GeomModel,
    keep: &[MeshSetId],
) -> std::result::Result<(), TopologyError> {
    let stale: Vec<MeshSetId> = model
        .curves()
        .map(|c| c.set)
        .filter(|c| !keep.contains(c))
        .collect();
    for c in stale {
        debug!("dropping stale curve");
        model.remove_curve(c);
        if store.set(c).is_ok() {
            store.remove_set(c)?;
        }
    }
    Ok(())
}

/// Verifies the parent/child structure of a built family.
fn check_family(store: &MeshStore, model: &GeomModel) -> std::result::Result<(), TopologyError> {
    for surface in model.surfaces() {
        let parents = store.parents(surface.set)?.len();
        if !(1..=2).contains(&parents) {
            return Err(TopologyError::InvalidTopology(format!(
                "surface has {parents} parent volumes, expected 1 or 2"
            )));
        }
        if store.children(surface.set)?.is_empty() {
            return Err(TopologyError::InvalidTopology(
                "surface has no bounding curve".into(),
            ));
        }
    }
    for curve in model.curves() {
        if store.parents(curve.set)?.is_empty() {
            return Err(TopologyError::InvalidTopology(
                "curve has no parent surface".into(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::levels::Levels;
    use crate::operations::imprint_merge::ImprintMerge;
    use crate::operations::read_database::ReadDatabase;
    use crate::operations::separate::SeparateIsovolumes;
    use crate::test_support::{database, unit_box};
    use crate::topology::Surface;

    fn merged(bands: &[Vec<[[f64; 3]; 3]>], levels: &[f64]) -> (MeshStore, GeomModel) {
        let db = database(bands);
        let levels = Levels::new(levels.iter().copied()).unwrap();
        let mut store = MeshStore::new();
        let mut model = GeomModel::new();
        ReadDatabase::new(db.path(), Some(&levels))
            .execute(&mut store, &mut model)
            .unwrap();
        SeparateIsovolumes::new()
            .execute(&mut store, &mut model)
            .unwrap();
        ImprintMerge::new(1.0, 1e-5)
            .execute(&mut store, &mut model)
            .unwrap();
        (store, model)
    }

    fn two_boxes() -> (MeshStore, GeomModel) {
        merged(&[unit_box([0.0; 3]), unit_box([1.0, 0.0, 0.0])], &[7.5])
    }

    #[test]
    fn two_boxes_family() {
        let (mut store, mut model) = two_boxes();
        let summary = MakeFamily::new().execute(&mut store, &mut model).unwrap();
        assert_eq!(
            summary,
            FamilySummary {
                volumes: 2,
                surfaces: 3,
                curves: 1
            }
        );

        let vol_ids: Vec<_> = model
            .isovolumes
            .iter()
            .map(|iv| iv.tags.unwrap())
            .collect();
        assert_eq!(
            vol_ids,
            vec![
                GeomTags::new(GeomDimension::Volume, 1),
                GeomTags::new(GeomDimension::Volume, 2)
            ]
        );

        let order = model.surface_order();
        for (i, &s) in order.iter().enumerate() {
            let surface = model.surface(s).unwrap();
            assert_eq!(
                surface.tags,
                Some(GeomTags::new(GeomDimension::Surface, u32::try_from(i + 1).unwrap()))
            );
            assert_eq!(surface.curves.len(), 1);
            let expected_parents = if surface.sense.is_merged() { 2 } else { 1 };
            assert_eq!(store.parents(s).unwrap().len(), expected_parents);
        }

        let curve = model.curves().next().unwrap();
        assert_eq!(curve.tags, Some(GeomTags::new(GeomDimension::Curve, 1)));
        assert_eq!(curve.edges.len(), 4);
        assert_eq!(store.parents(curve.set).unwrap().len(), 3);
        assert_eq!(store.set(curve.set).unwrap().edges.len(), 4);
        assert!(model.is_family_built());
    }

    #[test]
    fn closed_surface_gets_edgeless_curve() {
        let (mut store, mut model) = merged(&[unit_box([0.0; 3]), Vec::new()], &[1.0]);
        let summary = MakeFamily::new().execute(&mut store, &mut model).unwrap();
        assert_eq!(summary.surfaces, 1);
        assert_eq!(summary.curves, 1);
        let curve = model.curves().next().unwrap();
        assert!(curve.edges.is_empty());
        assert_eq!(store.parents(curve.set).unwrap().len(), 1);
    }

    #[test]
    fn rebuilding_is_idempotent() {
        let (mut store, mut model) = two_boxes();
        let first = MakeFamily::new().execute(&mut store, &mut model).unwrap();
        let sets = store.set_count();
        let curve_sets: Vec<_> = model.curves().map(|c| c.set).collect();

        let second = MakeFamily::new().execute(&mut store, &mut model).unwrap();
        assert_eq!(first, second);
        assert_eq!(store.set_count(), sets);
        assert_eq!(model.curves().map(|c| c.set).collect::<Vec<_>>(), curve_sets);
        let curve = model.curves().next().unwrap();
        assert_eq!(store.parents(curve.set).unwrap().len(), 3);
        assert_eq!(curve.tags, Some(GeomTags::new(GeomDimension::Curve, 1)));
    }

    #[test]
    fn tube_between_two_shared_faces_has_two_curves() {
        let bands: Vec<_> = (0..3)
            .map(|i| unit_box([f64::from(i), 0.0, 0.0]))
            .collect();
        let (mut store, mut model) = merged(&bands, &[5.0, 10.0]);
        let summary = MakeFamily::new().execute(&mut store, &mut model).unwrap();
        assert_eq!(summary.surfaces, 5);
        assert_eq!(summary.curves, 2);
        let tube = model.isovolumes[1].surfaces[0];
        assert_eq!(model.surface(tube).unwrap().curves.len(), 2);
        for curve in model.curves() {
            assert_eq!(curve.surfaces.len(), 3);
        }
    }

    #[test]
    fn orphan_surface_is_invalid() {
        let (mut store, mut model) = two_boxes();
        let orphan = store.create_set();
        model.insert_surface(Surface::unmerged(orphan, model.isovolumes[0].set));
        let err = MakeFamily::new().execute(&mut store, &mut model).unwrap_err();
        assert!(err.to_string().contains("invalid topology"));
    }

    #[test]
    fn open_strip_boundary() {
        let mut store = MeshStore::new();
        let v: Vec<_> = (0..4)
            .map(|i| {
                let (x, y) = (f64::from(i % 2), f64::from(i / 2));
                store.add_vertex(crate::math::Point3::new(x, y, 0.0))
            })
            .collect();
        let t0 = store.add_triangle([v[0], v[1], v[3]]);
        let t1 = store.add_triangle([v[0], v[3], v[2]]);
        let set = store.create_set();
        store.add_triangles_to_set(set, [t0, t1]).unwrap();
        let edges = boundary_edges(&store, set).unwrap();
        assert_eq!(edges.len(), 4);
        assert_eq!(polylines(&edges).len(), 1);
    }
}
