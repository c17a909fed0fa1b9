use std::collections::HashMap;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::store::{MeshStore, TriangleId, VertexId};
use crate::topology::{GeomModel, Surface};

/// Splits every isovolume's mesh into connected surface shells.
///
/// Each shell becomes a new entity set registered as an unmerged
/// [`Surface`] of its isovolume. The volume set itself is emptied; from then
/// on it only groups its surfaces.
pub struct SeparateIsovolumes;

impl SeparateIsovolumes {
    /// Creates a new `SeparateIsovolumes` operation.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Executes the separation, returning the total number of shells.
    ///
    /// Isovolumes that already have surfaces are left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if an isovolume set or one of its triangles is
    /// missing from the store.
    pub fn execute(&self, store: &mut MeshStore, model: &mut GeomModel) -> Result<usize> {
        let mut inputs = Vec::with_capacity(model.isovolumes.len());
        for iv in &model.isovolumes {
            if !iv.surfaces.is_empty() {
                warn!("isovolume {} already separated; skipping", iv.index);
                inputs.push(Vec::new());
                continue;
            }
            let set = store.set(iv.set)?;
            let mut tris = Vec::with_capacity(set.triangles.len());
            for &tri in &set.triangles {
                tris.push((tri, store.triangle(tri)?.vertices));
            }
            inputs.push(tris);
        }

        // Component labeling only reads; volumes are independent.
        let components: Vec<Vec<Vec<TriangleId>>> = inputs
            .par_iter()
            .map(|tris| connected_components(tris))
            .collect();

        let mut total = 0;
        let mut new_surfaces = Vec::new();
        for (iv, shells) in model.isovolumes.iter_mut().zip(components) {
            if shells.is_empty() {
                continue;
            }
            for shell in shells {
                let set = store.create_set();
                store.add_triangles_to_set(set, shell)?;
                iv.surfaces.push(set);
                new_surfaces.push(Surface::unmerged(set, iv.set));
            }
            store.set_mut(iv.set)?.clear_entities();
            debug!("isovolume {}: {} shells", iv.index, iv.surfaces.len());
            total += iv.surfaces.len();
        }

        for surface in new_surfaces {
            model.insert_surface(surface);
        }

        info!("separated {} isovolumes into {total} shells", model.isovolumes.len());
        Ok(total)
    }
}

impl Default for SeparateIsovolumes {
    fn default() -> Self {
        Self::new()
    }
}

/// Groups triangles into vertex-connected components.
///
/// Components are ordered by their first triangle in the input; triangles
/// keep their input order within a component.
pub fn connected_components(triangles: &[(TriangleId, [VertexId; 3])]) -> Vec<Vec<TriangleId>> {
    let mut index: HashMap<VertexId, usize> = HashMap::new();
    let mut sets = DisjointSet::default();
    for (_, verts) in triangles {
        let ids = verts.map(|v| *index.entry(v).or_insert_with(|| sets.make()));
        sets.union(ids[0], ids[1]);
        sets.union(ids[1], ids[2]);
    }

    let mut slot_of_root: HashMap<usize, usize> = HashMap::new();
    let mut components: Vec<Vec<TriangleId>> = Vec::new();
    for (tri, verts) in triangles {
        let root = index.get(&verts[0]).map_or(0, |&i| sets.find(i));
        let slot = *slot_of_root.entry(root).or_insert_with(|| {
            components.push(Vec::new());
            components.len() - 1
        });
        components[slot].push(*tri);
    }
    components
}

#[derive(Default)]
struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn make(&mut self) -> usize {
        self.parent.push(self.parent.len());
        self.rank.push(0);
        self.parent.len() - 1
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] = self.rank[ra].saturating_add(1);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::levels::Levels;
    use crate::operations::read_database::ReadDatabase;
    use crate::test_support::{database, unit_box};

    fn load(bands: &[Vec<[[f64; 3]; 3]>], levels: &[f64]) -> (MeshStore, GeomModel) {
        let db = database(bands);
        let levels = Levels::new(levels.iter().copied()).unwrap();
        let mut store = MeshStore::new();
        let mut model = GeomModel::new();
        ReadDatabase::new(db.path(), Some(&levels))
            .execute(&mut store, &mut model)
            .unwrap();
        (store, model)
    }

    #[test]
    fn single_box_is_one_shell() {
        let (mut store, mut model) = load(&[unit_box([0.0; 3]), Vec::new()], &[5.0]);
        // empty STL files parse to an empty mesh
        let shells = SeparateIsovolumes::new()
            .execute(&mut store, &mut model)
            .unwrap();
        assert_eq!(shells, 1);

        let iv = &model.isovolumes[0];
        assert_eq!(iv.surfaces.len(), 1);
        let surf = store.set(iv.surfaces[0]).unwrap();
        assert_eq!(surf.vertices.len(), 8);
        assert_eq!(surf.triangles.len(), 12);
        assert!(store.set(iv.set).unwrap().is_empty());
        assert!(model.isovolumes[1].surfaces.is_empty());

        let record = model.surface(iv.surfaces[0]).unwrap();
        assert_eq!(record.sense.forward, iv.set);
        assert!(!record.sense.is_merged());
    }

    #[test]
    fn disjoint_boxes_are_two_shells() {
        let mut two = unit_box([0.0; 3]);
        two.extend(unit_box([3.0, 0.0, 0.0]));
        let (mut store, mut model) = load(&[two, unit_box([5.0, 0.0, 0.0])], &[5.0]);
        let shells = SeparateIsovolumes::new()
            .execute(&mut store, &mut model)
            .unwrap();
        assert_eq!(shells, 3);
        let iv = &model.isovolumes[0];
        assert_eq!(iv.surfaces.len(), 2);
        for &s in &iv.surfaces {
            assert_eq!(store.set(s).unwrap().vertices.len(), 8);
            assert_eq!(store.set(s).unwrap().triangles.len(), 12);
        }
        let a = store.set(iv.surfaces[0]).unwrap();
        let b = store.set(iv.surfaces[1]).unwrap();
        assert_eq!(a.vertices.intersection(&b.vertices).count(), 0);
        assert_eq!(a.triangles.intersection(&b.triangles).count(), 0);
        assert_eq!(store.vertex_count(), 24);
        assert!(store.set(iv.set).unwrap().is_empty());
    }

    #[test]
    fn second_run_keeps_existing_shells() {
        let (mut store, mut model) =
            load(&[unit_box([0.0; 3]), unit_box([2.0, 0.0, 0.0])], &[5.0]);
        SeparateIsovolumes::new().execute(&mut store, &mut model).unwrap();
        let before = model.isovolumes[0].surfaces.clone();
        SeparateIsovolumes::new().execute(&mut store, &mut model).unwrap();
        assert_eq!(model.isovolumes[0].surfaces, before);
    }

    #[test]
    fn components_follow_input_order() {
        let mut store = MeshStore::new();
        let v: Vec<_> = (0..6)
            .map(|i| store.add_vertex(crate::math::Point3::new(f64::from(i), 0.0, 0.0)))
            .collect();
        let t0 = store.add_triangle([v[3], v[4], v[5]]);
        let t1 = store.add_triangle([v[0], v[1], v[2]]);
        let t2 = store.add_triangle([v[2], v[1], v[0]]);
        let input = [
            (t0, [v[3], v[4], v[5]]),
            (t1, [v[0], v[1], v[2]]),
            (t2, [v[2], v[1], v[0]]),
        ];
        assert_eq!(connected_components(&input), vec![vec![t0], vec![t1, t2]]);
    }
}
