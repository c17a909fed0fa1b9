pub mod curve;
pub mod surface;
pub mod tags;
pub mod volume;

pub use curve::Curve;
pub use surface::{Sense, Surface};
pub use tags::{GeomDimension, GeomTags};
pub use volume::Isovolume;

use std::collections::{BTreeMap, BTreeSet};

use crate::error::TopologyError;
use crate::store::MeshSetId;

/// The volume → surface → curve hierarchy built on top of a
/// [`MeshStore`](crate::store::MeshStore).
///
/// Records here carry the tags; the mesh entities and parent/child links
/// live in the store.
#[derive(Debug, Default)]
pub struct GeomModel {
    /// Isovolumes in band order.
    pub isovolumes: Vec<Isovolume>,
    surfaces: BTreeMap<MeshSetId, Surface>,
    curves: BTreeMap<MeshSetId, Curve>,
    /// Name of the visualization data tag, when viz tagging is on.
    pub viz_tag: Option<String>,
    /// User-defined name/value tags on the whole geometry.
    pub user_tags: Vec<(String, f64)>,
}

impl GeomModel {
    /// Creates an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops all volumes, surfaces and curves. Tags on the whole geometry
    /// are kept.
    pub fn reset_hierarchy(&mut self) {
        self.isovolumes.clear();
        self.surfaces.clear();
        self.curves.clear();
    }

    // --- Surface records ---

    /// Registers a surface record, replacing any record for the same set.
    pub fn insert_surface(&mut self, surface: Surface) {
        self.surfaces.insert(surface.set, surface);
    }

    /// Removes a surface record.
    pub fn remove_surface(&mut self, set: MeshSetId) -> Option<Surface> {
        self.surfaces.remove(&set)
    }

    /// Returns a surface record, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if no surface is registered for the set.
    pub fn surface(&self, set: MeshSetId) -> Result<&Surface, TopologyError> {
        self.surfaces
            .get(&set)
            .ok_or_else(|| TopologyError::EntityNotFound("surface".into()))
    }

    /// Returns a mutable surface record, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if no surface is registered for the set.
    pub fn surface_mut(&mut self, set: MeshSetId) -> Result<&mut Surface, TopologyError> {
        self.surfaces
            .get_mut(&set)
            .ok_or_else(|| TopologyError::EntityNotFound("surface".into()))
    }

    /// All surface records, in set id order.
    pub fn surfaces(&self) -> impl Iterator<Item = &Surface> {
        self.surfaces.values()
    }

    /// Mutable access to all surface records.
    pub fn surfaces_mut(&mut self) -> impl Iterator<Item = &mut Surface> {
        self.surfaces.values_mut()
    }

    /// Surface sets in discovery order: by volume, then by each volume's list.
    ///
    /// A shared surface appears once, at its first owner.
    #[must_use]
    pub fn surface_order(&self) -> Vec<MeshSetId> {
        let mut seen = BTreeSet::new();
        self.isovolumes
            .iter()
            .flat_map(|iv| iv.surfaces.iter().copied())
            .filter(|s| seen.insert(*s))
            .collect()
    }

    // --- Curve records ---

    /// Registers a curve record.
    pub fn insert_curve(&mut self, curve: Curve) {
        self.curves.insert(curve.set, curve);
    }

    /// Removes a curve record.
    pub fn remove_curve(&mut self, set: MeshSetId) -> Option<Curve> {
        self.curves.remove(&set)
    }

    /// Returns a curve record, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if no curve is registered for the set.
    pub fn curve(&self, set: MeshSetId) -> Result<&Curve, TopologyError> {
        self.curves
            .get(&set)
            .ok_or_else(|| TopologyError::EntityNotFound("curve".into()))
    }

    /// Returns a mutable curve record, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if no curve is registered for the set.
    pub fn curve_mut(&mut self, set: MeshSetId) -> Result<&mut Curve, TopologyError> {
        self.curves
            .get_mut(&set)
            .ok_or_else(|| TopologyError::EntityNotFound("curve".into()))
    }

    /// All curve records, in set id order.
    pub fn curves(&self) -> impl Iterator<Item = &Curve> {
        self.curves.values()
    }

    /// Number of registered curves.
    #[must_use]
    pub fn curve_count(&self) -> usize {
        self.curves.len()
    }

    /// Returns `true` once the family build has tagged every entity.
    #[must_use]
    pub fn is_family_built(&self) -> bool {
        !self.isovolumes.is_empty()
            && self.isovolumes.iter().all(|iv| iv.tags.is_some())
            && self.surfaces.values().all(|s| s.tags.is_some())
            && self.curves.values().all(|c| c.tags.is_some())
    }
}
