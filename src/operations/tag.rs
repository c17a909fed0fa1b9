use tracing::{debug, info};

use crate::error::ConfigError;
use crate::topology::GeomModel;

/// Default name of the visualization tag when no data name is known.
pub const DEFAULT_VIZ_TAG: &str = "data";

/// Copies every surface value into a visualization tag named after the data.
pub struct TagForViz {
    name: String,
}

impl TagForViz {
    /// Creates a new `TagForViz` operation; `data` names the tag.
    #[must_use]
    pub fn new(data: Option<&str>) -> Self {
        Self {
            name: data.unwrap_or(DEFAULT_VIZ_TAG).to_string(),
        }
    }

    /// Executes the tagging, returning the number of surfaces tagged.
    pub fn execute(&self, model: &mut GeomModel) -> usize {
        let mut count = 0;
        for surface in model.surfaces_mut() {
            surface.viz_value = Some(surface.value);
            count += 1;
        }
        model.viz_tag = Some(self.name.clone());
        info!("tagged {count} surfaces with {}", self.name);
        count
    }
}

/// Sets user-defined name/value tags on the whole geometry.
pub struct SetTags {
    tags: Vec<(String, f64)>,
}

impl SetTags {
    /// Pairs names with values.
    ///
    /// # Errors
    ///
    /// Returns an error if the two lists differ in length.
    pub fn new(names: Vec<String>, values: Vec<f64>) -> std::result::Result<Self, ConfigError> {
        if names.len() != values.len() {
            return Err(ConfigError::TagCountMismatch {
                names: names.len(),
                values: values.len(),
            });
        }
        Ok(Self {
            tags: names.into_iter().zip(values).collect(),
        })
    }

    /// Executes the tagging. A tag with an existing name is overwritten.
    pub fn execute(&self, model: &mut GeomModel) {
        for (name, value) in &self.tags {
            match model.user_tags.iter_mut().find(|(n, _)| n == name) {
                Some(slot) => slot.1 = *value,
                None => model.user_tags.push((name.clone(), *value)),
            }
            debug!("tag {name} = {value}");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::store::MeshStore;
    use crate::topology::Surface;

    #[test]
    fn viz_tag_mirrors_values() {
        let mut store = MeshStore::new();
        let mut model = GeomModel::new();
        let vol = store.create_set();
        let set = store.create_set();
        let mut surface = Surface::unmerged(set, vol);
        surface.value = 7.5;
        model.insert_surface(surface);

        assert_eq!(TagForViz::new(Some("temp")).execute(&mut model), 1);
        assert_eq!(model.surface(set).unwrap().viz_value, Some(7.5));
        assert_eq!(model.viz_tag.as_deref(), Some("temp"));

        TagForViz::new(None).execute(&mut model);
        assert_eq!(model.viz_tag.as_deref(), Some(DEFAULT_VIZ_TAG));
    }

    #[test]
    fn user_tags_overwrite_by_name() {
        let mut model = GeomModel::new();
        SetTags::new(vec!["a".into(), "b".into()], vec![1.0, 2.0])
            .unwrap()
            .execute(&mut model);
        SetTags::new(vec!["a".into()], vec![3.0])
            .unwrap()
            .execute(&mut model);
        assert_eq!(model.user_tags, vec![("a".into(), 3.0), ("b".into(), 2.0)]);
    }

    #[test]
    fn mismatched_tag_lists_are_rejected() {
        let err = SetTags::new(vec!["a".into()], Vec::new()).err().unwrap();
        assert!(matches!(err, ConfigError::TagCountMismatch { names: 1, values: 0 }));
    }
}
