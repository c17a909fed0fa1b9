use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{ConfigError, Result};
use crate::levels::{LevelSource, Levels};
use crate::math::{DEFAULT_MERGE_TOL, DEFAULT_NORM};
use crate::operations::write_geometry::default_path;
use crate::operations::{
    FamilySummary, ImprintMerge, MakeFamily, ReadDatabase, SeparateIsovolumes, SetTags,
    TagForViz, UpstreamDb, WriteGeometry,
};
use crate::store::MeshStore;
use crate::topology::GeomModel;

/// Parameters for a full [`IsoGeometry::build`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildParams {
    /// Maximum distance for two vertices to be treated as the same point.
    pub merge_tol: f64,
    /// Multiplier applied to level values for merged surface values.
    pub norm: f64,
    /// Whether to copy surface values into a visualization tag.
    pub tag_for_viz: bool,
}

impl BuildParams {
    /// Creates build parameters with viz tagging off.
    #[must_use]
    pub fn new(merge_tol: f64, norm: f64) -> Self {
        Self {
            merge_tol,
            norm,
            tag_for_viz: false,
        }
    }

    /// Turns viz tagging on or off.
    #[must_use]
    pub fn with_viz(mut self, tag_for_viz: bool) -> Self {
        self.tag_for_viz = tag_for_viz;
        self
    }
}

impl Default for BuildParams {
    fn default() -> Self {
        Self::new(DEFAULT_MERGE_TOL, DEFAULT_NORM)
    }
}

/// Builds a tagged volume/surface/curve geometry from an isovolume database.
///
/// Owns the mesh store and the hierarchy built on it. Stages can be run one
/// by one or all at once with [`IsoGeometry::build`].
///
/// ```no_run
/// use isogeom::{BuildParams, IsoGeometry};
///
/// let mut geom = IsoGeometry::new()
///     .with_levels(vec![5.0, 15.0])?
///     .with_data("temperature")
///     .with_db("db");
/// geom.build(&BuildParams::default().with_viz(true))?;
/// geom.write_geometry(None)?;
/// # Ok::<(), isogeom::IsogeomError>(())
/// ```
#[derive(Debug)]
pub struct IsoGeometry {
    store: MeshStore,
    model: GeomModel,
    levels: Option<Levels>,
    data: Option<String>,
    db: PathBuf,
}

impl IsoGeometry {
    /// Creates an empty geometry with the database at `<cwd>/tmp`.
    #[must_use]
    pub fn new() -> Self {
        let db = std::env::current_dir().unwrap_or_default().join("tmp");
        Self {
            store: MeshStore::new(),
            model: GeomModel::new(),
            levels: None,
            data: None,
            db,
        }
    }

    /// Sets the level values.
    ///
    /// # Errors
    ///
    /// Returns an error if the level file cannot be read or the values are
    /// invalid.
    pub fn with_levels(mut self, source: impl Into<LevelSource>) -> Result<Self> {
        self.levels = Some(Levels::from_source(&source.into())?);
        Ok(self)
    }

    /// Sets the name of the data field the levels were taken from.
    #[must_use]
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Sets the database directory.
    #[must_use]
    pub fn with_db(mut self, db: impl Into<PathBuf>) -> Self {
        self.db = db.into();
        self
    }

    /// The level values, if set.
    #[must_use]
    pub fn levels(&self) -> Option<&Levels> {
        self.levels.as_ref()
    }

    /// Name of the data field the levels belong to.
    #[must_use]
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    /// The database directory.
    #[must_use]
    pub fn db(&self) -> &Path {
        &self.db
    }

    /// The mesh store holding every vertex, triangle, edge and set.
    #[must_use]
    pub fn store(&self) -> &MeshStore {
        &self.store
    }

    /// The volume/surface/curve hierarchy built on the store.
    #[must_use]
    pub fn model(&self) -> &GeomModel {
        &self.model
    }

    /// Takes levels, data name and database from a finished upstream stage,
    /// overriding whatever was set before.
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream stage did not complete or its levels
    /// are invalid.
    pub fn read_upstream(&mut self, upstream: &UpstreamDb) -> Result<()> {
        upstream.ensure_complete()?;
        let values = upstream.levels.clone().ok_or(ConfigError::NoLevels)?;
        self.levels = Some(Levels::new(values)?);
        self.data.clone_from(&upstream.data);
        self.db.clone_from(&upstream.db);
        info!("using upstream database {}", self.db.display());
        Ok(())
    }

    /// Loads one isovolume per band from the database.
    ///
    /// A previously loaded hierarchy is discarded first, together with its
    /// mesh.
    ///
    /// # Errors
    ///
    /// See [`ReadDatabase::execute`].
    pub fn read_database(&mut self) -> Result<usize> {
        if !self.model.isovolumes.is_empty() {
            info!(
                "discarding {} previously loaded isovolumes",
                self.model.isovolumes.len()
            );
            self.model.reset_hierarchy();
            self.store = MeshStore::new();
        }
        ReadDatabase::new(&self.db, self.levels.as_ref()).execute(&mut self.store, &mut self.model)
    }

    /// Splits every isovolume into connected surface shells.
    ///
    /// # Errors
    ///
    /// See [`SeparateIsovolumes::execute`].
    pub fn separate_isovols(&mut self) -> Result<usize> {
        SeparateIsovolumes::new().execute(&mut self.store, &mut self.model)
    }

    /// Merges coincident surfaces of adjacent isovolumes.
    ///
    /// # Errors
    ///
    /// See [`ImprintMerge::execute`].
    pub fn imprint_merge(&mut self, norm: f64, merge_tol: f64) -> Result<usize> {
        ImprintMerge::new(norm, merge_tol).execute(&mut self.store, &mut self.model)
    }

    /// Builds curves, tags and parent/child links.
    ///
    /// # Errors
    ///
    /// See [`MakeFamily::execute`].
    pub fn make_family(&mut self) -> Result<FamilySummary> {
        MakeFamily::new().execute(&mut self.store, &mut self.model)
    }

    /// Copies surface values into a tag named after the data.
    pub fn tag_for_viz(&mut self) {
        TagForViz::new(self.data.as_deref()).execute(&mut self.model);
    }

    /// Sets user-defined tags on the whole geometry.
    ///
    /// # Errors
    ///
    /// Returns an error if `names` and `values` differ in length.
    pub fn set_tags(&mut self, names: Vec<String>, values: Vec<f64>) -> Result<()> {
        SetTags::new(names, values)?.execute(&mut self.model);
        Ok(())
    }

    /// Writes the geometry, to `<db>/geom-<data>.vtk` unless a path is given.
    /// Returns the path written.
    ///
    /// # Errors
    ///
    /// See [`WriteGeometry::execute`].
    pub fn write_geometry(&self, path: Option<&Path>) -> Result<PathBuf> {
        let path = path.map_or_else(
            || default_path(&self.db, self.data.as_deref()),
            Path::to_path_buf,
        );
        WriteGeometry::new(&path).execute(&self.store, &self.model)?;
        Ok(path)
    }

    /// Runs read, separate, merge and family build in order, then the viz
    /// tagging when requested.
    ///
    /// # Errors
    ///
    /// Returns the first stage error.
    pub fn build(&mut self, params: &BuildParams) -> Result<FamilySummary> {
        self.read_database()?;
        self.separate_isovols()?;
        self.imprint_merge(params.norm, params.merge_tol)?;
        let summary = self.make_family()?;
        if params.tag_for_viz {
            self.tag_for_viz();
        }
        Ok(summary)
    }
}

impl Default for IsoGeometry {
    fn default() -> Self {
        Self::new()
    }
}
