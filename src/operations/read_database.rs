use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{ConfigError, DatabaseError, Result};
use crate::levels::Levels;
use crate::math::Point3;
use crate::store::{MeshSetId, MeshStore};
use crate::topology::{GeomModel, Isovolume};

/// Subdirectory of the database that holds one mesh file per band.
pub const VOLS_DIR: &str = "vols";

/// State handed over by a finished (or unfinished) level-generation stage.
#[derive(Debug, Clone, Default)]
pub struct UpstreamDb {
    /// Level values used to slice the isovolumes.
    pub levels: Option<Vec<f64>>,
    /// Name of the sliced data field.
    pub data: Option<String>,
    /// Database directory the mesh files were written to.
    pub db: PathBuf,
    /// Whether the upstream stage ran to completion.
    pub completed: bool,
}

impl UpstreamDb {
    /// Checks that the upstream stage finished and produced levels and data.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::IncompleteUpstream`] naming the first missing piece.
    pub fn ensure_complete(&self) -> std::result::Result<(), DatabaseError> {
        let missing = if !self.completed {
            Some("not completed")
        } else if self.levels.as_ref().is_none_or(Vec::is_empty) {
            Some("levels")
        } else if self.data.is_none() {
            Some("data")
        } else if self.db.as_os_str().is_empty() {
            Some("db")
        } else {
            None
        };
        match missing {
            Some(missing) => Err(DatabaseError::IncompleteUpstream { missing }),
            None => Ok(()),
        }
    }
}

/// Loads one mesh file per isovolume band into the store.
///
/// Each file becomes a fresh entity set registered as an [`Isovolume`] with
/// the bounds of its band. Any previously loaded hierarchy in the model is
/// replaced.
pub struct ReadDatabase<'a> {
    db: &'a Path,
    levels: Option<&'a Levels>,
}

impl<'a> ReadDatabase<'a> {
    /// Creates a new `ReadDatabase` operation.
    #[must_use]
    pub fn new(db: &'a Path, levels: Option<&'a Levels>) -> Self {
        Self { db, levels }
    }

    /// Executes the read, returning the number of isovolumes loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if no levels are defined (checked before any I/O), if
    /// the number of mesh files is not the number of levels plus one, or if a
    /// file cannot be read or parsed.
    pub fn execute(&self, store: &mut MeshStore, model: &mut GeomModel) -> Result<usize> {
        let levels = self.levels.ok_or(ConfigError::NoLevels)?;
        let dir = mesh_dir(self.db);
        let files = list_mesh_files(&dir)?;

        if files.len() != levels.band_count() {
            return Err(DatabaseError::Cardinality {
                dir,
                expected: levels.band_count(),
                found: files.len(),
            }
            .into());
        }

        if !model.isovolumes.is_empty() {
            warn!(
                "replacing {} previously loaded isovolumes",
                model.isovolumes.len()
            );
        }
        model.reset_hierarchy();

        for (index, (path, bounds)) in files.iter().zip(levels.bounds()).enumerate() {
            let set = load_mesh_set(store, path)?;
            info!("isovolume {index} {bounds} <- {}", path.display());
            model.isovolumes.push(Isovolume::new(index, bounds, set));
        }

        Ok(model.isovolumes.len())
    }
}

/// Directory holding the band mesh files: `<db>/vols` if present, else `<db>`.
#[must_use]
pub fn mesh_dir(db: &Path) -> PathBuf {
    let vols = db.join(VOLS_DIR);
    if vols.is_dir() {
        vols
    } else {
        db.to_path_buf()
    }
}

/// Lists the `.stl` files of a directory in natural order.
///
/// Files are ordered by the first integer in their stem, then by name, so
/// `vol-10.stl` follows `vol-9.stl`.
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub fn list_mesh_files(dir: &Path) -> std::result::Result<Vec<PathBuf>, DatabaseError> {
    let io_err = |source| DatabaseError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_stl = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("stl"));
        if path.is_file() && is_stl {
            files.push(path);
        } else {
            debug!("ignoring {}", path.display());
        }
    }
    files.sort_by_cached_key(|p| natural_key(p));
    Ok(files)
}

fn natural_key(path: &Path) -> (Option<u64>, String) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let digits: String = stem
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    (digits.parse().ok(), name)
}

/// Loads an STL file into a new entity set.
///
/// Vertices with identical coordinates within the file are shared;
/// degenerate triangles are dropped.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or parsed.
pub fn load_mesh_set(store: &mut MeshStore, path: &Path) -> Result<MeshSetId> {
    let file = File::open(path).map_err(|source| DatabaseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = BufReader::new(file);

    let stl = stl_io::read_stl(&mut reader).map_err(|e| DatabaseError::Parse {
        path: path.to_path_buf(),
        details: e.to_string(),
    })?;

    let vertex_ids: Vec<_> = stl
        .vertices
        .iter()
        .map(|v| {
            store.add_vertex(Point3::new(
                f64::from(v.0[0]),
                f64::from(v.0[1]),
                f64::from(v.0[2]),
            ))
        })
        .collect();

    let mut triangles = Vec::with_capacity(stl.faces.len());
    let mut skipped = 0_usize;
    for face in &stl.faces {
        let [i0, i1, i2] = face.vertices;
        if i0 == i1 || i1 == i2 || i0 == i2 {
            skipped += 1;
            continue;
        }
        let lookup = |i: usize| {
            vertex_ids.get(i).copied().ok_or_else(|| DatabaseError::Parse {
                path: path.to_path_buf(),
                details: format!("face references missing vertex {i}"),
            })
        };
        triangles.push(store.add_triangle([lookup(i0)?, lookup(i1)?, lookup(i2)?]));
    }
    if skipped > 0 {
        warn!("{}: dropped {skipped} degenerate triangles", path.display());
    }

    let set = store.create_set();
    store.add_triangles_to_set(set, triangles)?;

    // Only vertices of kept triangles belong to the mesh.
    let used = &store.set(set)?.vertices;
    let unused: Vec<_> = vertex_ids
        .into_iter()
        .filter(|v| !used.contains(v))
        .collect();
    for &v in &unused {
        store.remove_vertex(v);
    }

    debug!(
        "{}: {} vertices ({} unused), {} triangles",
        path.display(),
        stl.vertices.len() - unused.len(),
        unused.len(),
        stl.faces.len() - skipped
    );
    Ok(set)
}
