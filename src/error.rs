use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for isosurface geometry construction.
#[derive(Debug, Error)]
pub enum IsogeomError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Errors in caller-supplied levels and parameters.
///
/// These are raised before any file is read or any entity is created.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no levels defined; provide level values or a level file")]
    NoLevels,

    #[error("level value {0} is not a finite number")]
    InvalidLevel(f64),

    #[error("level value {0} appears more than once")]
    DuplicateLevel(f64),

    #[error("failed to read level file {path}: {source}")]
    LevelFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("level file {path}, line {line}: cannot parse {text:?} as a number")]
    LevelParse {
        path: PathBuf,
        line: usize,
        text: String,
    },

    #[error("parameter {name} = {value} is invalid: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("{names} tag names were given but {values} tag values")]
    TagCountMismatch { names: usize, values: usize },

    #[error("unsupported geometry file format: {0} (expected a .vtk file)")]
    UnsupportedFormat(PathBuf),
}

/// Errors while loading the isovolume database.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error(
        "number of mesh files ({found}) in {dir} does not match number of levels + 1 ({expected})"
    )]
    Cardinality {
        dir: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("Incomplete IvDb object: upstream level generation has not finished ({missing})")]
    IncompleteUpstream { missing: &'static str },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse mesh file {path}: {details}")]
    Parse { path: PathBuf, details: String },
}

/// Errors related to the mesh store and the geometry hierarchy.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("invalid topology: {0}")]
    InvalidTopology(String),
}

/// Errors while writing the geometry file.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {details}")]
    Vtk { path: PathBuf, details: String },
}

/// Convenience type alias for results using [`IsogeomError`].
pub type Result<T> = std::result::Result<T, IsogeomError>;
