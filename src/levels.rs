//! Level values and the per-band scalar bounds they induce.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Where level values come from.
#[derive(Debug, Clone, PartialEq)]
pub enum LevelSource {
    /// Explicit values, in any order.
    Values(Vec<f64>),
    /// A text file with one value per line.
    File(PathBuf),
}

impl From<Vec<f64>> for LevelSource {
    fn from(values: Vec<f64>) -> Self {
        Self::Values(values)
    }
}

/// Scalar bounds of one isovolume band.
///
/// `None` marks the open end of an extreme band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelBounds {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl LevelBounds {
    /// Creates bounds for a band.
    #[must_use]
    pub fn new(lower: Option<f64>, upper: Option<f64>) -> Self {
        Self { lower, upper }
    }
}

impl fmt::Display for LevelBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lower {
            Some(v) => write!(f, "({v}, ")?,
            None => write!(f, "(-inf, ")?,
        }
        match self.upper {
            Some(v) => write!(f, "{v})"),
            None => write!(f, "+inf)"),
        }
    }
}

/// Sorted, validated isosurface level values.
#[derive(Debug, Clone, PartialEq)]
pub struct Levels {
    values: Vec<f64>,
}

impl Levels {
    /// Sorts and validates level values.
    ///
    /// # Errors
    ///
    /// Returns an error if no values are given, a value is not finite, or a
    /// value is repeated.
    pub fn new(values: impl IntoIterator<Item = f64>) -> Result<Self, ConfigError> {
        let mut values: Vec<f64> = values.into_iter().collect();
        if values.is_empty() {
            return Err(ConfigError::NoLevels);
        }
        if let Some(&bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(ConfigError::InvalidLevel(bad));
        }
        values.sort_by(f64::total_cmp);
        if let Some(pair) = values.windows(2).find(|w| w[0] >= w[1]) {
            return Err(ConfigError::DuplicateLevel(pair[1]));
        }
        Ok(Self { values })
    }

    /// Reads levels from a file with one value per line. Blank lines are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, a line is not a number,
    /// or the values are invalid.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::LevelFile {
            path: path.to_path_buf(),
            source,
        })?;
        let mut values = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let value = trimmed.parse::<f64>().map_err(|_| ConfigError::LevelParse {
                path: path.to_path_buf(),
                line: idx + 1,
                text: trimmed.to_string(),
            })?;
            values.push(value);
        }
        Self::new(values)
    }

    /// Resolves a [`LevelSource`].
    ///
    /// # Errors
    ///
    /// See [`Levels::new`] and [`Levels::from_file`].
    pub fn from_source(source: &LevelSource) -> Result<Self, ConfigError> {
        match source {
            LevelSource::Values(values) => Self::new(values.iter().copied()),
            LevelSource::File(path) => Self::from_file(path),
        }
    }

    /// The level values in ascending order.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of level values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no levels; never the case once validated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of isovolume bands (`len() + 1`).
    #[must_use]
    pub fn band_count(&self) -> usize {
        self.values.len() + 1
    }

    /// Bounds of every band, lowest first.
    #[must_use]
    pub fn bounds(&self) -> Vec<LevelBounds> {
        (0..self.band_count())
            .map(|i| {
                let lower = i.checked_sub(1).map(|j| self.values[j]);
                let upper = self.values.get(i).copied();
                LevelBounds::new(lower, upper)
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn unsorted_levels_are_sorted() {
        let levels = Levels::new([15.0, 5.0, 25.0, 35.0]).unwrap();
        assert_eq!(levels.values(), &[5.0, 15.0, 25.0, 35.0]);
    }

    #[test]
    fn four_levels_give_five_bands() {
        let levels = Levels::new([15.0, 5.0, 25.0, 35.0]).unwrap();
        let bounds = levels.bounds();
        assert_eq!(
            bounds,
            vec![
                LevelBounds::new(None, Some(5.0)),
                LevelBounds::new(Some(5.0), Some(15.0)),
                LevelBounds::new(Some(15.0), Some(25.0)),
                LevelBounds::new(Some(25.0), Some(35.0)),
                LevelBounds::new(Some(35.0), None),
            ]
        );
    }

    #[test]
    fn single_level_gives_two_open_bands() {
        let bounds = Levels::new([300.0]).unwrap().bounds();
        assert_eq!(bounds.len(), 2);
        assert_eq!(bounds[0].lower, None);
        assert_eq!(bounds[1].upper, None);
    }

    #[test]
    fn empty_levels_are_rejected() {
        assert!(matches!(Levels::new(Vec::<f64>::new()), Err(ConfigError::NoLevels)));
    }

    #[test]
    fn duplicate_and_nan_levels_are_rejected() {
        assert!(matches!(
            Levels::new([1.0, 2.0, 1.0]),
            Err(ConfigError::DuplicateLevel(v)) if v == 1.0
        ));
        assert!(matches!(
            Levels::new([1.0, f64::NAN]),
            Err(ConfigError::InvalidLevel(_))
        ));
    }

    #[test]
    fn reads_level_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "25\n5\n\n15.0\n35").unwrap();
        let levels = Levels::from_source(&LevelSource::File(file.path().to_path_buf())).unwrap();
        assert_eq!(levels.values(), &[5.0, 15.0, 25.0, 35.0]);
    }

    #[test]
    fn bad_level_file_line_reports_position() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "5\nfive").unwrap();
        let err = Levels::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::LevelParse { line: 2, .. }));
    }

    #[test]
    fn bounds_display() {
        assert_eq!(LevelBounds::new(None, Some(5.0)).to_string(), "(-inf, 5)");
        assert_eq!(LevelBounds::new(Some(5.0), None).to_string(), "(5, +inf)");
    }
}
