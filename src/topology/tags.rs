use std::fmt;

/// Topological dimension of a geometry entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GeomDimension {
    Curve = 1,
    Surface = 2,
    Volume = 3,
}

impl GeomDimension {
    /// The numeric dimension (1, 2 or 3).
    #[must_use]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// The category label paired with this dimension.
    #[must_use]
    pub fn category(self) -> &'static str {
        match self {
            Self::Curve => "Curve",
            Self::Surface => "Surface",
            Self::Volume => "Volume",
        }
    }
}

impl fmt::Display for GeomDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.category())
    }
}

/// Tags assigned to every volume, surface and curve by the family build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeomTags {
    pub dimension: GeomDimension,
    /// 1-based, numbered independently per dimension.
    pub global_id: u32,
}

impl GeomTags {
    /// Creates the tags for an entity.
    #[must_use]
    pub fn new(dimension: GeomDimension, global_id: u32) -> Self {
        Self {
            dimension,
            global_id,
        }
    }

    /// Category label ("Volume", "Surface" or "Curve").
    #[must_use]
    pub fn category(&self) -> &'static str {
        self.dimension.category()
    }
}
