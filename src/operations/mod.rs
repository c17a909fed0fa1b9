pub mod imprint_merge;
pub mod make_family;
pub mod read_database;
pub mod separate;
pub mod tag;
pub mod write_geometry;

pub use imprint_merge::ImprintMerge;
pub use make_family::{FamilySummary, MakeFamily};
pub use read_database::{ReadDatabase, UpstreamDb};
pub use separate::SeparateIsovolumes;
pub use tag::{SetTags, TagForViz};
pub use write_geometry::WriteGeometry;
