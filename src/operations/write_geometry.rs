use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::info;
use vtkio::model::{
    Attribute, Attributes, ByteOrder, DataArray, DataSet, ElementType, FieldArray, IOBuffer,
    PolyDataPiece, Version, VertexNumbers, Vtk,
};

use crate::error::{ConfigError, ExportError, Result, TopologyError};
use crate::store::{MeshStore, VertexId};
use crate::topology::{GeomModel, GeomTags};

/// File extension of the geometry output.
pub const GEOMETRY_EXTENSION: &str = "vtk";

/// Name of the field attribute holding user tags.
pub const USER_TAGS_FIELD: &str = "user_tags";

/// One output cell and the scalars attached to it.
struct Cell {
    vertices: Vec<usize>,
    tags: GeomTags,
    value: f64,
    viz_value: f64,
}

/// Writes the tagged geometry as a legacy VTK polydata file.
///
/// Curve edges are written as lines and surface triangles as polygons, each
/// cell carrying the dimension, global id and value of the entity it belongs
/// to. User tags are written as a field attribute on the cells.
pub struct WriteGeometry<'a> {
    path: &'a Path,
}

impl<'a> WriteGeometry<'a> {
    /// Creates a new `WriteGeometry` operation.
    #[must_use]
    pub fn new(path: &'a Path) -> Self {
        Self { path }
    }

    /// Executes the export.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not end in `.vtk`, if the family has
    /// not been built, or if the file cannot be written.
    pub fn execute(&self, store: &MeshStore, model: &GeomModel) -> Result<()> {
        let is_vtk = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(GEOMETRY_EXTENSION));
        if !is_vtk {
            return Err(ConfigError::UnsupportedFormat(self.path.to_path_buf()).into());
        }
        if !model.is_family_built() {
            return Err(TopologyError::InvalidTopology(
                "geometry must be built before it is written".into(),
            )
            .into());
        }

        let mut points = PointTable::default();
        let lines = curve_cells(store, model, &mut points)?;
        let polygons = surface_cells(store, model, &mut points)?;

        let export_err = |details: String| ExportError::Vtk {
            path: self.path.to_path_buf(),
            details,
        };
        let piece = PolyDataPiece {
            points: points.coords(store)?.into(),
            verts: None,
            lines: connectivity(&lines).map_err(export_err)?,
            polys: connectivity(&polygons).map_err(export_err)?,
            strips: None,
            data: Attributes {
                point: Vec::new(),
                cell: cell_attributes(model, &lines, &polygons),
            },
        };
        let vtk = Vtk {
            version: Version::new((4, 2)),
            title: String::from("isosurface geometry"),
            byte_order: ByteOrder::BigEndian,
            file_path: None,
            data: DataSet::inline(piece),
        };
        vtk.export_ascii(self.path)
            .map_err(|e| export_err(e.to_string()))?;

        info!(
            "wrote {} lines and {} polygons to {}",
            lines.len(),
            polygons.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Default output path: `<db>/geom-<data>.vtk`, or `<db>/geom.vtk`.
#[must_use]
pub fn default_path(db: &Path, data: Option<&str>) -> PathBuf {
    match data {
        Some(name) => db.join(format!("geom-{name}.{GEOMETRY_EXTENSION}")),
        None => db.join(format!("geom.{GEOMETRY_EXTENSION}")),
    }
}

/// Vertices in first-use order, renumbered from 0.
#[derive(Default)]
struct PointTable {
    index: BTreeMap<VertexId, usize>,
    order: Vec<VertexId>,
}

impl PointTable {
    fn index_of(&mut self, v: VertexId) -> usize {
        *self.index.entry(v).or_insert_with(|| {
            self.order.push(v);
            self.order.len() - 1
        })
    }

    /// Flat `x y z` coordinates in output order.
    fn coords(&self, store: &MeshStore) -> std::result::Result<Vec<f64>, TopologyError> {
        let mut coords = Vec::with_capacity(self.order.len() * 3);
        for &v in &self.order {
            let p = store.point(v)?;
            coords.extend([p.x, p.y, p.z]);
        }
        Ok(coords)
    }
}

fn sorted_by_id<'m, T>(
    items: impl Iterator<Item = &'m T>,
    tags: impl Fn(&T) -> Option<GeomTags>,
) -> Vec<&'m T> {
    let mut items: Vec<_> = items.collect();
    items.sort_by_key(|t| tags(t).map(|g| g.global_id));
    items
}

fn curve_cells(
    store: &MeshStore,
    model: &GeomModel,
    points: &mut PointTable,
) -> std::result::Result<Vec<Cell>, TopologyError> {
    let mut cells = Vec::new();
    for curve in sorted_by_id(model.curves(), |c| c.tags) {
        let Some(tags) = curve.tags else { continue };
        for &edge in &store.set(curve.set)?.edges {
            let e = store.edge(edge)?;
            cells.push(Cell {
                vertices: vec![points.index_of(e.start), points.index_of(e.end)],
                tags,
                value: 0.0,
                viz_value: 0.0,
            });
        }
    }
    Ok(cells)
}

fn surface_cells(
    store: &MeshStore,
    model: &GeomModel,
    points: &mut PointTable,
) -> std::result::Result<Vec<Cell>, TopologyError> {
    let mut cells = Vec::new();
    for surface in sorted_by_id(model.surfaces(), |s| s.tags) {
        let Some(tags) = surface.tags else { continue };
        for &tri in &store.set(surface.set)?.triangles {
            let verts = store.triangle(tri)?.vertices;
            cells.push(Cell {
                vertices: verts.iter().map(|&v| points.index_of(v)).collect(),
                tags,
                value: surface.value,
                viz_value: surface.viz_value.unwrap_or(surface.value),
            });
        }
    }
    Ok(cells)
}

/// Legacy cell connectivity: each cell is its vertex count followed by its
/// point indices. `None` when there are no cells of this kind.
fn connectivity(cells: &[Cell]) -> std::result::Result<Option<VertexNumbers>, String> {
    if cells.is_empty() {
        return Ok(None);
    }
    let to_u32 =
        |n: usize| u32::try_from(n).map_err(|_| format!("{n} exceeds the VTK index range"));
    let mut vertices = Vec::with_capacity(cells.iter().map(|c| c.vertices.len() + 1).sum());
    for cell in cells {
        vertices.push(to_u32(cell.vertices.len())?);
        for &i in &cell.vertices {
            vertices.push(to_u32(i)?);
        }
    }
    Ok(Some(VertexNumbers::Legacy {
        num_cells: to_u32(cells.len())?,
        vertices,
    }))
}

/// Array names in legacy VTK cannot contain whitespace.
fn array_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

fn scalars(name: &str, data: impl Into<IOBuffer>) -> Attribute {
    Attribute::DataArray(DataArray {
        name: array_name(name),
        elem: ElementType::Scalars {
            num_comp: 1,
            lookup_table: None,
        },
        data: data.into(),
    })
}

/// Cell scalars for lines then polygons, plus the user tags repeated on
/// every cell.
fn cell_attributes(model: &GeomModel, lines: &[Cell], polygons: &[Cell]) -> Vec<Attribute> {
    let all: Vec<&Cell> = lines.iter().chain(polygons).collect();
    if all.is_empty() {
        return Vec::new();
    }
    let dims: Vec<i32> = all
        .iter()
        .map(|c| i32::from(c.tags.dimension.as_u8()))
        .collect();
    let ids: Vec<u32> = all.iter().map(|c| c.tags.global_id).collect();
    let values: Vec<f64> = all.iter().map(|c| c.value).collect();

    let mut attributes = vec![
        scalars("GEOM_DIMENSION", dims),
        scalars("GLOBAL_ID", ids),
        scalars("VALUE", values),
    ];
    if let Some(name) = &model.viz_tag {
        let viz: Vec<f64> = all.iter().map(|c| c.viz_value).collect();
        attributes.push(scalars(name, viz));
    }
    if !model.user_tags.is_empty() {
        let data_array = model
            .user_tags
            .iter()
            .map(|(name, value)| FieldArray {
                name: array_name(name),
                elem: 1,
                data: vec![*value; all.len()].into(),
            })
            .collect();
        attributes.push(Attribute::Field {
            name: USER_TAGS_FIELD.to_owned(),
            data_array,
        });
    }
    attributes
}
