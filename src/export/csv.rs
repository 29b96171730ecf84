use crate::error::ExportError;
use crate::model::{ModelGraph, ModelView};
use crate::spatial::SpatialResolver;
use rayon::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use tracing::info;

/// One product with a snapshot of the storey it resolves to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementRow {
    pub id: u64,
    pub global_id: String,
    pub ifc_type: String,
    pub name: String,
    pub storey: String,
    pub storey_elevation: Option<f64>,
}

/// Flat element table, one row per product in id order.
#[must_use]
pub fn element_rows(graph: &ModelGraph) -> Vec<ElementRow> {
    let resolver = SpatialResolver::new(graph);
    let products: Vec<_> = graph.products().collect();

    products
        .par_iter()
        .map(|element| {
            let storey_id = resolver.resolve_storey_id(element.id);
            ElementRow {
                id: element.id,
                global_id: element.global_id.clone().unwrap_or_default(),
                ifc_type: element.entity_type.clone(),
                name: element.name.clone().unwrap_or_default(),
                storey: resolver.resolve_storey(element.id),
                storey_elevation: storey_id
                    .and_then(|id| graph.element(id))
                    .and_then(|storey| storey.elevation),
            }
        })
        .collect()
}

pub fn export_csv<P: AsRef<Path>>(graph: &ModelGraph, path: P) -> Result<(), ExportError> {
    let path_ref = path.as_ref();
    let file = File::create(path_ref).map_err(|source| ExportError::FileCreate {
        path: path_ref.to_path_buf(),
        source,
    })?;

    let mut writer = csv::Writer::from_writer(file);

    writer.write_record(["id", "global_id", "ifc_type", "name", "storey", "storey_elevation"])?;

    let rows = element_rows(graph);
    for row in &rows {
        let id = row.id.to_string();
        let elevation = row.storey_elevation.map(|e| e.to_string()).unwrap_or_default();
        writer.write_record([
            id.as_str(),
            row.global_id.as_str(),
            row.ifc_type.as_str(),
            row.name.as_str(),
            row.storey.as_str(),
            elevation.as_str(),
        ])?;
    }

    writer.flush().map_err(|source| ExportError::Write {
        path: path_ref.to_path_buf(),
        source,
    })?;

    info!(rows = rows.len(), path = %path_ref.display(), "exported element table");
    Ok(())
}
