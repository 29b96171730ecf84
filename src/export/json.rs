use crate::error::ExportError;
use crate::model::{ModelGraph, ProjectInfo, Storey};
use crate::query::{all_storeys, objects_by_storey, type_counts, TypeSummary};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Whole-model overview written by `export --report`.
#[derive(Debug, Serialize)]
pub struct ModelReport<'a> {
    pub project: &'a ProjectInfo,
    pub element_count: usize,
    pub storeys: Vec<Storey>,
    pub types: TypeSummary,
    pub objects_by_storey: BTreeMap<String, BTreeMap<String, usize>>,
}

#[must_use]
pub fn model_report(graph: &ModelGraph) -> ModelReport<'_> {
    ModelReport {
        project: &graph.project,
        element_count: graph.element_count(),
        storeys: all_storeys(graph),
        types: type_counts(graph),
        objects_by_storey: objects_by_storey(graph),
    }
}

/// Writes any report as pretty-printed JSON.
pub fn export_json<T, P>(report: &T, path: P) -> Result<(), ExportError>
where
    T: Serialize + ?Sized,
    P: AsRef<Path>,
{
    let path_ref = path.as_ref();
    let json = serde_json::to_string_pretty(report)?;

    let mut file = File::create(path_ref).map_err(|source| ExportError::FileCreate {
        path: path_ref.to_path_buf(),
        source,
    })?;

    file.write_all(json.as_bytes())
        .map_err(|source| ExportError::Write {
            path: path_ref.to_path_buf(),
            source,
        })?;

    debug!(path = %path_ref.display(), bytes = json.len(), "wrote JSON report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::fixture;
    use pretty_assertions::assert_eq;

    #[test]
    fn writes_model_report() {
        let graph = fixture::building();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        export_json(&model_report(&graph), &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["storeys"][0]["name"], "Level 0");
        assert_eq!(value["objects_by_storey"]["Level 1"]["IFCDOOR"], 3);
        assert_eq!(value["types"]["products"], graph.products().count());
    }
}
