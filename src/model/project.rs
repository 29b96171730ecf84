use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectInfo {
    pub name: String,
    pub description: Option<String>,
    pub schema: String,
    pub file_path: String,
}

/// A floor as listed in reports: display name, elevation and how many
/// products resolve to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Storey {
    pub id: u64,
    pub name: String,
    pub elevation: Option<f64>,
    pub element_count: usize,
}

/// Floor order: elevation ascending, storeys without elevation last.
#[must_use]
pub fn elevation_order(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Sorts storeys bottom-up. The sort is stable, so equal elevations keep
/// their incoming order.
pub fn sort_storeys(storeys: &mut [Storey]) {
    storeys.sort_by(|a, b| elevation_order(a.elevation, b.elevation));
}
