//! Handover lists: maintainable devices and distribution boards.

use serde::Serialize;

use super::{count_by_type_total, TypeFilter};
use crate::config::QueryConfig;
use crate::model::element::non_empty;
use crate::model::ModelGraph;
use crate::spatial::SpatialResolver;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardLocation {
    pub id: u64,
    pub name: String,
    pub storey: String,
    pub space: String,
}

/// Instances of every configured maintainable type, summed.
#[must_use]
pub fn count_maintainable_devices(graph: &ModelGraph, config: &QueryConfig) -> usize {
    config
        .maintainable_types
        .iter()
        .map(|t| count_by_type_total(graph, &TypeFilter::new(t)))
        .sum()
}

/// Storey and space of each electrical distribution board.
#[must_use]
pub fn locate_distribution_boards(graph: &ModelGraph) -> Vec<BoardLocation> {
    let resolver = SpatialResolver::new(graph);

    TypeFilter::new("IfcElectricDistributionBoard")
        .select(graph)
        .into_iter()
        .map(|board| BoardLocation {
            id: board.id,
            name: non_empty(board.name.as_deref())
                .map_or_else(|| format!("Board #{}", board.id), str::to_string),
            storey: resolver.resolve_storey(board.id),
            space: resolver
                .resolve_space(board.id)
                .and_then(|space| space.label())
                .unwrap_or("Unknown")
                .to_string(),
        })
        .collect()
}
