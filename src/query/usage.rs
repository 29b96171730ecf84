//! Space usage and coverage checks.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::context::{count_elements_in_space_type, space_matches};
use super::quantities::element_area;
use super::{group_sum, TypeFilter};
use crate::config::QueryConfig;
use crate::model::{Element, EntityKind, ModelGraph};
use crate::spatial::SpatialResolver;

/// Whether every space of a kind holds at least one element of a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpaceCoverage {
    pub all_have: bool,
    pub total_spaces: usize,
    pub spaces_with_elements: usize,
    pub missing_count: usize,
}

fn spaces(graph: &ModelGraph) -> Vec<&Element> {
    graph.elements_of_kind(EntityKind::Space).collect()
}

#[must_use]
pub fn count_rooms(graph: &ModelGraph) -> usize {
    graph.elements_of_kind(EntityKind::Space).count()
}

/// Summed space area per storey display name.
#[must_use]
pub fn net_area_per_storey(graph: &ModelGraph, config: &QueryConfig) -> BTreeMap<String, f64> {
    let resolver = SpatialResolver::new(graph);
    group_sum(&spaces(graph), |space| {
        Some((resolver.resolve_storey(space.id), element_area(graph, config, space.id)))
    })
}

/// Summed area of spaces whose name contains `space_name`.
#[must_use]
pub fn area_by_space_type(graph: &ModelGraph, config: &QueryConfig, space_name: &str) -> f64 {
    graph
        .elements_of_kind(EntityKind::Space)
        .filter(|space| space_matches(space, space_name))
        .map(|space| element_area(graph, config, space.id))
        .sum()
}

/// Elements per square metre in spaces whose name contains `space_name`;
/// `0.0` when those spaces have no recorded area.
#[must_use]
pub fn elements_per_area(
    graph: &ModelGraph,
    config: &QueryConfig,
    filter: &TypeFilter,
    space_name: &str,
) -> f64 {
    let area = area_by_space_type(graph, config, space_name);
    if area > 0.0 {
        count_elements_in_space_type(graph, filter, space_name) as f64 / area
    } else {
        0.0
    }
}

/// Checks that each space whose name contains `space_name` holds an
/// element of the type.
#[must_use]
pub fn check_elements_in_all_spaces(
    graph: &ModelGraph,
    filter: &TypeFilter,
    space_name: &str,
) -> SpaceCoverage {
    let resolver = SpatialResolver::new(graph);

    let targets: BTreeSet<u64> = graph
        .elements_of_kind(EntityKind::Space)
        .filter(|space| space_matches(space, space_name))
        .map(|space| space.id)
        .collect();

    let covered: BTreeSet<u64> = filter
        .select(graph)
        .iter()
        .filter_map(|e| resolver.resolve_space(e.id))
        .filter(|space| space_matches(space, space_name))
        .map(|space| space.id)
        .collect();

    let missing_count = targets.difference(&covered).count();
    SpaceCoverage {
        all_have: missing_count == 0,
        total_spaces: targets.len(),
        spaces_with_elements: covered.len(),
        missing_count,
    }
}
