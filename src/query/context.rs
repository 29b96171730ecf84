//! Questions about where elements sit: host walls, spaces and storeys.

use std::collections::BTreeMap;

use rayon::prelude::*;

use super::{contains_ignore_case, tally, TypeFilter};
use crate::model::{Element, ModelGraph};
use crate::spatial::{display_name, SpatialResolver};

/// Elements of a type hosted by an element of `host` type, e.g. doors in
/// curtain walls. Any of the element's openings may lead to the host; each
/// element still counts once.
#[must_use]
pub fn count_elements_by_host_type(
    graph: &ModelGraph,
    filter: &TypeFilter,
    host: &TypeFilter,
) -> usize {
    let resolver = SpatialResolver::new(graph);
    filter
        .select(graph)
        .par_iter()
        .filter(|e| resolver.resolve_hosts(e.id).into_iter().any(|h| host.matches(h)))
        .count()
}

/// Elements whose space name contains `space_name`, case-insensitively.
#[must_use]
pub fn count_elements_in_space_type(
    graph: &ModelGraph,
    filter: &TypeFilter,
    space_name: &str,
) -> usize {
    let resolver = SpatialResolver::new(graph);
    filter
        .select(graph)
        .par_iter()
        .filter(|e| {
            resolver
                .resolve_space(e.id)
                .is_some_and(|space| space_matches(space, space_name))
        })
        .count()
}

/// Elements per space display name. Elements outside any space are not
/// counted.
#[must_use]
pub fn count_elements_per_space(
    graph: &ModelGraph,
    filter: &TypeFilter,
) -> BTreeMap<String, usize> {
    let resolver = SpatialResolver::new(graph);
    tally(&filter.select(graph), |e| resolver.resolve_space(e.id).map(display_name))
}

/// Spaces ranked by how many elements of any of `filters` they hold,
/// most first. Equal counts are ordered by name.
#[must_use]
pub fn rooms_with_most_devices(graph: &ModelGraph, filters: &[TypeFilter]) -> Vec<(String, usize)> {
    let resolver = SpatialResolver::new(graph);
    let devices: Vec<&Element> = graph
        .elements()
        .filter(|e| filters.iter().any(|f| f.matches(e)))
        .collect();

    let mut rooms: Vec<(String, usize)> =
        tally(&devices, |e| resolver.resolve_space(e.id).map(display_name))
            .into_iter()
            .collect();
    rooms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    rooms
}

/// Elements of a type on storeys whose name contains `storey` and in
/// spaces whose name contains `space`. Both filters are optional; with a
/// space filter, elements outside any space never match.
#[must_use]
pub fn count_elements_filtered(
    graph: &ModelGraph,
    filter: &TypeFilter,
    storey: Option<&str>,
    space: Option<&str>,
) -> usize {
    let resolver = SpatialResolver::new(graph);
    filter
        .select(graph)
        .par_iter()
        .filter(|e| {
            storey.map_or(true, |s| contains_ignore_case(&resolver.resolve_storey(e.id), s))
        })
        .filter(|e| {
            space.map_or(true, |s| {
                resolver
                    .resolve_space(e.id)
                    .is_some_and(|found| space_matches(found, s))
            })
        })
        .count()
}

/// Space name match on name, then long name, never the synthesized label.
pub(crate) fn space_matches(space: &Element, name: &str) -> bool {
    contains_ignore_case(space.label().unwrap_or_default(), name)
}
