//! Lengths, areas and installation heights read from quantity and
//! property sets. Values are taken as stored; no unit conversion is done.

use std::collections::BTreeMap;

use rayon::prelude::*;

use super::{group_sum, TypeFilter};
use crate::config::QueryConfig;
use crate::model::{EntityKind, ModelGraph, ModelView, PropertyDefinition, QuantityKind};
use crate::spatial::{display_name, SpatialResolver};

/// First named measure found in the element's definitions, in file order.
///
/// Quantity sets are searched for a quantity of `kind` with one of
/// `quantity_names`; property sets for a property with one of
/// `property_names` and a numeric value. A zero quantity counts as unset.
fn measure(
    graph: &ModelGraph,
    id: u64,
    kind: QuantityKind,
    quantity_names: &[String],
    property_names: &[String],
) -> Option<f64> {
    graph.property_definitions(id).find_map(|definition| match definition {
        PropertyDefinition::Quantities(set) => set
            .quantities
            .iter()
            .filter(|q| q.kind == kind && quantity_names.contains(&q.name))
            .find_map(|q| q.value.filter(|v| *v != 0.0)),
        PropertyDefinition::Properties(set) => set
            .properties
            .iter()
            .filter(|p| property_names.contains(&p.name))
            .find_map(|p| p.value.as_f64()),
    })
}

/// Length of a linear element, or `0.0` when none is recorded.
#[must_use]
pub fn element_length(graph: &ModelGraph, config: &QueryConfig, id: u64) -> f64 {
    measure(
        graph,
        id,
        QuantityKind::Length,
        &config.length_quantity_names,
        &config.length_property_names,
    )
    .unwrap_or(0.0)
}

/// Area of an element or space, or `0.0` when none is recorded.
#[must_use]
pub fn element_area(graph: &ModelGraph, config: &QueryConfig, id: u64) -> f64 {
    measure(
        graph,
        id,
        QuantityKind::Area,
        &config.area_quantity_names,
        &config.area_property_names,
    )
    .unwrap_or(0.0)
}

/// Installation height: the first property whose name contains one of the
/// height keywords and whose value reads as a number.
#[must_use]
pub fn element_height(graph: &ModelGraph, config: &QueryConfig, id: u64) -> Option<f64> {
    graph
        .property_definitions(id)
        .filter_map(|definition| match definition {
            PropertyDefinition::Properties(set) => Some(set),
            PropertyDefinition::Quantities(_) => None,
        })
        .flat_map(|set| set.properties.iter())
        .filter(|p| {
            let name = p.name.to_lowercase();
            config
                .height_property_keywords
                .iter()
                .any(|keyword| name.contains(&keyword.to_lowercase()))
        })
        .find_map(|p| p.value.as_f64())
}

#[must_use]
pub fn total_length_by_type(graph: &ModelGraph, config: &QueryConfig, filter: &TypeFilter) -> f64 {
    filter
        .select(graph)
        .par_iter()
        .map(|e| element_length(graph, config, e.id))
        .sum()
}

#[must_use]
pub fn length_by_storey(
    graph: &ModelGraph,
    config: &QueryConfig,
    filter: &TypeFilter,
) -> BTreeMap<String, f64> {
    let resolver = SpatialResolver::new(graph);
    group_sum(&filter.select(graph), |e| {
        Some((resolver.resolve_storey(e.id), element_length(graph, config, e.id)))
    })
}

/// Length per system display name, over members matching `filter`.
/// Systems without a matching member are left out.
#[must_use]
pub fn length_by_system(
    graph: &ModelGraph,
    config: &QueryConfig,
    filter: &TypeFilter,
) -> BTreeMap<String, f64> {
    let systems = TypeFilter::new("IfcSystem");
    let mut lengths = BTreeMap::new();

    for system in graph
        .elements_of_kind(EntityKind::Group)
        .filter(|g| systems.matches(g))
    {
        for member in graph
            .group_members(system.id)
            .iter()
            .filter_map(|id| graph.element(*id))
            .filter(|e| filter.matches(e))
        {
            *lengths.entry(display_name(system)).or_insert(0.0) +=
                element_length(graph, config, member.id);
        }
    }
    lengths
}

#[must_use]
pub fn total_area_by_type(graph: &ModelGraph, config: &QueryConfig, filter: &TypeFilter) -> f64 {
    filter
        .select(graph)
        .par_iter()
        .map(|e| element_area(graph, config, e.id))
        .sum()
}
