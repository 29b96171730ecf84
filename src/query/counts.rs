//! Element counts by type and floor, and the storey listing.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use tracing::debug;

use super::{tally, TypeFilter};
use crate::model::project::elevation_order;
use crate::model::{sort_storeys, Element, EntityKind, ModelGraph, Storey};
use crate::spatial::{display_name, SpatialResolver};

/// Object types reported by the model summary, in report order.
const SUMMARY_TYPES: &[&str] = &[
    "IFCWALL",
    "IFCWALLSTANDARDCASE",
    "IFCDOOR",
    "IFCWINDOW",
    "IFCSLAB",
    "IFCBEAM",
    "IFCCOLUMN",
    "IFCSTAIR",
    "IFCROOF",
    "IFCSPACE",
    "IFCFURNISHINGELEMENT",
    "IFCBUILDINGELEMENTPROXY",
];

/// Counts of the common object types plus the building element and
/// product totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeSummary {
    /// Types with at least one instance, in report order.
    pub counts: Vec<(String, usize)>,
    pub total_counted: usize,
    pub building_elements: usize,
    pub products: usize,
}

/// Elements of a type per storey display name.
#[must_use]
pub fn count_by_type_and_storey(
    graph: &ModelGraph,
    filter: &TypeFilter,
) -> BTreeMap<String, usize> {
    let resolver = SpatialResolver::new(graph);
    let counts = tally(&filter.select(graph), |e| Some(resolver.resolve_storey(e.id)));
    debug!(%filter, storeys = counts.len(), "counted elements per storey");
    counts
}

#[must_use]
pub fn count_by_type_total(graph: &ModelGraph, filter: &TypeFilter) -> usize {
    graph.elements().filter(|e| filter.matches(e)).count()
}

/// All products per storey display name.
#[must_use]
pub fn count_elements_per_floor(graph: &ModelGraph) -> BTreeMap<String, usize> {
    count_by_type_and_storey(graph, &TypeFilter::new("IfcProduct"))
}

/// Storey → entity type → count, over all products.
#[must_use]
pub fn objects_by_storey(graph: &ModelGraph) -> BTreeMap<String, BTreeMap<String, usize>> {
    let resolver = SpatialResolver::new(graph);
    let products: Vec<&Element> = graph.products().collect();
    let pairs = tally(&products, |e| {
        Some((resolver.resolve_storey(e.id), e.entity_type.clone()))
    });

    let mut by_storey: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
    for ((storey, entity_type), count) in pairs {
        by_storey.entry(storey).or_default().insert(entity_type, count);
    }
    by_storey
}

/// Storey with the most elements of a type, or of any product when no
/// filter is given. Ties go to the alphabetically first storey name.
#[must_use]
pub fn floor_with_highest_density(
    graph: &ModelGraph,
    filter: Option<&TypeFilter>,
) -> Option<(String, usize)> {
    let counts = match filter {
        Some(filter) => count_by_type_and_storey(graph, filter),
        None => count_elements_per_floor(graph),
    };

    // BTreeMap order is by name, so the first maximum is the tie winner
    counts
        .into_iter()
        .fold(None, |best: Option<(String, usize)>, (storey, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((storey, count)),
        })
}

/// Distinct entity types of all products, sorted.
#[must_use]
pub fn available_element_types(graph: &ModelGraph) -> Vec<String> {
    graph
        .products()
        .map(|e| e.entity_type.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Every storey with the number of products resolving to it, bottom-up.
#[must_use]
pub fn all_storeys(graph: &ModelGraph) -> Vec<Storey> {
    let resolver = SpatialResolver::new(graph);
    let products: Vec<&Element> = graph.products().collect();
    let per_storey = tally(&products, |e| resolver.resolve_storey_id(e.id));

    let mut storeys: Vec<Storey> = graph
        .elements_of_kind(EntityKind::Storey)
        .map(|storey| Storey {
            id: storey.id,
            name: display_name(storey),
            elevation: storey.elevation,
            element_count: per_storey.get(&storey.id).copied().unwrap_or(0),
        })
        .collect();

    sort_storeys(&mut storeys);
    storeys
}

/// Orders a storey-keyed result bottom-up. Keys that are not a storey
/// name, such as `Unassigned`, sort last.
#[must_use]
pub fn sort_by_storey_elevation<V: Clone>(
    graph: &ModelGraph,
    data: &BTreeMap<String, V>,
) -> Vec<(String, V)> {
    let elevations: HashMap<String, Option<f64>> = graph
        .elements_of_kind(EntityKind::Storey)
        .map(|storey| (display_name(storey), storey.elevation))
        .collect();

    let mut rows: Vec<(String, V, Option<f64>)> = data
        .iter()
        .map(|(name, value)| {
            let elevation = elevations.get(name).copied().flatten();
            (name.clone(), value.clone(), elevation)
        })
        .collect();
    rows.sort_by(|a, b| elevation_order(a.2, b.2));

    rows.into_iter().map(|(name, value, _)| (name, value)).collect()
}

/// Counts of the common object types. A supertype count includes its
/// subtypes, so walls are counted under both `IFCWALL` and
/// `IFCWALLSTANDARDCASE`.
#[must_use]
pub fn type_counts(graph: &ModelGraph) -> TypeSummary {
    let counts: Vec<(String, usize)> = SUMMARY_TYPES
        .iter()
        .map(|name| {
            let filter = TypeFilter::new(name);
            (filter.name().to_string(), count_by_type_total(graph, &filter))
        })
        .filter(|(_, count)| *count > 0)
        .collect();

    TypeSummary {
        total_counted: counts.iter().map(|(_, count)| count).sum(),
        counts,
        building_elements: count_by_type_total(graph, &TypeFilter::new("IfcBuildingElement")),
        products: graph.products().count(),
    }
}
