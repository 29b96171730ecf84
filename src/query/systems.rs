//! Grouping by distribution systems and electrical circuits.

use std::collections::BTreeMap;

use super::{contains_ignore_case, TypeFilter};
use crate::model::{Element, EntityKind, ModelGraph, ModelView};
use crate::spatial::display_name;

/// Circuit entities across schema versions.
const CIRCUIT_TYPES: &[&str] = &["IFCELECTRICALCIRCUIT", "IFCDISTRIBUTIONCIRCUIT"];

fn members<'g>(graph: &'g ModelGraph, group: &Element) -> impl Iterator<Item = &'g Element> + 'g {
    graph
        .group_members(group.id)
        .iter()
        .filter_map(move |id| graph.element(*id))
}

/// System display name → product entity type → count. `name` keeps only
/// systems whose display name contains it, case-insensitively. Systems
/// sharing a display name are merged.
#[must_use]
pub fn elements_by_system(
    graph: &ModelGraph,
    name: Option<&str>,
) -> BTreeMap<String, BTreeMap<String, usize>> {
    let systems = TypeFilter::new("IfcSystem");
    let mut result: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();

    for system in graph
        .elements_of_kind(EntityKind::Group)
        .filter(|g| systems.matches(g))
    {
        let system_name = display_name(system);
        if name.is_some_and(|n| !contains_ignore_case(&system_name, n)) {
            continue;
        }

        for member in members(graph, system).filter(|e| e.kind.is_product()) {
            *result
                .entry(system_name.clone())
                .or_default()
                .entry(member.entity_type.clone())
                .or_insert(0) += 1;
        }
    }
    result
}

/// Members of a type per circuit display name. Circuits without a
/// matching member are left out.
#[must_use]
pub fn count_elements_per_circuit(
    graph: &ModelGraph,
    filter: &TypeFilter,
) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();

    for circuit in graph
        .elements_of_kind(EntityKind::Group)
        .filter(|g| CIRCUIT_TYPES.contains(&g.entity_type.as_str()))
    {
        let count = members(graph, circuit).filter(|e| filter.matches(e)).count();
        if count > 0 {
            *counts.entry(display_name(circuit)).or_insert(0) += count;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EdgeKind;
    use crate::query::fixture;
    use pretty_assertions::assert_eq;

    #[test]
    fn systems_list_member_types() {
        let graph = fixture::building();
        let systems = elements_by_system(&graph, None);

        assert_eq!(
            systems["Supply"],
            BTreeMap::from([
                ("IFCCABLECARRIERSEGMENT".to_string(), 1),
                ("IFCPIPESEGMENT".to_string(), 1),
            ])
        );
        assert_eq!(systems["Circuit A"]["IFCCABLECARRIERSEGMENT"], 2);
    }

    #[test]
    fn system_name_filter_is_a_substring_match() {
        let graph = fixture::building();
        let systems = elements_by_system(&graph, Some("supp"));
        assert_eq!(systems.keys().collect::<Vec<_>>(), vec!["Supply"]);
    }

    #[test]
    fn circuits_count_matching_members() {
        let mut graph = fixture::building();
        graph.insert_element(Element::new(92, "IFCELECTRICALCIRCUIT", EntityKind::Group));
        graph.add_edge(40, EdgeKind::GroupedIn, 92);

        let carriers = TypeFilter::new("IfcCableCarrierSegment");
        let segments = count_elements_per_circuit(&graph, &carriers);
        assert_eq!(segments, BTreeMap::from([("Circuit A".to_string(), 2)]));

        let outlets = count_elements_per_circuit(&graph, &TypeFilter::new("IfcOutlet"));
        assert_eq!(outlets, BTreeMap::from([("Circuit #92".to_string(), 1)]));
    }
}
