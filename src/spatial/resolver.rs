use std::collections::HashSet;

use tracing::trace;

use crate::model::{EdgeKind, Element, EntityKind, ModelView};

/// Storey label for elements no spatial relation leads to.
pub const UNASSIGNED: &str = "Unassigned";

/// Upper bound on space-to-parent hops; real models need two or three.
pub const MAX_SPATIAL_DEPTH: usize = 32;

/// Order in which an element's own edges are tried when looking for a storey.
const STOREY_SEARCH: [EdgeKind; 3] = [
    EdgeKind::ContainedIn,
    EdgeKind::ReferencedIn,
    EdgeKind::Decomposes,
];

/// Order in which a space's edges are tried when looking for its parent.
const SPACE_PARENT_SEARCH: [EdgeKind; 2] = [EdgeKind::ContainedIn, EdgeKind::Decomposes];

/// Order in which an element's edges are tried when looking for its space.
const SPACE_SEARCH: [EdgeKind; 2] = [EdgeKind::ContainedIn, EdgeKind::ReferencedIn];

/// Resolves which storey and space logically contain an element.
///
/// Resolution only reads the graph. Missing edge targets and dangling
/// references make a path yield nothing; they never surface as errors.
pub struct SpatialResolver<'g, M: ModelView + ?Sized> {
    model: &'g M,
}

impl<M: ModelView + ?Sized> Clone for SpatialResolver<'_, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: ModelView + ?Sized> Copy for SpatialResolver<'_, M> {}

impl<'g, M: ModelView + ?Sized> SpatialResolver<'g, M> {
    #[must_use]
    pub fn new(model: &'g M) -> Self {
        Self { model }
    }

    /// Display name of the storey containing `id`, or [`UNASSIGNED`].
    ///
    /// Tries contained-in, then referenced-in, then decomposes edges; the
    /// first edge that reaches a storey wins. A space on the way is followed
    /// up to its own parent storey.
    #[must_use]
    pub fn resolve_storey(&self, id: u64) -> String {
        self.resolve_storey_element(id)
            .map_or_else(|| UNASSIGNED.to_string(), display_name)
    }

    /// Id of the storey containing `id`, for callers joining on elevation.
    #[must_use]
    pub fn resolve_storey_id(&self, id: u64) -> Option<u64> {
        self.resolve_storey_element(id).map(|storey| storey.id)
    }

    /// The storey element containing `id`.
    #[must_use]
    pub fn resolve_storey_element(&self, id: u64) -> Option<&'g Element> {
        let mut visited = HashSet::from([id]);

        let storey = STOREY_SEARCH
            .iter()
            .find_map(|&kind| self.storey_among(id, kind, &mut visited, 0));

        if storey.is_none() {
            trace!(element = id, "no spatial relation resolves to a storey");
        }
        storey
    }

    /// First space among contained-in targets, then referenced-in targets.
    /// Parents of that space are not consulted.
    #[must_use]
    pub fn resolve_space(&self, id: u64) -> Option<&'g Element> {
        SPACE_SEARCH.iter().find_map(|&kind| {
            self.model
                .edges(id, kind)
                .iter()
                .filter_map(|&target| self.model.element(target))
                .find(|target| target.kind == EntityKind::Space)
        })
    }

    /// Host element of a filling element: fills-void → opening → voids → host.
    #[must_use]
    pub fn resolve_host(&self, id: u64) -> Option<&'g Element> {
        self.resolve_host_with_opening(id).map(|(host, _)| host)
    }

    /// Every host reached through any of the element's openings, in edge
    /// order, each host once.
    #[must_use]
    pub fn resolve_hosts(&self, id: u64) -> Vec<&'g Element> {
        let mut hosts: Vec<&'g Element> = Vec::new();
        for &opening_id in self.model.edges(id, EdgeKind::FillsVoid) {
            for &host_id in self.model.edges(opening_id, EdgeKind::VoidsElement) {
                if let Some(host) = self.model.element(host_id) {
                    if !hosts.iter().any(|h| h.id == host.id) {
                        hosts.push(host);
                    }
                }
            }
        }
        hosts
    }

    /// Host element together with the opening it is reached through.
    #[must_use]
    pub fn resolve_host_with_opening(&self, id: u64) -> Option<(&'g Element, &'g Element)> {
        self.model.edges(id, EdgeKind::FillsVoid).iter().find_map(|&opening_id| {
            let opening = self.model.element(opening_id)?;
            self.model
                .edges(opening_id, EdgeKind::VoidsElement)
                .iter()
                .find_map(|&host_id| self.model.element(host_id))
                .map(|host| (host, opening))
        })
    }

    fn storey_among(
        &self,
        id: u64,
        kind: EdgeKind,
        visited: &mut HashSet<u64>,
        depth: usize,
    ) -> Option<&'g Element> {
        for &target_id in self.model.edges(id, kind) {
            let Some(target) = self.model.element(target_id) else {
                trace!(element = id, target = target_id, ?kind, "edge target missing");
                continue;
            };

            match target.kind {
                EntityKind::Storey => return Some(target),
                EntityKind::Space => {
                    if let Some(storey) = self.storey_of_space(target, visited, depth + 1) {
                        return Some(storey);
                    }
                }
                _ => {}
            }
        }
        None
    }

    fn storey_of_space(
        &self,
        space: &'g Element,
        visited: &mut HashSet<u64>,
        depth: usize,
    ) -> Option<&'g Element> {
        if depth > MAX_SPATIAL_DEPTH || !visited.insert(space.id) {
            trace!(space = space.id, depth, "spatial cycle or depth limit reached");
            return None;
        }

        SPACE_PARENT_SEARCH
            .iter()
            .find_map(|&kind| self.storey_among(space.id, kind, visited, depth))
    }
}

/// Non-empty label for any element: name, then long name, then a
/// synthesized `"<Kind> #<id>"` built from the element's own id.
#[must_use]
pub fn display_name(element: &Element) -> String {
    match element.label() {
        Some(label) => label.to_string(),
        None => format!("{} #{}", fallback_prefix(element), element.id),
    }
}

fn fallback_prefix(element: &Element) -> &'static str {
    match element.kind {
        EntityKind::Storey => "Storey",
        EntityKind::Space => "Space",
        EntityKind::Group if element.entity_type.ends_with("CIRCUIT") => "Circuit",
        EntityKind::Group => "System",
        EntityKind::TypeObject => "Type",
        _ => "Element",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelGraph;
    use pretty_assertions::assert_eq;

    fn storey(id: u64, name: &str, elevation: f64) -> Element {
        Element::new(id, "IFCBUILDINGSTOREY", EntityKind::Storey)
            .with_name(name)
            .with_elevation(elevation)
    }

    fn space(id: u64, name: &str) -> Element {
        Element::new(id, "IFCSPACE", EntityKind::Space).with_name(name)
    }

    fn product(id: u64, entity_type: &str, name: &str) -> Element {
        Element::new(id, entity_type, EntityKind::Product).with_name(name)
    }

    /// Level 0 (1), Level 1 (2), Office 101 (10) decomposing into Level 1,
    /// Outlet-7 (20) referenced in Office 101, Proxy-3 (21) unrelated.
    fn office_model() -> ModelGraph {
        let mut graph = ModelGraph::default();
        graph.insert_element(storey(1, "Level 0", 0.0));
        graph.insert_element(storey(2, "Level 1", 3.0));
        graph.insert_element(space(10, "Office 101"));
        graph.insert_element(product(20, "IFCOUTLET", "Outlet-7"));
        graph.insert_element(product(21, "IFCBUILDINGELEMENTPROXY", "Proxy-3"));
        graph.add_edge(10, EdgeKind::Decomposes, 2);
        graph.add_edge(20, EdgeKind::ReferencedIn, 10);
        graph
    }

    #[test]
    fn referenced_outlet_resolves_through_its_space() {
        let graph = office_model();
        let resolver = SpatialResolver::new(&graph);

        assert_eq!(resolver.resolve_storey(20), "Level 1");
        assert_eq!(resolver.resolve_storey_id(20), Some(2));
        assert_eq!(
            resolver.resolve_space(20).map(display_name).as_deref(),
            Some("Office 101")
        );
    }

    #[test]
    fn unrelated_element_is_unassigned() {
        let graph = office_model();
        let resolver = SpatialResolver::new(&graph);

        assert_eq!(resolver.resolve_storey(21), UNASSIGNED);
        assert!(resolver.resolve_space(21).is_none());
        assert!(resolver.resolve_host(21).is_none());
    }

    #[test]
    fn unknown_ids_are_unassigned() {
        let graph = office_model();
        assert_eq!(SpatialResolver::new(&graph).resolve_storey(9999), UNASSIGNED);
    }

    #[test]
    fn direct_containment_beats_reference_and_decomposition() {
        let mut graph = office_model();
        graph.insert_element(product(30, "IFCWALL", "Wall"));
        graph.add_edge(30, EdgeKind::ReferencedIn, 2);
        graph.add_edge(30, EdgeKind::Decomposes, 2);
        graph.add_edge(30, EdgeKind::ContainedIn, 1);

        assert_eq!(SpatialResolver::new(&graph).resolve_storey(30), "Level 0");
    }

    #[test]
    fn reference_beats_decomposition() {
        let mut graph = office_model();
        graph.insert_element(product(30, "IFCSENSOR", "Sensor"));
        graph.add_edge(30, EdgeKind::Decomposes, 1);
        graph.add_edge(30, EdgeKind::ReferencedIn, 2);

        assert_eq!(SpatialResolver::new(&graph).resolve_storey(30), "Level 1");
    }

    #[test]
    fn orphan_space_falls_through_to_unassigned() {
        let mut graph = office_model();
        graph.insert_element(space(11, "Orphan room"));
        graph.insert_element(product(30, "IFCFURNITURE", "Desk"));
        graph.add_edge(30, EdgeKind::ContainedIn, 11);

        let resolver = SpatialResolver::new(&graph);
        assert_eq!(resolver.resolve_storey(30), UNASSIGNED);
        assert_eq!(resolver.resolve_space(30).map(|s| s.id), Some(11));
    }

    #[test]
    fn failed_containment_path_falls_through_to_reference() {
        let mut graph = office_model();
        graph.insert_element(space(11, "Orphan room"));
        graph.insert_element(product(30, "IFCOUTLET", "Outlet"));
        graph.add_edge(30, EdgeKind::ContainedIn, 11);
        graph.add_edge(30, EdgeKind::ReferencedIn, 1);

        assert_eq!(SpatialResolver::new(&graph).resolve_storey(30), "Level 0");
    }

    #[test]
    fn missing_targets_are_skipped() {
        let mut graph = office_model();
        graph.insert_element(product(30, "IFCWALL", "Wall"));
        graph.add_edge(30, EdgeKind::ContainedIn, 404);
        graph.add_edge(30, EdgeKind::ContainedIn, 2);

        assert_eq!(SpatialResolver::new(&graph).resolve_storey(30), "Level 1");
    }

    #[test]
    fn nested_spaces_resolve_to_outer_storey() {
        let mut graph = office_model();
        graph.insert_element(space(11, "Desk area"));
        graph.insert_element(product(30, "IFCLAMP", "Lamp"));
        graph.add_edge(11, EdgeKind::Decomposes, 10);
        graph.add_edge(30, EdgeKind::ContainedIn, 11);

        assert_eq!(SpatialResolver::new(&graph).resolve_storey(30), "Level 1");
    }

    #[test]
    fn cyclic_spaces_terminate() {
        let mut graph = ModelGraph::default();
        graph.insert_element(space(1, "A"));
        graph.insert_element(space(2, "B"));
        graph.insert_element(product(3, "IFCLAMP", "Lamp"));
        graph.add_edge(1, EdgeKind::Decomposes, 2);
        graph.add_edge(2, EdgeKind::ContainedIn, 1);
        graph.add_edge(3, EdgeKind::ContainedIn, 1);
        graph.add_edge(1, EdgeKind::Decomposes, 1);

        let resolver = SpatialResolver::new(&graph);
        assert_eq!(resolver.resolve_storey(3), UNASSIGNED);
        assert_eq!(resolver.resolve_storey(1), UNASSIGNED);
    }

    #[test]
    fn resolution_is_idempotent() {
        let graph = office_model();
        let resolver = SpatialResolver::new(&graph);
        assert_eq!(resolver.resolve_storey(20), resolver.resolve_storey(20));
    }

    #[test]
    fn unnamed_storey_uses_its_own_id() {
        let mut graph = ModelGraph::default();
        graph.insert_element(
            Element::new(77, "IFCBUILDINGSTOREY", EntityKind::Storey)
                .with_name("")
                .with_long_name(""),
        );
        graph.insert_element(storey(78, "Roof", 9.0));
        graph.insert_element(product(5, "IFCSLAB", "Slab"));
        graph.add_edge(5, EdgeKind::ContainedIn, 77);

        assert_eq!(SpatialResolver::new(&graph).resolve_storey(5), "Storey #77");
    }

    #[test]
    fn long_name_is_second_choice() {
        let mut graph = ModelGraph::default();
        graph.insert_element(
            Element::new(1, "IFCBUILDINGSTOREY", EntityKind::Storey).with_long_name("Ground floor"),
        );
        graph.insert_element(product(5, "IFCSLAB", "Slab"));
        graph.add_edge(5, EdgeKind::ContainedIn, 1);

        assert_eq!(SpatialResolver::new(&graph).resolve_storey(5), "Ground floor");
    }

    #[test]
    fn spaces_nested_beyond_the_depth_limit_are_unassigned() {
        let mut graph = office_model();
        let chain = |base: u64, len: u64, graph: &mut ModelGraph| {
            for offset in 0..len {
                let id = base + offset;
                graph.insert_element(space(id, &format!("Zone {id}")));
                if offset + 1 < len {
                    graph.add_edge(id, EdgeKind::Decomposes, id + 1);
                }
            }
            graph.add_edge(base + len - 1, EdgeKind::Decomposes, 1);
        };

        chain(100, 8, &mut graph);
        graph.insert_element(product(30, "IFCLAMP", "Shallow lamp"));
        graph.add_edge(30, EdgeKind::ContainedIn, 100);

        let deep = MAX_SPATIAL_DEPTH as u64 + 8;
        chain(200, deep, &mut graph);
        graph.insert_element(product(31, "IFCLAMP", "Deep lamp"));
        graph.add_edge(31, EdgeKind::ContainedIn, 200);

        let resolver = SpatialResolver::new(&graph);
        assert_eq!(resolver.resolve_storey(30), "Level 0");
        assert_eq!(resolver.resolve_storey(31), UNASSIGNED);
        assert_eq!(resolver.resolve_storey_id(31), None);
    }

    #[test]
    fn every_opening_contributes_a_host() {
        let mut graph = ModelGraph::default();
        graph.insert_element(product(1, "IFCWALL", "Wall"));
        graph.insert_element(product(2, "IFCCURTAINWALL", "Facade"));
        graph.insert_element(Element::new(3, "IFCOPENINGELEMENT", EntityKind::Opening));
        graph.insert_element(Element::new(4, "IFCOPENINGELEMENT", EntityKind::Opening));
        graph.insert_element(Element::new(5, "IFCOPENINGELEMENT", EntityKind::Opening));
        graph.insert_element(product(6, "IFCDOOR", "Door"));
        graph.add_edge(6, EdgeKind::FillsVoid, 3);
        graph.add_edge(6, EdgeKind::FillsVoid, 4);
        graph.add_edge(6, EdgeKind::FillsVoid, 5);
        graph.add_edge(3, EdgeKind::VoidsElement, 1);
        graph.add_edge(4, EdgeKind::VoidsElement, 2);
        graph.add_edge(5, EdgeKind::VoidsElement, 1);

        let resolver = SpatialResolver::new(&graph);
        let hosts: Vec<u64> = resolver.resolve_hosts(6).iter().map(|h| h.id).collect();
        assert_eq!(hosts, vec![1, 2]);
        assert_eq!(resolver.resolve_host(6).map(|h| h.id), Some(1));
        assert!(resolver.resolve_hosts(1).is_empty());
    }

    #[test]
    fn host_requires_the_full_chain() {
        let mut graph = ModelGraph::default();
        graph.insert_element(product(1, "IFCWALL", "Wall"));
        graph.insert_element(Element::new(2, "IFCOPENINGELEMENT", EntityKind::Opening));
        graph.insert_element(product(3, "IFCDOOR", "Door"));
        graph.insert_element(product(4, "IFCDOOR", "Loose door"));
        graph.insert_element(product(5, "IFCWINDOW", "Window"));
        graph.insert_element(Element::new(6, "IFCOPENINGELEMENT", EntityKind::Opening));
        graph.add_edge(3, EdgeKind::FillsVoid, 2);
        graph.add_edge(2, EdgeKind::VoidsElement, 1);
        // window fills an opening that voids nothing
        graph.add_edge(5, EdgeKind::FillsVoid, 6);

        let resolver = SpatialResolver::new(&graph);
        let (host, opening) = resolver.resolve_host_with_opening(3).unwrap();
        assert_eq!((host.id, opening.id), (1, 2));
        assert!(resolver.resolve_host(4).is_none());
        assert!(resolver.resolve_host(5).is_none());
    }

    #[test]
    fn fallback_names_by_kind() {
        let circuit = Element::new(9, "IFCELECTRICALCIRCUIT", EntityKind::Group);
        let system = Element::new(8, "IFCSYSTEM", EntityKind::Group);
        let wall = Element::new(7, "IFCWALL", EntityKind::Product);
        assert_eq!(display_name(&circuit), "Circuit #9");
        assert_eq!(display_name(&system), "System #8");
        assert_eq!(display_name(&wall), "Element #7");
    }
}
