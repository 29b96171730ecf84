//! Read-only, in-memory model graph.
//!
//! Every relationship entity of the file is folded into typed, directed
//! edges stored on the element they start from. Edge lists keep file
//! order, which is what makes "first match wins" resolution deterministic.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::element::{Element, EntityKind};
use super::project::ProjectInfo;
use super::property::{ElementQuantity, PropertyDefinition, PropertySet};

/// Directed relationship kinds, named from the element they start at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EdgeKind {
    /// element → spatial structure it is placed in
    ContainedIn,
    /// element → spatial structure it is associated with
    ReferencedIn,
    /// part → aggregate
    Decomposes,
    /// filler (door, window) → opening
    FillsVoid,
    /// opening → host element
    VoidsElement,
    /// element → type object
    TypedBy,
    /// element → property set or element quantity
    DefinedBy,
    /// element → group, system or circuit
    GroupedIn,
}

/// Read access to a model graph, the seam between resolution and storage.
pub trait ModelView {
    fn element(&self, id: u64) -> Option<&Element>;

    /// Targets of the edges of `kind` leaving `id`, in file order.
    fn edges(&self, id: u64, kind: EdgeKind) -> &[u64];
}

#[derive(Debug, Default, Clone)]
struct Relations {
    contained_in: Vec<u64>,
    referenced_in: Vec<u64>,
    decomposes: Vec<u64>,
    fills_void: Vec<u64>,
    voids_element: Vec<u64>,
    typed_by: Vec<u64>,
    defined_by: Vec<u64>,
    grouped_in: Vec<u64>,
}

impl Relations {
    fn get(&self, kind: EdgeKind) -> &[u64] {
        match kind {
            EdgeKind::ContainedIn => &self.contained_in,
            EdgeKind::ReferencedIn => &self.referenced_in,
            EdgeKind::Decomposes => &self.decomposes,
            EdgeKind::FillsVoid => &self.fills_void,
            EdgeKind::VoidsElement => &self.voids_element,
            EdgeKind::TypedBy => &self.typed_by,
            EdgeKind::DefinedBy => &self.defined_by,
            EdgeKind::GroupedIn => &self.grouped_in,
        }
    }

    fn get_mut(&mut self, kind: EdgeKind) -> &mut Vec<u64> {
        match kind {
            EdgeKind::ContainedIn => &mut self.contained_in,
            EdgeKind::ReferencedIn => &mut self.referenced_in,
            EdgeKind::Decomposes => &mut self.decomposes,
            EdgeKind::FillsVoid => &mut self.fills_void,
            EdgeKind::VoidsElement => &mut self.voids_element,
            EdgeKind::TypedBy => &mut self.typed_by,
            EdgeKind::DefinedBy => &mut self.defined_by,
            EdgeKind::GroupedIn => &mut self.grouped_in,
        }
    }
}

#[derive(Debug, Default)]
pub struct ModelGraph {
    pub project: ProjectInfo,
    elements: BTreeMap<u64, Element>,
    relations: HashMap<u64, Relations>,
    group_members: HashMap<u64, Vec<u64>>,
    property_sets: HashMap<u64, PropertySet>,
    quantity_sets: HashMap<u64, ElementQuantity>,
}

impl ModelGraph {
    #[must_use]
    pub fn new(project: ProjectInfo) -> Self {
        Self {
            project,
            ..Self::default()
        }
    }

    pub fn insert_element(&mut self, element: Element) {
        self.elements.insert(element.id, element);
    }

    /// Adds a directed edge. Group membership is indexed both ways.
    pub fn add_edge(&mut self, from: u64, kind: EdgeKind, to: u64) {
        self.relations.entry(from).or_default().get_mut(kind).push(to);
        if kind == EdgeKind::GroupedIn {
            self.group_members.entry(to).or_default().push(from);
        }
    }

    pub fn insert_property_set(&mut self, set: PropertySet) {
        self.property_sets.insert(set.id, set);
    }

    pub fn insert_quantity_set(&mut self, set: ElementQuantity) {
        self.quantity_sets.insert(set.id, set);
    }

    /// All elements ordered by id.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    pub fn elements_of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &Element> {
        self.elements.values().filter(move |e| e.kind == kind)
    }

    /// Every element an `IfcProduct` query covers.
    pub fn products(&self) -> impl Iterator<Item = &Element> {
        self.elements.values().filter(|e| e.kind.is_product())
    }

    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Members of a group, system or circuit, in file order.
    #[must_use]
    pub fn group_members(&self, group_id: u64) -> &[u64] {
        self.group_members
            .get(&group_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First type object assigned to the element.
    #[must_use]
    pub fn type_object(&self, id: u64) -> Option<&Element> {
        self.edges(id, EdgeKind::TypedBy)
            .iter()
            .find_map(|type_id| self.element(*type_id))
    }

    /// Property sets and quantity sets attached to the element, in file order.
    pub fn property_definitions(&self, id: u64) -> impl Iterator<Item = PropertyDefinition<'_>> {
        self.edges(id, EdgeKind::DefinedBy).iter().filter_map(|def_id| {
            self.property_sets
                .get(def_id)
                .map(PropertyDefinition::Properties)
                .or_else(|| self.quantity_sets.get(def_id).map(PropertyDefinition::Quantities))
        })
    }
}

impl ModelView for ModelGraph {
    fn element(&self, id: u64) -> Option<&Element> {
        self.elements.get(&id)
    }

    fn edges(&self, id: u64, kind: EdgeKind) -> &[u64] {
        self.relations
            .get(&id)
            .map(|r| r.get(kind))
            .unwrap_or(&[])
    }
}
