//! Aggregate questions over a loaded model.
//!
//! Every aggregation is keyed by a label (storey name, space name, type
//! name), so per-thread partial results merge by plain summation and the
//! outcome does not depend on how rayon splits the work.

pub mod context;
pub mod counts;
pub mod maintenance;
pub mod quantities;
pub mod special;
pub mod systems;
pub mod usage;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hash;
use std::ops::AddAssign;

use rayon::prelude::*;

use crate::model::{Element, EntityKind, ModelGraph};

pub use context::{
    count_elements_by_host_type, count_elements_filtered, count_elements_in_space_type,
    count_elements_per_space, rooms_with_most_devices,
};
pub use counts::{
    all_storeys, available_element_types, count_by_type_and_storey, count_by_type_total,
    count_elements_per_floor, floor_with_highest_density, objects_by_storey,
    sort_by_storey_elevation, type_counts, TypeSummary,
};
pub use maintenance::{count_maintainable_devices, locate_distribution_boards, BoardLocation};
pub use quantities::{
    element_area, element_height, element_length, length_by_storey, length_by_system,
    total_area_by_type, total_length_by_type,
};
pub use special::{
    cable_carriers_detailed, doors_by_wall_type, parapet_channels_by_type,
    parapet_channels_summary, pipe_segments_detailed, CableCarrierReport, ParapetChannel,
    ParapetGroup, ParapetSummary, PipeReport, SegmentGroup, SegmentInfo, TypeTotal,
};
pub use systems::{count_elements_per_circuit, elements_by_system};
pub use usage::{
    area_by_space_type, check_elements_in_all_spaces, count_rooms, elements_per_area,
    net_area_per_storey, SpaceCoverage,
};

/// Supertypes the tool knows the common subtypes of. A filter on the
/// supertype also matches these.
const SUBTYPES: &[(&str, &[&str])] = &[
    ("IFCWALL", &["IFCWALLSTANDARDCASE", "IFCWALLELEMENTEDCASE"]),
    ("IFCSLAB", &["IFCSLABSTANDARDCASE", "IFCSLABELEMENTEDCASE"]),
    ("IFCBEAM", &["IFCBEAMSTANDARDCASE"]),
    ("IFCCOLUMN", &["IFCCOLUMNSTANDARDCASE"]),
    ("IFCMEMBER", &["IFCMEMBERSTANDARDCASE"]),
    ("IFCPLATE", &["IFCPLATESTANDARDCASE"]),
    ("IFCDOOR", &["IFCDOORSTANDARDCASE"]),
    ("IFCWINDOW", &["IFCWINDOWSTANDARDCASE"]),
    ("IFCOPENINGELEMENT", &["IFCOPENINGSTANDARDCASE"]),
    (
        "IFCFLOWSEGMENT",
        &[
            "IFCCABLECARRIERSEGMENT",
            "IFCCABLESEGMENT",
            "IFCPIPESEGMENT",
            "IFCDUCTSEGMENT",
        ],
    ),
    (
        "IFCFLOWFITTING",
        &[
            "IFCCABLECARRIERFITTING",
            "IFCCABLEFITTING",
            "IFCPIPEFITTING",
            "IFCDUCTFITTING",
            "IFCJUNCTIONBOX",
        ],
    ),
    (
        "IFCFLOWTERMINAL",
        &[
            "IFCOUTLET",
            "IFCLAMP",
            "IFCLIGHTFIXTURE",
            "IFCAIRTERMINAL",
            "IFCSANITARYTERMINAL",
            "IFCFIRESUPPRESSIONTERMINAL",
            "IFCELECTRICAPPLIANCE",
            "IFCCOMMUNICATIONSAPPLIANCE",
            "IFCAUDIOVISUALAPPLIANCE",
        ],
    ),
    (
        "IFCFLOWCONTROLLER",
        &[
            "IFCVALVE",
            "IFCDAMPER",
            "IFCSWITCHINGDEVICE",
            "IFCPROTECTIVEDEVICE",
            "IFCELECTRICDISTRIBUTIONBOARD",
            "IFCFLOWMETER",
        ],
    ),
    (
        "IFCSYSTEM",
        &[
            "IFCDISTRIBUTIONSYSTEM",
            "IFCDISTRIBUTIONCIRCUIT",
            "IFCBUILDINGSYSTEM",
            "IFCBUILTSYSTEM",
            "IFCELECTRICALCIRCUIT",
        ],
    ),
    (
        "IFCBUILDINGELEMENT",
        &[
            "IFCWALL",
            "IFCWALLSTANDARDCASE",
            "IFCWALLELEMENTEDCASE",
            "IFCSLAB",
            "IFCSLABSTANDARDCASE",
            "IFCSLABELEMENTEDCASE",
            "IFCBEAM",
            "IFCBEAMSTANDARDCASE",
            "IFCCOLUMN",
            "IFCCOLUMNSTANDARDCASE",
            "IFCMEMBER",
            "IFCMEMBERSTANDARDCASE",
            "IFCPLATE",
            "IFCPLATESTANDARDCASE",
            "IFCDOOR",
            "IFCDOORSTANDARDCASE",
            "IFCWINDOW",
            "IFCWINDOWSTANDARDCASE",
            "IFCSTAIR",
            "IFCSTAIRFLIGHT",
            "IFCRAMP",
            "IFCRAMPFLIGHT",
            "IFCROOF",
            "IFCCOVERING",
            "IFCCURTAINWALL",
            "IFCRAILING",
            "IFCFOOTING",
            "IFCPILE",
            "IFCCHIMNEY",
            "IFCSHADINGDEVICE",
            "IFCBUILDINGELEMENTPROXY",
        ],
    ),
];

/// Entity type filter as typed on the command line.
///
/// Matching is by upper-case STEP name, so `IfcWall` and `IFCWALL` are the
/// same filter. `IfcProduct`, `IfcElement` and `IfcSpatialStructureElement`
/// are answered from the element kind instead of the name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeFilter {
    name: String,
}

impl TypeFilter {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.trim().to_ascii_uppercase(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn matches(&self, element: &Element) -> bool {
        match self.name.as_str() {
            "IFCPRODUCT" => element.kind.is_product(),
            "IFCELEMENT" => matches!(element.kind, EntityKind::Product | EntityKind::Opening),
            "IFCSPATIALSTRUCTUREELEMENT" | "IFCSPATIALELEMENT" => matches!(
                element.kind,
                EntityKind::Storey | EntityKind::Space | EntityKind::SpatialStructure
            ),
            name if element.entity_type == name => true,
            name => SUBTYPES
                .iter()
                .find(|(supertype, _)| *supertype == name)
                .is_some_and(|(_, subtypes)| subtypes.contains(&element.entity_type.as_str())),
        }
    }

    /// Matching elements in id order.
    pub fn select<'g>(&self, graph: &'g ModelGraph) -> Vec<&'g Element> {
        graph.elements().filter(|e| self.matches(e)).collect()
    }
}

impl From<&str> for TypeFilter {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for TypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Case-insensitive substring test used by every name filter.
pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Counts elements per key in parallel. Elements mapped to `None` are
/// left out.
pub(crate) fn tally<'g, K, F>(elements: &[&'g Element], key: F) -> BTreeMap<K, usize>
where
    K: Ord + Hash + Send,
    F: Fn(&'g Element) -> Option<K> + Sync,
{
    group_sum(elements, |element| key(element).map(|k| (k, 1)))
}

/// Sums a per-element value per key in parallel.
pub(crate) fn group_sum<'g, K, V, F>(elements: &[&'g Element], entry: F) -> BTreeMap<K, V>
where
    K: Ord + Hash + Send,
    V: AddAssign + Default + Send,
    F: Fn(&'g Element) -> Option<(K, V)> + Sync,
{
    elements
        .par_iter()
        .fold(HashMap::new, |mut acc: HashMap<K, V>, element| {
            if let Some((key, value)) = entry(*element) {
                *acc.entry(key).or_default() += value;
            }
            acc
        })
        .reduce(HashMap::new, |mut left, right| {
            for (key, value) in right {
                *left.entry(key).or_default() += value;
            }
            left
        })
        .into_iter()
        .collect()
}

#[cfg(test)]
pub(crate) mod fixture {
    //! Small hand-built model shared by the query tests.

    use crate::model::{
        EdgeKind, Element, ElementQuantity, EntityKind, ModelGraph, Property, PropertySet,
        PropertyValue, Quantity, QuantityKind,
    };

    pub fn product(id: u64, entity_type: &str, name: &str) -> Element {
        Element::new(id, entity_type, EntityKind::Product).with_name(name)
    }

    pub fn length_qto(id: u64, length: f64) -> ElementQuantity {
        ElementQuantity {
            id,
            name: "Qto_Common".into(),
            quantities: vec![Quantity {
                name: "Length".into(),
                kind: QuantityKind::Length,
                value: Some(length),
            }],
        }
    }

    pub fn area_qto(id: u64, area: f64) -> ElementQuantity {
        ElementQuantity {
            id,
            name: "Qto_SpaceBaseQuantities".into(),
            quantities: vec![Quantity {
                name: "NetArea".into(),
                kind: QuantityKind::Area,
                value: Some(area),
            }],
        }
    }

    pub fn height_pset(id: u64, height: f64) -> PropertySet {
        PropertySet {
            id,
            name: "Pset_Installation".into(),
            properties: vec![Property {
                name: "Mounting Height".into(),
                value: PropertyValue::Real(height),
            }],
        }
    }

    /// Two storeys (Level 0 at 0.0, Level 1 at 3.0), three spaces and a
    /// mix of walls, doors, outlets and segments.
    ///
    /// | id  | element              | placement                         |
    /// |-----|----------------------|-----------------------------------|
    /// | 1   | storey Level 0       |                                   |
    /// | 2   | storey Level 1       |                                   |
    /// | 10  | space Office 101     | decomposes Level 1, area 20       |
    /// | 11  | space Office 102     | decomposes Level 1, area 30       |
    /// | 12  | space Kitchen        | contained in Level 0, area 10     |
    /// | 20  | wall "GKB 100"       | Level 1                           |
    /// | 21  | wall std case, typed Concrete | Level 0                  |
    /// | 22  | door                 | in wall 20 via opening 30         |
    /// | 23  | door                 | in wall 21 via opening 31         |
    /// | 24  | door                 | no host                           |
    /// | 40  | outlet               | referenced in Office 101          |
    /// | 41  | outlet               | contained in Office 101           |
    /// | 42  | outlet               | contained in Kitchen              |
    /// | 43  | outlet               | unplaced                          |
    /// | 50  | cable carrier "Brüstungskanal" 4.0 m, Level 1, circuit 90 |
    /// | 51  | cable carrier at 1.1 m height, 2.5 m long, circuit 90     |
    /// | 52  | cable carrier plain, 6.0 m, system 91                     |
    /// | 60  | pipe "Kupferrohr" 3.0 m, system 91                        |
    /// | 61  | pipe "PVC Abwasser" 5.0 m                                 |
    /// | 70  | distribution board in Kitchen                             |
    pub fn building() -> ModelGraph {
        let mut g = ModelGraph::default();

        g.insert_element(
            Element::new(1, "IFCBUILDINGSTOREY", EntityKind::Storey)
                .with_name("Level 0")
                .with_elevation(0.0),
        );
        g.insert_element(
            Element::new(2, "IFCBUILDINGSTOREY", EntityKind::Storey)
                .with_name("Level 1")
                .with_elevation(3.0),
        );

        let spaces = [
            (10, "Office 101", 20.0),
            (11, "Office 102", 30.0),
            (12, "Kitchen", 10.0),
        ];
        for (id, name, area) in spaces {
            g.insert_element(Element::new(id, "IFCSPACE", EntityKind::Space).with_name(name));
            g.insert_quantity_set(area_qto(id + 900, area));
            g.add_edge(id, EdgeKind::DefinedBy, id + 900);
        }
        g.add_edge(10, EdgeKind::Decomposes, 2);
        g.add_edge(11, EdgeKind::Decomposes, 2);
        g.add_edge(12, EdgeKind::ContainedIn, 1);

        g.insert_element(product(20, "IFCWALL", "GKB 100"));
        g.insert_element(product(21, "IFCWALLSTANDARDCASE", "Wall-021"));
        g.insert_element(
            Element::new(25, "IFCWALLTYPE", EntityKind::TypeObject)
                .with_name("Basic Wall")
                .with_description("Stahlbeton 240"),
        );
        g.add_edge(21, EdgeKind::TypedBy, 25);
        g.add_edge(20, EdgeKind::ContainedIn, 2);
        g.add_edge(21, EdgeKind::ContainedIn, 1);

        g.insert_element(Element::new(30, "IFCOPENINGELEMENT", EntityKind::Opening));
        g.insert_element(Element::new(31, "IFCOPENINGELEMENT", EntityKind::Opening));
        g.add_edge(30, EdgeKind::VoidsElement, 20);
        g.add_edge(31, EdgeKind::VoidsElement, 21);

        for id in [22, 23, 24] {
            g.insert_element(product(id, "IFCDOOR", &format!("Door-{id}")));
            g.add_edge(id, EdgeKind::ContainedIn, 2);
        }
        g.add_edge(22, EdgeKind::FillsVoid, 30);
        g.add_edge(23, EdgeKind::FillsVoid, 31);

        for id in [40, 41, 42, 43] {
            g.insert_element(product(id, "IFCOUTLET", &format!("Outlet-{id}")));
        }
        g.add_edge(40, EdgeKind::ReferencedIn, 10);
        g.add_edge(41, EdgeKind::ContainedIn, 10);
        g.add_edge(42, EdgeKind::ContainedIn, 12);

        g.insert_element(product(50, "IFCCABLECARRIERSEGMENT", "Brüstungskanal BK 60"));
        g.insert_element(product(51, "IFCCABLECARRIERSEGMENT", "Kabeltrasse 100"));
        g.insert_element(product(52, "IFCCABLECARRIERSEGMENT", "Kabeltrasse 300"));
        g.insert_quantity_set(length_qto(150, 4.0));
        g.insert_quantity_set(length_qto(151, 2.5));
        g.insert_quantity_set(length_qto(152, 6.0));
        g.insert_property_set(height_pset(251, 1.1));
        g.add_edge(50, EdgeKind::DefinedBy, 150);
        g.add_edge(51, EdgeKind::DefinedBy, 251);
        g.add_edge(51, EdgeKind::DefinedBy, 151);
        g.add_edge(52, EdgeKind::DefinedBy, 152);
        for id in [50, 51, 52] {
            g.add_edge(id, EdgeKind::ContainedIn, 2);
        }

        g.insert_element(product(60, "IFCPIPESEGMENT", "Kupferrohr 22"));
        g.insert_element(product(61, "IFCPIPESEGMENT", "PVC Abwasser"));
        g.insert_quantity_set(length_qto(160, 3.0));
        g.insert_quantity_set(length_qto(161, 5.0));
        g.add_edge(60, EdgeKind::DefinedBy, 160);
        g.add_edge(61, EdgeKind::DefinedBy, 161);
        g.add_edge(60, EdgeKind::ContainedIn, 1);
        g.add_edge(61, EdgeKind::ContainedIn, 1);

        g.insert_element(product(70, "IFCELECTRICDISTRIBUTIONBOARD", "UV-EG"));
        g.add_edge(70, EdgeKind::ContainedIn, 12);

        g.insert_element(
            Element::new(90, "IFCELECTRICALCIRCUIT", EntityKind::Group).with_name("Circuit A"),
        );
        g.insert_element(
            Element::new(91, "IFCDISTRIBUTIONSYSTEM", EntityKind::Group).with_name("Supply"),
        );
        g.add_edge(50, EdgeKind::GroupedIn, 90);
        g.add_edge(51, EdgeKind::GroupedIn, 90);
        g.add_edge(52, EdgeKind::GroupedIn, 91);
        g.add_edge(60, EdgeKind::GroupedIn, 91);

        g
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn filter_spelling_is_normalized() {
        assert_eq!(TypeFilter::new(" IfcWall ").name(), "IFCWALL");
        assert_eq!(TypeFilter::from("ifcdoor").to_string(), "IFCDOOR");
    }

    #[test]
    fn supertype_filters_include_subtypes() {
        let graph = fixture::building();
        let walls: Vec<u64> = TypeFilter::new("IfcWall")
            .select(&graph)
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(walls, vec![20, 21]);

        let std_case: Vec<u64> = TypeFilter::new("IfcWallStandardCase")
            .select(&graph)
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(std_case, vec![21]);

        assert_eq!(TypeFilter::new("IfcFlowSegment").select(&graph).len(), 5);
    }

    #[test]
    fn product_filter_uses_the_element_kind() {
        let graph = fixture::building();
        let products = TypeFilter::new("IfcProduct").select(&graph);
        assert!(products.iter().all(|e| e.kind.is_product()));
        assert!(products.iter().any(|e| e.id == 1));
        assert!(products.iter().all(|e| e.id != 25 && e.id != 90));
    }

    #[test]
    fn parallel_tally_matches_sequential_count() {
        let graph = fixture::building();
        let elements: Vec<&Element> = graph.elements().collect();
        let counts = tally(&elements, |e| Some(e.entity_type.clone()));

        assert_eq!(counts.values().sum::<usize>(), elements.len());
        assert_eq!(counts.get("IFCOUTLET"), Some(&4));
    }
}
