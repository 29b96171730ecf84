use serde::Serialize;

/// Coarse classification of an IFC entity, derived from its STEP type name.
///
/// The tool carries no schema, so this is a name-based approximation of the
/// IFC inheritance tree that is good enough to tell products, spatial
/// structure, openings, types, groups and relationships apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntityKind {
    Product,
    Storey,
    Space,
    SpatialStructure,
    Opening,
    TypeObject,
    Group,
    Relationship,
    PropertyDefinition,
    Context,
    Other,
}

const SPATIAL_STRUCTURES: &[&str] = &[
    "IFCSITE",
    "IFCBUILDING",
    "IFCFACILITY",
    "IFCFACILITYPART",
    "IFCBRIDGE",
    "IFCBRIDGEPART",
    "IFCROAD",
    "IFCROADPART",
    "IFCRAILWAY",
    "IFCRAILWAYPART",
    "IFCMARINEFACILITY",
    "IFCEXTERNALSPATIALELEMENT",
    "IFCSPATIALZONE",
];

const GROUPS: &[&str] = &[
    "IFCGROUP",
    "IFCSYSTEM",
    "IFCZONE",
    "IFCELECTRICALCIRCUIT",
    "IFCDISTRIBUTIONSYSTEM",
    "IFCDISTRIBUTIONCIRCUIT",
    "IFCBUILDINGSYSTEM",
    "IFCBUILTSYSTEM",
    "IFCSTRUCTURALANALYSISMODEL",
    "IFCSTRUCTURALLOADGROUP",
    "IFCSTRUCTURALLOADCASE",
    "IFCSTRUCTURALRESULTGROUP",
    "IFCINVENTORY",
    "IFCASSET",
];

// IfcRoot subtypes that are neither products nor any other kind above
const NON_PRODUCT_OBJECTS: &[&str] = &[
    "IFCTASK",
    "IFCPROCEDURE",
    "IFCEVENT",
    "IFCACTOR",
    "IFCOCCUPANT",
    "IFCCOSTITEM",
    "IFCCOSTSCHEDULE",
    "IFCWORKPLAN",
    "IFCWORKSCHEDULE",
    "IFCWORKCALENDAR",
    "IFCPERMIT",
    "IFCACTIONREQUEST",
    "IFCPROJECTORDER",
    "IFCPERFORMANCEHISTORY",
    "IFCCONSTRUCTIONEQUIPMENTRESOURCE",
    "IFCCONSTRUCTIONMATERIALRESOURCE",
    "IFCCONSTRUCTIONPRODUCTRESOURCE",
    "IFCLABORRESOURCE",
    "IFCCREWRESOURCE",
    "IFCSUBCONTRACTRESOURCE",
];

// Resource entities whose first attribute is a name, not a GlobalId. A
// 22-character name would otherwise pass for a rooted instance.
const RESOURCE_PREFIXES: &[&str] = &[
    "IFCPROPERTY",
    "IFCQUANTITY",
    "IFCPHYSICAL",
    "IFCMATERIAL",
    "IFCCLASSIFICATION",
    "IFCPRESENTATION",
    "IFCSURFACESTYLE",
    "IFCCURVESTYLE",
    "IFCFILLAREASTYLE",
    "IFCTEXTSTYLE",
    "IFCEXTERNALLYDEFINED",
    "IFCDOCUMENT",
    "IFCLIBRARY",
    "IFCAPPROVAL",
];

const UNIT_RESOURCES: &[&str] = &[
    "IFCUNITASSIGNMENT",
    "IFCMEASUREWITHUNIT",
    "IFCDERIVEDUNITELEMENT",
    "IFCDIMENSIONALEXPONENTS",
];

fn is_resource(entity_type: &str) -> bool {
    RESOURCE_PREFIXES.iter().any(|p| entity_type.starts_with(p))
        || UNIT_RESOURCES.contains(&entity_type)
        || entity_type.ends_with("UNIT")
        || entity_type.ends_with("TIMESERIES")
}

impl EntityKind {
    /// Classifies an upper-case STEP entity name.
    ///
    /// `rooted` tells whether the instance starts with a GlobalId string;
    /// only rooted instances can be products.
    #[must_use]
    pub fn classify(entity_type: &str, rooted: bool) -> Self {
        if !rooted {
            return EntityKind::Other;
        }
        match entity_type {
            "IFCBUILDINGSTOREY" => EntityKind::Storey,
            "IFCSPACE" => EntityKind::Space,
            "IFCOPENINGELEMENT" | "IFCOPENINGSTANDARDCASE" | "IFCVOIDINGFEATURE" => {
                EntityKind::Opening
            }
            "IFCPROJECT" | "IFCPROJECTLIBRARY" => EntityKind::Context,
            "IFCPROPERTYSET" | "IFCELEMENTQUANTITY" => EntityKind::PropertyDefinition,
            t if SPATIAL_STRUCTURES.contains(&t) => EntityKind::SpatialStructure,
            t if GROUPS.contains(&t) => EntityKind::Group,
            t if t.starts_with("IFCREL") => EntityKind::Relationship,
            t if is_resource(t) => EntityKind::Other,
            t if t.ends_with("TYPE") || t.ends_with("STYLE") || t == "IFCTYPEOBJECT" => {
                EntityKind::TypeObject
            }
            t if t.ends_with("PROPERTIES") || t.ends_with("TEMPLATE") => {
                EntityKind::PropertyDefinition
            }
            t if NON_PRODUCT_OBJECTS.contains(&t) => EntityKind::Other,
            _ => EntityKind::Product,
        }
    }

    /// True for everything an `IfcProduct` query would return, including
    /// the spatial structure and openings.
    #[must_use]
    pub fn is_product(self) -> bool {
        matches!(
            self,
            EntityKind::Product
                | EntityKind::Storey
                | EntityKind::Space
                | EntityKind::SpatialStructure
                | EntityKind::Opening
        )
    }
}

/// One IFC entity instance in the model graph.
#[derive(Debug, Clone, Serialize)]
pub struct Element {
    pub id: u64,
    pub entity_type: String,
    pub kind: EntityKind,
    pub global_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub object_type: Option<String>,
    pub long_name: Option<String>,
    /// Storeys only.
    pub elevation: Option<f64>,
}

impl Element {
    #[must_use]
    pub fn new(id: u64, entity_type: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            id,
            entity_type: entity_type.into(),
            kind,
            global_id: None,
            name: None,
            description: None,
            object_type: None,
            long_name: None,
            elevation: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_long_name(mut self, long_name: impl Into<String>) -> Self {
        self.long_name = Some(long_name.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = Some(elevation);
        self
    }

    /// Name, falling back to the long name. Empty strings count as absent.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        non_empty(self.name.as_deref()).or_else(|| non_empty(self.long_name.as_deref()))
    }

    /// Exact type check, accepting both `IfcWall` and `IFCWALL` spellings.
    #[must_use]
    pub fn is_a(&self, entity_type: &str) -> bool {
        self.entity_type.eq_ignore_ascii_case(entity_type)
    }
}

pub(crate) fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_common_entities() {
        assert_eq!(EntityKind::classify("IFCWALL", true), EntityKind::Product);
        assert_eq!(EntityKind::classify("IFCBUILDINGSTOREY", true), EntityKind::Storey);
        assert_eq!(EntityKind::classify("IFCSPACE", true), EntityKind::Space);
        assert_eq!(EntityKind::classify("IFCSITE", true), EntityKind::SpatialStructure);
        assert_eq!(EntityKind::classify("IFCWALLTYPE", true), EntityKind::TypeObject);
        assert_eq!(EntityKind::classify("IFCDOORSTYLE", true), EntityKind::TypeObject);
        assert_eq!(EntityKind::classify("IFCRELAGGREGATES", true), EntityKind::Relationship);
        assert_eq!(EntityKind::classify("IFCELECTRICALCIRCUIT", true), EntityKind::Group);
        assert_eq!(EntityKind::classify("IFCCARTESIANPOINT", false), EntityKind::Other);
        assert_eq!(EntityKind::classify("IFCTASK", true), EntityKind::Other);
    }

    #[test]
    fn named_resources_are_never_products() {
        for resource in [
            "IFCPROPERTYSINGLEVALUE",
            "IFCPROPERTYENUMERATEDVALUE",
            "IFCQUANTITYLENGTH",
            "IFCPHYSICALCOMPLEXQUANTITY",
            "IFCMATERIAL",
            "IFCMATERIALLAYERSET",
            "IFCCLASSIFICATIONREFERENCE",
            "IFCPRESENTATIONLAYERASSIGNMENT",
            "IFCSURFACESTYLE",
            "IFCSIUNIT",
            "IFCCONVERSIONBASEDUNIT",
            "IFCUNITASSIGNMENT",
        ] {
            assert_eq!(EntityKind::classify(resource, true), EntityKind::Other, "{resource}");
        }
        assert_eq!(
            EntityKind::classify("IFCPROPERTYSET", true),
            EntityKind::PropertyDefinition
        );
        assert_eq!(EntityKind::classify("IFCUNITARYEQUIPMENT", true), EntityKind::Product);
    }

    #[test]
    fn label_skips_blank_names() {
        let e = Element::new(7, "IFCSPACE", EntityKind::Space)
            .with_name("  ")
            .with_long_name("Office");
        assert_eq!(e.label(), Some("Office"));
        assert!(e.is_a("IfcSpace"));
    }
}
