use serde::Serialize;

/// Value of an `IfcPropertySingleValue`, with the measure wrapper dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Text(String),
    Real(f64),
    Integer(i64),
    Boolean(bool),
    Missing,
}

impl PropertyValue {
    /// Numeric reading of the value. Text is accepted when it parses as a
    /// number, which covers exporters that store measures as labels.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Real(f) => Some(*f),
            PropertyValue::Integer(i) => Some(*i as f64),
            PropertyValue::Text(s) => s.trim().replace(',', ".").parse().ok(),
            PropertyValue::Boolean(_) | PropertyValue::Missing => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Property {
    pub name: String,
    pub value: PropertyValue,
}

#[derive(Debug, Clone, Serialize)]
pub struct PropertySet {
    pub id: u64,
    pub name: String,
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QuantityKind {
    Length,
    Area,
    Volume,
    Count,
    Weight,
    Time,
    Other,
}

impl QuantityKind {
    #[must_use]
    pub fn from_entity_type(entity_type: &str) -> Self {
        match entity_type {
            "IFCQUANTITYLENGTH" => QuantityKind::Length,
            "IFCQUANTITYAREA" => QuantityKind::Area,
            "IFCQUANTITYVOLUME" => QuantityKind::Volume,
            "IFCQUANTITYCOUNT" => QuantityKind::Count,
            "IFCQUANTITYWEIGHT" => QuantityKind::Weight,
            "IFCQUANTITYTIME" => QuantityKind::Time,
            _ => QuantityKind::Other,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Quantity {
    pub name: String,
    pub kind: QuantityKind,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ElementQuantity {
    pub id: u64,
    pub name: String,
    pub quantities: Vec<Quantity>,
}

/// One entry behind an element's `IsDefinedBy` relation.
#[derive(Debug, Clone, Copy)]
pub enum PropertyDefinition<'a> {
    Properties(&'a PropertySet),
    Quantities(&'a ElementQuantity),
}
