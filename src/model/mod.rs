pub mod element;
pub mod graph;
pub mod project;
pub mod property;

pub use element::{Element, EntityKind};
pub use graph::{EdgeKind, ModelGraph, ModelView};
pub use project::{sort_storeys, ProjectInfo, Storey};
pub use property::{
    ElementQuantity, Property, PropertyDefinition, PropertySet, PropertyValue, Quantity,
    QuantityKind,
};
