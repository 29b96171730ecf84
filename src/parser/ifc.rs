use crate::error::ParseError;
use crate::model::{
    EdgeKind, Element, ElementQuantity, EntityKind, ModelGraph, ProjectInfo, Property,
    PropertySet, PropertyValue, Quantity, QuantityKind,
};
use crate::parser::step::{StepEntity, StepFile, StepValue};
use std::path::Path;
use tracing::{debug, info};

/// Relationship entities folded into graph edges.
///
/// Each row: entity name, attribute index of the "from" side, attribute
/// index of the "to" side, edge kind. Either side may be a list.
const RELATIONSHIPS: &[(&str, usize, usize, EdgeKind)] = &[
    ("IFCRELCONTAINEDINSPATIALSTRUCTURE", 4, 5, EdgeKind::ContainedIn),
    ("IFCRELREFERENCEDINSPATIALSTRUCTURE", 4, 5, EdgeKind::ReferencedIn),
    // RelatingObject at 4, RelatedObjects at 5: parts point at the whole
    ("IFCRELAGGREGATES", 5, 4, EdgeKind::Decomposes),
    // RelatingOpeningElement at 4, RelatedBuildingElement at 5
    ("IFCRELFILLSELEMENT", 5, 4, EdgeKind::FillsVoid),
    // RelatingBuildingElement at 4, RelatedOpeningElement at 5
    ("IFCRELVOIDSELEMENT", 5, 4, EdgeKind::VoidsElement),
    ("IFCRELDEFINESBYTYPE", 4, 5, EdgeKind::TypedBy),
    ("IFCRELDEFINESBYPROPERTIES", 4, 5, EdgeKind::DefinedBy),
    ("IFCRELASSIGNSTOGROUP", 4, 6, EdgeKind::GroupedIn),
    ("IFCRELASSIGNSTOGROUPBYFACTOR", 4, 6, EdgeKind::GroupedIn),
];

/// Parses an IFC file into a read-only model graph.
///
/// Supports both IFC2x3 and IFC4 schemas. Extracts:
/// - Project metadata (name, description, schema version)
/// - Products, spatial structure, type objects and groups
/// - Containment, reference, aggregation, opening and type relationships
/// - Property sets and element quantities
///
/// # Arguments
///
/// * `path` - Path to the IFC file
///
/// # Errors
///
/// Returns [`ParseError::FileRead`] if the file cannot be read.
/// Returns [`ParseError::InvalidStep`] if the STEP format is malformed.
///
/// # Example
///
/// ```no_run
/// use ifc_query::parser::parse_ifc_file;
///
/// let graph = parse_ifc_file("model.ifc")?;
/// println!("{}: {} entities", graph.project.name, graph.element_count());
/// # Ok::<(), ifc_query::error::ParseError>(())
/// ```
pub fn parse_ifc_file<P: AsRef<Path>>(path: P) -> Result<ModelGraph, ParseError> {
    let bytes = std::fs::read(&path).map_err(|source| ParseError::FileRead {
        path: path.as_ref().to_path_buf(),
        source,
    })?;
    // STEP files are 7-bit by definition; tolerate exporters that ignore that
    let content = String::from_utf8_lossy(&bytes);

    parse_ifc_str(&content, &path.as_ref().to_string_lossy())
}

/// Parses IFC text already held in memory. `file_path` is only recorded.
pub fn parse_ifc_str(content: &str, file_path: &str) -> Result<ModelGraph, ParseError> {
    let step_file = StepFile::parse(content)?;
    Ok(build_graph(&step_file, file_path))
}

/// Builds the model graph from a tokenized STEP file.
#[must_use]
pub fn build_graph(step_file: &StepFile, file_path: &str) -> ModelGraph {
    let mut graph = ModelGraph::new(extract_project_info(step_file, file_path));

    let mut entities: Vec<&StepEntity> = step_file.entities.values().collect();
    entities.sort_by_key(|e| e.id);

    for entity in &entities {
        if let Some(element) = to_element(entity) {
            graph.insert_element(element);
        }
    }

    let mut edge_count = 0usize;
    for entity in &entities {
        edge_count += add_relationship_edges(&mut graph, entity);
    }

    for pset in step_file.get_entities_by_type("IFCPROPERTYSET") {
        graph.insert_property_set(extract_property_set(step_file, pset));
    }
    for qset in step_file.get_entities_by_type("IFCELEMENTQUANTITY") {
        graph.insert_quantity_set(extract_quantity_set(step_file, qset));
    }

    info!(
        schema = %graph.project.schema,
        entities = graph.element_count(),
        storeys = graph.elements_of_kind(EntityKind::Storey).count(),
        spaces = graph.elements_of_kind(EntityKind::Space).count(),
        edges = edge_count,
        "model graph built"
    );

    graph
}

fn extract_project_info(step_file: &StepFile, file_path: &str) -> ProjectInfo {
    let project = step_file.get_entities_by_type("IFCPROJECT").into_iter().next();

    let name = project
        .and_then(|p| p.text(2))
        .map(str::to_string)
        .unwrap_or_else(|| {
            Path::new(file_path)
                .file_name()
                .map_or_else(|| "Unknown Project".to_string(), |n| n.to_string_lossy().to_string())
        });

    ProjectInfo {
        name,
        description: project.and_then(|p| p.text(3)).map(str::to_string),
        schema: step_file.schema.clone(),
        file_path: file_path.to_string(),
    }
}

fn to_element(entity: &StepEntity) -> Option<Element> {
    let global_id = entity
        .value(0)
        .and_then(StepValue::as_str)
        .filter(|g| is_global_id(g));
    let kind = EntityKind::classify(&entity.entity_type, global_id.is_some());

    if matches!(
        kind,
        EntityKind::Other | EntityKind::Relationship | EntityKind::PropertyDefinition
    ) {
        return None;
    }

    let owned = |index: usize| entity.text(index).map(str::to_string);

    let mut element = Element::new(entity.id, entity.entity_type.clone(), kind);
    element.global_id = global_id.map(str::to_string);
    element.name = owned(2);
    element.description = owned(3);

    match kind {
        EntityKind::Storey | EntityKind::Space | EntityKind::SpatialStructure => {
            element.object_type = owned(4);
            element.long_name = owned(7);
        }
        EntityKind::Group | EntityKind::Context => {
            element.object_type = owned(4);
            element.long_name = owned(5);
        }
        EntityKind::Product | EntityKind::Opening => element.object_type = owned(4),
        _ => {}
    }

    if kind == EntityKind::Storey {
        element.elevation = entity.value(9).and_then(StepValue::as_f64);
    }

    Some(element)
}

/// IFC GlobalIds are 22 characters of the IFC base64 alphabet. Checking the
/// shape keeps named resources (properties, materials) out of the element set.
fn is_global_id(s: &str) -> bool {
    s.len() == 22
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'$')
}

fn add_relationship_edges(graph: &mut ModelGraph, entity: &StepEntity) -> usize {
    let Some(&(_, from_index, to_index, kind)) = RELATIONSHIPS
        .iter()
        .find(|(name, ..)| *name == entity.entity_type)
    else {
        return 0;
    };

    let sources = entity.references(from_index);
    // IFC4 allows a set of property definitions on the relating side
    let targets = entity.references(to_index);

    if sources.is_empty() || targets.is_empty() {
        debug!(id = entity.id, entity_type = %entity.entity_type, "relationship without endpoints");
        return 0;
    }

    let mut added = 0;
    for &source in &sources {
        for &target in &targets {
            graph.add_edge(source, kind, target);
            added += 1;
        }
    }
    added
}

fn extract_property_set(step_file: &StepFile, pset: &StepEntity) -> PropertySet {
    let properties = pset
        .references(4)
        .into_iter()
        .filter_map(|prop_id| step_file.get_entity(prop_id))
        .filter_map(|prop| {
            let name = prop.text(0)?.to_string();
            let value = match prop.entity_type.as_str() {
                "IFCPROPERTYSINGLEVALUE" => prop
                    .value(2)
                    .map_or(PropertyValue::Missing, to_property_value),
                "IFCPROPERTYENUMERATEDVALUE" => match prop.value(2) {
                    Some(StepValue::List(items)) => items
                        .first()
                        .map_or(PropertyValue::Missing, to_property_value),
                    other => other.map_or(PropertyValue::Missing, to_property_value),
                },
                _ => return None,
            };
            Some(Property { name, value })
        })
        .collect();

    PropertySet {
        id: pset.id,
        name: pset.text(2).unwrap_or_default().to_string(),
        properties,
    }
}

fn to_property_value(value: &StepValue) -> PropertyValue {
    match value {
        StepValue::String(s) | StepValue::Enum(s) => PropertyValue::Text(s.clone()),
        StepValue::Real(f) => PropertyValue::Real(*f),
        StepValue::Integer(i) => PropertyValue::Integer(*i),
        StepValue::Boolean(b) => PropertyValue::Boolean(*b),
        StepValue::Reference(_) | StepValue::List(_) | StepValue::Null | StepValue::Derived => {
            PropertyValue::Missing
        }
    }
}

fn extract_quantity_set(step_file: &StepFile, qset: &StepEntity) -> ElementQuantity {
    // Name at 2, MethodOfMeasurement at 4, Quantities at 5
    let quantities = qset
        .references(5)
        .into_iter()
        .filter_map(|q_id| step_file.get_entity(q_id))
        .filter_map(|q| {
            Some(Quantity {
                name: q.text(0)?.to_string(),
                kind: QuantityKind::from_entity_type(&q.entity_type),
                value: q.value(3).and_then(StepValue::as_f64),
            })
        })
        .collect();

    ElementQuantity {
        id: qset.id,
        name: qset.text(2).unwrap_or_default().to_string(),
        quantities,
    }
}
