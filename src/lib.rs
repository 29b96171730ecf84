//! # IFC Query
//!
//! Answers quantity and location questions about IFC building models.
//!
//! ## Features
//!
//! - Parse IFC files (IFC2x3 and IFC4 schemas) into a typed relationship graph
//! - Resolve the storey, space and host wall of any element
//! - Count, measure and classify elements by type, storey, space and system
//! - Browse storeys interactively in the terminal
//! - Export to CSV and JSON
//!
//! ## Example
//!
//! ```no_run
//! use ifc_query::parser::parse_ifc_file;
//! use ifc_query::spatial::SpatialResolver;
//!
//! let graph = parse_ifc_file("model.ifc").expect("Failed to parse");
//! let resolver = SpatialResolver::new(&graph);
//! for element in graph.products() {
//!     println!("{} -> {}", element.entity_type, resolver.resolve_storey(element.id));
//! }
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod parser;
pub mod query;
pub mod spatial;
pub mod ui;
