//! Heuristic analyses: doors by wall construction, parapet channels, cable
//! carriers and drinking water pipes.

use std::collections::{BTreeMap, HashSet};

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use super::quantities::{element_height, element_length};
use super::{tally, TypeFilter};
use crate::classify::{candidate_texts, classify_by_keyword, matches_any};
use crate::config::QueryConfig;
use crate::model::{Element, ModelGraph};
use crate::spatial::{display_name, SpatialResolver};

/// A cable or pipe run with the measures the reports show.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentInfo {
    pub id: u64,
    pub name: String,
    pub type_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    pub length: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SegmentGroup {
    pub count: usize,
    pub total_length: f64,
    pub items: Vec<SegmentInfo>,
}

impl SegmentGroup {
    fn push(&mut self, info: SegmentInfo) {
        self.count += 1;
        self.total_length += info.length;
        self.items.push(info);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParapetChannel {
    pub id: u64,
    pub name: String,
    pub type_name: Option<String>,
    pub height: Option<f64>,
    pub length: f64,
    pub detected_by_name: bool,
    pub detected_by_height: bool,
}

/// Parapet channels found while searching one configured entity type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParapetGroup {
    pub element_type: String,
    pub channels: Vec<ParapetChannel>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TypeTotal {
    pub count: usize,
    pub total_length: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParapetSummary {
    pub by_type: BTreeMap<String, TypeTotal>,
    pub total_count: usize,
    pub total_length: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CableCarrierReport {
    pub parapet_channels: SegmentGroup,
    pub other_cable_carriers: SegmentGroup,
    pub total_count: usize,
    pub total_length: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipeReport {
    pub drinking_water_pipes: SegmentGroup,
    pub other_pipes: SegmentGroup,
    pub total_count: usize,
    pub total_length: f64,
}

fn type_name(graph: &ModelGraph, element: &Element) -> Option<String> {
    graph
        .type_object(element.id)
        .and_then(|t| t.name.clone())
        .filter(|name| !name.trim().is_empty())
}

/// Doors per construction class of the wall they sit in. Doors without a
/// host are counted under the configured no-host label.
#[must_use]
pub fn doors_by_wall_type(graph: &ModelGraph, config: &QueryConfig) -> BTreeMap<String, usize> {
    let resolver = SpatialResolver::new(graph);
    let counts = tally(&TypeFilter::new("IfcDoor").select(graph), |door| {
        let label = match resolver.resolve_host(door.id) {
            Some(wall) => classify_by_keyword(&candidate_texts(graph, wall), &config.wall_types),
            None => config.no_host_label.as_str(),
        };
        Some(label.to_string())
    });
    debug!(classes = counts.len(), "classified doors by host wall");
    counts
}

/// Name and height tests of the parapet heuristic.
struct ParapetTest {
    name: String,
    type_name: Option<String>,
    height: Option<f64>,
    by_name: bool,
    by_height: bool,
}

impl ParapetTest {
    fn run(graph: &ModelGraph, config: &QueryConfig, element: &Element) -> Self {
        let name = display_name(element);
        let type_name = type_name(graph, element);
        let height = element_height(graph, config, element.id);

        Self {
            by_name: matches_any(
                &[Some(name.as_str()), type_name.as_deref()],
                &config.parapet_keywords,
            ),
            by_height: height.is_some_and(|h| config.is_parapet_height(h)),
            name,
            type_name,
            height,
        }
    }

    fn is_parapet(&self) -> bool {
        self.by_name || self.by_height
    }
}

/// Parapet channels per searched entity type, in configured type order.
///
/// An element is a parapet channel when its name or type name carries a
/// parapet keyword, or when its installation height lies in the parapet
/// window. Supertype searches also return subtypes, so one element may
/// appear under several types.
#[must_use]
pub fn parapet_channels_by_type(graph: &ModelGraph, config: &QueryConfig) -> Vec<ParapetGroup> {
    config
        .parapet_element_types
        .iter()
        .filter_map(|element_type| {
            let filter = TypeFilter::new(element_type);
            let channels: Vec<ParapetChannel> = filter
                .select(graph)
                .par_iter()
                .filter_map(|element| {
                    let test = ParapetTest::run(graph, config, element);
                    test.is_parapet().then(|| ParapetChannel {
                        id: element.id,
                        length: element_length(graph, config, element.id),
                        detected_by_name: test.by_name,
                        detected_by_height: test.by_height,
                        name: test.name,
                        type_name: test.type_name,
                        height: test.height,
                    })
                })
                .collect();

            (!channels.is_empty()).then(|| ParapetGroup {
                element_type: filter.name().to_string(),
                channels,
            })
        })
        .collect()
}

/// Parapet channel counts and lengths. Each element is counted once,
/// under the first type it was found by.
#[must_use]
pub fn parapet_channels_summary(graph: &ModelGraph, config: &QueryConfig) -> ParapetSummary {
    let mut seen = HashSet::new();
    let mut summary = ParapetSummary::default();

    for group in parapet_channels_by_type(graph, config) {
        let mut total = TypeTotal::default();
        for channel in group.channels.iter().filter(|c| seen.insert(c.id)) {
            total.count += 1;
            total.total_length += channel.length;
        }

        if total.count > 0 {
            summary.total_count += total.count;
            summary.total_length += total.total_length;
            summary.by_type.insert(group.element_type, total);
        }
    }
    summary
}

/// All cable carrier segments, split into parapet channels and the rest.
#[must_use]
pub fn cable_carriers_detailed(graph: &ModelGraph, config: &QueryConfig) -> CableCarrierReport {
    let tested: Vec<(bool, SegmentInfo)> = TypeFilter::new("IfcCableCarrierSegment")
        .select(graph)
        .par_iter()
        .map(|element| {
            let test = ParapetTest::run(graph, config, element);
            let is_parapet = test.is_parapet();
            let info = SegmentInfo {
                id: element.id,
                name: test.name,
                type_name: test.type_name,
                height: test.height,
                length: element_length(graph, config, element.id),
            };
            (is_parapet, info)
        })
        .collect();

    let mut report = CableCarrierReport::default();
    for (is_parapet, info) in tested {
        report.total_count += 1;
        report.total_length += info.length;
        if is_parapet {
            report.parapet_channels.push(info);
        } else {
            report.other_cable_carriers.push(info);
        }
    }
    report
}

/// All pipe segments, split by drinking water keywords in the name or
/// type name.
#[must_use]
pub fn pipe_segments_detailed(graph: &ModelGraph, config: &QueryConfig) -> PipeReport {
    let tested: Vec<(bool, SegmentInfo)> = TypeFilter::new("IfcPipeSegment")
        .select(graph)
        .par_iter()
        .map(|element| {
            let name = display_name(element);
            let type_name = type_name(graph, element);
            let drinking = matches_any(
                &[Some(name.as_str()), type_name.as_deref()],
                &config.drinking_water_keywords,
            );
            let info = SegmentInfo {
                id: element.id,
                name,
                type_name,
                height: None,
                length: element_length(graph, config, element.id),
            };
            (drinking, info)
        })
        .collect();

    let mut report = PipeReport::default();
    for (drinking, info) in tested {
        report.total_count += 1;
        report.total_length += info.length;
        if drinking {
            report.drinking_water_pipes.push(info);
        } else {
            report.other_pipes.push(info);
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EdgeKind, EntityKind};
    use crate::query::fixture;
    use pretty_assertions::assert_eq;

    #[test]
    fn doors_grouped_by_wall_construction() {
        let graph = fixture::building();
        assert_eq!(
            doors_by_wall_type(&graph, &QueryConfig::default()),
            BTreeMap::from([
                ("Concrete".to_string(), 1),
                ("GKB".to_string(), 1),
                ("No wall".to_string(), 1),
            ])
        );
    }

    #[test]
    fn door_in_unclassifiable_wall_is_unknown() {
        let mut graph = fixture::building();
        graph.insert_element(fixture::product(26, "IFCWALL", "Wall-026"));
        graph.insert_element(Element::new(32, "IFCOPENINGELEMENT", EntityKind::Opening));
        graph.insert_element(fixture::product(27, "IFCDOORSTANDARDCASE", "Door-27"));
        graph.add_edge(32, EdgeKind::VoidsElement, 26);
        graph.add_edge(27, EdgeKind::FillsVoid, 32);

        let counts = doors_by_wall_type(&graph, &QueryConfig::default());
        assert_eq!(counts.get("Unknown"), Some(&1));
        assert_eq!(counts.values().sum::<usize>(), 4);
    }

    #[test]
    fn parapets_by_name_and_by_height() {
        let graph = fixture::building();
        let groups = parapet_channels_by_type(&graph, &QueryConfig::default());

        let types: Vec<&str> = groups.iter().map(|g| g.element_type.as_str()).collect();
        assert_eq!(types, vec!["IFCCABLECARRIERSEGMENT", "IFCFLOWSEGMENT"]);

        let carriers = &groups[0].channels;
        assert_eq!(carriers.len(), 2);
        assert_eq!(
            carriers[0],
            ParapetChannel {
                id: 50,
                name: "Brüstungskanal BK 60".into(),
                type_name: None,
                height: None,
                length: 4.0,
                detected_by_name: true,
                detected_by_height: false,
            }
        );
        assert_eq!((carriers[1].id, carriers[1].detected_by_height), (51, true));
    }

    #[test]
    fn summary_counts_each_channel_once() {
        let graph = fixture::building();
        let summary = parapet_channels_summary(&graph, &QueryConfig::default());

        assert_eq!(summary.total_count, 2);
        assert_eq!(summary.total_length, 6.5);
        assert_eq!(
            summary.by_type.keys().collect::<Vec<_>>(),
            vec!["IFCCABLECARRIERSEGMENT"]
        );
    }

    #[test]
    fn height_outside_window_is_not_a_parapet() {
        let mut graph = fixture::building();
        graph.insert_property_set(fixture::height_pset(252, 2.4));
        graph.add_edge(52, EdgeKind::DefinedBy, 252);

        let report = cable_carriers_detailed(&graph, &QueryConfig::default());
        assert_eq!(report.parapet_channels.count, 2);
        assert_eq!(report.other_cable_carriers.items[0].height, Some(2.4));
    }

    #[test]
    fn cable_carriers_split_into_parapet_and_other() {
        let graph = fixture::building();
        let report = cable_carriers_detailed(&graph, &QueryConfig::default());

        assert_eq!(report.total_count, 3);
        assert_eq!(report.total_length, 12.5);
        assert_eq!(report.parapet_channels.total_length, 6.5);
        assert_eq!(report.other_cable_carriers.count, 1);
        assert_eq!(report.other_cable_carriers.items[0].id, 52);
    }

    #[test]
    fn pipes_split_by_drinking_water_keywords() {
        let graph = fixture::building();
        let report = pipe_segments_detailed(&graph, &QueryConfig::default());

        assert_eq!(report.total_count, 2);
        assert_eq!(report.drinking_water_pipes.items[0].name, "Kupferrohr 22");
        assert_eq!(report.drinking_water_pipes.total_length, 3.0);
        assert_eq!(report.other_pipes.total_length, 5.0);
    }
}
