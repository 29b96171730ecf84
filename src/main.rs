use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use color_eyre::Result;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ifc_query::config::QueryConfig;
use ifc_query::export::{export_csv, export_json, model_report};
use ifc_query::model::ModelGraph;
use ifc_query::parser::parse_ifc_file;
use ifc_query::query::{self, TypeFilter};
use ifc_query::ui::App;

#[derive(Parser, Debug)]
#[command(name = "ifc-query")]
#[command(about = "IFC Query - resolve storeys and spaces, count and classify building elements")]
#[command(version)]
struct Args {
    /// Path to IFC file
    file: PathBuf,

    /// JSON file overriding keyword lists and thresholds
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Project info and counts of common object types
    Summary,
    /// Storeys bottom-up with their product counts
    Storeys,
    /// Distinct entity types of all products
    Types,
    /// Count elements of a type, in total or per storey
    Count {
        #[arg(short = 't', long = "type")]
        element_type: String,
        #[arg(long)]
        by_storey: bool,
    },
    /// Elements per floor and the densest floor
    Floors {
        #[arg(short = 't', long = "type")]
        element_type: Option<String>,
    },
    /// Elements of a type per space
    Spaces {
        #[arg(short = 't', long = "type")]
        element_type: String,
    },
    /// Elements of a type hosted by elements of another type
    Hosts {
        #[arg(short = 't', long = "type")]
        element_type: String,
        #[arg(long)]
        host: String,
    },
    /// Total length of a linear element type
    Length {
        #[arg(short = 't', long = "type")]
        element_type: String,
        #[arg(long, value_enum)]
        by: Option<LengthGrouping>,
    },
    /// Area of an element type, of named spaces, or of spaces per storey
    Area {
        #[arg(short = 't', long = "type", conflicts_with = "space")]
        element_type: Option<String>,
        #[arg(long)]
        space: Option<String>,
    },
    /// Product types per system
    Systems {
        #[arg(long)]
        name: Option<String>,
    },
    /// Elements of a type per electrical circuit
    Circuits {
        #[arg(short = 't', long = "type")]
        element_type: String,
    },
    /// Room count, or rooms ranked by device count
    Rooms {
        /// Rank rooms by elements of these types
        #[arg(long, num_args = 1..)]
        devices: Vec<String>,
    },
    /// Check that every space of a kind holds an element of a type
    Coverage {
        #[arg(short = 't', long = "type")]
        element_type: String,
        #[arg(long)]
        space: String,
    },
    /// Elements of a type per square metre of a space kind
    Density {
        #[arg(short = 't', long = "type")]
        element_type: String,
        #[arg(long)]
        space: String,
    },
    /// Distribution board locations and maintainable device count
    Boards,
    /// Count elements of a type filtered by storey and space name
    Filter {
        #[arg(short = 't', long = "type")]
        element_type: String,
        #[arg(long)]
        storey: Option<String>,
        #[arg(long)]
        space: Option<String>,
    },
    /// Doors per construction class of their host wall
    Doors,
    /// Parapet channels by searched type with a deduplicated summary
    Parapets,
    /// Cable carrier segments split into parapet channels and others
    CableCarriers,
    /// Pipe segments split into drinking water and other pipes
    Pipes,
    /// Write the element table as CSV and/or the model report as JSON
    #[command(group(ArgGroup::new("target").required(true).multiple(true).args(["csv", "report"])))]
    Export {
        #[arg(long, value_name = "FILE")]
        csv: Option<PathBuf>,
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },
    /// Interactive storey browser
    Browse,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum LengthGrouping {
    Storey,
    System,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ifc_query={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = QueryConfig::load_or_default(args.config.as_deref())?;
    let graph = parse_ifc_file(&args.file)?;
    info!(elements = graph.element_count(), "model ready");

    if matches!(args.command, Command::Browse) {
        let terminal = ratatui::init();
        let result = App::new(&graph).run(terminal);
        ratatui::restore();
        return result;
    }

    run(&args.command, &graph, &config, args.json)
}

fn run(command: &Command, graph: &ModelGraph, config: &QueryConfig, json: bool) -> Result<()> {
    let out = Output { json };

    match command {
        Command::Summary => {
            let summary = query::type_counts(graph);
            out.emit(&(&graph.project, &summary), |_| {
                println!("Project:     {}", graph.project.name);
                if let Some(description) = &graph.project.description {
                    println!("Description: {description}");
                }
                println!("Schema:      {}", graph.project.schema);
                println!();
                for (name, count) in &summary.counts {
                    println!("  {name:30} {count:>6}");
                }
                println!();
                println!("  {:30} {:>6}", "Total building elements", summary.building_elements);
                println!("  {:30} {:>6}", "Total products", summary.products);
                println!("  {:30} {:>6}", "Total counted", summary.total_counted);
            })
        }
        Command::Storeys => {
            let storeys = query::all_storeys(graph);
            out.emit(&storeys, |storeys| {
                for storey in storeys {
                    let elevation = storey
                        .elevation
                        .map_or_else(|| "-".to_string(), |e| format!("{e:+.2}"));
                    println!("  {:30} {elevation:>10} {:>6}", storey.name, storey.element_count);
                }
            })
        }
        Command::Types => out.emit(&query::available_element_types(graph), |types| {
            for name in types {
                println!("  {name}");
            }
        }),
        Command::Count {
            element_type,
            by_storey,
        } => {
            let filter = TypeFilter::new(element_type);
            if *by_storey {
                let counts = query::count_by_type_and_storey(graph, &filter);
                out.emit_counts(&query::sort_by_storey_elevation(graph, &counts))
            } else {
                let total = query::count_by_type_total(graph, &filter);
                out.emit(&total, |total| println!("{filter}: {total}"))
            }
        }
        Command::Floors { element_type } => {
            let filter = element_type.as_deref().map(TypeFilter::new);
            let counts = match &filter {
                Some(filter) => query::count_by_type_and_storey(graph, filter),
                None => query::count_elements_per_floor(graph),
            };
            let densest = query::floor_with_highest_density(graph, filter.as_ref());
            let rows = query::sort_by_storey_elevation(graph, &counts);
            out.emit(&(&rows, &densest), |_| {
                print_counts(&rows);
                if let Some((storey, count)) = &densest {
                    println!();
                    println!("Highest density: {storey} ({count})");
                }
            })
        }
        Command::Spaces { element_type } => {
            let counts = query::count_elements_per_space(graph, &TypeFilter::new(element_type));
            out.emit_counts(&counts.into_iter().collect::<Vec<_>>())
        }
        Command::Hosts { element_type, host } => {
            let count = query::count_elements_by_host_type(
                graph,
                &TypeFilter::new(element_type),
                &TypeFilter::new(host),
            );
            out.emit(&count, |count| println!("{element_type} in {host}: {count}"))
        }
        Command::Length { element_type, by } => {
            let filter = TypeFilter::new(element_type);
            match by {
                Some(LengthGrouping::Storey) => {
                    let lengths = query::length_by_storey(graph, config, &filter);
                    out.emit_lengths(&query::sort_by_storey_elevation(graph, &lengths))
                }
                Some(LengthGrouping::System) => {
                    let lengths = query::length_by_system(graph, config, &filter);
                    out.emit_lengths(&lengths.into_iter().collect::<Vec<_>>())
                }
                None => {
                    let total = query::total_length_by_type(graph, config, &filter);
                    out.emit(&total, |total| println!("{filter}: {total:.2}"))
                }
            }
        }
        Command::Area {
            element_type,
            space,
        } => match (element_type, space) {
            (Some(element_type), _) => {
                let filter = TypeFilter::new(element_type);
                let total = query::total_area_by_type(graph, config, &filter);
                out.emit(&total, |total| println!("{filter}: {total:.2}"))
            }
            (None, Some(space)) => {
                let total = query::area_by_space_type(graph, config, space);
                out.emit(&total, |total| println!("Spaces matching '{space}': {total:.2}"))
            }
            (None, None) => {
                let areas = query::net_area_per_storey(graph, config);
                out.emit_lengths(&query::sort_by_storey_elevation(graph, &areas))
            }
        },
        Command::Systems { name } => {
            let systems = query::elements_by_system(graph, name.as_deref());
            out.emit(&systems, |systems| {
                for (system, types) in systems {
                    println!("{system}");
                    for (entity_type, count) in types {
                        println!("  {entity_type:30} {count:>6}");
                    }
                }
            })
        }
        Command::Circuits { element_type } => {
            let counts = query::count_elements_per_circuit(graph, &TypeFilter::new(element_type));
            out.emit_counts(&counts.into_iter().collect::<Vec<_>>())
        }
        Command::Rooms { devices } => {
            if devices.is_empty() {
                let rooms = query::count_rooms(graph);
                out.emit(&rooms, |rooms| println!("Rooms: {rooms}"))
            } else {
                let filters: Vec<TypeFilter> = devices.iter().map(|d| TypeFilter::new(d)).collect();
                out.emit_counts(&query::rooms_with_most_devices(graph, &filters))
            }
        }
        Command::Coverage {
            element_type,
            space,
        } => {
            let coverage =
                query::check_elements_in_all_spaces(graph, &TypeFilter::new(element_type), space);
            out.emit(&coverage, |c| {
                println!(
                    "{} of {} '{space}' spaces have {element_type} ({} missing)",
                    c.spaces_with_elements, c.total_spaces, c.missing_count
                );
            })
        }
        Command::Density {
            element_type,
            space,
        } => {
            let density =
                query::elements_per_area(graph, config, &TypeFilter::new(element_type), space);
            out.emit(&density, |d| println!("{element_type} per m² in '{space}': {d:.3}"))
        }
        Command::Boards => {
            let boards = query::locate_distribution_boards(graph);
            let maintainable = query::count_maintainable_devices(graph, config);
            out.emit(&(&boards, maintainable), |_| {
                for board in &boards {
                    println!("  {:30} {:20} {}", board.name, board.storey, board.space);
                }
                println!();
                println!("Maintainable devices: {maintainable}");
            })
        }
        Command::Filter {
            element_type,
            storey,
            space,
        } => {
            let count = query::count_elements_filtered(
                graph,
                &TypeFilter::new(element_type),
                storey.as_deref(),
                space.as_deref(),
            );
            out.emit(&count, |count| println!("{element_type}: {count}"))
        }
        Command::Doors => {
            let counts = query::doors_by_wall_type(graph, config);
            out.emit_counts(&counts.into_iter().collect::<Vec<_>>())
        }
        Command::Parapets => {
            let groups = query::parapet_channels_by_type(graph, config);
            let summary = query::parapet_channels_summary(graph, config);
            out.emit(&(&groups, &summary), |_| {
                for group in &groups {
                    println!("{}", group.element_type);
                    for channel in &group.channels {
                        let height = channel
                            .height
                            .map_or_else(|| "-".to_string(), |h| format!("{h:.2}"));
                        println!(
                            "  #{:<8} {:40} h={height:>6} l={:.2}",
                            channel.id, channel.name, channel.length
                        );
                    }
                }
                println!();
                println!(
                    "Parapet channels: {} ({:.2} total length)",
                    summary.total_count, summary.total_length
                );
            })
        }
        Command::CableCarriers => {
            let report = query::cable_carriers_detailed(graph, config);
            out.emit(&report, |r| {
                print_group("Parapet channels", &r.parapet_channels);
                print_group("Other cable carriers", &r.other_cable_carriers);
                println!("Total: {} ({:.2})", r.total_count, r.total_length);
            })
        }
        Command::Pipes => {
            let report = query::pipe_segments_detailed(graph, config);
            out.emit(&report, |r| {
                print_group("Drinking water pipes", &r.drinking_water_pipes);
                print_group("Other pipes", &r.other_pipes);
                println!("Total: {} ({:.2})", r.total_count, r.total_length);
            })
        }
        Command::Export { csv, report } => {
            if let Some(path) = csv {
                export_csv(graph, path)?;
                println!("Exported to CSV: {}", path.display());
            }
            if let Some(path) = report {
                export_json(&model_report(graph), path)?;
                println!("Exported to JSON: {}", path.display());
            }
            Ok(())
        }
        Command::Browse => Ok(()),
    }
}

struct Output {
    json: bool,
}

impl Output {
    fn emit<T: Serialize + ?Sized>(&self, value: &T, render: impl FnOnce(&T)) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            render(value);
        }
        Ok(())
    }

    fn emit_counts(&self, rows: &[(String, usize)]) -> Result<()> {
        self.emit(&rows_to_map(rows), |_| print_counts(rows))
    }

    fn emit_lengths(&self, rows: &[(String, f64)]) -> Result<()> {
        self.emit(&rows_to_map(rows), |_| {
            for (label, value) in rows {
                println!("  {label:30} {value:>10.2}");
            }
        })
    }
}

/// One labelled row; JSON output keeps row order, which a map keyed by
/// label would lose.
#[derive(Serialize)]
struct LabelledValue<'a, V> {
    label: &'a str,
    value: &'a V,
}

fn rows_to_map<V: Serialize>(rows: &[(String, V)]) -> Vec<LabelledValue<'_, V>> {
    rows.iter()
        .map(|(label, value)| LabelledValue { label, value })
        .collect()
}

fn print_counts(rows: &[(String, usize)]) {
    for (label, count) in rows {
        println!("  {label:30} {count:>6}");
    }
}

fn print_group(title: &str, group: &query::SegmentGroup) {
    println!("{title}: {} ({:.2})", group.count, group.total_length);
    for item in &group.items {
        let type_name = item.type_name.as_deref().unwrap_or("-");
        println!("  #{:<8} {:40} {type_name:30} {:.2}", item.id, item.name, item.length);
    }
    println!();
}
