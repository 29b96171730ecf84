use crate::model::{EntityKind, ModelGraph, Storey};
use crate::query::all_storeys;
use crate::spatial::{display_name, SpatialResolver, UNASSIGNED};
use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{DefaultTerminal, Frame};
use rayon::prelude::*;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum View {
    Dashboard,
    Instances,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FocusPanel {
    Storeys,
    Types,
    Spaces,
}

/// Storey panel entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoreyFilter {
    All,
    Storey(u64),
    Unassigned,
}

/// Where one product resolved to, computed once when the browser opens.
#[derive(Debug, Clone)]
pub struct Placement {
    pub id: u64,
    pub entity_type: String,
    pub name: String,
    pub storey_id: Option<u64>,
    pub space_id: Option<u64>,
    pub host: Option<String>,
}

/// One row of the instance list.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceRow {
    pub id: u64,
    pub name: String,
    pub storey: String,
    pub space: String,
    pub host: String,
}

pub struct App<'g> {
    pub graph: &'g ModelGraph,
    pub storeys: Vec<Storey>,
    pub placements: Vec<Placement>,
    /// Spaces in id order with the storey each resolves to.
    pub spaces: Vec<(u64, String, Option<u64>)>,
    pub view: View,
    pub focus_panel: FocusPanel,
    /// 0 = All, 1..=storeys = storey, last = Unassigned
    pub selected_storey: usize,
    pub selected_type: usize,
    pub selected_space: usize,
    pub selected_instance: usize,
    pub should_quit: bool,
}

impl<'g> App<'g> {
    #[must_use]
    pub fn new(graph: &'g ModelGraph) -> Self {
        let resolver = SpatialResolver::new(graph);
        let products: Vec<_> = graph.products().collect();

        let placements: Vec<Placement> = products
            .par_iter()
            .map(|element| Placement {
                id: element.id,
                entity_type: element.entity_type.clone(),
                name: display_name(element),
                storey_id: resolver.resolve_storey_id(element.id),
                space_id: resolver.resolve_space(element.id).map(|s| s.id),
                host: resolver.resolve_host(element.id).map(display_name),
            })
            .collect();

        let storeys = all_storeys(graph);

        let spaces = graph
            .elements_of_kind(EntityKind::Space)
            .map(|space| {
                (
                    space.id,
                    display_name(space),
                    resolver.resolve_storey_id(space.id),
                )
            })
            .collect();

        Self {
            graph,
            storeys,
            placements,
            spaces,
            view: View::Dashboard,
            focus_panel: FocusPanel::Storeys,
            selected_storey: 0,
            selected_type: 0,
            selected_space: 0,
            selected_instance: 0,
            should_quit: false,
        }
    }

    pub fn run(mut self, mut terminal: DefaultTerminal) -> Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| self.draw(frame))?;
            self.handle_events()?;
        }
        Ok(())
    }

    fn draw(&self, frame: &mut Frame) {
        match self.view {
            View::Dashboard => super::dashboard::draw_dashboard(frame, self),
            View::Instances => super::dashboard::draw_instances(frame, self),
        }
    }

    fn handle_events(&mut self) -> Result<()> {
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                return Ok(());
            }
            self.handle_key(key.code);
        }
        Ok(())
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        match self.view {
            View::Dashboard => self.handle_dashboard_keys(code),
            View::Instances => self.handle_instance_keys(code),
        }
    }

    fn handle_dashboard_keys(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Up | KeyCode::Char('k') => self.navigate(-1),
            KeyCode::Down | KeyCode::Char('j') => self.navigate(1),
            KeyCode::Left | KeyCode::Char('h') => self.navigate_left(),
            KeyCode::Right | KeyCode::Char('l') => self.navigate_right(),
            KeyCode::Enter if self.focus_panel == FocusPanel::Types => {
                if self.selected_type_name().is_some() {
                    self.selected_instance = 0;
                    self.view = View::Instances;
                }
            }
            _ => {}
        }
    }

    fn handle_instance_keys(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Left | KeyCode::Char('h') => {
                self.view = View::Dashboard;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_instance = self.selected_instance.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let count = self.instance_rows().len();
                if self.selected_instance + 1 < count {
                    self.selected_instance += 1;
                }
            }
            _ => {}
        }
    }

    fn navigate(&mut self, delta: isize) {
        match self.focus_panel {
            FocusPanel::Storeys => {
                let next = step(self.selected_storey, delta, self.storeys.len() + 2);
                if next != self.selected_storey {
                    self.selected_storey = next;
                    self.selected_type = 0;
                    self.selected_space = 0;
                }
            }
            FocusPanel::Types => {
                self.selected_type = step(self.selected_type, delta, self.type_rows().len());
            }
            FocusPanel::Spaces => {
                self.selected_space = step(self.selected_space, delta, self.space_rows().len());
            }
        }
    }

    fn navigate_left(&mut self) {
        self.focus_panel = match self.focus_panel {
            FocusPanel::Spaces => FocusPanel::Types,
            FocusPanel::Types | FocusPanel::Storeys => FocusPanel::Storeys,
        };
    }

    fn navigate_right(&mut self) {
        self.focus_panel = match self.focus_panel {
            FocusPanel::Storeys => FocusPanel::Types,
            FocusPanel::Types | FocusPanel::Spaces => FocusPanel::Spaces,
        };
    }

    #[must_use]
    pub fn storey_filter(&self) -> StoreyFilter {
        match self.selected_storey {
            0 => StoreyFilter::All,
            i if i <= self.storeys.len() => StoreyFilter::Storey(self.storeys[i - 1].id),
            _ => StoreyFilter::Unassigned,
        }
    }

    #[must_use]
    pub fn storey_label(&self) -> String {
        match self.storey_filter() {
            StoreyFilter::All => "All".to_string(),
            StoreyFilter::Storey(id) => self
                .storeys
                .iter()
                .find(|s| s.id == id)
                .map(|s| s.name.clone())
                .unwrap_or_default(),
            StoreyFilter::Unassigned => UNASSIGNED.to_string(),
        }
    }

    fn on_selected_storey(&self, storey_id: Option<u64>) -> bool {
        match self.storey_filter() {
            StoreyFilter::All => true,
            StoreyFilter::Storey(id) => storey_id == Some(id),
            StoreyFilter::Unassigned => storey_id.is_none(),
        }
    }

    /// Products that resolved to no storey.
    #[must_use]
    pub fn unassigned_count(&self) -> usize {
        self.placements.iter().filter(|p| p.storey_id.is_none()).count()
    }

    /// Entity types on the selected storey, most frequent first.
    #[must_use]
    pub fn type_rows(&self) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for placement in self.placements.iter().filter(|p| self.on_selected_storey(p.storey_id)) {
            *counts.entry(placement.entity_type.as_str()).or_insert(0) += 1;
        }

        let mut rows: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(name, count)| (name.to_string(), count))
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        rows
    }

    /// Spaces on the selected storey with the number of products in each.
    #[must_use]
    pub fn space_rows(&self) -> Vec<(String, usize)> {
        let mut per_space: HashMap<u64, usize> = HashMap::new();
        for space_id in self.placements.iter().filter_map(|p| p.space_id) {
            *per_space.entry(space_id).or_insert(0) += 1;
        }

        self.spaces
            .iter()
            .filter(|(_, _, storey_id)| self.on_selected_storey(*storey_id))
            .map(|(id, name, _)| (name.clone(), per_space.get(id).copied().unwrap_or(0)))
            .collect()
    }

    #[must_use]
    pub fn selected_type_name(&self) -> Option<String> {
        self.type_rows()
            .into_iter()
            .nth(self.selected_type)
            .map(|(name, _)| name)
    }

    /// Instances of the selected type on the selected storey.
    #[must_use]
    pub fn instance_rows(&self) -> Vec<InstanceRow> {
        let Some(entity_type) = self.selected_type_name() else {
            return Vec::new();
        };
        let space_names: HashMap<u64, &str> = self
            .spaces
            .iter()
            .map(|(id, name, _)| (*id, name.as_str()))
            .collect();

        self.placements
            .iter()
            .filter(|p| p.entity_type == entity_type && self.on_selected_storey(p.storey_id))
            .map(|p| InstanceRow {
                id: p.id,
                name: p.name.clone(),
                storey: p
                    .storey_id
                    .and_then(|id| self.storeys.iter().find(|s| s.id == id))
                    .map_or_else(|| UNASSIGNED.to_string(), |s| s.name.clone()),
                space: p
                    .space_id
                    .and_then(|id| space_names.get(&id).copied())
                    .unwrap_or("-")
                    .to_string(),
                host: p.host.clone().unwrap_or_else(|| "-".to_string()),
            })
            .collect()
    }
}

fn step(current: usize, delta: isize, len: usize) -> usize {
    current
        .saturating_add_signed(delta)
        .min(len.saturating_sub(1))
}
