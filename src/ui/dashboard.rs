use crate::ui::app::{App, FocusPanel};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, List, ListItem, Paragraph, Row, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Table,
    },
    Frame,
};

const DARK: Color = Color::Rgb(0x1F, 0x2F, 0x3C);
const SELECT_BG: Color = Color::Rgb(0xC3, 0xD3, 0xE0);
const GREEN: Color = Color::Rgb(0x82, 0x9A, 0x68);
const ORANGE: Color = Color::Rgb(0x9E, 0x68, 0x3C);
const MUTED: Color = Color::Rgb(0x71, 0x65, 0x65);

const HEADER_STYLE: Style = Style::new().fg(DARK).add_modifier(Modifier::BOLD);
const SELECTED_STYLE: Style = Style::new()
    .bg(SELECT_BG)
    .fg(DARK)
    .add_modifier(Modifier::BOLD);

pub fn draw_dashboard(frame: &mut Frame, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Length(3), // Header
        Constraint::Min(10),   // Panels
        Constraint::Length(3), // Footer
    ])
    .split(frame.area());

    draw_header(frame, chunks[0], app);
    draw_panels(frame, chunks[1], app);
    draw_footer(
        frame,
        chunks[2],
        " ←→ Panel | ↑↓ Select | Enter Instances | q Quit ",
    );
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let title = format!(
        " IFC Query | {} | {} | {} storeys | {} products ({} unassigned) ",
        app.graph.project.name,
        app.graph.project.schema,
        app.storeys.len(),
        app.placements.len(),
        app.unassigned_count()
    );

    let header = Paragraph::new(title)
        .style(HEADER_STYLE)
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(header, area);
}

fn draw_panels(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::horizontal([
        Constraint::Percentage(25), // Storeys
        Constraint::Percentage(45), // Types
        Constraint::Percentage(30), // Spaces
    ])
    .split(area);

    draw_storeys(frame, chunks[0], app);
    draw_counts(
        frame,
        chunks[1],
        &format!(" Types on {} ", app.storey_label()),
        &app.type_rows(),
        app.selected_type,
        app.focus_panel == FocusPanel::Types,
    );
    draw_counts(
        frame,
        chunks[2],
        " Spaces ",
        &app.space_rows(),
        app.selected_space,
        app.focus_panel == FocusPanel::Spaces,
    );
}

fn row_style(is_selected: bool, is_focused: bool) -> Style {
    if is_selected && is_focused {
        SELECTED_STYLE
    } else if is_selected {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

fn border_style(is_focused: bool) -> Style {
    if is_focused {
        Style::default().fg(ORANGE)
    } else {
        Style::default()
    }
}

fn draw_storeys(frame: &mut Frame, area: Rect, app: &App) {
    let is_focused = app.focus_panel == FocusPanel::Storeys;

    let mut entries: Vec<(String, String)> = vec![("All".to_string(), String::new())];
    entries.extend(app.storeys.iter().map(|storey| {
        let elevation = storey
            .elevation
            .map(|e| format!(" {e:+.2}"))
            .unwrap_or_default();
        (storey.name.clone(), elevation)
    }));
    entries.push((
        crate::spatial::UNASSIGNED.to_string(),
        format!(" ({})", app.unassigned_count()),
    ));

    let items: Vec<ListItem> = entries
        .into_iter()
        .enumerate()
        .map(|(i, (name, detail))| {
            let is_selected = i == app.selected_storey;
            let marker = if is_selected && is_focused { " ◄" } else { "" };
            ListItem::new(Line::from(vec![
                Span::styled(name, row_style(is_selected, is_focused)),
                Span::styled(detail, Style::default().fg(MUTED)),
                Span::styled(marker, Style::default().fg(ORANGE)),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(format!(" Storeys ({}) ", app.storeys.len()))
            .borders(Borders::ALL)
            .border_style(border_style(is_focused)),
    );

    frame.render_widget(list, area);
}

/// Scrolling two-column table of label and count.
fn draw_counts(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    rows: &[(String, usize)],
    selected: usize,
    is_focused: bool,
) {
    let visible_rows = (area.height as usize).saturating_sub(3);
    let scroll_offset = if selected >= visible_rows {
        selected - visible_rows + 1
    } else {
        0
    };

    let header = Row::new(vec!["Name", "Count"]).style(HEADER_STYLE).height(1);

    let table_rows: Vec<Row> = rows
        .iter()
        .enumerate()
        .skip(scroll_offset)
        .take(visible_rows)
        .map(|(i, (name, count))| {
            Row::new(vec![
                Span::raw(name.clone()),
                Span::styled(count.to_string(), Style::default().fg(GREEN)),
            ])
            .style(row_style(i == selected, is_focused))
        })
        .collect();

    let widths = [Constraint::Percentage(75), Constraint::Percentage(25)];
    let table = Table::new(table_rows, widths).header(header).block(
        Block::default()
            .title(format!("{title}({}) ", rows.len()))
            .borders(Borders::ALL)
            .border_style(border_style(is_focused)),
    );

    frame.render_widget(table, area);
    draw_scrollbar(frame, area, rows.len(), visible_rows, selected);
}

fn draw_scrollbar(frame: &mut Frame, area: Rect, len: usize, visible_rows: usize, position: usize) {
    if len <= visible_rows || area.height < 4 {
        return;
    }

    let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
        .begin_symbol(Some("↑"))
        .end_symbol(Some("↓"));
    let mut scrollbar_state = ScrollbarState::new(len).position(position);

    let scrollbar_area = Rect {
        x: area.x + area.width - 1,
        y: area.y + 2,
        width: 1,
        height: area.height - 3,
    };
    frame.render_stateful_widget(scrollbar, scrollbar_area, &mut scrollbar_state);
}

fn draw_footer(frame: &mut Frame, area: Rect, help: &str) {
    let footer = Paragraph::new(help)
        .style(Style::default().fg(MUTED))
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(footer, area);
}

pub fn draw_instances(frame: &mut Frame, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Length(3), // Header
        Constraint::Min(6),    // Instances
        Constraint::Length(3), // Footer
    ])
    .split(frame.area());

    let type_name = app.selected_type_name().unwrap_or_default();
    let rows = app.instance_rows();

    let header = Paragraph::new(format!(
        " {type_name} on {} | {} instances ",
        app.storey_label(),
        rows.len()
    ))
    .style(HEADER_STYLE)
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, chunks[0]);

    let area = chunks[1];
    let visible_rows = (area.height as usize).saturating_sub(3);
    let scroll_offset = if app.selected_instance >= visible_rows {
        app.selected_instance - visible_rows + 1
    } else {
        0
    };

    let table_rows: Vec<Row> = rows
        .iter()
        .enumerate()
        .skip(scroll_offset)
        .take(visible_rows)
        .map(|(i, row)| {
            Row::new(vec![
                format!("#{}", row.id),
                row.name.clone(),
                row.storey.clone(),
                row.space.clone(),
                row.host.clone(),
            ])
            .style(row_style(i == app.selected_instance, true))
        })
        .collect();

    let widths = [
        Constraint::Length(10),
        Constraint::Percentage(30),
        Constraint::Percentage(20),
        Constraint::Percentage(20),
        Constraint::Percentage(20),
    ];
    let table = Table::new(table_rows, widths)
        .header(Row::new(vec!["Id", "Name", "Storey", "Space", "Host"]).style(HEADER_STYLE))
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(table, area);
    draw_scrollbar(frame, area, rows.len(), visible_rows, app.selected_instance);

    draw_footer(frame, chunks[2], " ↑↓ Select | Esc Back | q Quit ");
}
