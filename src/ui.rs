use crate::app::{App, HEADER_ROWS, MAP_WIDTH_PERCENT, STATUS_ROWS};
use crate::braille::BrailleCanvas;
use crate::map::color::bucket_color;
use crate::map::MapLayers;
use crate::web::{format_decimal, format_thousands};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget},
    Frame,
};

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_ROWS), // KPIs
            Constraint::Min(3),              // Map and table
            Constraint::Length(STATUS_ROWS), // Status bar
        ])
        .split(area);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(MAP_WIDTH_PERCENT),
            Constraint::Percentage(100 - MAP_WIDTH_PERCENT),
        ])
        .split(chunks[1]);

    render_kpis(frame, app, chunks[0]);
    render_map(frame, app, body[0]);
    render_table(frame, app, body[1]);
    render_status_bar(frame, app, chunks[2]);
}

fn render_kpis(frame: &mut Frame, app: &App, area: Rect) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3); 3])
        .split(area);

    let summary = &app.current.summary;
    let top = if summary.top_department.is_empty() {
        "-".to_string()
    } else {
        summary.top_department.clone()
    };
    let kpis = [
        ("Total de casos", format_thousands(summary.total)),
        ("Promedio por departamento", format_decimal(summary.mean, 1)),
        ("Departamento con más casos", top),
    ];

    for ((title, value), card) in kpis.into_iter().zip(cards.iter()) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled(format!(" {title} "), Style::default().fg(Color::Gray)));
        let paragraph = Paragraph::new(Span::styled(
            value,
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ))
        .block(block);
        frame.render_widget(paragraph, *card);
    }
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" {} ", app.current.title),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if !app.map_renderer.has_data() {
        let message = Paragraph::new(Span::styled(
            "Sin geometrías para dibujar",
            Style::default().fg(Color::DarkGray),
        ));
        frame.render_widget(message, inner);
        return;
    }

    let mut viewport = app.viewport.clone();
    // Braille gives 2x4 resolution per character
    viewport.width = inner.width as usize * 2;
    viewport.height = inner.height as usize * 4;

    let layers = app.map_renderer.render(
        inner.width as usize,
        inner.height as usize,
        &viewport,
        &app.current.metric,
        app.view_mode,
    );

    let map_widget = MapWidget {
        layers,
        inner_width: inner.width,
        inner_height: inner.height,
    };
    frame.render_widget(map_widget, inner);
}

/// Braille map: one colored canvas per class, outlines above, labels on top
struct MapWidget {
    layers: MapLayers,
    inner_width: u16,
    inner_height: u16,
}

impl MapWidget {
    fn render_layer(&self, canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for (row_idx, row_str) in canvas.rows().enumerate() {
            if row_idx >= area.height as usize {
                break;
            }
            let y = area.y + row_idx as u16;

            for (col_idx, ch) in row_str.chars().enumerate() {
                if col_idx >= area.width as usize {
                    break;
                }
                // Empty braille cell (U+2800) keeps what is underneath
                if ch == '\u{2800}' {
                    continue;
                }
                let x = area.x + col_idx as u16;
                buf[(x, y)].set_char(ch).set_fg(color);
            }
        }
    }
}

impl Widget for MapWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for (class, canvas) in self.layers.classes.iter().enumerate() {
            let (r, g, b) = bucket_color(class);
            self.render_layer(canvas, Color::Rgb(r, g, b), area, buf);
        }

        self.render_layer(&self.layers.outlines, Color::DarkGray, area, buf);

        let label_style = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
        for (lx, ly, text) in &self.layers.labels {
            if *ly >= self.inner_height || *lx >= self.inner_width {
                continue;
            }
            let x = area.x + *lx;
            let y = area.y + *ly;
            let max_len = self.inner_width.saturating_sub(*lx) as usize;
            for (i, ch) in text.chars().take(max_len.min(18)).enumerate() {
                buf[(x + i as u16, y)].set_char(ch).set_style(label_style);
            }
        }
    }
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let schema = app.dashboard.schema();
    let header = Row::new(vec![
        Cell::from(schema.boundary_key.clone()),
        Cell::from("Departamento"),
        Cell::from("Casos"),
    ])
    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));

    let rows = app.current.table.iter().map(|row| {
        Row::new(vec![
            Cell::from(row.code.clone()),
            Cell::from(row.name.clone()),
            Cell::from(Line::from(format_decimal(row.cases, 0)).right_aligned()),
        ])
    });

    let table = Table::new(
        rows,
        [Constraint::Length(10), Constraint::Min(10), Constraint::Length(9)],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled(
                " Tabla de departamentos (Top 10) ",
                Style::default().fg(Color::Cyan),
            )),
    );
    frame.render_widget(table, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let settings = &app.map_renderer.settings;
    let dataset = app.dashboard.dataset();

    let status = Line::from(vec![
        Span::styled(" Año: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.year_label().to_string(), Style::default().fg(Color::Yellow)),
        Span::styled(" Vista: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.view_mode.as_str(), Style::default().fg(Color::Magenta)),
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::styled(" ", Style::default()),
        Span::styled(
            if settings.show_labels { "[L]abels " } else { "[l]abels " },
            Style::default().fg(if settings.show_labels { Color::Green } else { Color::DarkGray }),
        ),
        Span::styled(
            if settings.show_outlines { "[O]utlines " } else { "[o]utlines " },
            Style::default().fg(if settings.show_outlines { Color::Green } else { Color::DarkGray }),
        ),
        Span::styled("| ", Style::default().fg(Color::DarkGray)),
        Span::styled(dataset.provenance.as_str(), Style::default().fg(Color::Cyan)),
        Span::styled(
            " | y:año v:vista hjkl:pan +/-:zoom r:reset q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(status), area);
}
