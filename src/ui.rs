use crate::app::App;
use crate::map::{class_index, class_thresholds, format_total, MapLayers, CLASS_COUNT};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget},
    Frame,
};

/// Choropleth ramp, lowest class first (YlOrRd in terminal colors).
const CLASS_COLORS: [Color; CLASS_COUNT] = [
    Color::LightYellow,
    Color::Yellow,
    Color::LightRed,
    Color::Red,
    Color::Magenta,
];

const OUTLINE_COLOR: Color = Color::DarkGray;

/// Width of the left column (selector + table) in terminal cells.
pub const SIDE_PANEL_WIDTH: u16 = 36;

/// Map canvas area as (x, y, width, height) in terminal cells for a
/// given terminal size: the right column inside its block border, minus
/// the legend line. `App` uses this to convert mouse coordinates and to
/// size its viewport, so it must mirror the splits in `render`.
pub fn map_canvas_area(term_width: u16, term_height: u16) -> (u16, u16, u16, u16) {
    let dashboard_height = term_height.saturating_sub(1); // status bar
    let x = SIDE_PANEL_WIDTH.saturating_add(1); // block border
    let y = 1;
    let width = term_width.saturating_sub(SIDE_PANEL_WIDTH + 2);
    let height = dashboard_height.saturating_sub(3); // borders + legend
    (x, y, width, height)
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Split into dashboard and status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Dashboard
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    // Left column: selector + table; right column: map
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDE_PANEL_WIDTH), Constraint::Min(24)])
        .split(chunks[0]);

    let selector_height = (app.categories.len() as u16 + 2).min(10);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(selector_height), Constraint::Min(4)])
        .split(columns[0]);

    render_selector(frame, app, left[0]);
    render_table(frame, app, left[1]);
    render_map(frame, app, columns[1]);
    render_status_bar(frame, app, chunks[1]);
}

fn render_selector(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " 범죄 대분류 ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let lines: Vec<Line> = app
        .categories
        .iter()
        .enumerate()
        .map(|(i, category)| {
            if i == app.selected {
                Line::from(Span::styled(
                    format!("▶ {category}"),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(Span::styled(
                    format!("  {category}"),
                    Style::default().fg(Color::Gray),
                ))
            }
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!(" {} - 지역별 총 범죄 건수 ", app.selected_category());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let header = Row::new([Cell::from("지역"), Cell::from("총 범죄 건수")])
        .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD));

    let max_total = app.summary.iter().map(|d| d.total).fold(0.0_f64, f64::max);

    let rows: Vec<Row> = app
        .table_rows()
        .into_iter()
        .map(|district| {
            let color = CLASS_COLORS[class_index(district.total, max_total)];
            Row::new([
                Cell::from(district.name.clone()),
                Cell::from(Span::styled(
                    format_total(district.total),
                    Style::default().fg(color),
                )),
            ])
        })
        .collect();

    let table = Table::new(rows, [Constraint::Percentage(55), Constraint::Percentage(45)])
        .header(header)
        .block(block)
        .column_spacing(1);

    frame.render_widget(table, area);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " 서울 지역별 범죄 발생 지도 ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(renderer) = &app.map_renderer else {
        // Boundary data unavailable: the table stands alone.
        let notice = Paragraph::new(
            "경계 GeoJSON 데이터를 불러올 수 없어\n지도를 표시할 수 없습니다.",
        )
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
        frame.render_widget(notice, inner);
        return;
    };

    // Reserve one line for the legend
    let map_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(inner);
    let map_area = map_chunks[0];

    // Braille gives 2x4 resolution per character
    let mut viewport = app.viewport.clone();
    viewport.width = map_area.width as usize * 2;
    viewport.height = map_area.height as usize * 4;

    let layers = renderer.render(
        map_area.width as usize,
        map_area.height as usize,
        &viewport,
        &app.summary,
    );

    frame.render_widget(
        MapWidget {
            layers,
            inner_width: map_area.width,
            inner_height: map_area.height,
        },
        map_area,
    );

    render_legend(frame, app, map_chunks[1]);
}

fn render_legend(frame: &mut Frame, app: &App, area: Rect) {
    let max_total = app.summary.iter().map(|d| d.total).fold(0.0_f64, f64::max);
    let bounds = class_thresholds(max_total);

    let mut spans = vec![Span::styled(" 건수: ", Style::default().fg(Color::DarkGray))];
    for (i, bound) in bounds.iter().enumerate() {
        spans.push(Span::styled("■", Style::default().fg(CLASS_COLORS[i])));
        spans.push(Span::styled(
            format!("≤{} ", format_total(*bound)),
            Style::default().fg(Color::Gray),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Custom widget that paints each choropleth class canvas in its ramp
/// color, the outlines on top, then district labels.
struct MapWidget {
    layers: MapLayers,
    inner_width: u16,
    inner_height: u16,
}

impl MapWidget {
    /// Render a braille canvas layer with a specific color
    fn render_layer(
        &self,
        canvas: &crate::braille::BrailleCanvas,
        color: Color,
        area: Rect,
        buf: &mut Buffer,
    ) {
        for (row_idx, row_str) in canvas.rows().enumerate() {
            if row_idx >= area.height as usize {
                break;
            }
            let y = area.y + row_idx as u16;

            for (col_idx, ch) in row_str.chars().enumerate() {
                if col_idx >= area.width as usize {
                    break;
                }
                // Skip empty braille characters (U+2800)
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
        // Fill layers back to front, lowest class first
        for (canvas, color) in self.layers.fills.iter().zip(CLASS_COLORS) {
            self.render_layer(canvas, color, area, buf);
        }

        // District outlines on top
        self.render_layer(&self.layers.outlines, OUTLINE_COLOR, area, buf);

        // District name labels
        let label_style = Style::default().fg(Color::White);
        for (lx, ly, text) in &self.layers.labels {
            if *ly >= self.inner_height || *lx >= self.inner_width {
                continue;
            }

            let x = area.x + *lx;
            let y = area.y + *ly;

            let max_len = (self.inner_width.saturating_sub(*lx)) as usize;
            let display_text: String = text.chars().take(max_len.min(18)).collect();

            for (i, ch) in display_text.chars().enumerate() {
                let px = x + i as u16;
                if px < area.x + area.width {
                    buf[(px, y)].set_char(ch).set_style(label_style);
                }
            }
        }
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let sort_label = if app.sort_descending { "내림차순" } else { "오름차순" };
    let map_label = if app.map_renderer.is_some() {
        Span::styled("지도: 표시 ", Style::default().fg(Color::Green))
    } else {
        Span::styled("지도: 없음 ", Style::default().fg(Color::DarkGray))
    };

    let status = Line::from(vec![
        Span::styled(" 분류: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            app.selected_category().to_string(),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(" | 정렬: ", Style::default().fg(Color::DarkGray)),
        Span::styled(sort_label, Style::default().fg(Color::Cyan)),
        Span::styled(" | ", Style::default().fg(Color::DarkGray)),
        map_label,
        Span::styled("| 확대: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Magenta)),
        Span::styled(
            " | Tab:분류 s:정렬 hjkl:이동 +/-:확대 r:초기화 q:종료",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(status), area);
}
