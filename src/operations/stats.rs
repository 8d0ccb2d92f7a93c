use crate::models::record::{COL_MONTO, COL_PAIS, COL_TIPO};
use crate::models::table::Table;
use crate::store::SheetStore;
use crate::store::repository;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::{Alignment, Color, Constraint, Direction, Layout, Rect, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::collections::BTreeMap;
use std::io::{self, Write};
use tracing::warn;

pub const NO_DATA: &str = "No hay datos para mostrar.";

const PLAIN_BAR_WIDTH: usize = 40;
const BLANK_LABEL: &str = "(vacío)";

#[derive(Debug, Default, PartialEq)]
pub struct StatsData {
    /// Total Monto per Tipo, in label order.
    pub by_kind: Vec<(String, Decimal)>,
    /// Total Monto per País, largest first.
    pub by_country: Vec<(String, Decimal)>,
    pub total: Decimal,
    /// Rows whose Monto could not be read as a number.
    pub skipped: usize,
}

impl StatsData {
    pub fn is_empty(&self) -> bool {
        self.by_kind.is_empty()
    }
}

pub fn build_stats(table: &Table) -> StatsData {
    let mut by_kind: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut by_country: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut skipped = 0;

    for row in 0..table.len() {
        let label = |column: &str| {
            let text = table
                .get(row, column)
                .map(|c| c.to_string().trim().to_string())
                .unwrap_or_default();
            if text.is_empty() {
                BLANK_LABEL.to_string()
            } else {
                text
            }
        };

        let monto = match table.get(row, COL_MONTO) {
            Some(cell) if !cell.is_empty() => match cell.as_decimal() {
                Some(value) => value,
                None => {
                    warn!(row = row + 2, value = %cell, "skipping unreadable Monto");
                    skipped += 1;
                    continue;
                }
            },
            _ => Decimal::ZERO,
        };

        *by_kind.entry(label(COL_TIPO)).or_insert(Decimal::ZERO) += monto;
        *by_country.entry(label(COL_PAIS)).or_insert(Decimal::ZERO) += monto;
    }

    let total = by_kind.values().fold(Decimal::ZERO, |acc, v| acc + *v);

    let mut by_country: Vec<(String, Decimal)> = by_country.into_iter().collect();
    by_country.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    StatsData {
        by_kind: by_kind.into_iter().collect(),
        by_country,
        total,
        skipped,
    }
}

/// Loads the sheet and shows the totals, as a terminal chart or as plain text.
pub fn run_stats(store: &dyn SheetStore, plain: bool) -> Result<(), String> {
    let loaded = repository::load_data(store);
    if let Some(e) = loaded.error {
        return Err(format!("No se pudieron cargar los registros: {}", e));
    }

    let data = build_stats(&loaded.table);
    let mut stdout = io::stdout();
    if data.is_empty() {
        warn!("stats requested on an empty sheet");
        writeln!(stdout, "{}", NO_DATA).map_err(|e| format!("No se pudieron escribir las estadísticas: {}", e))?;
        return Ok(());
    }

    if plain {
        print_stats(&data, &mut stdout)
    } else {
        render_stats(&data)
    }
}

pub fn print_stats<W: Write>(data: &StatsData, out: &mut W) -> Result<(), String> {
    let write_err = |e: io::Error| format!("No se pudieron escribir las estadísticas: {}", e);

    if data.is_empty() {
        writeln!(out, "{}", NO_DATA).map_err(write_err)?;
        return Ok(());
    }

    let max_total = data
        .by_kind
        .iter()
        .map(|(_, v)| v.to_f64().unwrap_or(0.0))
        .fold(0.0_f64, f64::max)
        .max(1.0);
    let kind_width = data.by_kind.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);

    writeln!(out, "Monto por Tipo").map_err(write_err)?;
    for (kind, amount) in &data.by_kind {
        let value = amount.to_f64().unwrap_or(0.0).max(0.0);
        let bar = (value / max_total * PLAIN_BAR_WIDTH as f64).round() as usize;
        writeln!(
            out,
            "{}{} {:>14} {}",
            kind,
            " ".repeat(kind_width - kind.chars().count()),
            amount.round_dp(2),
            "#".repeat(bar)
        )
        .map_err(write_err)?;
    }

    writeln!(out).map_err(write_err)?;
    writeln!(out, "Monto por País").map_err(write_err)?;
    let country_width = data
        .by_country
        .iter()
        .map(|(c, _)| c.chars().count())
        .max()
        .unwrap_or(0);
    for (country, amount) in &data.by_country {
        writeln!(
            out,
            "{}{} {:>14}",
            country,
            " ".repeat(country_width - country.chars().count()),
            amount.round_dp(2)
        )
        .map_err(write_err)?;
    }

    writeln!(out).map_err(write_err)?;
    writeln!(out, "Total: {}", data.total.round_dp(2)).map_err(write_err)?;
    if data.skipped > 0 {
        writeln!(out, "{} filas omitidas (Monto ilegible)", data.skipped).map_err(write_err)?;
    }
    Ok(())
}

fn assign_colors(count: usize) -> Vec<Color> {
    let palette = [
        Color::Cyan,
        Color::Magenta,
        Color::Yellow,
        Color::Green,
        Color::Blue,
        Color::Red,
    ];
    (0..count).map(|i| palette[i % palette.len()]).collect()
}

fn render_stats(data: &StatsData) -> Result<(), String> {
    enable_raw_mode().map_err(|e| format!("No se pudo preparar la terminal: {}", e))?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)
        .map_err(|e| format!("No se pudo abrir la pantalla alternativa: {}", e))?;

    let result = (|| {
        let backend = ratatui::backend::CrosstermBackend::new(stdout);
        let mut terminal = ratatui::Terminal::new(backend)
            .map_err(|e| format!("No se pudo inicializar la terminal: {}", e))?;
        let colors = assign_colors(data.by_kind.len());

        loop {
            terminal
                .draw(|frame| {
                    let layout = Layout::default()
                        .direction(Direction::Horizontal)
                        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                        .split(frame.area());

                    render_bar_chart(frame, layout[0], data, &colors);
                    render_country_table(frame, layout[1], data);
                })
                .map_err(|e| format!("No se pudo dibujar la interfaz: {}", e))?;

            if event::poll(std::time::Duration::from_millis(250))
                .map_err(|e| format!("No se pudo leer el teclado: {}", e))?
            {
                match event::read().map_err(|e| format!("No se pudo leer el teclado: {}", e))? {
                    Event::Key(key) if key.code == KeyCode::Char('q') => break,
                    Event::Key(key) if key.code == KeyCode::Esc => break,
                    _ => {}
                }
            }
        }

        Ok(())
    })();

    disable_raw_mode().map_err(|e| format!("No se pudo restaurar la terminal: {}", e))?;
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen)
        .map_err(|e| format!("No se pudo cerrar la pantalla alternativa: {}", e))?;

    result
}

fn render_bar_chart(frame: &mut ratatui::Frame, area: Rect, data: &StatsData, colors: &[Color]) {
    let inner = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    let block = Block::default()
        .title(Line::from(vec![Span::styled(
            "Monto Total por Tipo  (q para salir)",
            Style::default().fg(Color::White),
        )]))
        .borders(Borders::ALL);
    let chart_area = block.inner(inner[0]);
    frame.render_widget(block, inner[0]);

    let bar_height = chart_area.height.saturating_sub(1) as usize;
    if bar_height == 0 || data.by_kind.is_empty() {
        return;
    }

    let slot_width = std::cmp::max(1, chart_area.width as usize / data.by_kind.len());
    let bar_width = std::cmp::max(1, slot_width * 2 / 3);
    let gap = slot_width - bar_width;

    let max_total = data
        .by_kind
        .iter()
        .map(|(_, v)| v.to_f64().unwrap_or(0.0))
        .fold(0.0_f64, f64::max)
        .max(1.0);

    let mut lines: Vec<Line> = Vec::new();
    for row in 0..bar_height {
        let level = (bar_height - row) as f64;
        let mut spans: Vec<Span> = Vec::new();
        for (i, (_, amount)) in data.by_kind.iter().enumerate() {
            let total = amount.to_f64().unwrap_or(0.0);
            let scaled_height = (total / max_total * bar_height as f64).ceil();
            spans.push(Span::raw(" ".repeat(gap / 2)));
            if total <= 0.0 || level > scaled_height {
                spans.push(Span::raw(" ".repeat(bar_width)));
            } else {
                spans.push(Span::styled(
                    "█".repeat(bar_width),
                    Style::default().fg(colors[i]),
                ));
            }
            spans.push(Span::raw(" ".repeat(gap - gap / 2)));
        }
        lines.push(Line::from(spans));
    }
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Left), chart_area);

    let names: Vec<String> = data.by_kind.iter().map(|(k, _)| k.clone()).collect();
    let amounts: Vec<String> = data
        .by_kind
        .iter()
        .map(|(_, v)| v.round_dp(2).to_string())
        .collect();
    let labels = vec![
        Line::from(""),
        slot_line(&names, slot_width, colors),
        slot_line(&amounts, slot_width, colors),
    ];
    frame.render_widget(Paragraph::new(labels), inner[1]);
}

/// One centered label per bar slot.
fn slot_line(labels: &[String], slot_width: usize, colors: &[Color]) -> Line<'static> {
    let spans: Vec<Span> = labels
        .iter()
        .zip(colors)
        .map(|(label, &color)| {
            let label: String = label.chars().take(slot_width).collect();
            Span::styled(
                format!("{:^width$}", label, width = slot_width),
                Style::default().fg(color),
            )
        })
        .collect();
    Line::from(spans)
}

fn render_country_table(frame: &mut ratatui::Frame, area: Rect, data: &StatsData) {
    let block = Block::default().title("Monto por País").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![Line::from(vec![
        Span::styled(format!("{:15}", "País"), Style::default().fg(Color::White).bold()),
        Span::raw("  "),
        Span::styled(format!("{:>14}", "Monto"), Style::default().fg(Color::White).bold()),
    ])];

    for (country, amount) in &data.by_country {
        lines.push(Line::from(vec![
            Span::raw(format!("{:15}", country)),
            Span::raw("  "),
            Span::raw(format!("{:>14}", amount.round_dp(2))),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(format!("{:15}", "Total"), Style::default().bold()),
        Span::raw("  "),
        Span::styled(format!("{:>14}", data.total.round_dp(2)), Style::default().bold()),
    ]));
    if data.skipped > 0 {
        lines.push(Line::from(Span::styled(
            format!("{} filas omitidas (Monto ilegible)", data.skipped),
            Style::default().fg(Color::Yellow),
        )));
    }

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Left), inner);
}
