use crate::models::record::{
    COL_ALIAS, COL_CODIGO, COL_FECHA, COL_MONTO, COL_PAIS, COL_SECTOR, COL_SUBSECTOR, COL_TIPO,
    RecordKind,
};
use crate::models::table::Table;
use crate::models::taxonomy::fold;
use crate::store::SheetStore;
use crate::store::repository::{self, Loaded};
use chrono::NaiveDate;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::{Alignment, Color, Constraint, Direction, Layout, Rect, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table as TableWidget, TableState, Wrap},
};
use std::cmp::{max, min};
use std::io::{self, Write};

/// Columns shown in the list, in this order, when the sheet has them.
const LIST_COLUMNS: [(&str, u16); 8] = [
    (COL_FECHA, 10),
    (COL_TIPO, 10),
    (COL_PAIS, 9),
    (COL_SECTOR, 15),
    (COL_SUBSECTOR, 18),
    (COL_ALIAS, 20),
    (COL_CODIGO, 12),
    (COL_MONTO, 14),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortOrder {
    Sheet,
    DateDesc,
    DateAsc,
}

impl SortOrder {
    fn next(self) -> Self {
        match self {
            SortOrder::Sheet => SortOrder::DateDesc,
            SortOrder::DateDesc => SortOrder::DateAsc,
            SortOrder::DateAsc => SortOrder::Sheet,
        }
    }

    fn label(self) -> &'static str {
        match self {
            SortOrder::Sheet => "orden de la hoja",
            SortOrder::DateDesc => "fecha ↓",
            SortOrder::DateAsc => "fecha ↑",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    List,
    Details,
    Input(InputKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputKind {
    Country,
    DateRange,
}

/// One sheet row plus the fields the filters look at.
#[derive(Debug, Clone)]
struct RecordRow {
    cells: Vec<String>,
    kind: Option<RecordKind>,
    pais: String,
    fecha: Option<NaiveDate>,
}

fn record_rows(table: &Table) -> Vec<RecordRow> {
    let text = |row: usize, column: &str| {
        table
            .get(row, column)
            .map(|c| c.to_string())
            .unwrap_or_default()
    };
    (0..table.len())
        .map(|i| RecordRow {
            cells: table.rows()[i].iter().map(|c| c.to_string()).collect(),
            kind: RecordKind::from_label(&text(i, COL_TIPO)),
            pais: text(i, COL_PAIS),
            fecha: NaiveDate::parse_from_str(text(i, COL_FECHA).trim(), "%Y-%m-%d").ok(),
        })
        .collect()
}

struct BrowseState {
    mode: Mode,

    headers: Vec<String>,
    rows: Vec<RecordRow>,
    filtered_indices: Vec<usize>,

    table_state: TableState,

    filter_country: Option<String>,
    filter_kind: Option<RecordKind>,
    filter_from: Option<NaiveDate>,
    filter_to: Option<NaiveDate>,

    sort_order: SortOrder,

    // Input modal
    input_buffer: String,
    input_error: Option<String>,

    // Load failure shown in the header
    load_error: Option<String>,

    // Cached per-draw
    last_page_size: usize,
}

impl BrowseState {
    fn new(loaded: Loaded) -> Self {
        let mut state = Self {
            mode: Mode::List,
            headers: Vec::new(),
            rows: Vec::new(),
            filtered_indices: Vec::new(),
            table_state: TableState::default(),
            filter_country: None,
            filter_kind: None,
            filter_from: None,
            filter_to: None,
            sort_order: SortOrder::Sheet,
            input_buffer: String::new(),
            input_error: None,
            load_error: None,
            last_page_size: 10,
        };
        state.replace_data(loaded);
        state
    }

    fn replace_data(&mut self, loaded: Loaded) {
        self.headers = loaded.table.headers().to_vec();
        self.rows = record_rows(&loaded.table);
        self.load_error = loaded.error.map(|e| e.to_string());
        self.recompute();
    }

    fn selected_row(&self) -> Option<&RecordRow> {
        let selected = self.table_state.selected()?;
        let idx = *self.filtered_indices.get(selected)?;
        self.rows.get(idx)
    }

    fn recompute(&mut self) {
        self.filtered_indices = (0..self.rows.len())
            .filter(|&i| self.matches_filters(&self.rows[i]))
            .collect();

        self.sort_filtered();

        if self.filtered_indices.is_empty() {
            self.table_state.select(None);
        } else {
            let new_selected = match self.table_state.selected() {
                Some(sel) => min(sel, self.filtered_indices.len().saturating_sub(1)),
                None => 0,
            };
            self.table_state.select(Some(new_selected));
        }
    }

    fn matches_filters(&self, row: &RecordRow) -> bool {
        if let Some(kind) = self.filter_kind {
            if row.kind != Some(kind) {
                return false;
            }
        }

        if self.filter_from.is_some() || self.filter_to.is_some() {
            let Some(fecha) = row.fecha else {
                return false;
            };
            if self.filter_from.is_some_and(|from| fecha < from) {
                return false;
            }
            if self.filter_to.is_some_and(|to| fecha > to) {
                return false;
            }
        }

        if let Some(ref country) = self.filter_country {
            if fold(&row.pais) != fold(country) {
                return false;
            }
        }

        true
    }

    fn sort_filtered(&mut self) {
        let rows = &self.rows;
        match self.sort_order {
            SortOrder::Sheet => self.filtered_indices.sort_unstable(),
            // rows without a parseable Fecha go last either way
            SortOrder::DateDesc => self.filtered_indices.sort_by(|&a, &b| {
                match (rows[a].fecha, rows[b].fecha) {
                    (Some(fa), Some(fb)) => fb.cmp(&fa),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                }
                .then_with(|| a.cmp(&b))
            }),
            SortOrder::DateAsc => self.filtered_indices.sort_by(|&a, &b| {
                match (rows[a].fecha, rows[b].fecha) {
                    (Some(fa), Some(fb)) => fa.cmp(&fb),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                }
                .then_with(|| a.cmp(&b))
            }),
        }
    }

    fn move_selection(&mut self, delta: i32) {
        if self.filtered_indices.is_empty() {
            self.table_state.select(None);
            return;
        }

        let current = self.table_state.selected().unwrap_or(0) as i32;
        let max_index = self.filtered_indices.len().saturating_sub(1) as i32;
        let next = (current + delta).clamp(0, max_index) as usize;
        self.table_state.select(Some(next));
    }

    fn page_up(&mut self) {
        let page = max(1, self.last_page_size) as i32;
        self.move_selection(-page);
    }

    fn page_down(&mut self) {
        let page = max(1, self.last_page_size) as i32;
        self.move_selection(page);
    }

    fn cycle_kind_filter(&mut self) {
        self.filter_kind = match self.filter_kind {
            None => Some(RecordKind::Aprobacion),
            Some(RecordKind::Aprobacion) => Some(RecordKind::Desembolso),
            Some(RecordKind::Desembolso) => None,
        };
        self.recompute();
    }

    fn clear_filters(&mut self) {
        self.filter_country = None;
        self.filter_kind = None;
        self.filter_from = None;
        self.filter_to = None;
        self.recompute();
    }

    fn start_input(&mut self, kind: InputKind) {
        self.input_buffer.clear();
        self.input_error = None;

        match kind {
            InputKind::Country => {
                if let Some(ref c) = self.filter_country {
                    self.input_buffer = c.clone();
                }
            }
            InputKind::DateRange => {
                let from = self
                    .filter_from
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default();
                let to = self
                    .filter_to
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default();
                if !from.is_empty() || !to.is_empty() {
                    self.input_buffer = format!("{}..{}", from, to);
                }
            }
        }

        self.mode = Mode::Input(kind);
    }

    fn cancel_input(&mut self) {
        self.input_error = None;
        self.mode = Mode::List;
    }

    fn commit_input(&mut self, kind: InputKind) {
        let raw = self.input_buffer.trim();
        match kind {
            InputKind::Country => {
                if raw.is_empty() {
                    self.filter_country = None;
                } else {
                    self.filter_country = Some(raw.to_string());
                }
                self.mode = Mode::List;
                self.recompute();
            }
            InputKind::DateRange => {
                if raw.is_empty() {
                    self.filter_from = None;
                    self.filter_to = None;
                    self.mode = Mode::List;
                    self.recompute();
                    return;
                }

                match parse_date_range(raw) {
                    Ok((from, to)) => {
                        self.filter_from = from;
                        self.filter_to = to;
                        self.input_error = None;
                        self.mode = Mode::List;
                        self.recompute();
                    }
                    Err(e) => {
                        self.input_error = Some(e);
                    }
                }
            }
        }
    }
}

/// Prints the records as an aligned text table, or the load error followed by an empty table.
pub fn print_records<W: Write>(loaded: &Loaded, out: &mut W) -> Result<(), String> {
    let write_err = |e: io::Error| format!("No se pudieron escribir los registros: {}", e);

    if let Some(ref e) = loaded.error {
        writeln!(out, "❌ ERROR al cargar datos: {}", e).map_err(write_err)?;
    }

    let table = &loaded.table;
    let headers = table.headers();
    if !headers.is_empty() {
        let rows: Vec<Vec<String>> = table
            .rows()
            .iter()
            .map(|r| r.iter().map(|c| c.to_string().replace('\n', " ")).collect())
            .collect();
        let widths: Vec<usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                rows.iter()
                    .map(|r| r[i].chars().count())
                    .chain(std::iter::once(h.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let render = |cells: &[String]| {
            cells
                .iter()
                .zip(&widths)
                .map(|(c, &w)| format!("{}{}", c, " ".repeat(w - c.chars().count())))
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        };

        writeln!(out, "{}", render(headers)).map_err(write_err)?;
        let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
        writeln!(out, "{}", rule.join("-+-")).map_err(write_err)?;
        for row in &rows {
            writeln!(out, "{}", render(row)).map_err(write_err)?;
        }
    }

    writeln!(out, "{} registros", table.len()).map_err(write_err)?;
    Ok(())
}

pub fn run_browse(store: &dyn SheetStore) -> Result<(), String> {
    enable_raw_mode().map_err(|e| format!("No se pudo preparar la terminal: {}", e))?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)
        .map_err(|e| format!("No se pudo abrir la pantalla alternativa: {}", e))?;

    let result = (|| {
        let backend = ratatui::backend::CrosstermBackend::new(stdout);
        let mut terminal = ratatui::Terminal::new(backend)
            .map_err(|e| format!("No se pudo inicializar la terminal: {}", e))?;

        let mut state = BrowseState::new(repository::load_data(store));

        loop {
            terminal
                .draw(|frame| {
                    let size = frame.area();
                    let layout = Layout::default()
                        .direction(Direction::Vertical)
                        .constraints([
                            Constraint::Length(3),
                            Constraint::Min(5),
                            Constraint::Length(3),
                        ])
                        .split(size);

                    render_header(frame, layout[0], &state);
                    render_table(frame, layout[1], &mut state);
                    render_footer(frame, layout[2], &state);

                    if let Mode::Input(kind) = state.mode {
                        render_input_modal(frame, size, &state, kind);
                    }

                    if state.mode == Mode::Details {
                        render_details_modal(frame, size, &state);
                    }
                })
                .map_err(|e| format!("No se pudo dibujar la interfaz: {}", e))?;

            if event::poll(std::time::Duration::from_millis(200))
                .map_err(|e| format!("No se pudo leer el teclado: {}", e))?
            {
                let event = event::read().map_err(|e| format!("No se pudo leer el teclado: {}", e))?;
                if let Event::Key(key) = event {
                    if handle_key(store, &mut state, key) {
                        break;
                    }
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

/// Returns true when the browser should close.
fn handle_key(store: &dyn SheetStore, state: &mut BrowseState, key: KeyEvent) -> bool {
    // Many terminals emit both a Press and a Release event. Only act on Press/Repeat.
    if key.kind == KeyEventKind::Release {
        return false;
    }

    if state.mode == Mode::List && (key.code == KeyCode::Char('q') || key.code == KeyCode::Esc) {
        return true;
    }

    match state.mode {
        Mode::List => match key.code {
            KeyCode::Up => state.move_selection(-1),
            KeyCode::Down => state.move_selection(1),
            KeyCode::PageUp => state.page_up(),
            KeyCode::PageDown => state.page_down(),
            KeyCode::Home => state.move_selection(i32::MIN / 2),
            KeyCode::End => state.move_selection(i32::MAX / 2),
            KeyCode::Enter => {
                if state.selected_row().is_some() {
                    state.mode = Mode::Details;
                }
            }
            KeyCode::Char('r') => state.replace_data(repository::load_data(store)),
            KeyCode::Char('p') => state.start_input(InputKind::Country),
            KeyCode::Char('d') => state.start_input(InputKind::DateRange),
            KeyCode::Char('t') => state.cycle_kind_filter(),
            KeyCode::Char('s') => {
                state.sort_order = state.sort_order.next();
                state.recompute();
            }
            KeyCode::Char('x') => state.clear_filters(),
            _ => {}
        },
        Mode::Details => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('b')) {
                state.mode = Mode::List;
            }
        }
        Mode::Input(kind) => {
            if key.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
            {
                state.cancel_input();
                return false;
            }

            match key.code {
                KeyCode::Esc => state.cancel_input(),
                KeyCode::Enter => state.commit_input(kind),
                KeyCode::Backspace => {
                    state.input_buffer.pop();
                }
                KeyCode::Char(ch) => state.input_buffer.push(ch),
                _ => {}
            }
        }
    }

    false
}

fn render_header(frame: &mut ratatui::Frame, area: Rect, state: &BrowseState) {
    let any = || "(todos)".to_string();
    let country = state.filter_country.clone().unwrap_or_else(any);
    let kind = state
        .filter_kind
        .map(|k| k.label().to_string())
        .unwrap_or_else(any);
    let from = state
        .filter_from
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(any);
    let to = state
        .filter_to
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(any);

    let mut spans = vec![
        Span::styled("Registros", Style::default().fg(Color::Cyan).bold()),
        Span::raw("  "),
        Span::raw(format!("Orden: {}", state.sort_order.label())),
        Span::raw("  |  "),
        Span::raw(format!("Tipo: {}", kind)),
        Span::raw("  |  "),
        Span::raw(format!("País: {}", country)),
        Span::raw("  |  "),
        Span::raw(format!("Fecha: {}..{}", from, to)),
        Span::raw("  |  "),
        Span::raw(format!("Filas: {}/{}", state.filtered_indices.len(), state.rows.len())),
    ];
    if let Some(ref e) = state.load_error {
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(format!("ERROR: {}", e), Style::default().fg(Color::Red)));
    }

    let block = Block::default().borders(Borders::ALL);
    let paragraph = Paragraph::new(Line::from(spans))
        .block(block)
        .alignment(Alignment::Left);
    frame.render_widget(paragraph, area);
}

fn render_footer(frame: &mut ratatui::Frame, area: Rect, state: &BrowseState) {
    let hint = match state.mode {
        Mode::List => {
            "↑/↓ mover  RePág/AvPág página  Enter detalle  t tipo  p país  d fechas  s orden  r recargar  x limpiar  q/Esc salir"
        }
        Mode::Details => "Esc/q/b volver",
        Mode::Input(_) => "Escriba, Enter aplica, Esc cancela",
    };

    let block = Block::default().borders(Borders::ALL);
    frame.render_widget(
        Paragraph::new(hint)
            .block(block)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn render_table(frame: &mut ratatui::Frame, area: Rect, state: &mut BrowseState) {
    let block = Block::default().title("Registros Existentes").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let shown: Vec<(usize, u16)> = LIST_COLUMNS
        .iter()
        .filter_map(|&(name, width)| {
            state
                .headers
                .iter()
                .position(|h| h == name)
                .map(|idx| (idx, width))
        })
        .collect();

    let header = Row::new(
        shown
            .iter()
            .map(|&(idx, _)| Cell::from(state.headers[idx].clone()).style(Style::default().bold())),
    )
    .style(Style::default().fg(Color::White));

    let rows = state.filtered_indices.iter().map(|&i| {
        let row = &state.rows[i];
        Row::new(shown.iter().map(|&(idx, width)| {
            let mut value = row.cells.get(idx).cloned().unwrap_or_default();
            if value.chars().count() > width as usize {
                value = value.chars().take(width.saturating_sub(1) as usize).collect();
                value.push('…');
            }
            Cell::from(value)
        }))
    });

    // Leave room for the header row.
    state.last_page_size = max(1, inner.height.saturating_sub(2) as usize);

    let widths: Vec<Constraint> = shown.iter().map(|&(_, w)| Constraint::Length(w)).collect();

    let table = TableWidget::new(rows, widths)
        .header(header)
        .row_highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White).bold())
        .highlight_symbol("➤ ")
        .column_spacing(1);

    frame.render_stateful_widget(table, inner, &mut state.table_state);

    if state.filtered_indices.is_empty() {
        let message = if state.rows.is_empty() {
            "No hay registros"
        } else {
            "Ningún registro coincide con los filtros"
        };
        let empty = Paragraph::new(message)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
    }
}

fn render_input_modal(frame: &mut ratatui::Frame, area: Rect, state: &BrowseState, kind: InputKind) {
    let popup_area = centered_rect(80, 30, area);
    frame.render_widget(Clear, popup_area);

    let (title, help) = match kind {
        InputKind::Country => ("Filtrar País", "Ingrese el país (vacío quita el filtro)"),
        InputKind::DateRange => (
            "Filtrar Fecha",
            "Ingrese un rango como 2025-01-01..2025-01-31 (vacío quita el filtro)",
        ),
    };

    let mut lines = vec![
        Line::from(vec![Span::styled(title, Style::default().bold())]),
        Line::from(help),
        Line::from(""),
        Line::from(vec![Span::styled(
            format!("> {}", state.input_buffer),
            Style::default().fg(Color::Yellow),
        )]),
    ];

    if let Some(ref err) = state.input_error {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![Span::styled(
            err.as_str(),
            Style::default().fg(Color::Red),
        )]));
    }

    let block = Block::default().borders(Borders::ALL).title("Filtro");
    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, popup_area);
}

fn render_details_modal(frame: &mut ratatui::Frame, area: Rect, state: &BrowseState) {
    let popup_area = centered_rect(90, 70, area);
    frame.render_widget(Clear, popup_area);

    let block = Block::default().borders(Borders::ALL).title("Detalle");
    let Some(row) = state.selected_row() else {
        frame.render_widget(
            Paragraph::new("Sin selección")
                .block(block)
                .alignment(Alignment::Center),
            popup_area,
        );
        return;
    };

    let mut lines = vec![Line::from(""),];
    for (name, value) in state.headers.iter().zip(&row.cells) {
        lines.push(Line::from(vec![
            Span::styled(format!("{}: ", name), Style::default().fg(Color::Cyan)),
            Span::raw(value.clone()),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Esc/q/b para volver",
        Style::default().fg(Color::DarkGray),
    )));

    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: false }),
        popup_area,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Accepts `FROM..TO` or `FROM,TO`; either side may be empty.
fn parse_date_range(input: &str) -> Result<(Option<NaiveDate>, Option<NaiveDate>), String> {
    let s = input.trim();
    let (left, right) = s
        .split_once("..")
        .or_else(|| s.split_once(','))
        .ok_or_else(|| "Rango de fechas inválido. Use AAAA-MM-DD..AAAA-MM-DD".to_string())?;

    let parse = |part: &str| -> Result<Option<NaiveDate>, String> {
        let part = part.trim();
        if part.is_empty() {
            return Ok(None);
        }
        NaiveDate::parse_from_str(part, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| format!("Fecha inválida '{}'. Use AAAA-MM-DD.", part))
    };
    let from = parse(left)?;
    let to = parse(right)?;

    if let (Some(f), Some(t)) = (from, to) {
        if f > t {
            return Err("Rango inválido: la fecha inicial debe ser anterior o igual a la final".to_string());
        }
    }

    Ok((from, to))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::table::Cell as SheetCell;
    use crate::store::StoreError;

    fn loaded(rows: &[[&str; 3]]) -> Loaded {
        let mut values = vec![vec![
            SheetCell::from("Tipo"),
            SheetCell::from("País"),
            SheetCell::from("Fecha"),
        ]];
        values.extend(rows.iter().map(|r| r.iter().map(|&c| SheetCell::from(c)).collect()));
        Loaded {
            table: Table::from_values(values),
            error: None,
        }
    }

    fn sample_state() -> BrowseState {
        BrowseState::new(loaded(&[
            ["Aprobación", "Brasil", "2025-03-01"],
            ["Desembolso", "Uruguay", "2025-01-15"],
            ["Aprobación", "Uruguay", "2025-02-10"],
            ["Desembolso", "Brasil", "sin fecha"],
        ]))
    }

    #[test]
    fn test_kind_filter_cycles() {
        let mut state = sample_state();
        state.cycle_kind_filter();
        assert_eq!(state.filtered_indices, vec![0, 2]);
        state.cycle_kind_filter();
        assert_eq!(state.filtered_indices, vec![1, 3]);
        state.cycle_kind_filter();
        assert_eq!(state.filtered_indices.len(), 4);
    }

    #[test]
    fn test_country_filter_ignores_case() {
        let mut state = sample_state();
        state.start_input(InputKind::Country);
        state.input_buffer = "uruguay".to_string();
        state.commit_input(InputKind::Country);
        assert_eq!(state.filtered_indices, vec![1, 2]);
        assert_eq!(state.mode, Mode::List);
    }

    #[test]
    fn test_date_filter_excludes_rows_without_date() {
        let mut state = sample_state();
        state.start_input(InputKind::DateRange);
        state.input_buffer = "2025-02-01..".to_string();
        state.commit_input(InputKind::DateRange);
        assert_eq!(state.filtered_indices, vec![0, 2]);
    }

    #[test]
    fn test_bad_date_range_keeps_modal_open() {
        let mut state = sample_state();
        state.start_input(InputKind::DateRange);
        state.input_buffer = "ayer".to_string();
        state.commit_input(InputKind::DateRange);
        assert_eq!(state.mode, Mode::Input(InputKind::DateRange));
        assert!(state.input_error.is_some());
    }

    #[test]
    fn test_sort_by_date() {
        let mut state = sample_state();
        state.sort_order = SortOrder::DateDesc;
        state.recompute();
        assert_eq!(state.filtered_indices, vec![0, 2, 1, 3]);

        state.sort_order = SortOrder::DateAsc;
        state.recompute();
        assert_eq!(state.filtered_indices, vec![1, 2, 0, 3]);
    }

    #[test]
    fn test_clear_filters() {
        let mut state = sample_state();
        state.cycle_kind_filter();
        state.filter_country = Some("Brasil".to_string());
        state.recompute();
        assert_eq!(state.filtered_indices, vec![0]);
        state.clear_filters();
        assert_eq!(state.filtered_indices.len(), 4);
    }

    #[test]
    fn test_empty_sheet_has_no_selection() {
        let state = BrowseState::new(Loaded {
            table: Table::new(),
            error: None,
        });
        assert!(state.rows.is_empty());
        assert_eq!(state.table_state.selected(), None);
        assert!(state.load_error.is_none());
    }

    #[test]
    fn test_failed_load_keeps_error() {
        let state = BrowseState::new(Loaded {
            table: Table::new(),
            error: Some(StoreError::Read("HTTP 503".to_string())),
        });
        assert!(state.rows.is_empty());
        assert!(state.load_error.unwrap().contains("HTTP 503"));
    }

    #[test]
    fn test_parse_date_range() {
        let (from, to) = parse_date_range("2025-01-01..2025-01-31").unwrap();
        assert_eq!(from, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(to, NaiveDate::from_ymd_opt(2025, 1, 31));
        assert_eq!(parse_date_range("..2025-01-31").unwrap().0, None);
        assert!(parse_date_range("2025-02-01,2025-01-01").is_err());
        assert!(parse_date_range("2025-02-01").is_err());
    }

    #[test]
    fn test_parse_date_range_messages() {
        assert_eq!(
            parse_date_range("2025-02-01").unwrap_err(),
            "Rango de fechas inválido. Use AAAA-MM-DD..AAAA-MM-DD"
        );
        assert_eq!(
            parse_date_range("2025-13-01..").unwrap_err(),
            "Fecha inválida '2025-13-01'. Use AAAA-MM-DD."
        );
        assert!(parse_date_range("2025-02-01..2025-01-01").unwrap_err().starts_with("Rango inválido"));
    }

    #[test]
    fn test_print_records() {
        let mut out = Vec::new();
        print_records(&loaded(&[["Aprobación", "Brasil", "2025-03-01"]]), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Tipo       | País   | Fecha");
        assert_eq!(lines[2], "Aprobación | Brasil | 2025-03-01");
        assert_eq!(lines[3], "1 registros");
    }

    #[test]
    fn test_print_records_empty() {
        let mut out = Vec::new();
        let empty = Loaded {
            table: Table::new(),
            error: None,
        };
        print_records(&empty, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "0 registros\n");
    }

    #[test]
    fn test_print_records_failed_load() {
        let mut out = Vec::new();
        let failed = Loaded {
            table: Table::new(),
            error: Some(StoreError::Read("timeout".to_string())),
        };
        print_records(&failed, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("❌ ERROR al cargar datos: no se pudo leer la hoja: timeout"));
        assert!(text.ends_with("0 registros\n"));
    }
}
