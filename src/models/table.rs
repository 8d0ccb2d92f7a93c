use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

/// One spreadsheet cell. Numbers are kept apart so they are written back as numbers.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(Decimal),
}

impl Cell {
    pub fn empty() -> Self {
        Cell::Text(String::new())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Text(s) if s.is_empty())
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => Decimal::from_str(s.trim()).ok(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

/// Whole-sheet contents: a header row and the data rows under it.
///
/// Every row has exactly as many cells as there are headers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from raw sheet values. The first row is the header and
    /// data rows are padded or cut to the header width.
    pub fn from_values(values: Vec<Vec<Cell>>) -> Self {
        let mut values = values.into_iter();
        let headers: Vec<String> = match values.next() {
            Some(header_row) => header_row.iter().map(|c| c.to_string()).collect(),
            None => return Self::new(),
        };

        let width = headers.len();
        let rows = values
            .map(|mut row| {
                row.resize(width, Cell::empty());
                row
            })
            .collect();

        Self { headers, rows }
    }

    /// Header row followed by every data row, ready to be written from A1.
    pub fn to_values(&self) -> Vec<Vec<Cell>> {
        if self.headers.is_empty() {
            return Vec::new();
        }
        let mut values = Vec::with_capacity(self.rows.len() + 1);
        values.push(self.headers.iter().map(|h| Cell::from(h.as_str())).collect());
        values.extend(self.rows.iter().cloned());
        values
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }

    /// Appends one row given as (column, value) pairs.
    ///
    /// Columns the table does not have yet are added at the end and existing
    /// rows get empty cells for them. Columns the row does not mention are left empty.
    pub fn append_row<I, S>(&mut self, columns: I)
    where
        I: IntoIterator<Item = (S, Cell)>,
        S: Into<String>,
    {
        let mut row = vec![Cell::empty(); self.headers.len()];
        for (name, value) in columns {
            let name = name.into();
            let idx = match self.column_index(&name) {
                Some(idx) => idx,
                None => {
                    self.headers.push(name);
                    for existing in &mut self.rows {
                        existing.push(Cell::empty());
                    }
                    row.push(Cell::empty());
                    self.headers.len() - 1
                }
            };
            row[idx] = value;
        }
        self.rows.push(row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_row(cells: &[&str]) -> Vec<Cell> {
        cells.iter().map(|&c| Cell::from(c)).collect()
    }

    #[test]
    fn test_from_values_empty_sheet() {
        let table = Table::from_values(Vec::new());
        assert!(table.is_empty());
        assert!(table.headers().is_empty());
        assert!(table.to_values().is_empty());
    }

    #[test]
    fn test_from_values_header_only() {
        let table = Table::from_values(vec![text_row(&["Tipo", "Monto"])]);
        assert!(table.is_empty());
        assert_eq!(table.headers(), ["Tipo", "Monto"]);
    }

    #[test]
    fn test_from_values_pads_short_rows() {
        let table = Table::from_values(vec![
            text_row(&["Tipo", "Alias", "Monto"]),
            text_row(&["Aprobación"]),
            vec![Cell::from("Desembolso"), Cell::from("x"), Cell::Number(Decimal::new(250, 1))],
        ]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0, "Monto"), Some(&Cell::empty()));
        assert_eq!(table.get(1, "Monto").and_then(Cell::as_decimal), Some(Decimal::new(25, 0)));
    }

    #[test]
    fn test_append_row_to_empty_table_uses_row_order() {
        let mut table = Table::new();
        table.append_row([("Tipo", Cell::from("Aprobación")), ("Monto", Cell::Number(Decimal::ONE))]);
        assert_eq!(table.headers(), ["Tipo", "Monto"]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_append_row_unions_columns() {
        let mut table = Table::from_values(vec![
            text_row(&["Tipo", "Notas"]),
            text_row(&["Desembolso", "manual"]),
        ]);
        table.append_row([("Tipo", Cell::from("Aprobación")), ("Monto", Cell::from("10"))]);

        assert_eq!(table.headers(), ["Tipo", "Notas", "Monto"]);
        assert_eq!(table.rows()[0], text_row(&["Desembolso", "manual", ""]));
        assert_eq!(table.rows()[1], text_row(&["Aprobación", "", "10"]));
    }

    #[test]
    fn test_to_values_starts_with_header() {
        let mut table = Table::new();
        table.append_row([("Tipo", Cell::from("Desembolso"))]);
        let values = table.to_values();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0], text_row(&["Tipo"]));
    }

    #[test]
    fn test_cell_as_decimal() {
        assert_eq!(Cell::from(" 12.50 ").as_decimal(), Some(Decimal::new(1250, 2)));
        assert_eq!(Cell::from("n/a").as_decimal(), None);
        assert!(Cell::from("").is_empty());
        assert!(!Cell::Number(Decimal::ZERO).is_empty());
    }
}
