use std::fs;
use std::path::Path;
use std::str::FromStr;

use super::error::StarError;
use super::value::StarValue;

/// One `data_` block of a STAR file
#[derive(Debug, Clone, PartialEq)]
pub struct StarTable {
    /// Block name without the `data_` prefix
    pub name: String,
    /// Column labels without the leading underscore
    pub columns: Vec<String>,
    /// Rows in file order
    pub rows: Vec<Vec<StarValue>>,
}

impl StarTable {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column
    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == label)
    }

    /// All values of a column
    pub fn column(&self, label: &str) -> Option<Vec<&StarValue>> {
        let index = self.column_index(label)?;
        Some(self.rows.iter().map(|row| &row[index]).collect())
    }

    /// Single cell lookup
    pub fn value(&self, row: usize, label: &str) -> Option<&StarValue> {
        let index = self.column_index(label)?;
        self.rows.get(row).map(|r| &r[index])
    }
}

/// All tables of a STAR file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StarDocument {
    /// Tables in file order
    pub tables: Vec<StarTable>,
}

impl StarDocument {
    /// Read and parse a STAR file
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, StarError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Find a table by name
    pub fn table(&self, name: &str) -> Option<&StarTable> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Parse STAR text
    pub fn parse(content: &str) -> Result<Self, StarError> {
        let mut tables: Vec<StarTable> = Vec::new();
        let mut in_loop = false;

        for (i, raw) in content.lines().enumerate() {
            let line_no = i + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix("data_") {
                tables.push(StarTable::new(name.trim()));
                in_loop = false;
                continue;
            }

            let table = tables.last_mut().ok_or_else(|| StarError::InvalidFormat {
                line: line_no,
                message: "content before the first data_ block".to_string(),
            })?;

            if line == "loop_" {
                in_loop = true;
                continue;
            }

            if let Some(label) = line.strip_prefix('_') {
                let mut parts = tokenize(label).into_iter();
                let label = parts.next().map(|t| t.text).unwrap_or_default();
                if in_loop && table.rows.is_empty() {
                    table.columns.push(label);
                } else {
                    // key/value block: a one-row table
                    in_loop = false;
                    let value = parts.next().ok_or_else(|| StarError::InvalidFormat {
                        line: line_no,
                        message: format!("missing value for _{}", label),
                    })?;
                    table.columns.push(label);
                    if table.rows.is_empty() {
                        table.rows.push(Vec::new());
                    }
                    table.rows[0].push(value.into_value());
                }
                continue;
            }

            let values: Vec<StarValue> = tokenize(line).into_iter().map(Token::into_value).collect();
            if values.len() != table.columns.len() {
                return Err(StarError::ColumnCountMismatch {
                    table: table.name.clone(),
                    expected: table.columns.len(),
                    found: values.len(),
                });
            }
            table.rows.push(values);
        }

        Ok(Self { tables })
    }
}

impl FromStr for StarDocument {
    type Err = StarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A whitespace-separated field of a data line
struct Token {
    text: String,
    quoted: bool,
}

impl Token {
    /// Quoted fields are always text
    fn into_value(self) -> StarValue {
        if self.quoted {
            StarValue::Text(self.text)
        } else {
            StarValue::parse(&self.text)
        }
    }
}

/// Split a data line on whitespace, honouring double-quoted tokens
fn tokenize(line: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut had_quotes = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                had_quotes = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() || had_quotes {
                    tokens.push(Token {
                        text: std::mem::take(&mut current),
                        quoted: had_quotes,
                    });
                }
                had_quotes = false;
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() || had_quotes {
        tokens.push(Token {
            text: current,
            quoted: had_quotes,
        });
    }
    tokens
}
