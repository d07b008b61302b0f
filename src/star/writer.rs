use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::error::StarError;
use super::value::StarValue;

/// Streaming writer for STAR tables
///
/// Tables are written header-first so rows can be appended while the input is
/// still being iterated; nothing is buffered beyond the underlying writer.
pub struct StarWriter<W: Write> {
    writer: W,
    table: Option<String>,
    columns: usize,
    rows_written: usize,
}

impl StarWriter<BufWriter<File>> {
    /// Create (or truncate) a STAR file
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, StarError> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> StarWriter<W> {
    /// Wrap any writer
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            table: None,
            columns: 0,
            rows_written: 0,
        }
    }

    /// Write a `# ...` comment line
    pub fn comment(&mut self, text: &str) -> Result<(), StarError> {
        writeln!(self.writer, "# {}", text)?;
        Ok(())
    }

    /// Write an empty line
    pub fn blank_line(&mut self) -> Result<(), StarError> {
        writeln!(self.writer)?;
        Ok(())
    }

    /// Start a `data_<name>` loop table with the given column labels
    pub fn begin_table<S: AsRef<str>>(&mut self, name: &str, columns: &[S]) -> Result<(), StarError> {
        writeln!(self.writer)?;
        writeln!(self.writer, "data_{}", name)?;
        writeln!(self.writer)?;
        writeln!(self.writer, "loop_")?;
        for (i, column) in columns.iter().enumerate() {
            writeln!(self.writer, "_{} #{}", column.as_ref(), i + 1)?;
        }
        self.table = Some(name.to_string());
        self.columns = columns.len();
        Ok(())
    }

    /// Append one row to the current table
    pub fn write_row(&mut self, values: &[StarValue]) -> Result<(), StarError> {
        let table = self.table.as_ref().ok_or(StarError::NoTable)?;
        if values.len() != self.columns {
            return Err(StarError::ColumnCountMismatch {
                table: table.clone(),
                expected: self.columns,
                found: values.len(),
            });
        }
        if let Some(value) = values.iter().find(|v| !v.is_representable()) {
            return Err(StarError::UnrepresentableValue {
                table: table.clone(),
                value: value.to_string(),
            });
        }

        let line = values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(self.writer, "{}", line)?;
        self.rows_written += 1;
        Ok(())
    }

    /// Rows written across all tables so far
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Flush and hand back the underlying writer
    pub fn finish(mut self) -> Result<W, StarError> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}
