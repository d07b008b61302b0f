use crate::star::StarValue;

/// One particle row: labels in insertion order with their values
///
/// Setting an existing label replaces its value but keeps its position, so a
/// later field group can override an earlier one without reordering columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StarRow {
    cells: Vec<(String, StarValue)>,
}

impl StarRow {
    /// Empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a label, appending it when new
    pub fn set(&mut self, label: &str, value: impl Into<StarValue>) {
        let value = value.into();
        match self.cells.iter_mut().find(|(l, _)| l == label) {
            Some(cell) => cell.1 = value,
            None => self.cells.push((label.to_string(), value)),
        }
    }

    /// Value of a label
    pub fn get(&self, label: &str) -> Option<&StarValue> {
        self.cells.iter().find(|(l, _)| l == label).map(|(_, v)| v)
    }

    /// Remove a label
    pub fn remove(&mut self, label: &str) -> Option<StarValue> {
        let pos = self.cells.iter().position(|(l, _)| l == label)?;
        Some(self.cells.remove(pos).1)
    }

    /// Whether the row has the label
    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    /// Labels in column order
    pub fn labels(&self) -> Vec<String> {
        self.cells.iter().map(|(l, _)| l.clone()).collect()
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the row has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Values laid out for `columns`; absent labels become [`StarValue::Missing`]
    pub fn project(&self, columns: &[String]) -> Vec<StarValue> {
        columns
            .iter()
            .map(|c| self.get(c).cloned().unwrap_or(StarValue::Missing))
            .collect()
    }
}
