use std::fmt::Display;

use serde::Serialize;

use super::element::validate_all;
use super::{
    ContainerStyle, Element, ElementHandle, HorizontalAlignment, TextBlock, VerticalAlignment,
};
use crate::error::CardError;
use crate::prepare::TargetIndex;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    #[serde(skip)]
    handle: ElementHandle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub columns: Vec<TableColumnDefinition>,
    pub rows: Vec<TableRow>,
    pub first_row_as_header: bool,
    pub show_grid_lines: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_style: Option<ContainerStyle>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub separator: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename = "TableColumnDefinition", rename_all = "camelCase")]
pub struct TableColumnDefinition {
    pub width: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal_cell_content_alignment: Option<HorizontalAlignment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical_cell_content_alignment: Option<VerticalAlignment>,
}

impl Default for TableColumnDefinition {
    fn default() -> Self {
        Self {
            width: 1,
            horizontal_cell_content_alignment: None,
            vertical_cell_content_alignment: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(tag = "type", rename = "TableRow", rename_all = "camelCase")]
pub struct TableRow {
    #[serde(skip)]
    handle: ElementHandle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub cells: Vec<TableCell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ContainerStyle>,
}

impl TableRow {
    pub fn new(cells: Vec<TableCell>) -> Self {
        Self {
            cells,
            ..Self::default()
        }
    }

    pub fn handle(&self) -> ElementHandle {
        self.handle
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(tag = "type", rename = "TableCell", rename_all = "camelCase")]
pub struct TableCell {
    #[serde(skip)]
    handle: ElementHandle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub items: Vec<Element>,
}

impl TableCell {
    pub fn new(items: Vec<Element>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    /// A cell holding a single wrapping text block with `value`'s display form.
    pub fn text(value: impl Display) -> Self {
        Self::new(vec![TextBlock::new(value.to_string(), true).into()])
    }

    pub fn handle(&self) -> ElementHandle {
        self.handle
    }
}

/// Wraps each value in its own text cell, in order.
pub fn table_cells_with_text_block<I>(values: I) -> Vec<TableCell>
where
    I: IntoIterator,
    I::Item: Display,
{
    values.into_iter().map(TableCell::text).collect()
}

impl Table {
    /// Builds a table from rows of cells.
    ///
    /// `columns` of zero takes the width of the first row. Every row must have exactly that many
    /// cells.
    pub fn from_cells(
        rows: Vec<Vec<TableCell>>,
        columns: usize,
        first_row_as_header: bool,
        show_grid_lines: bool,
    ) -> Result<Self, CardError> {
        let Some(first) = rows.first() else {
            return Err(CardError::InvalidTableShape(
                "at least one row of cells is required".into(),
            ));
        };
        let width = if columns == 0 { first.len() } else { columns };
        if width == 0 {
            return Err(CardError::InvalidTableShape(
                "rows must contain at least one cell".into(),
            ));
        }
        if let Some((index, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != width) {
            return Err(CardError::InvalidTableShape(format!(
                "row {index} has {} cells, expected {width}",
                row.len()
            )));
        }

        Ok(Self {
            columns: vec![TableColumnDefinition::default(); width],
            rows: rows.into_iter().map(TableRow::new).collect(),
            first_row_as_header,
            show_grid_lines,
            ..Self::default()
        })
    }

    /// Lays a flat list of cells out as a grid `per_row` wide, padding the last row with empty
    /// cells.
    pub fn grid_from_cells(cells: Vec<TableCell>, per_row: usize) -> Result<Self, CardError> {
        if per_row == 0 {
            return Err(CardError::InvalidTableShape(
                "cells per row must be positive".into(),
            ));
        }
        if cells.is_empty() {
            return Err(CardError::InvalidTableShape(
                "at least one cell is required".into(),
            ));
        }

        let mut rows: Vec<Vec<TableCell>> = Vec::with_capacity(cells.len().div_ceil(per_row));
        let mut cells = cells.into_iter().peekable();
        while cells.peek().is_some() {
            let mut row: Vec<TableCell> = cells.by_ref().take(per_row).collect();
            row.resize_with(per_row, TableCell::default);
            rows.push(row);
        }

        Self::from_cells(rows, per_row, false, true)
    }

    pub fn handle(&self) -> ElementHandle {
        self.handle
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<(), CardError> {
        if self.columns.is_empty() {
            return Err(CardError::element("Table", "at least one column is required"));
        }
        for (index, row) in self.rows.iter().enumerate() {
            if row.cells.len() != self.columns.len() {
                return Err(CardError::InvalidTableShape(format!(
                    "row {index} has {} cells, table declares {} columns",
                    row.cells.len(),
                    self.columns.len()
                )));
            }
            for cell in &row.cells {
                validate_all(&cell.items)?;
            }
        }
        Ok(())
    }

    pub(crate) fn index_into(&self, index: &mut TargetIndex) {
        for row in &self.rows {
            for cell in &row.cells {
                for item in &cell.items {
                    item.index_into(index);
                }
                index.record(cell.handle, cell.id.as_deref());
            }
            index.record(row.handle, row.id.as_deref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string_rows() -> Vec<Vec<TableCell>> {
        (0..3)
            .map(|row| table_cells_with_text_block((0..3).map(|col| format!("r{row}c{col}"))))
            .collect()
    }

    #[test]
    fn infers_columns_from_first_row() {
        let table = Table::from_cells(string_rows(), 0, true, true).unwrap();
        assert_eq!(table.columns.len(), 3);
        assert_eq!(table.rows.len(), 3);
        assert!(table.first_row_as_header);
    }

    #[test]
    fn rejects_ragged_rows() {
        let mut rows = string_rows();
        rows[1].pop();
        let err = Table::from_cells(rows, 0, false, false).unwrap_err();
        assert!(matches!(err, CardError::InvalidTableShape(msg) if msg.contains("row 1")));
    }

    #[test]
    fn rejects_explicit_width_mismatch() {
        let err = Table::from_cells(string_rows(), 4, false, false).unwrap_err();
        assert!(matches!(err, CardError::InvalidTableShape(_)));
    }

    #[test]
    fn grid_pads_last_row() {
        let cells = table_cells_with_text_block(1..=11);
        let table = Table::grid_from_cells(cells, 4).unwrap();
        assert_eq!(table.columns.len(), 4);
        assert_eq!(table.rows.len(), 3);
        assert!(table.rows.iter().all(|row| row.cells.len() == 4));
        assert!(table.rows[2].cells[3].items.is_empty());
    }

    #[test]
    fn grid_rejects_zero_width() {
        let cells = table_cells_with_text_block(["a"]);
        assert!(matches!(
            Table::grid_from_cells(cells, 0),
            Err(CardError::InvalidTableShape(_))
        ));
    }

    #[test]
    fn table_without_columns_is_invalid_element() {
        let table = Table::default();
        assert!(matches!(
            Element::from(table).validate(),
            Err(CardError::InvalidElementKind { kind: "Table", .. })
        ));
    }
}
