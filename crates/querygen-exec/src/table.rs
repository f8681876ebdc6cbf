//! Raw (unencoded) tables, as handed to the loader.

use std::io::Read;

use querygen_core::schema::{ColumnType, Field, Schema};
use querygen_core::types::Scalar;

use crate::error::{ExecError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct RawColumn {
    pub name: String,
    pub column_type: ColumnType,
    pub values: Vec<Scalar>,
}

impl RawColumn {
    pub fn new(name: impl Into<String>, column_type: ColumnType, values: Vec<Scalar>) -> Self {
        Self {
            name: name.into(),
            column_type,
            values,
        }
    }
}

/// Named, typed columns of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    columns: Vec<RawColumn>,
}

impl RawTable {
    pub fn new(columns: Vec<RawColumn>) -> Result<Self> {
        if let Some(first) = columns.first() {
            let n = first.values.len();
            if let Some(bad) = columns.iter().find(|c| c.values.len() != n) {
                return Err(ExecError::Input(format!(
                    "column '{}' has {} values, '{}' has {n}",
                    bad.name,
                    bad.values.len(),
                    first.name
                )));
            }
        }
        for (i, c) in columns.iter().enumerate() {
            if columns[..i].iter().any(|o| o.name == c.name) {
                return Err(ExecError::Input(format!("duplicate column '{}'", c.name)));
            }
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[RawColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&RawColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn schema(&self) -> Schema {
        Schema::new(
            self.columns
                .iter()
                .map(|c| Field::new(c.name.clone(), c.column_type))
                .collect(),
        )
    }

    /// Read a headed CSV. Every schema field must appear in the header;
    /// extra CSV columns are ignored.
    pub fn from_csv<R: Read>(reader: R, schema: &Schema) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let positions = schema
            .fields
            .iter()
            .map(|f| {
                headers
                    .iter()
                    .position(|h| h == f.name)
                    .ok_or_else(|| ExecError::Input(format!("CSV has no column '{}'", f.name)))
            })
            .collect::<Result<Vec<usize>>>()?;

        let mut values: Vec<Vec<Scalar>> = vec![Vec::new(); schema.fields.len()];
        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            for ((field, &pos), out) in schema.fields.iter().zip(&positions).zip(&mut values) {
                let cell = record.get(pos).unwrap_or("");
                let logical = field.column_type.logical();
                let v = Scalar::parse(cell, logical).ok_or_else(|| {
                    ExecError::Input(format!(
                        "row {}: '{cell}' is not a valid {} for column '{}'",
                        row + 1,
                        logical.name(),
                        field.name
                    ))
                })?;
                out.push(v);
            }
        }
        tracing::debug!(rows = values.first().map_or(0, Vec::len), "read CSV");

        let columns = schema
            .fields
            .iter()
            .zip(values)
            .map(|(f, vals)| RawColumn::new(f.name.clone(), f.column_type, vals))
            .collect();
        Self::new(columns)
    }
}
