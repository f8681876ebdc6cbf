//! Concrete values for a template's placeholders.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use querygen_core::schema::{ColumnType, LogicalType, PhysicalType};
use querygen_encoding::HashKind;

use crate::template::Role;

/// One attribute placeholder bound to a stored column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeBinding {
    pub column: String,
    pub column_type: ColumnType,
    pub hash: HashKind,
}

impl AttributeBinding {
    pub fn new(column: impl Into<String>, column_type: ColumnType, hash: HashKind) -> Self {
        Self {
            column: column.into(),
            column_type,
            hash,
        }
    }

    pub fn logical(&self) -> LogicalType {
        self.column_type.logical()
    }

    pub fn physical(&self) -> PhysicalType {
        self.column_type.physical()
    }
}

/// Accumulator type of an aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Annotation {
    Count,
    SumI64,
    SumF64,
}

impl Annotation {
    pub const fn rust_type(self) -> &'static str {
        match self {
            Annotation::Count => "u64",
            Annotation::SumI64 => "i64",
            Annotation::SumF64 => "f64",
        }
    }

    pub const fn tag(self) -> &'static str {
        match self {
            Annotation::Count => "COUNT",
            Annotation::SumI64 => "SUMI64",
            Annotation::SumF64 => "SUMF64",
        }
    }

    /// Logical type of the decoded aggregate.
    pub const fn logical(self) -> LogicalType {
        match self {
            Annotation::Count => LogicalType::UInt64,
            Annotation::SumI64 => LogicalType::Int64,
            Annotation::SumF64 => LogicalType::Float64,
        }
    }

    /// Accumulator for summing a value column of `physical` type.
    pub fn sum_for(physical: PhysicalType) -> Option<Self> {
        match physical {
            PhysicalType::I32 | PhysicalType::I64 | PhysicalType::U32 | PhysicalType::U64 => {
                Some(Annotation::SumI64)
            }
            PhysicalType::F32 | PhysicalType::F64 => Some(Annotation::SumF64),
            PhysicalType::U8 => None,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "count" => Some(Annotation::Count),
            "sum_i64" | "sumi64" => Some(Annotation::SumI64),
            "sum_f64" | "sumf64" => Some(Annotation::SumF64),
            _ => None,
        }
    }
}

/// The value given to one placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundValue {
    Attribute(AttributeBinding),
    Annotation(Annotation),
    Literal(String),
}

impl BoundValue {
    /// Whether this value may fill a placeholder declared with `role`.
    pub fn fits(&self, role: Role) -> bool {
        matches!(
            (self, role),
            (BoundValue::Attribute(_), Role::Key | Role::Value)
                | (BoundValue::Annotation(_), Role::Annotation)
                | (BoundValue::Literal(_), Role::Literal)
        )
    }

    fn kind(&self) -> &'static str {
        match self {
            BoundValue::Attribute(_) => "attribute",
            BoundValue::Annotation(_) => "annotation",
            BoundValue::Literal(_) => "literal",
        }
    }
}

impl fmt::Display for BoundValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundValue::Attribute(a) => write!(
                f,
                "attribute {}: {}/{:?}/{}",
                a.column,
                a.logical().name(),
                a.physical(),
                a.hash.tag()
            ),
            other => f.write_str(other.kind()),
        }
    }
}

/// Placeholder name -> bound value. Built with the chaining helpers:
///
/// ```
/// use querygen_codegen::{Annotation, AttributeBinding, Binding};
/// use querygen_core::schema::{ColumnType, LogicalType};
/// use querygen_encoding::HashKind;
///
/// let b = Binding::new()
///     .attribute("KEY", AttributeBinding::new("word", ColumnType::of(LogicalType::Utf8), HashKind::Fx))
///     .annotation("AGG", Annotation::Count);
/// assert_eq!(b.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    slots: BTreeMap<String, BoundValue>,
}

impl Binding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute(self, name: impl Into<String>, attr: AttributeBinding) -> Self {
        self.with(name, BoundValue::Attribute(attr))
    }

    pub fn annotation(self, name: impl Into<String>, ann: Annotation) -> Self {
        self.with(name, BoundValue::Annotation(ann))
    }

    pub fn literal(self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.with(name, BoundValue::Literal(text.into()))
    }

    /// Bind `name`, replacing any earlier value.
    pub fn with(mut self, name: impl Into<String>, value: BoundValue) -> Self {
        self.slots.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&BoundValue> {
        self.slots.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BoundValue)> {
        self.slots.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
