//! Query templates: a fixed kernel plus source text with placeholder tokens.
//!
//! Tokens are written `{{NAME}}` or `{{NAME:facet}}`. Which facets a token
//! accepts depends on the role its placeholder is declared with; the reserved
//! token `{{UNIT}}` always expands to the generated unit's name.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Token that every template may use without declaring it.
pub const UNIT_TOKEN: &str = "UNIT";

/// What a placeholder stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Grouping attribute; must encode to an integer physical type.
    Key,
    /// Aggregated attribute; must be numeric.
    Value,
    /// Aggregate accumulator type.
    Annotation,
    /// Constant text baked into the unit (e.g. a prefix).
    Literal,
}

impl Role {
    pub fn is_attribute(self) -> bool {
        matches!(self, Role::Key | Role::Value)
    }

    /// Facets a token of this role may request. The first is the default.
    pub fn facets(self) -> &'static [&'static str] {
        match self {
            Role::Key | Role::Value => &["type", "tag", "hash", "column", "logical"],
            Role::Annotation => &["type", "tag"],
            Role::Literal => &["literal"],
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Key => "key",
            Role::Value => "value",
            Role::Annotation => "annotation",
            Role::Literal => "literal",
        };
        f.write_str(s)
    }
}

/// The fixed algorithm a template specializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kernel {
    /// Rows per distinct key.
    GroupCount,
    /// Sum of a value column per distinct key.
    GroupSum,
    /// Rows per distinct string key starting with a literal prefix.
    PrefixCount,
}

/// How many placeholders of each role a kernel consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelShape {
    pub keys: usize,
    pub values: usize,
    pub annotations: usize,
    pub literals: usize,
}

impl Kernel {
    pub fn shape(self) -> KernelShape {
        match self {
            Kernel::GroupCount => KernelShape { keys: 1, values: 0, annotations: 1, literals: 0 },
            Kernel::GroupSum => KernelShape { keys: 1, values: 1, annotations: 1, literals: 0 },
            Kernel::PrefixCount => KernelShape { keys: 1, values: 0, annotations: 1, literals: 1 },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Kernel::GroupCount => "GroupCount",
            Kernel::GroupSum => "GroupSum",
            Kernel::PrefixCount => "PrefixCount",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placeholder {
    pub name: String,
    pub role: Role,
}

impl Placeholder {
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self { name: name.into(), role }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Template {
    id: String,
    kernel: Kernel,
    placeholders: Vec<Placeholder>,
    source: String,
}

impl Template {
    /// Build a template, checking its id, placeholder names and that the
    /// declared roles fit the kernel. Token syntax in `source` is checked when
    /// a unit is generated.
    pub fn new(
        id: impl Into<String>,
        kernel: Kernel,
        placeholders: Vec<Placeholder>,
        source: impl Into<String>,
    ) -> Result<Self> {
        let id = id.into();
        let invalid = |reason: String| Error::InvalidTemplate {
            template: id.clone(),
            reason,
        };

        if id.is_empty()
            || !id.starts_with(|c: char| c.is_ascii_lowercase())
            || !id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(invalid("template id must be snake_case".into()));
        }

        for (i, p) in placeholders.iter().enumerate() {
            if !is_token_name(&p.name) {
                return Err(invalid(format!("'{}' is not a valid placeholder name", p.name)));
            }
            if p.name == UNIT_TOKEN {
                return Err(invalid(format!("'{UNIT_TOKEN}' is reserved")));
            }
            if placeholders[..i].iter().any(|q| q.name == p.name) {
                return Err(invalid(format!("placeholder '{}' declared twice", p.name)));
            }
        }

        let count = |role: Role| placeholders.iter().filter(|p| p.role == role).count();
        let want = kernel.shape();
        let have = KernelShape {
            keys: count(Role::Key),
            values: count(Role::Value),
            annotations: count(Role::Annotation),
            literals: count(Role::Literal),
        };
        if want != have {
            return Err(invalid(format!(
                "{} needs {want:?} placeholders, template declares {have:?}",
                kernel.name()
            )));
        }

        Ok(Self {
            id,
            kernel,
            placeholders,
            source: source.into(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    pub fn placeholders(&self) -> &[Placeholder] {
        &self.placeholders
    }

    pub fn placeholder(&self, name: &str) -> Option<&Placeholder> {
        self.placeholders.iter().find(|p| p.name == name)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// `group_count` -> `GroupCount`.
    pub fn camel_id(&self) -> String {
        self.id
            .split('_')
            .filter(|s| !s.is_empty())
            .map(|s| {
                let mut cs = s.chars();
                match cs.next() {
                    Some(c) => c.to_ascii_uppercase().to_string() + cs.as_str(),
                    None => String::new(),
                }
            })
            .collect()
    }
}

/// `[A-Z][A-Z0-9_]*`
pub(crate) fn is_token_name(s: &str) -> bool {
    let mut cs = s.chars();
    matches!(cs.next(), Some(c) if c.is_ascii_uppercase())
        && cs.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ph(name: &str, role: Role) -> Placeholder {
        Placeholder::new(name, role)
    }

    #[test]
    fn shape_must_match_kernel() {
        let err = Template::new("gc", Kernel::GroupCount, vec![ph("KEY", Role::Key)], "").unwrap_err();
        assert!(matches!(err, Error::InvalidTemplate { .. }));

        let ok = Template::new(
            "gc",
            Kernel::GroupCount,
            vec![ph("KEY", Role::Key), ph("AGG", Role::Annotation)],
            "",
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn rejects_bad_names() {
        let ps = || vec![ph("KEY", Role::Key), ph("AGG", Role::Annotation)];
        assert!(Template::new("GroupCount", Kernel::GroupCount, ps(), "").is_err());
        assert!(Template::new(
            "gc",
            Kernel::GroupCount,
            vec![ph("UNIT", Role::Key), ph("AGG", Role::Annotation)],
            ""
        )
        .is_err());
        assert!(Template::new(
            "gc",
            Kernel::GroupCount,
            vec![ph("key", Role::Key), ph("AGG", Role::Annotation)],
            ""
        )
        .is_err());
    }

    #[test]
    fn camel_case_id() {
        let t = Template::new(
            "prefix_count",
            Kernel::PrefixCount,
            vec![
                ph("KEY", Role::Key),
                ph("AGG", Role::Annotation),
                ph("PREFIX", Role::Literal),
            ],
            "",
        )
        .unwrap();
        assert_eq!(t.camel_id(), "PrefixCount");
    }
}
