//! Machine-readable description of a generated unit.
//!
//! The descriptor carries everything the source text encodes about types and
//! columns, so the in-process registry can pick the matching monomorphized
//! kernel without parsing source.

use serde::{Deserialize, Serialize};

use crate::binding::{Annotation, AttributeBinding};
use crate::error::{Error, Result};
use crate::template::{Kernel, Role};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotBinding {
    pub placeholder: String,
    pub role: Role,
    pub attribute: AttributeBinding,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitDescriptor {
    pub template: String,
    pub kernel: Kernel,
    pub unit_name: String,
    /// Attribute slots in template declaration order.
    pub attributes: Vec<SlotBinding>,
    pub annotation: Annotation,
    /// `(placeholder, text)` in template declaration order.
    pub literals: Vec<(String, String)>,
}

impl UnitDescriptor {
    fn role(&self, role: Role) -> Option<&AttributeBinding> {
        self.attributes
            .iter()
            .find(|s| s.role == role)
            .map(|s| &s.attribute)
    }

    pub fn key(&self) -> Result<&AttributeBinding> {
        self.role(Role::Key).ok_or_else(|| {
            Error::InvalidBinding(format!("unit '{}' has no key attribute", self.unit_name))
        })
    }

    pub fn value(&self) -> Result<&AttributeBinding> {
        self.role(Role::Value).ok_or_else(|| {
            Error::InvalidBinding(format!("unit '{}' has no value attribute", self.unit_name))
        })
    }

    pub fn first_literal(&self) -> Result<&str> {
        self.literals
            .first()
            .map(|(_, text)| text.as_str())
            .ok_or_else(|| {
                Error::InvalidBinding(format!("unit '{}' has no literal", self.unit_name))
            })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Exec(e.to_string()))
    }
}

/// `Query` + CamelCase template id + `_<physical>_<hash>` per attribute +
/// `_<annotation>`.
pub fn unit_name(camel_id: &str, attributes: &[SlotBinding], annotation: Annotation) -> String {
    let mut name = format!("Query{camel_id}");
    for slot in attributes {
        name.push('_');
        name.push_str(slot.attribute.physical().tag());
        name.push('_');
        name.push_str(slot.attribute.hash.tag());
    }
    name.push('_');
    name.push_str(annotation.tag());
    name
}
