//! Binding templates and generating unit source.

use querygen_core::schema::{ColumnType, LogicalType};

use crate::binding::{Annotation, Binding, BoundValue};
use crate::descriptor::{unit_name, SlotBinding, UnitDescriptor};
use crate::error::{Error, Result};
use crate::lifecycle::Stage;
use crate::scan::{scan, Piece};
use crate::template::{Kernel, Role, Template, UNIT_TOKEN};
use crate::unit::GeneratedUnit;

/// A template whose placeholders all have validated values.
#[derive(Debug, Clone)]
pub struct BoundTemplate {
    template: Template,
    binding: Binding,
    descriptor: UnitDescriptor,
}

/// Validate `binding` against `template`.
pub fn bind(template: &Template, binding: &Binding) -> Result<BoundTemplate> {
    let tid = template.id();
    let mut attributes = Vec::new();
    let mut annotation = None;
    let mut literals = Vec::new();

    for p in template.placeholders() {
        let value = binding.get(&p.name).ok_or_else(|| Error::UnboundPlaceholder {
            template: tid.to_string(),
            token: p.name.clone(),
        })?;
        if !value.fits(p.role) {
            return Err(Error::InvalidBinding(format!(
                "'{}' is a {} placeholder, bound to {value}",
                p.name, p.role
            )));
        }
        match value {
            BoundValue::Attribute(attr) => {
                ColumnType::new(attr.logical(), attr.physical())?;
                check_attribute_role(&p.name, p.role, attr.column_type)?;
                attributes.push(SlotBinding {
                    placeholder: p.name.clone(),
                    role: p.role,
                    attribute: attr.clone(),
                });
            }
            BoundValue::Annotation(a) => annotation = Some(*a),
            BoundValue::Literal(text) => {
                if text.contains("{{") {
                    return Err(Error::InvalidBinding(format!(
                        "literal for '{}' may not contain '{{{{'",
                        p.name
                    )));
                }
                literals.push((p.name.clone(), text.clone()));
            }
        }
    }

    if let Some((extra, _)) = binding.iter().find(|(n, _)| template.placeholder(n).is_none()) {
        return Err(Error::InvalidBinding(format!(
            "template '{tid}' declares no placeholder '{extra}'"
        )));
    }

    let annotation = annotation.ok_or_else(|| {
        Error::InvalidBinding(format!("template '{tid}' has no annotation slot"))
    })?;
    check_kernel(template.kernel(), &attributes, annotation)?;

    let descriptor = UnitDescriptor {
        template: tid.to_string(),
        kernel: template.kernel(),
        unit_name: unit_name(&template.camel_id(), &attributes, annotation),
        attributes,
        annotation,
        literals,
    };
    tracing::trace!(template = tid, unit = %descriptor.unit_name, "bound template");
    Ok(BoundTemplate {
        template: template.clone(),
        binding: binding.clone(),
        descriptor,
    })
}

fn check_attribute_role(name: &str, role: Role, ty: ColumnType) -> Result<()> {
    match role {
        Role::Key if !ty.physical().is_key() => Err(Error::InvalidBinding(format!(
            "key '{name}' must encode to an integer type, got {:?}",
            ty.physical()
        ))),
        Role::Value if ty.logical().is_string() || Annotation::sum_for(ty.physical()).is_none() => {
            Err(Error::InvalidBinding(format!(
                "value '{name}' must be numeric, got {}/{:?}",
                ty.logical().name(),
                ty.physical()
            )))
        }
        _ => Ok(()),
    }
}

fn check_kernel(kernel: Kernel, attrs: &[SlotBinding], annotation: Annotation) -> Result<()> {
    let key = attrs.iter().find(|s| s.role == Role::Key);
    let value = attrs.iter().find(|s| s.role == Role::Value);
    match kernel {
        Kernel::GroupCount | Kernel::PrefixCount if annotation != Annotation::Count => {
            Err(Error::InvalidBinding(format!(
                "{} aggregates with Count, got {annotation:?}",
                kernel.name()
            )))
        }
        Kernel::GroupSum => {
            let value = value.ok_or_else(|| {
                Error::InvalidBinding("GroupSum needs a value attribute".into())
            })?;
            let want = Annotation::sum_for(value.attribute.physical());
            if want != Some(annotation) {
                return Err(Error::InvalidBinding(format!(
                    "annotation {annotation:?} cannot accumulate {:?} values (use {want:?})",
                    value.attribute.physical()
                )));
            }
            Ok(())
        }
        Kernel::PrefixCount => match key {
            Some(k) if k.attribute.logical() == LogicalType::Utf8 => Ok(()),
            _ => Err(Error::InvalidBinding(
                "PrefixCount needs a Utf8 key attribute".into(),
            )),
        },
        Kernel::GroupCount => Ok(()),
    }
}

impl BoundTemplate {
    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn descriptor(&self) -> &UnitDescriptor {
        &self.descriptor
    }

    pub fn stage(&self) -> Stage {
        Stage::Bound
    }

    /// Substitute every token in the template text.
    pub fn generate(&self) -> Result<GeneratedUnit> {
        let tid = self.template.id();
        let pieces = scan(self.template.source()).map_err(|reason| Error::InvalidTemplate {
            template: tid.to_string(),
            reason,
        })?;

        let mut source = String::with_capacity(self.template.source().len() + 64);
        for piece in pieces {
            match piece {
                Piece::Text(t) => source.push_str(t),
                Piece::Token { name, facet, offset } => {
                    let expanded = self.expand(name, facet, offset)?;
                    source.push_str(&expanded);
                }
            }
        }

        let unit = GeneratedUnit::new(source, self.descriptor.clone());
        tracing::debug!(
            template = tid,
            unit = %unit.unit_name(),
            fingerprint = %unit.fingerprint(),
            "generated unit"
        );
        Ok(unit)
    }

    fn expand(&self, name: &str, facet: Option<&str>, offset: usize) -> Result<String> {
        let tid = self.template.id();
        let bad_facet = |f: &str| Error::InvalidTemplate {
            template: tid.to_string(),
            reason: format!("unknown facet '{f}' for '{name}' at byte {offset}"),
        };

        if name == UNIT_TOKEN {
            return match facet {
                None => Ok(self.descriptor.unit_name.clone()),
                Some(f) => Err(bad_facet(f)),
            };
        }

        let unbound = || Error::UnboundPlaceholder {
            template: tid.to_string(),
            token: name.to_string(),
        };
        let role = self.template.placeholder(name).ok_or_else(unbound)?.role;
        let facet = match facet {
            Some(f) if role.facets().contains(&f) => f,
            Some(f) => return Err(bad_facet(f)),
            None => role.facets()[0],
        };

        Ok(match (self.binding.get(name).ok_or_else(unbound)?, facet) {
            (BoundValue::Attribute(a), "type") => a.physical().rust_type().to_string(),
            (BoundValue::Attribute(a), "tag") => a.physical().tag().to_string(),
            (BoundValue::Attribute(a), "hash") => a.hash.type_path().to_string(),
            (BoundValue::Attribute(a), "column") => format!("{:?}", a.column),
            (BoundValue::Attribute(a), "logical") => a.logical().name().to_string(),
            (BoundValue::Annotation(a), "type") => a.rust_type().to_string(),
            (BoundValue::Annotation(a), "tag") => a.tag().to_string(),
            (BoundValue::Literal(text), "literal") => format!("{text:?}"),
            (_, f) => return Err(bad_facet(f)),
        })
    }
}

/// `bind` followed by `generate`. Pure and deterministic.
pub fn instantiate(template: &Template, binding: &Binding) -> Result<GeneratedUnit> {
    bind(template, binding)?.generate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::AttributeBinding;
    use crate::template::Placeholder;
    use querygen_core::schema::PhysicalType;
    use querygen_encoding::HashKind;

    fn template(src: &str) -> Template {
        Template::new(
            "group_count",
            Kernel::GroupCount,
            vec![
                Placeholder::new("KEY", Role::Key),
                Placeholder::new("AGG", Role::Annotation),
            ],
            src,
        )
        .unwrap()
    }

    fn word_key() -> AttributeBinding {
        AttributeBinding::new("word", ColumnType::of(LogicalType::Utf8), HashKind::Fx)
    }

    fn binding() -> Binding {
        Binding::new()
            .attribute("KEY", word_key())
            .annotation("AGG", Annotation::Count)
    }

    #[test]
    fn expands_every_facet() {
        let t = template(
            "{{UNIT}} {{KEY}} {{KEY:tag}} {{KEY:hash}} {{KEY:column}} {{KEY:logical}} {{AGG}} {{AGG:tag}}",
        );
        let unit = instantiate(&t, &binding()).unwrap();
        assert_eq!(
            unit.source(),
            "QueryGroupCount_U32_FX_COUNT u32 U32 querygen_encoding::hash::Fx \"word\" Utf8 u64 COUNT"
        );
    }

    #[test]
    fn missing_binding_is_unbound_placeholder() {
        let t = template("{{KEY}}");
        let err = bind(&t, &Binding::new().attribute("KEY", word_key())).unwrap_err();
        assert!(matches!(err, Error::UnboundPlaceholder { ref token, .. } if token == "AGG"));
    }

    #[test]
    fn undeclared_token_is_unbound_placeholder() {
        let t = template("{{KEY}} {{OTHER}}");
        let err = instantiate(&t, &binding()).unwrap_err();
        assert!(matches!(err, Error::UnboundPlaceholder { ref token, .. } if token == "OTHER"));
    }

    #[test]
    fn unknown_facet_and_unterminated_are_invalid_template() {
        let err = instantiate(&template("{{KEY:literal}}"), &binding()).unwrap_err();
        assert!(matches!(err, Error::InvalidTemplate { .. }));
        let err = instantiate(&template("{{KEY"), &binding()).unwrap_err();
        assert!(matches!(err, Error::InvalidTemplate { .. }));
        let err = instantiate(&template("{{UNIT:type}}"), &binding()).unwrap_err();
        assert!(matches!(err, Error::InvalidTemplate { .. }));
    }

    #[test]
    fn role_and_type_checks() {
        let t = template("");
        let wrong_role = Binding::new()
            .literal("KEY", "x")
            .annotation("AGG", Annotation::Count);
        assert!(matches!(bind(&t, &wrong_role), Err(Error::InvalidBinding(_))));

        let float_key = Binding::new()
            .attribute(
                "KEY",
                AttributeBinding::new("f", ColumnType::of(LogicalType::Float64), HashKind::Fx),
            )
            .annotation("AGG", Annotation::Count);
        assert!(matches!(bind(&t, &float_key), Err(Error::InvalidBinding(_))));

        let wrong_ann = binding().annotation("AGG", Annotation::SumI64);
        assert!(matches!(bind(&t, &wrong_ann), Err(Error::InvalidBinding(_))));

        let extra = binding().literal("EXTRA", "x");
        assert!(matches!(bind(&t, &extra), Err(Error::InvalidBinding(_))));
    }

    #[test]
    fn group_sum_annotation_must_match_value_type() {
        let t = Template::new(
            "group_sum",
            Kernel::GroupSum,
            vec![
                Placeholder::new("KEY", Role::Key),
                Placeholder::new("VAL", Role::Value),
                Placeholder::new("AGG", Role::Annotation),
            ],
            "{{UNIT}}",
        )
        .unwrap();
        let val = |p: PhysicalType, l: LogicalType| {
            AttributeBinding::new("v", ColumnType::new(l, p).unwrap(), HashKind::Mix64)
        };
        let b = Binding::new()
            .attribute("KEY", word_key())
            .attribute("VAL", val(PhysicalType::F64, LogicalType::Float64))
            .annotation("AGG", Annotation::SumF64);
        let unit = instantiate(&t, &b).unwrap();
        assert_eq!(unit.source(), "QueryGroupSum_U32_FX_F64_MIX64_SUMF64");

        let b = b.annotation("AGG", Annotation::SumI64);
        assert!(matches!(bind(&t, &b), Err(Error::InvalidBinding(_))));
    }

    #[test]
    fn literals_are_quoted_and_brace_free() {
        let t = Template::new(
            "prefix_count",
            Kernel::PrefixCount,
            vec![
                Placeholder::new("KEY", Role::Key),
                Placeholder::new("AGG", Role::Annotation),
                Placeholder::new("PREFIX", Role::Literal),
            ],
            "{{PREFIX}}",
        )
        .unwrap();
        let b = binding().literal("PREFIX", "say \"hi\"");
        assert_eq!(instantiate(&t, &b).unwrap().source(), r#""say \"hi\"""#);
        let b = binding().literal("PREFIX", "{{KEY}}");
        assert!(matches!(bind(&t, &b), Err(Error::InvalidBinding(_))));
    }
}
