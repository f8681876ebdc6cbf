//! Templates shipped with the engine.

use crate::template::{Kernel, Placeholder, Role, Template};

pub const BUILTIN_IDS: [&str; 3] = ["group_count", "group_sum", "prefix_count"];

const GROUP_COUNT_SRC: &str = r#"// Generated by querygen from template `group_count`.
use querygen_codegen::kernels::{GroupCount, GroupTable};
use querygen_codegen::{Application, ExecContext, KernelApp};

/// Rows per distinct {{KEY:column}} ({{KEY:logical}} stored as {{KEY:tag}}).
pub type {{UNIT}} = GroupCount<{{KEY}}, {{KEY:hash}}>;
pub type {{UNIT}}Result = GroupTable<{{KEY}}, {{AGG}}>;

pub fn init_app(ctx: ExecContext) -> Box<dyn Application> {
    Box::new(KernelApp::new("{{UNIT}}", {{UNIT}}::new({{KEY:column}}), ctx))
}
"#;

const GROUP_SUM_SRC: &str = r#"// Generated by querygen from template `group_sum`.
use querygen_codegen::kernels::{GroupSum, GroupTable};
use querygen_codegen::{Application, ExecContext, KernelApp};

/// Sum of {{VAL:column}} ({{VAL:logical}}) per distinct {{KEY:column}} ({{KEY:logical}}).
pub type {{UNIT}} = GroupSum<{{KEY}}, {{VAL}}, {{KEY:hash}}>;
pub type {{UNIT}}Result = GroupTable<{{KEY}}, {{AGG}}>;

pub fn init_app(ctx: ExecContext) -> Box<dyn Application> {
    Box::new(KernelApp::new(
        "{{UNIT}}",
        {{UNIT}}::new({{KEY:column}}, {{VAL:column}}),
        ctx,
    ))
}
"#;

const PREFIX_COUNT_SRC: &str = r#"// Generated by querygen from template `prefix_count`.
use querygen_codegen::kernels::{GroupTable, PrefixCount};
use querygen_codegen::{Application, ExecContext, KernelApp};

pub const PREFIX: &str = {{PREFIX}};

/// Rows per distinct {{KEY:column}} starting with `PREFIX`.
pub type {{UNIT}} = PrefixCount<{{KEY}}, {{KEY:hash}}>;
pub type {{UNIT}}Result = GroupTable<{{KEY}}, {{AGG}}>;

pub fn init_app(ctx: ExecContext) -> Box<dyn Application> {
    Box::new(KernelApp::new("{{UNIT}}", {{UNIT}}::new({{KEY:column}}, PREFIX), ctx))
}
"#;

/// The built-in template named `id`.
pub fn builtin(id: &str) -> Option<Template> {
    let (kernel, placeholders, src) = match id {
        "group_count" => (
            Kernel::GroupCount,
            vec![
                Placeholder::new("KEY", Role::Key),
                Placeholder::new("AGG", Role::Annotation),
            ],
            GROUP_COUNT_SRC,
        ),
        "group_sum" => (
            Kernel::GroupSum,
            vec![
                Placeholder::new("KEY", Role::Key),
                Placeholder::new("VAL", Role::Value),
                Placeholder::new("AGG", Role::Annotation),
            ],
            GROUP_SUM_SRC,
        ),
        "prefix_count" => (
            Kernel::PrefixCount,
            vec![
                Placeholder::new("KEY", Role::Key),
                Placeholder::new("AGG", Role::Annotation),
                Placeholder::new("PREFIX", Role::Literal),
            ],
            PREFIX_COUNT_SRC,
        ),
        _ => return None,
    };
    Template::new(id, kernel, placeholders, src).ok()
}

pub fn builtins() -> Vec<Template> {
    BUILTIN_IDS.iter().filter_map(|id| builtin(id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{Annotation, AttributeBinding, Binding};
    use crate::instantiate::instantiate;
    use querygen_core::schema::{ColumnType, LogicalType};
    use querygen_encoding::HashKind;

    #[test]
    fn all_builtins_are_valid() {
        assert_eq!(builtins().len(), BUILTIN_IDS.len());
        assert!(builtin("nope").is_none());
    }

    #[test]
    fn group_count_source_is_fully_substituted() {
        let t = builtin("group_count").unwrap();
        let b = Binding::new()
            .attribute(
                "KEY",
                AttributeBinding::new("word", ColumnType::of(LogicalType::Utf8), HashKind::Fx),
            )
            .annotation("AGG", Annotation::Count);
        let unit = instantiate(&t, &b).unwrap();
        let src = unit.source();
        assert!(!src.contains("{{"));
        assert!(src.contains(
            "pub type QueryGroupCount_U32_FX_COUNT = GroupCount<u32, querygen_encoding::hash::Fx>;"
        ));
        assert!(src.contains("pub type QueryGroupCount_U32_FX_COUNTResult = GroupTable<u32, u64>;"));
        assert!(src.contains("QueryGroupCount_U32_FX_COUNT::new(\"word\")"));
    }
}
