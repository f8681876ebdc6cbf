#![forbid(unsafe_code)]
//! querygen-codegen: turns query templates into specialized units.
//!
//! A [`Template`] is source text with `{{NAME}}` / `{{NAME:facet}}` tokens and
//! a fixed [`Kernel`]. Binding it to concrete column types and hash strategies
//! ([`bind`]) and substituting every token ([`BoundTemplate::generate`])
//! yields a [`GeneratedUnit`]: deterministic Rust source that monomorphizes a
//! generic kernel from [`kernels`], plus a [`UnitDescriptor`] carrying the same
//! choices in machine-readable form.
//!
//! In process, the [`Registry`] maps the descriptor onto the same kernel
//! instantiation through tagged-variant dispatch and hands out fresh
//! [`Application`]s via `init_app`.

pub mod application;
pub mod binding;
pub mod builtin;
pub mod context;
pub mod descriptor;
mod dispatch;
pub mod error;
pub mod instantiate;
pub mod kernels;
pub mod lifecycle;
pub mod registry;
mod scan;
pub mod template;
pub mod unit;

pub use application::{Application, KernelApp, QueryKernel, ResultHandle};
pub use binding::{Annotation, AttributeBinding, Binding, BoundValue};
pub use builtin::{builtin, builtins, BUILTIN_IDS};
pub use context::ExecContext;
pub use descriptor::{SlotBinding, UnitDescriptor};
pub use error::{Error, LifecycleViolation, Result};
pub use instantiate::{bind, instantiate, BoundTemplate};
pub use lifecycle::Stage;
pub use registry::{Factory, Registry};
pub use template::{Kernel, Placeholder, Role, Template};
pub use unit::GeneratedUnit;

// Used by the dispatch macros.
pub use querygen_core::schema::PhysicalType;
pub use querygen_encoding::{hash, HashKind};
