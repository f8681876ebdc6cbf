//! Lookup table of unit factories.
//!
//! Registering a [`GeneratedUnit`] resolves its descriptor to the kernel the
//! generated source names, with the same type parameters, and stores a factory
//! that builds a fresh [`Application`] per call. Factories are keyed by the
//! unit's fingerprint: units that share a name (same type shape, different
//! columns or literals) live side by side.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use querygen_core::hash::Hash256;
use querygen_core::schema::PhysicalType;

use crate::application::{Application, KernelApp, QueryKernel};
use crate::context::ExecContext;
use crate::descriptor::UnitDescriptor;
use crate::error::{Error, Result};
use crate::kernels::{GroupCount, GroupSum, PrefixCount};
use crate::template::Kernel;
use crate::unit::GeneratedUnit;

/// Builds a new, not yet run, unit bound to an execution context.
pub type Factory = Arc<dyn Fn(ExecContext) -> Box<dyn Application> + Send + Sync>;

struct Entry {
    descriptor: UnitDescriptor,
    factory: Factory,
}

#[derive(Default)]
pub struct Registry {
    units: HashMap<Hash256, Entry>,
    /// Unit name -> fingerprint of the unit most recently registered under it.
    latest: HashMap<String, Hash256>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the factory for `unit` and return it. Registering the same source
    /// again returns the existing factory.
    pub fn register(&mut self, unit: &GeneratedUnit) -> Result<Factory> {
        let fingerprint = unit.fingerprint();
        self.latest.insert(unit.unit_name().to_string(), fingerprint);
        if let Some(entry) = self.units.get(&fingerprint) {
            return Ok(Arc::clone(&entry.factory));
        }

        let factory = factory_for(unit.descriptor())?;
        self.units.insert(
            fingerprint,
            Entry {
                descriptor: unit.descriptor().clone(),
                factory: Arc::clone(&factory),
            },
        );
        tracing::debug!(
            unit = unit.unit_name(),
            fingerprint = %fingerprint,
            registered = self.units.len(),
            "registered unit"
        );
        Ok(factory)
    }

    /// Whether this exact source has been registered.
    pub fn is_registered(&self, unit: &GeneratedUnit) -> bool {
        self.units.contains_key(&unit.fingerprint())
    }

    /// Factory of the unit whose source hashes to `fingerprint`.
    pub fn factory(&self, fingerprint: &Hash256) -> Option<Factory> {
        self.units.get(fingerprint).map(|e| Arc::clone(&e.factory))
    }

    /// A newly owned instance of the unit most recently registered as `name`.
    pub fn init_app(&self, name: &str, ctx: ExecContext) -> Result<Box<dyn Application>> {
        let entry = self
            .latest
            .get(name)
            .and_then(|fp| self.units.get(fp))
            .ok_or_else(|| Error::UnknownUnit(name.to_string()))?;
        Ok((entry.factory)(ctx))
    }

    /// Descriptor of the unit most recently registered as `name`.
    pub fn descriptor(&self, name: &str) -> Option<&UnitDescriptor> {
        self.latest
            .get(name)
            .and_then(|fp| self.units.get(fp))
            .map(|e| &e.descriptor)
    }

    pub fn unit_names(&self) -> impl Iterator<Item = &str> {
        self.latest.keys().map(String::as_str)
    }

    /// Number of distinct registered sources.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.unit_names().collect();
        names.sort_unstable();
        f.debug_struct("Registry")
            .field("units", &self.units.len())
            .field("names", &names)
            .finish()
    }
}

fn kernel_factory<Q: QueryKernel + Clone>(name: String, kernel: Q) -> Factory {
    Arc::new(move |ctx: ExecContext| -> Box<dyn Application> {
        Box::new(KernelApp::new(name.clone(), kernel.clone(), ctx))
    })
}

fn not_a_key(physical: PhysicalType) -> Error {
    Error::InvalidBinding(format!("{physical:?} cannot be a group key"))
}

fn factory_for(desc: &UnitDescriptor) -> Result<Factory> {
    let name = desc.unit_name.clone();
    let key = desc.key()?;
    let key_column = key.column.clone();

    match desc.kernel {
        Kernel::GroupCount => crate::with_key_type!(key.physical(), K => {
            crate::with_hash_strategy!(key.hash, S => {
                Ok(kernel_factory(name, GroupCount::<K, S>::new(key_column)))
            })
        }, else other => Err(not_a_key(other))),

        Kernel::GroupSum => {
            let value = desc.value()?;
            let value_column = value.column.clone();
            crate::with_key_type!(key.physical(), K => {
                crate::with_sum_type!(value.physical(), V => {
                    crate::with_hash_strategy!(key.hash, S => {
                        Ok(kernel_factory(
                            name,
                            GroupSum::<K, V, S>::new(key_column, value_column),
                        ))
                    })
                }, else other => Err(Error::InvalidBinding(format!(
                    "{other:?} values cannot be summed"
                ))))
            }, else other => Err(not_a_key(other)))
        }

        Kernel::PrefixCount => {
            let prefix = desc.first_literal()?.to_string();
            crate::with_key_type!(key.physical(), K => {
                crate::with_hash_strategy!(key.hash, S => {
                    Ok(kernel_factory(name, PrefixCount::<K, S>::new(key_column, prefix)))
                })
            }, else other => Err(not_a_key(other)))
        }
    }
}
