//! The reference host: drives one query through its lifecycle.
//!
//! Each stage is a value the next step consumes:
//! `Template + Binding` → [`GeneratedUnit`] → [`LoadedUnit`] →
//! [`ExecutedUnit`] → [`QueryOutput`].

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use querygen_codegen::{
    bind, Application, Binding, ExecContext, Factory, GeneratedUnit, Registry, ResultHandle,
    Stage, Template, UnitDescriptor,
};
use querygen_core::config::EngineConfig;
use querygen_core::manifest::RunManifest;
use querygen_encoding::Dictionaries;

use crate::error::{ExecError, Result};
use crate::interpret::{interpret, ResultRow};

pub struct Host {
    config: EngineConfig,
    registry: Registry,
}

/// A unit whose factory is registered and can be instantiated.
///
/// Holds its own factory, so later registrations under the same unit name
/// cannot change what it runs.
pub struct LoadedUnit {
    unit: GeneratedUnit,
    factory: Factory,
    cache_hit: bool,
    started_ms: u64,
}

impl fmt::Debug for LoadedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedUnit")
            .field("unit", &self.unit.unit_name())
            .field("fingerprint", &self.unit.fingerprint())
            .field("cache_hit", &self.cache_hit)
            .finish()
    }
}

/// A unit that has run; owns its result until it is consumed.
#[derive(Debug)]
pub struct ExecutedUnit {
    descriptor: UnitDescriptor,
    result: ResultHandle,
    dictionaries: Dictionaries,
    manifest: RunManifest,
    rows_scanned: u64,
}

/// Decoded rows of a consumed result, plus the run manifest.
#[derive(Debug, Clone)]
pub struct QueryOutput {
    rows: Vec<ResultRow>,
    manifest: RunManifest,
}

impl Host {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            registry: Registry::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Bind and generate, writing the source to `generated_dir` if configured.
    pub fn generate(&self, template: &Template, binding: &Binding) -> Result<GeneratedUnit> {
        let unit = bind(template, binding)?.generate()?;
        if let Some(dir) = &self.config.generated_dir {
            unit.write_to(dir)?;
        }
        Ok(unit)
    }

    /// Register `unit`, reusing the existing factory when the same source was
    /// registered before.
    pub fn load(&mut self, unit: GeneratedUnit) -> Result<LoadedUnit> {
        let started_ms = now_ms();
        let cache_hit = self.registry.is_registered(&unit);
        let factory = self.registry.register(&unit)?;
        tracing::debug!(
            unit = unit.unit_name(),
            fingerprint = %unit.fingerprint(),
            cache_hit,
            stage = %Stage::Loaded,
            "unit loaded"
        );
        Ok(LoadedUnit {
            unit,
            factory,
            cache_hit,
            started_ms,
        })
    }

    /// Instantiate and run a loaded unit against `ctx`.
    pub fn run(&self, loaded: LoadedUnit, ctx: ExecContext) -> Result<ExecutedUnit> {
        let name = loaded.unit.unit_name().to_string();
        let rows_scanned = ctx.store().total_rows() as u64;
        let dictionaries = ctx.dictionaries().clone();

        let mut app: Box<dyn Application> = (loaded.factory)(ctx);
        app.run()?;
        let result = app
            .take_result()
            .ok_or_else(|| ExecError::MissingResult { unit: name.clone() })?;
        drop(app);

        let mut manifest = RunManifest::new(
            loaded.unit.descriptor().template.clone(),
            name,
            loaded.unit.fingerprint(),
            loaded.started_ms,
        );
        manifest.cache_hit = loaded.cache_hit;
        tracing::debug!(unit = %manifest.unit_name, stage = %Stage::Executed, rows_scanned, "unit executed");

        Ok(ExecutedUnit {
            descriptor: loaded.unit.descriptor().clone(),
            result,
            dictionaries,
            manifest,
            rows_scanned,
        })
    }

    /// Whole lifecycle: bind → generate → load → run → consume.
    pub fn execute(
        &mut self,
        template: &Template,
        binding: &Binding,
        ctx: ExecContext,
    ) -> Result<QueryOutput> {
        let unit = self.generate(template, binding)?;
        let loaded = self.load(unit)?;
        let executed = self.run(loaded, ctx)?;
        let output = executed.consume()?;
        tracing::info!(
            unit = %output.manifest.unit_name,
            rows = output.num_rows(),
            cache_hit = output.manifest.cache_hit,
            elapsed_ms = output.manifest.finished_ms.saturating_sub(output.manifest.started_ms),
            "query finished"
        );
        Ok(output)
    }
}

impl LoadedUnit {
    pub fn unit(&self) -> &GeneratedUnit {
        &self.unit
    }

    pub fn cache_hit(&self) -> bool {
        self.cache_hit
    }

    pub fn stage(&self) -> Stage {
        Stage::Loaded
    }
}

impl ExecutedUnit {
    pub fn descriptor(&self) -> &UnitDescriptor {
        &self.descriptor
    }

    pub fn stage(&self) -> Stage {
        Stage::Executed
    }

    /// Take ownership of the result and decode it.
    pub fn consume(self) -> Result<QueryOutput> {
        let rows = interpret(&self.descriptor, self.result, &self.dictionaries)?;
        let manifest = self
            .manifest
            .finish(now_ms(), self.rows_scanned, rows.len() as u64);
        Ok(QueryOutput { rows, manifest })
    }
}

impl QueryOutput {
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<ResultRow> {
        self.rows
    }

    pub fn manifest(&self) -> &RunManifest {
        &self.manifest
    }

    pub fn stage(&self) -> Stage {
        Stage::Consumed
    }

    /// Value for the row whose key is `key`.
    pub fn get(&self, key: &querygen_core::types::Scalar) -> Option<&querygen_core::types::Scalar> {
        self.rows.iter().find(|r| &r.key == key).map(|r| &r.value)
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
