//! The contract between a generated unit and the host that runs it.

use std::any::Any;
use std::fmt;

use crate::context::ExecContext;
use crate::error::{Error, LifecycleViolation, Result};

/// A runnable query unit.
///
/// `run` executes the query exactly once; afterwards `take_result` hands the
/// result to the caller, who owns it from then on.
pub trait Application: Send {
    fn run(&mut self) -> Result<()>;

    /// The result of a successful `run`. Returns `None` before `run`, after a
    /// failed `run`, and on every call after the first.
    fn take_result(&mut self) -> Option<ResultHandle>;
}

/// Opaque result of a unit. The host downcasts it to the type agreed at
/// generation time (see `UnitDescriptor`).
pub struct ResultHandle(Box<dyn Any + Send>);

impl ResultHandle {
    pub fn new<T: Any + Send>(value: T) -> Self {
        Self(Box::new(value))
    }

    pub fn is<T: Any>(&self) -> bool {
        self.0.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Recover the concrete result, or the handle unchanged if `T` is wrong.
    pub fn downcast<T: Any>(self) -> std::result::Result<Box<T>, Self> {
        self.0.downcast::<T>().map_err(Self)
    }
}

impl fmt::Debug for ResultHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResultHandle(..)")
    }
}

/// The algorithm a unit runs, specialized to concrete key/value/hash types.
pub trait QueryKernel: Send + Sync + 'static {
    type Output: Send + 'static;

    fn execute(&self, ctx: &ExecContext) -> Result<Self::Output>;
}

/// Adapts a kernel and its context to [`Application`].
pub struct KernelApp<Q: QueryKernel> {
    name: String,
    kernel: Q,
    ctx: ExecContext,
    ran: bool,
    result: Option<ResultHandle>,
}

impl<Q: QueryKernel> KernelApp<Q> {
    pub fn new(name: impl Into<String>, kernel: Q, ctx: ExecContext) -> Self {
        Self {
            name: name.into(),
            kernel,
            ctx,
            ran: false,
            result: None,
        }
    }
}

impl<Q: QueryKernel> Application for KernelApp<Q> {
    fn run(&mut self) -> Result<()> {
        if self.ran {
            return Err(Error::Lifecycle {
                unit: self.name.clone(),
                violation: LifecycleViolation::AlreadyRun,
            });
        }
        self.ran = true;
        let output = self.kernel.execute(&self.ctx)?;
        self.result = Some(ResultHandle::new(output));
        tracing::debug!(unit = %self.name, "unit finished");
        Ok(())
    }

    fn take_result(&mut self) -> Option<ResultHandle> {
        self.result.take()
    }
}
