//! Components and the capability adapters behind them.
//!
//! Two layers:
//! - **Capability traits** ([`Extract`], [`Process`], [`Handle`]) are what
//!   user code implements: one pure-ish function from input to output plus an
//!   optional one-time `configure` hook.
//! - **[`Stage`]** wraps exactly one capability, owns the stage's `inputs` and
//!   `outputs` cells and implements [`Component`], which is what managers
//!   drive.
//!
//! Managers themselves implement [`Component`] too, so they nest.

use crate::component::cell::SharedCell;
use crate::component::role::Role;
use crate::error::{Result, StageGraphError};
use std::fmt;

/// A unit of work that managers can wire and run.
///
/// `run` reads the current value of `inputs` and stores a value in `outputs`.
/// Implementations must not write through `inputs`: in a parallel manager
/// every component reads the same slot.
pub trait Component<T>: Send {
    fn name(&self) -> &str;

    fn role(&self) -> Role;

    fn inputs(&self) -> &SharedCell<T>;

    fn inputs_mut(&mut self) -> &mut SharedCell<T>;

    fn outputs(&self) -> &SharedCell<T>;

    fn outputs_mut(&mut self) -> &mut SharedCell<T>;

    fn run(&mut self) -> Result<()>;
}

/// Produces data, treating the input as a source descriptor.
pub trait Extract<T>: Send {
    /// Called exactly once, when the owning [`Stage`] is constructed.
    fn configure(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn extract(&mut self, input: &T) -> anyhow::Result<T>;
}

/// Transforms data.
pub trait Process<T>: Send {
    /// Called exactly once, when the owning [`Stage`] is constructed.
    fn configure(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn process(&mut self, input: &T) -> anyhow::Result<T>;
}

/// Consumes data. The returned value becomes the stage's output.
pub trait Handle<T>: Send {
    /// Called exactly once, when the owning [`Stage`] is constructed.
    fn configure(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn handle(&mut self, input: &T) -> anyhow::Result<T>;
}

/// Where a stage is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// `configure` has run; `run` has not completed yet.
    Configured,
    /// `run` has completed successfully `runs` times.
    Ran { runs: u64 },
}

/// Enum dispatch over the three capabilities.
enum Capability<T> {
    Extract(Box<dyn Extract<T>>),
    Process(Box<dyn Process<T>>),
    Handle(Box<dyn Handle<T>>),
}

impl<T> Capability<T> {
    fn role(&self) -> Role {
        match self {
            Capability::Extract(_) => Role::Extractor,
            Capability::Process(_) => Role::Processor,
            Capability::Handle(_) => Role::Handler,
        }
    }

    fn configure(&mut self) -> anyhow::Result<()> {
        match self {
            Capability::Extract(c) => c.configure(),
            Capability::Process(c) => c.configure(),
            Capability::Handle(c) => c.configure(),
        }
    }

    fn apply(&mut self, input: &T) -> anyhow::Result<T> {
        match self {
            Capability::Extract(c) => c.extract(input),
            Capability::Process(c) => c.process(input),
            Capability::Handle(c) => c.handle(input),
        }
    }
}

/// A component backed by a single capability.
pub struct Stage<T> {
    name: String,
    capability: Capability<T>,
    inputs: SharedCell<T>,
    outputs: SharedCell<T>,
    lifecycle: Lifecycle,
}

impl<T> Stage<T> {
    fn configured(name: String, mut capability: Capability<T>) -> Result<Self> {
        let role = capability.role();
        capability.configure().map_err(|e| {
            tracing::error!(stage = %name, %role, "Configure failed: {e:#}");
            StageGraphError::component(name.clone(), e.context("configure failed"))
        })?;
        tracing::debug!(stage = %name, %role, "Stage configured");

        Ok(Self {
            name,
            capability,
            inputs: SharedCell::new(),
            outputs: SharedCell::new(),
            lifecycle: Lifecycle::Configured,
        })
    }

    /// Build an extractor stage, running its `configure` hook.
    pub fn extractor(name: impl Into<String>, extract: impl Extract<T> + 'static) -> Result<Self> {
        Self::configured(name.into(), Capability::Extract(Box::new(extract)))
    }

    /// Build a processor stage, running its `configure` hook.
    pub fn processor(name: impl Into<String>, process: impl Process<T> + 'static) -> Result<Self> {
        Self::configured(name.into(), Capability::Process(Box::new(process)))
    }

    /// Build a handler stage, running its `configure` hook.
    pub fn handler(name: impl Into<String>, handle: impl Handle<T> + 'static) -> Result<Self> {
        Self::configured(name.into(), Capability::Handle(Box::new(handle)))
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Successful runs so far.
    pub fn runs(&self) -> u64 {
        match self.lifecycle {
            Lifecycle::Configured => 0,
            Lifecycle::Ran { runs } => runs,
        }
    }
}

impl<T: 'static> Stage<T> {
    /// Extractor backed by a closure.
    pub fn extract_fn<F>(name: impl Into<String>, f: F) -> Self
    where
        F: FnMut(&T) -> anyhow::Result<T> + Send + 'static,
    {
        Self::from_capability(name.into(), Capability::Extract(Box::new(FnCapability(f))))
    }

    /// Processor backed by a closure.
    pub fn process_fn<F>(name: impl Into<String>, f: F) -> Self
    where
        F: FnMut(&T) -> anyhow::Result<T> + Send + 'static,
    {
        Self::from_capability(name.into(), Capability::Process(Box::new(FnCapability(f))))
    }

    /// Handler backed by a closure.
    pub fn handle_fn<F>(name: impl Into<String>, f: F) -> Self
    where
        F: FnMut(&T) -> anyhow::Result<T> + Send + 'static,
    {
        Self::from_capability(name.into(), Capability::Handle(Box::new(FnCapability(f))))
    }

    // Closures have nothing to configure.
    fn from_capability(name: String, capability: Capability<T>) -> Self {
        Self {
            name,
            capability,
            inputs: SharedCell::new(),
            outputs: SharedCell::new(),
            lifecycle: Lifecycle::Configured,
        }
    }
}

impl<T: Send + Sync + 'static> Component<T> for Stage<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> Role {
        self.capability.role()
    }

    fn inputs(&self) -> &SharedCell<T> {
        &self.inputs
    }

    fn inputs_mut(&mut self) -> &mut SharedCell<T> {
        &mut self.inputs
    }

    fn outputs(&self) -> &SharedCell<T> {
        &self.outputs
    }

    fn outputs_mut(&mut self) -> &mut SharedCell<T> {
        &mut self.outputs
    }

    fn run(&mut self) -> Result<()> {
        let capability = &mut self.capability;
        // The read lock is released before the output is stored, so a stage
        // whose outputs alias its inputs does not deadlock.
        let produced = self.inputs.with(|input| capability.apply(input))?;

        match produced {
            Ok(value) => {
                self.outputs.set(value);
                self.lifecycle = Lifecycle::Ran {
                    runs: self.runs() + 1,
                };
                tracing::trace!(stage = %self.name, runs = self.runs(), "Stage ran");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(stage = %self.name, "Stage failed: {e:#}");
                Err(StageGraphError::component(self.name.clone(), e))
            }
        }
    }
}

impl<T> fmt::Debug for Stage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("name", &self.name)
            .field("role", &self.capability.role())
            .field("lifecycle", &self.lifecycle)
            .finish()
    }
}

/// Adapter that lets a closure stand in for any capability.
struct FnCapability<F>(F);

impl<T, F> Extract<T> for FnCapability<F>
where
    F: FnMut(&T) -> anyhow::Result<T> + Send,
{
    fn extract(&mut self, input: &T) -> anyhow::Result<T> {
        (self.0)(input)
    }
}

impl<T, F> Process<T> for FnCapability<F>
where
    F: FnMut(&T) -> anyhow::Result<T> + Send,
{
    fn process(&mut self, input: &T) -> anyhow::Result<T> {
        (self.0)(input)
    }
}

impl<T, F> Handle<T> for FnCapability<F>
where
    F: FnMut(&T) -> anyhow::Result<T> + Send,
{
    fn handle(&mut self, input: &T) -> anyhow::Result<T> {
        (self.0)(input)
    }
}
