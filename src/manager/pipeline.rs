//! Three-slot extract → process → handle pipeline.

use crate::component::{Component, Role, SharedCell};
use crate::error::{Result, StageGraphError};
use crate::manager::list::BoxedComponent;
use crate::manager::serial::SerialManager;

/// Slot names and the role each slot requires, in execution order.
const SLOTS: [(&str, Role); 3] = [
    ("extractor", Role::Extractor),
    ("processor", Role::Processor),
    ("handler", Role::Handler),
];

const EXTRACTOR: usize = 0;
const PROCESSOR: usize = 1;
const HANDLER: usize = 2;

/// A serial manager with exactly three role-checked slots.
///
/// Runs like any serial manager; the only thing it adds is that each slot
/// only accepts a component whose role matches.
pub struct Pipeline<T> {
    manager: SerialManager<T>,
}

impl<T: Send + Sync + 'static> Pipeline<T> {
    /// Build a pipeline, checking each component's role against its slot.
    pub fn new(
        name: impl Into<String>,
        extractor: impl Component<T> + 'static,
        processor: impl Component<T> + 'static,
        handler: impl Component<T> + 'static,
    ) -> Result<Self> {
        Self::from_boxed(
            name,
            Box::new(extractor),
            Box::new(processor),
            Box::new(handler),
        )
    }

    pub fn from_boxed(
        name: impl Into<String>,
        extractor: BoxedComponent<T>,
        processor: BoxedComponent<T>,
        handler: BoxedComponent<T>,
    ) -> Result<Self> {
        let components = [extractor, processor, handler];
        for (slot, component) in components.iter().enumerate() {
            check_slot(slot, &**component)?;
        }

        let mut manager = SerialManager::new(name);
        for component in components {
            manager.add_boxed(component);
        }
        tracing::debug!(pipeline = Component::name(&manager), stages = %manager.components(), "Pipeline assembled");
        Ok(Self { manager })
    }

    /// Role reported when this pipeline is nested inside another manager.
    pub fn with_role(self, role: Role) -> Self {
        Self {
            manager: self.manager.with_role(role),
        }
    }

    pub fn extractor(&self) -> &dyn Component<T> {
        &*self.manager.components()[EXTRACTOR]
    }

    pub fn processor(&self) -> &dyn Component<T> {
        &*self.manager.components()[PROCESSOR]
    }

    pub fn handler(&self) -> &dyn Component<T> {
        &*self.manager.components()[HANDLER]
    }

    fn replace_slot(&mut self, slot: usize, component: BoxedComponent<T>) -> Result<BoxedComponent<T>> {
        check_slot(slot, &*component)?;
        let name = component.name().to_string();
        let previous = self
            .manager
            .components_mut()
            .replace(slot, component)
            .ok_or_else(|| {
                StageGraphError::Config(format!("pipeline is missing its {} slot", SLOTS[slot].0))
            })?;
        tracing::debug!(slot = SLOTS[slot].0, from = previous.name(), to = %name, "Pipeline slot replaced");
        Ok(previous)
    }

    /// Replace the extractor, returning the previous one. On a role mismatch
    /// the pipeline is left unchanged.
    pub fn set_extractor(&mut self, extractor: impl Component<T> + 'static) -> Result<BoxedComponent<T>> {
        self.replace_slot(EXTRACTOR, Box::new(extractor))
    }

    /// Replace the processor, returning the previous one. On a role mismatch
    /// the pipeline is left unchanged.
    pub fn set_processor(&mut self, processor: impl Component<T> + 'static) -> Result<BoxedComponent<T>> {
        self.replace_slot(PROCESSOR, Box::new(processor))
    }

    /// Replace the handler, returning the previous one. On a role mismatch
    /// the pipeline is left unchanged.
    pub fn set_handler(&mut self, handler: impl Component<T> + 'static) -> Result<BoxedComponent<T>> {
        self.replace_slot(HANDLER, Box::new(handler))
    }

    pub fn run(&mut self) -> Result<()> {
        self.manager.run()
    }

    /// Set `input`, run all three stages and return a copy of the result.
    pub fn run_with(&mut self, input: T) -> Result<T>
    where
        T: Clone,
    {
        self.manager.run_with(input)
    }

    /// Completed runs of the whole pipeline.
    pub fn runs(&self) -> u64 {
        self.manager.runs()
    }
}

fn check_slot<T>(slot: usize, component: &dyn Component<T>) -> Result<()> {
    let (name, expected) = SLOTS[slot];
    let found = component.role();
    if found == expected {
        Ok(())
    } else {
        tracing::warn!(slot = name, component = component.name(), %expected, %found, "Rejected component for pipeline slot");
        Err(StageGraphError::CapabilityMismatch {
            slot: name,
            expected,
            found,
        })
    }
}

impl<T: Send + Sync + 'static> Component<T> for Pipeline<T> {
    fn name(&self) -> &str {
        Component::name(&self.manager)
    }

    fn role(&self) -> Role {
        Component::role(&self.manager)
    }

    fn inputs(&self) -> &SharedCell<T> {
        self.manager.inputs()
    }

    fn inputs_mut(&mut self) -> &mut SharedCell<T> {
        self.manager.inputs_mut()
    }

    fn outputs(&self) -> &SharedCell<T> {
        self.manager.outputs()
    }

    fn outputs_mut(&mut self) -> &mut SharedCell<T> {
        self.manager.outputs_mut()
    }

    fn run(&mut self) -> Result<()> {
        Pipeline::run(self)
    }
}

impl<T> std::fmt::Debug for Pipeline<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").field("manager", &self.manager).finish()
    }
}
