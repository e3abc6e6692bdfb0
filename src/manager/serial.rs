//! Serial manager: runs components one after another, threading each
//! component's outputs into the next component's inputs.

use crate::component::{Component, Role, SharedCell};
use crate::error::Result;
use crate::manager::list::{BoxedComponent, ComponentList};

/// Chain of components run in registration order.
///
/// Before each component runs, its `inputs` is pointed at the previous
/// component's `outputs` (the manager's own `inputs` for the first one).
/// The last component writes straight into the manager's `outputs` slot, so
/// cells aliased to `outputs` before a run see its result. With no
/// components, `outputs` aliases `inputs`.
pub struct SerialManager<T> {
    name: String,
    role: Role,
    components: ComponentList<T>,
    inputs: SharedCell<T>,
    outputs: SharedCell<T>,
    runs: u64,
}

impl<T: Send + Sync + 'static> SerialManager<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: Role::Processor,
            components: ComponentList::new(),
            inputs: SharedCell::new(),
            outputs: SharedCell::new(),
            runs: 0,
        }
    }

    /// Role this manager reports when nested inside another manager.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Append a component to the chain.
    pub fn add(&mut self, component: impl Component<T> + 'static) -> &mut Self {
        self.components.add(component);
        self
    }

    pub fn add_boxed(&mut self, component: BoxedComponent<T>) -> &mut Self {
        self.components.add_boxed(component);
        self
    }

    pub fn components(&self) -> &ComponentList<T> {
        &self.components
    }

    pub fn components_mut(&mut self) -> &mut ComponentList<T> {
        &mut self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Completed runs of the whole chain.
    pub fn runs(&self) -> u64 {
        self.runs
    }

    /// Run every component in order. Stops at the first failure; components
    /// after the failing one do not run and `outputs` is cleared.
    pub fn run(&mut self) -> Result<()> {
        let span = tracing::debug_span!("serial", manager = %self.name, stages = self.components.len());
        let _enter = span.enter();

        let Some(last) = self.components.len().checked_sub(1) else {
            self.outputs.point_to(&self.inputs);
            self.runs += 1;
            tracing::debug!(runs = self.runs, "Empty serial chain passed input through");
            return Ok(());
        };

        let mut current = self.inputs.clone();
        for (index, component) in self.components.iter_mut().enumerate() {
            component.inputs_mut().point_to(&current);
            if index == last {
                component.outputs_mut().point_to(&self.outputs);
            } else if component.outputs().aliases(&self.outputs) {
                // Was the tail before more components were added.
                component.outputs_mut().detach();
            }
            tracing::trace!(index, component = component.name(), "Running component");

            if let Err(e) = component.run() {
                tracing::warn!(index, component = component.name(), "Serial chain aborted: {e}");
                self.outputs.clear();
                return Err(e);
            }

            current = component.outputs().clone();
        }

        self.runs += 1;
        tracing::debug!(runs = self.runs, "Serial chain complete");
        Ok(())
    }

    /// Set `input`, run the chain and return a copy of the result.
    pub fn run_with(&mut self, input: T) -> Result<T>
    where
        T: Clone,
    {
        self.inputs.set(input);
        self.run()?;
        self.outputs.get()
    }
}

impl<T: Send + Sync + 'static> Component<T> for SerialManager<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> Role {
        self.role
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
        SerialManager::run(self)
    }
}

impl<T> std::fmt::Debug for SerialManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialManager")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("components", &self.components)
            .field("runs", &self.runs)
            .finish()
    }
}
