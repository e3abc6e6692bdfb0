//! Parallel manager: fans one input out to every component and gathers their
//! outputs in registration order.
//!
//! Work is dispatched through a crossbeam job queue to a bounded set of
//! scoped worker threads. Completion order is irrelevant to the result:
//! every outcome is tagged with its component index and slotted back into
//! place once all workers have joined.

use crate::component::{Component, SharedCell};
use crate::config::ParallelConfig;
use crate::error::{Result, StageGraphError};
use crate::manager::list::{BoxedComponent, ComponentList};
use crossbeam_channel::unbounded;
use std::sync::atomic::{AtomicBool, Ordering};

/// Runs every component against the same input concurrently.
///
/// All components' `inputs` alias the manager's `inputs` for the duration of
/// a run, so components must treat their input as read-only.
pub struct ParallelManager<T> {
    name: String,
    components: ComponentList<T>,
    inputs: SharedCell<T>,
    outputs: SharedCell<Vec<T>>,
    max_workers: usize,
}

impl<T: Clone + Send + Sync + 'static> ParallelManager<T> {
    /// A manager that spawns one worker per component.
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_config(name, &ParallelConfig::default())
    }

    pub fn from_config(name: impl Into<String>, config: &ParallelConfig) -> Self {
        Self {
            name: name.into(),
            components: ComponentList::new(),
            inputs: SharedCell::new(),
            outputs: SharedCell::new(),
            max_workers: config.max_workers,
        }
    }

    /// Cap the number of worker threads. Zero means one per component.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn add(&mut self, component: impl Component<T> + 'static) -> &mut Self {
        self.components.add(component);
        self
    }

    pub fn add_boxed(&mut self, component: BoxedComponent<T>) -> &mut Self {
        self.components.add_boxed(component);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
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

    pub fn inputs(&self) -> &SharedCell<T> {
        &self.inputs
    }

    pub fn inputs_mut(&mut self) -> &mut SharedCell<T> {
        &mut self.inputs
    }

    /// One output per component, in registration order, after a successful
    /// run. Cleared when a run fails.
    pub fn outputs(&self) -> &SharedCell<Vec<T>> {
        &self.outputs
    }

    fn worker_count(&self) -> usize {
        let count = self.components.len();
        match self.max_workers {
            0 => count,
            cap => cap.min(count),
        }
    }

    /// Run all components and collect their outputs.
    ///
    /// If any component fails, the others that have not started yet are
    /// skipped, `outputs` is cleared and the error of the failing component
    /// with the lowest registration index is returned.
    pub fn run(&mut self) -> Result<()> {
        let count = self.components.len();
        let workers = self.worker_count();
        tracing::debug!(manager = %self.name, components = count, workers, "Parallel run starting");

        if count == 0 {
            self.outputs.set(Vec::new());
            return Ok(());
        }

        let names = self.components.names();
        for component in self.components.iter_mut() {
            component.inputs_mut().point_to(&self.inputs);
        }

        let (job_tx, job_rx) = unbounded::<(usize, &mut BoxedComponent<T>)>();
        for job in self.components.iter_mut().enumerate() {
            // The receiver is alive in this scope, so sending cannot fail.
            let _ = job_tx.send(job);
        }
        drop(job_tx);

        let (result_tx, result_rx) = unbounded::<(usize, Result<T>)>();
        let abort = AtomicBool::new(false);

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|worker| {
                    let job_rx = job_rx.clone();
                    let result_tx = result_tx.clone();
                    let abort = &abort;
                    scope.spawn(move || {
                        while let Ok((index, component)) = job_rx.recv() {
                            if abort.load(Ordering::Acquire) {
                                tracing::trace!(worker, index, "Skipping after failure");
                                continue;
                            }
                            let outcome = component.run().and_then(|()| component.outputs().get());
                            if outcome.is_err() {
                                abort.store(true, Ordering::Release);
                            }
                            if result_tx.send((index, outcome)).is_err() {
                                break;
                            }
                        }
                    })
                })
                .collect();

            for handle in handles {
                if handle.join().is_err() {
                    tracing::error!(manager = %self.name, "Parallel worker panicked");
                }
            }
        });
        drop(result_tx);

        let mut slots: Vec<Option<T>> = (0..count).map(|_| None).collect();
        let mut failure: Option<(usize, StageGraphError)> = None;
        for (index, outcome) in result_rx.try_iter() {
            match outcome {
                Ok(value) => slots[index] = Some(value),
                Err(e) => {
                    if failure.as_ref().map_or(true, |(first, _)| index < *first) {
                        failure = Some((index, e));
                    }
                }
            }
        }

        if let Some((index, e)) = failure {
            tracing::warn!(manager = %self.name, component = %names[index], "Parallel run failed: {e}");
            self.outputs.clear();
            return Err(e);
        }

        // Only a panicking worker can leave a slot empty without an error.
        let mut outputs = Vec::with_capacity(count);
        for (index, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(value) => outputs.push(value),
                None => {
                    self.outputs.clear();
                    return Err(StageGraphError::component(
                        names[index].clone(),
                        anyhow::anyhow!("worker thread panicked before completing"),
                    ));
                }
            }
        }

        self.outputs.set(outputs);
        tracing::debug!(manager = %self.name, "Parallel run complete");
        Ok(())
    }

    /// Set `input`, run every component and return a copy of the outputs.
    pub fn run_with(&mut self, input: T) -> Result<Vec<T>> {
        self.inputs.set(input);
        self.run()?;
        self.outputs.get()
    }
}

impl<T> std::fmt::Debug for ParallelManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParallelManager")
            .field("name", &self.name)
            .field("components", &self.components)
            .field("max_workers", &self.max_workers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Stage;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Barrier};
    use std::time::Duration;

    fn delayed(name: &str, millis: u64, value: i64) -> Stage<i64> {
        Stage::process_fn(name, move |x: &i64| {
            std::thread::sleep(Duration::from_millis(millis));
            Ok(x + value)
        })
    }

    #[test]
    fn test_results_follow_registration_order() {
        let mut manager = ParallelManager::new("fan");
        manager
            .add(delayed("slow", 40, 1))
            .add(delayed("fast", 0, 2))
            .add(delayed("medium", 15, 3));
        assert_eq!(manager.run_with(10).unwrap(), vec![11, 12, 13]);
    }

    #[test]
    fn test_single_worker() {
        let mut manager = ParallelManager::new("fan").with_max_workers(1);
        for n in 0..5 {
            manager.add(delayed(&format!("s{n}"), 0, n));
        }
        assert_eq!(manager.worker_count(), 1);
        assert_eq!(manager.run_with(0).unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_empty_manager_yields_empty_outputs() {
        let mut manager: ParallelManager<i64> = ParallelManager::new("empty");
        assert_eq!(manager.run_with(1).unwrap(), Vec::<i64>::new());
    }

    #[test]
    fn test_all_inputs_alias_manager_input() {
        let mut manager = ParallelManager::new("fan");
        manager.add(delayed("a", 0, 0)).add(delayed("b", 0, 0));
        manager.run_with(0).unwrap();
        for component in manager.components().iter() {
            assert!(component.inputs().aliases(manager.inputs()));
        }
    }

    #[test]
    fn test_lowest_index_failure_wins() {
        // Both failing components are running before either fails; the later
        // registered one fails first.
        let barrier = Arc::new(Barrier::new(2));
        let first_gate = Arc::clone(&barrier);
        let second_gate = Arc::clone(&barrier);

        let mut manager = ParallelManager::new("fan");
        manager
            .add(delayed("ok", 0, 0))
            .add(Stage::process_fn("first_bad", move |_: &i64| {
                first_gate.wait();
                std::thread::sleep(Duration::from_millis(30));
                anyhow::bail!("first")
            }))
            .add(Stage::process_fn("second_bad", move |_: &i64| {
                second_gate.wait();
                anyhow::bail!("second")
            }));

        let err = manager.run_with(0).unwrap_err();
        assert!(matches!(
            err,
            StageGraphError::ComponentFailure { ref component, .. } if component == "first_bad"
        ));
        assert!(!manager.outputs().is_set());
    }

    #[test]
    fn test_failure_skips_unstarted_components() {
        let started = Arc::new(AtomicUsize::new(0));
        let mut manager = ParallelManager::new("fan").with_max_workers(1);
        manager.add(Stage::process_fn("bad", |_: &i64| anyhow::bail!("stop")));
        for n in 0..3 {
            let started = Arc::clone(&started);
            manager.add(Stage::process_fn(format!("later{n}"), move |x: &i64| {
                started.fetch_add(1, Ordering::SeqCst);
                Ok(*x)
            }));
        }

        assert!(manager.run_with(0).is_err());
        assert_eq!(started.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_from_config() {
        let config = ParallelConfig { max_workers: 2 };
        let mut manager = ParallelManager::from_config("fan", &config);
        for n in 0..4 {
            manager.add(delayed(&format!("s{n}"), 5, n));
        }
        assert_eq!(manager.worker_count(), 2);
        assert_eq!(manager.run_with(1).unwrap(), vec![1, 2, 3, 4]);
    }
}
