//! Mock components and capabilities

use mockall::mock;
use stagegraph::{Extract, Handle, Process, Stage};
use std::sync::{Arc, Mutex};
use std::time::Duration;

mock! {
    pub Processor {}

    impl Process<i64> for Processor {
        fn configure(&mut self) -> anyhow::Result<()>;
        fn process(&mut self, input: &i64) -> anyhow::Result<i64>;
    }
}

mock! {
    pub Extractor {}

    impl Extract<String> for Extractor {
        fn configure(&mut self) -> anyhow::Result<()>;
        fn extract(&mut self, input: &String) -> anyhow::Result<String>;
    }
}

/// Handler that records every value it sees and passes it through
#[derive(Clone)]
pub struct RecordingHandler<T> {
    pub seen: Arc<Mutex<Vec<T>>>,
}

impl<T: Clone> RecordingHandler<T> {
    pub fn new() -> Self {
        Self {
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn seen(&self) -> Vec<T> {
        self.seen.lock().unwrap().clone()
    }
}

impl<T: Clone + Send> Handle<T> for RecordingHandler<T> {
    fn handle(&mut self, input: &T) -> anyhow::Result<T> {
        self.seen.lock().unwrap().push(input.clone());
        Ok(input.clone())
    }
}

/// Processor that sleeps before adding `value`
pub fn delayed_adder(name: &str, delay: Duration, value: i64) -> Stage<i64> {
    Stage::process_fn(name, move |x: &i64| {
        std::thread::sleep(delay);
        Ok(x + value)
    })
}

/// Processor that always fails with `message`
pub fn failing_processor(name: &str, message: &'static str) -> Stage<i64> {
    Stage::process_fn(name, move |_: &i64| Err(anyhow::anyhow!(message)))
}
