//! Generation progress callbacks.

use serde::Serialize;

/// Receives `(generation, best fitness)` on generation boundaries.
///
/// Calls are synchronous and arrive in increasing generation order; the
/// optimizer does not continue until the callback returns.
pub trait ProgressListener {
    fn on_generation_update(&mut self, generation: usize, fitness: f64);
}

impl<F> ProgressListener for F
where
    F: FnMut(usize, f64),
{
    fn on_generation_update(&mut self, generation: usize, fitness: f64) {
        self(generation, fitness)
    }
}

/// Listener that ignores every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl ProgressListener for NoopListener {
    fn on_generation_update(&mut self, _generation: usize, _fitness: f64) {}
}

/// A progress event as relayed to collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub generation: usize,
    pub fitness: f64,
}

/// Several listeners invoked in registration order.
#[derive(Default)]
pub struct ListenerSet {
    listeners: Vec<Box<dyn ProgressListener + Send>>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, listener: impl ProgressListener + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn with(mut self, listener: impl ProgressListener + Send + 'static) -> Self {
        self.register(listener);
        self
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl ProgressListener for ListenerSet {
    fn on_generation_update(&mut self, generation: usize, fitness: f64) {
        for listener in &mut self.listeners {
            listener.on_generation_update(generation, fitness);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_closure_listener() {
        let mut seen = Vec::new();
        {
            let mut listener = |g: usize, f: f64| seen.push(ProgressEvent { generation: g, fitness: f });
            listener.on_generation_update(3, 0.5);
        }
        assert_eq!(seen, vec![ProgressEvent { generation: 3, fitness: 0.5 }]);
    }

    #[test]
    fn test_listener_set_preserves_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = Arc::clone(&log);
        let second = Arc::clone(&log);
        let mut set = ListenerSet::new()
            .with(move |g: usize, _f: f64| first.lock().unwrap().push(("first", g)))
            .with(move |g: usize, _f: f64| second.lock().unwrap().push(("second", g)));

        set.on_generation_update(0, 0.1);
        set.on_generation_update(1, 0.2);

        assert_eq!(set.len(), 2);
        assert_eq!(
            *log.lock().unwrap(),
            vec![("first", 0), ("second", 0), ("first", 1), ("second", 1)]
        );
    }
}
