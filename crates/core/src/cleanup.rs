//! Scoped teardown
//!
//! A [`CleanupStack`] collects release actions as resources are acquired and
//! runs them in reverse order exactly once: either when [`CleanupStack::run_all`]
//! is called or when the stack is dropped.

use crate::errors::Result;
use tracing::{debug, warn};

type CleanupAction = Box<dyn FnOnce() -> Result<()>>;

/// Owned stack of release actions
#[derive(Default)]
pub struct CleanupStack {
    actions: Vec<(String, CleanupAction)>,
}

impl CleanupStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `action` under a human readable `label`
    pub fn push<F>(&mut self, label: impl Into<String>, action: F)
    where
        F: FnOnce() -> Result<()> + 'static,
    {
        let label = label.into();
        debug!("Registered cleanup: {}", label);
        self.actions.push((label, Box::new(action)));
    }

    /// Number of actions still pending
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Run every pending action, last registered first.
    ///
    /// All actions are attempted even if some fail; the first failure is
    /// returned and the others are logged.
    pub fn run_all(&mut self) -> Result<()> {
        let mut first_error = None;

        while let Some((label, action)) = self.actions.pop() {
            debug!("Running cleanup: {}", label);
            if let Err(e) = action() {
                warn!("Cleanup '{}' failed: {}", label, e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for CleanupStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CleanupStack")
            .field(
                "actions",
                &self.actions.iter().map(|(l, _)| l).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Drop for CleanupStack {
    fn drop(&mut self) {
        // Errors were already logged by run_all
        let _ = self.run_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FixtureError;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<&'static str>>>;

    fn record(log: &Log, name: &'static str) -> impl FnOnce() -> Result<()> {
        let log = log.clone();
        move || {
            log.borrow_mut().push(name);
            Ok(())
        }
    }

    #[test]
    fn test_runs_in_reverse_order_once() {
        let log = Log::default();
        let mut stack = CleanupStack::new();
        stack.push("first", record(&log, "first"));
        stack.push("second", record(&log, "second"));
        assert_eq!(stack.len(), 2);

        stack.run_all().unwrap();
        assert_eq!(*log.borrow(), vec!["second", "first"]);
        assert!(stack.is_empty());

        stack.run_all().unwrap();
        drop(stack);
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn test_drop_runs_pending_actions() {
        let log = Log::default();
        {
            let mut stack = CleanupStack::new();
            stack.push("only", record(&log, "only"));
        }
        assert_eq!(*log.borrow(), vec!["only"]);
    }

    #[test]
    fn test_failure_does_not_skip_remaining_actions() {
        let log = Log::default();
        let mut stack = CleanupStack::new();
        stack.push("survivor", record(&log, "survivor"));
        stack.push("broken", || {
            Err(FixtureError::Cleanup {
                container_id: "abc".to_string(),
                message: "boom".to_string(),
            })
        });

        let err = stack.run_all().unwrap_err();
        assert!(matches!(err, FixtureError::Cleanup { .. }));
        assert_eq!(*log.borrow(), vec!["survivor"]);
    }
}
