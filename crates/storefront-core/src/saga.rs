//! Compensating-action runner for multi-step writes across independent registries.
//!
//! A [`Saga`] starts `Pending`. Each step that succeeds may register an undo
//! action. When a later step fails, undo actions run newest-first and the saga
//! ends `RolledBack` (or `CompensationFailed` if an undo itself errors).
//! `commit` discards the undo log. A saga dropped while still `Pending` rolls
//! back, so an early `?` between steps cannot leave half a write behind.

use crate::error::{Result, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SagaState {
    Pending,
    Committed,
    RolledBack,
    CompensationFailed(String),
}

type Compensation<'a> = Box<dyn FnOnce() -> Result<()> + 'a>;

pub struct Saga<'a> {
    name: &'static str,
    state: SagaState,
    undo: Vec<(&'static str, Compensation<'a>)>,
}

impl<'a> Saga<'a> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: SagaState::Pending,
            undo: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> &SagaState {
        &self.state
    }

    /// Run one step. On failure every registered undo runs before the error
    /// is returned.
    pub fn step<T>(&mut self, label: &'static str, action: impl FnOnce() -> Result<T>) -> Result<T> {
        match action() {
            Ok(value) => {
                tracing::debug!(saga = self.name, step = label, "step completed");
                Ok(value)
            }
            Err(cause) => Err(self.abort(label, cause)),
        }
    }

    /// Register the undo for the step that just completed.
    pub fn compensate(&mut self, label: &'static str, undo: impl FnOnce() -> Result<()> + 'a) {
        self.undo.push((label, Box::new(undo)));
    }

    pub fn commit(mut self) -> SagaState {
        self.undo.clear();
        self.state = SagaState::Committed;
        self.state.clone()
    }

    fn abort(&mut self, failed_step: &'static str, cause: StoreError) -> StoreError {
        tracing::warn!(
            saga = self.name,
            step = failed_step,
            error = %cause,
            "step failed, rolling back"
        );
        match self.unwind() {
            None => cause,
            Some(rollback) => StoreError::RollbackFailed {
                operation: self.name.to_string(),
                cause: cause.to_string(),
                rollback,
            },
        }
    }

    /// Run pending undos newest-first. Returns the joined failures, if any.
    fn unwind(&mut self) -> Option<String> {
        let mut failures = Vec::new();
        while let Some((label, undo)) = self.undo.pop() {
            if let Err(e) = undo() {
                tracing::error!(saga = self.name, step = label, error = %e, "compensation failed");
                failures.push(format!("{label}: {e}"));
            }
        }
        if failures.is_empty() {
            self.state = SagaState::RolledBack;
            None
        } else {
            let joined = failures.join("; ");
            self.state = SagaState::CompensationFailed(joined.clone());
            Some(joined)
        }
    }
}

impl Drop for Saga<'_> {
    fn drop(&mut self) {
        if self.state == SagaState::Pending && !self.undo.is_empty() {
            tracing::warn!(saga = self.name, "saga dropped before commit, rolling back");
            self.unwind();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
