//! Tunable budgets and scheduling knobs, exposed as a fluent builder:
//! one method per option, consuming and returning `self`, with
//! validation deferred to [`TaskConfigBuilder::build`] rather than
//! each setter.

use fmcore::{Error, Result};

/// Step/byte budgets and the other knobs a [`crate::Task`] is driven
/// with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskConfig {
    estimate_step_budget: u64,
    action_byte_budget: u64,
    copy_chunk_size: usize,
    temp_name_prefix: String,
    redraw_interval_ms: Option<u64>,
}

impl TaskConfig {
    /// Start a builder seeded with sensible defaults: ~2048 estimate
    /// steps, a 16 MiB action-phase byte budget, a 64 KiB copy chunk,
    /// the `dpan.` temp-name prefix, and a 500 ms redraw interval.
    #[must_use]
    pub fn builder() -> TaskConfigBuilder {
        TaskConfigBuilder::default()
    }

    /// Units (events) an estimate-phase `do_step` call may consume
    /// before yielding.
    #[must_use]
    pub fn estimate_step_budget(&self) -> u64 {
        self.estimate_step_budget
    }

    /// Bytes an action-phase (copy/move/chmod) `do_step` call may
    /// consume before yielding.
    #[must_use]
    pub fn action_byte_budget(&self) -> u64 {
        self.action_byte_budget
    }

    /// Chunk size used when copying a regular file's contents.
    #[must_use]
    pub fn copy_chunk_size(&self) -> usize {
        self.copy_chunk_size
    }

    /// Prefix used when generating a rename-cycle or copy-staging
    /// temporary name.
    #[must_use]
    pub fn temp_name_prefix(&self) -> &str {
        &self.temp_name_prefix
    }

    /// Millisecond timeout the (external) UI loop's `get_input` should
    /// use while a task is active; `None` means block (no task active).
    #[must_use]
    pub fn redraw_interval_ms(&self) -> Option<u64> {
        self.redraw_interval_ms
    }
}

/// Builder for [`TaskConfig`]; validates at [`TaskConfigBuilder::build`]
/// rather than on each setter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskConfigBuilder {
    estimate_step_budget: u64,
    action_byte_budget: u64,
    copy_chunk_size: usize,
    temp_name_prefix: String,
    redraw_interval_ms: Option<u64>,
}

impl Default for TaskConfigBuilder {
    fn default() -> Self {
        TaskConfigBuilder {
            estimate_step_budget: 2048,
            action_byte_budget: 16 * 1024 * 1024,
            copy_chunk_size: 64 * 1024,
            temp_name_prefix: "dpan".to_owned(),
            redraw_interval_ms: Some(500),
        }
    }
}

impl TaskConfigBuilder {
    /// Overrides the estimate-phase step budget.
    #[must_use]
    pub const fn estimate_step_budget(mut self, budget: u64) -> Self {
        self.estimate_step_budget = budget;
        self
    }

    /// Overrides the action-phase byte budget.
    #[must_use]
    pub const fn action_byte_budget(mut self, budget: u64) -> Self {
        self.action_byte_budget = budget;
        self
    }

    /// Overrides the copy chunk size.
    #[must_use]
    pub const fn copy_chunk_size(mut self, size: usize) -> Self {
        self.copy_chunk_size = size;
        self
    }

    /// Overrides the temporary-name prefix.
    #[must_use]
    pub fn temp_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.temp_name_prefix = prefix.into();
        self
    }

    /// Overrides the UI redraw-interval hint. `None` means block on
    /// input (no task active).
    #[must_use]
    pub const fn redraw_interval_ms(mut self, interval: Option<u64>) -> Self {
        self.redraw_interval_ms = interval;
        self
    }

    /// Validate and produce the final [`TaskConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] if either budget is zero or the
    /// chunk size is zero — a task built against a zero budget would
    /// never make progress.
    pub fn build(self) -> Result<TaskConfig> {
        if self.estimate_step_budget == 0 {
            return Err(Error::InvalidName("estimate_step_budget must be nonzero".to_owned()));
        }
        if self.action_byte_budget == 0 {
            return Err(Error::InvalidName("action_byte_budget must be nonzero".to_owned()));
        }
        if self.copy_chunk_size == 0 {
            return Err(Error::InvalidName("copy_chunk_size must be nonzero".to_owned()));
        }
        Ok(TaskConfig {
            estimate_step_budget: self.estimate_step_budget,
            action_byte_budget: self.action_byte_budget,
            copy_chunk_size: self.copy_chunk_size,
            temp_name_prefix: self.temp_name_prefix,
            redraw_interval_ms: self.redraw_interval_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_suggestions() {
        let cfg = TaskConfig::builder().build().unwrap();
        assert_eq!(cfg.estimate_step_budget(), 2048);
        assert_eq!(cfg.action_byte_budget(), 16 * 1024 * 1024);
    }

    #[test]
    fn zero_budget_is_rejected() {
        let err = TaskConfig::builder()
            .estimate_step_budget(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidName(_)));
    }

    #[test]
    fn overrides_stick() {
        let cfg = TaskConfig::builder()
            .action_byte_budget(1024)
            .temp_name_prefix("xyz")
            .redraw_interval_ms(None)
            .build()
            .unwrap();
        assert_eq!(cfg.action_byte_budget(), 1024);
        assert_eq!(cfg.temp_name_prefix(), "xyz");
        assert_eq!(cfg.redraw_interval_ms(), None);
    }
}
