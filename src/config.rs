use crate::constants::{DEFAULT_MAX_ATTEMPTS, DEFAULT_TOLERANCE_FLOOR};
use crate::error::{BreakpointError, Result};

/// Tuning for the breakpoint search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    step: u64,
    tolerance_floor: u64,
    max_attempts: usize,
}

impl SearchConfig {
    /// Creates a config for the given file-size step with default tolerances.
    ///
    /// # Errors
    ///
    /// Returns [`BreakpointError::InvalidStep`] when `step` is zero.
    pub fn new(step: u64) -> Result<Self> {
        Self::with_limits(step, DEFAULT_TOLERANCE_FLOOR, DEFAULT_MAX_ATTEMPTS)
    }

    /// Creates a config with explicit tolerance and attempt cap.
    ///
    /// # Errors
    ///
    /// Returns an error if `step` is zero or `max_attempts` is zero.
    pub fn with_limits(step: u64, tolerance_floor: u64, max_attempts: usize) -> Result<Self> {
        if step == 0 {
            return Err(BreakpointError::InvalidStep(step));
        }
        if max_attempts == 0 {
            return Err(BreakpointError::InvalidAttempts(max_attempts));
        }

        Ok(Self {
            step,
            tolerance_floor,
            max_attempts,
        })
    }

    /// Bytes between successive checkpoints.
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Probes within this many bytes of the checkpoint are accepted.
    pub fn tolerance_floor(&self) -> u64 {
        self.tolerance_floor
    }

    /// Recalibrations allowed per checkpoint before punting.
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_config_defaults() {
        let config = SearchConfig::new(50_000).unwrap();
        assert_eq!(config.step(), 50_000);
        assert_eq!(config.tolerance_floor(), 1024);
        assert_eq!(config.max_attempts(), 16);
    }

    #[test]
    fn test_search_config_rejects_zero_step() {
        assert!(matches!(
            SearchConfig::new(0),
            Err(BreakpointError::InvalidStep(0))
        ));
    }

    #[test]
    fn test_search_config_rejects_zero_attempts() {
        assert!(matches!(
            SearchConfig::with_limits(10, 0, 0),
            Err(BreakpointError::InvalidAttempts(0))
        ));
    }
}
