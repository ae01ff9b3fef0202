//! Simulation error taxonomy
//!
//! Fatal-at-init errors (`InvalidParameter`, `InsufficientData`) abort a run
//! before any ensemble exists. `NoSurvivors` is a reportable live-mode
//! condition: the updater stalls and reseeds instead of terminating.

use thiserror::Error;

/// Errors raised by the estimation/simulation core
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// A parameter failed pre-run validation
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Not enough data points to estimate model parameters
    #[error("insufficient data: need at least {required} points, got {got}")]
    InsufficientData { required: usize, got: usize },

    /// Every path in the ensemble has been eliminated
    #[error("no surviving paths in ensemble")]
    NoSurvivors,
}

impl SimulationError {
    /// True for errors that are fatal during initialization
    pub fn is_fatal_at_init(&self) -> bool {
        matches!(
            self,
            SimulationError::InvalidParameter(_) | SimulationError::InsufficientData { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(SimulationError::InvalidParameter("x".into()).is_fatal_at_init());
        assert!(SimulationError::InsufficientData { required: 2, got: 1 }.is_fatal_at_init());
        assert!(!SimulationError::NoSurvivors.is_fatal_at_init());
    }

    #[test]
    fn test_display_messages() {
        let err = SimulationError::InsufficientData { required: 2, got: 0 };
        assert_eq!(
            err.to_string(),
            "insufficient data: need at least 2 points, got 0"
        );
    }
}
