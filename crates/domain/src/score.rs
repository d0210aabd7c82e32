use serde::{Deserialize, Serialize};

use crate::DomainError;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Score {
    pub correct: u32,
    pub total: u32,
}

impl Score {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.correct > self.total {
            return Err(DomainError::validation(
                "correct answers cannot exceed total answers",
            ));
        }
        Ok(())
    }

    /// Fraction answered correctly, `None` before the first answer.
    pub fn accuracy(&self) -> Option<f32> {
        (self.total > 0).then(|| self.correct as f32 / self.total as f32)
    }
}
