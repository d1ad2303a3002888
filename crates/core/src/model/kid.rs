use thiserror::Error;

use crate::model::ids::{KidId, TutorId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum KidError {
    #[error("kid name cannot be empty")]
    EmptyName,
}

/// A child profile managed by a tutor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kid {
    id: KidId,
    name: String,
    tutor_id: TutorId,
}

impl Kid {
    /// # Errors
    ///
    /// Returns `KidError::EmptyName` if the name is blank.
    pub fn new(id: KidId, name: impl Into<String>, tutor_id: TutorId) -> Result<Self, KidError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(KidError::EmptyName);
        }
        Ok(Self { id, name, tutor_id })
    }

    #[must_use]
    pub fn id(&self) -> &KidId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn tutor_id(&self) -> &TutorId {
        &self.tutor_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_name() {
        let err = Kid::new(KidId::new("kid-1"), "  ", TutorId::new("tutor-1")).unwrap_err();
        assert_eq!(err, KidError::EmptyName);
    }
}
