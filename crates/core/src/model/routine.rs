use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::{ExerciseId, RoutineId, TutorId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RoutineError {
    #[error("routine title cannot be empty")]
    EmptyTitle,

    #[error("routine must contain at least one exercise")]
    NoExercises,

    #[error("exercise name cannot be empty")]
    EmptyExerciseName,

    #[error("exercise {0} appears more than once")]
    DuplicateExercise(ExerciseId),

    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),
}

//
// ─── EXERCISE ──────────────────────────────────────────────────────────────────
//

/// One step of a routine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    id: ExerciseId,
    name: String,
    duration_seconds: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    repetitions: Option<u32>,
}

impl Exercise {
    /// # Errors
    ///
    /// Returns `RoutineError::EmptyExerciseName` if the name is blank.
    pub fn new(
        id: ExerciseId,
        name: impl Into<String>,
        duration_seconds: u32,
        repetitions: Option<u32>,
    ) -> Result<Self, RoutineError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(RoutineError::EmptyExerciseName);
        }
        Ok(Self {
            id,
            name,
            duration_seconds,
            repetitions,
        })
    }

    #[must_use]
    pub fn id(&self) -> ExerciseId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn duration_seconds(&self) -> u32 {
        self.duration_seconds
    }

    #[must_use]
    pub fn repetitions(&self) -> Option<u32> {
        self.repetitions
    }
}

//
// ─── ROUTINE ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = RoutineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(RoutineError::UnknownDifficulty(s.to_string())),
        }
    }
}

/// Who authored a routine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoutineAuthor {
    System,
    Tutor(TutorId),
}

impl RoutineAuthor {
    /// Stored form: `"system"` or the tutor id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            RoutineAuthor::System => "system",
            RoutineAuthor::Tutor(id) => id.as_str(),
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw == "system" {
            Self::System
        } else {
            Self::Tutor(TutorId::new(raw))
        }
    }
}

/// An ordered list of exercises a kid works through in one sitting.
///
/// Routines are not edited once assignments reference them; tutors customize
/// by duplicating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routine {
    id: RoutineId,
    title: String,
    exercises: Vec<Exercise>,
    difficulty: Difficulty,
    categories: BTreeSet<String>,
    created_by: RoutineAuthor,
    is_public: bool,
}

impl Routine {
    /// Creates a validated routine.
    ///
    /// # Errors
    ///
    /// Returns `RoutineError` if the title is blank, there are no exercises,
    /// or an exercise id repeats.
    pub fn new(
        id: RoutineId,
        title: impl Into<String>,
        exercises: Vec<Exercise>,
        difficulty: Difficulty,
        categories: impl IntoIterator<Item = String>,
        created_by: RoutineAuthor,
        is_public: bool,
    ) -> Result<Self, RoutineError> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(RoutineError::EmptyTitle);
        }
        if exercises.is_empty() {
            return Err(RoutineError::NoExercises);
        }
        let mut seen = HashSet::with_capacity(exercises.len());
        for exercise in &exercises {
            if !seen.insert(exercise.id()) {
                return Err(RoutineError::DuplicateExercise(exercise.id()));
            }
        }
        let categories = categories
            .into_iter()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect();

        Ok(Self {
            id,
            title,
            exercises,
            difficulty,
            categories,
            created_by,
            is_public,
        })
    }

    /// Copy this routine into a private, tutor-owned routine with a new id.
    #[must_use]
    pub fn duplicate_for(&self, tutor: TutorId, new_id: RoutineId) -> Self {
        Self {
            id: new_id,
            title: format!("{} (copy)", self.title),
            exercises: self.exercises.clone(),
            difficulty: self.difficulty,
            categories: self.categories.clone(),
            created_by: RoutineAuthor::Tutor(tutor),
            is_public: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> &RoutineId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    #[must_use]
    pub fn exercise_count(&self) -> usize {
        self.exercises.len()
    }

    #[must_use]
    pub fn exercise_at(&self, index: usize) -> Option<&Exercise> {
        self.exercises.get(index)
    }

    /// Sum of exercise durations, rounded up to whole minutes.
    #[must_use]
    pub fn total_duration_minutes(&self) -> u32 {
        let secs: u32 = self
            .exercises
            .iter()
            .map(Exercise::duration_seconds)
            .fold(0, u32::saturating_add);
        secs.div_ceil(60)
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn categories(&self) -> &BTreeSet<String> {
        &self.categories
    }

    #[must_use]
    pub fn created_by(&self) -> &RoutineAuthor {
        &self.created_by
    }

    #[must_use]
    pub fn is_public(&self) -> bool {
        self.is_public
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
