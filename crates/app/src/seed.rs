use routine_core::model::{
    Difficulty, Exercise, ExerciseId, Kid, KidId, Routine, RoutineAuthor, RoutineId, TutorId,
};
use services::CatalogService;

struct SampleRoutine {
    id: &'static str,
    title: &'static str,
    difficulty: Difficulty,
    categories: &'static [&'static str],
    exercises: &'static [(u64, &'static str, u32, Option<u32>)],
}

const ROUTINES: &[SampleRoutine] = &[
    SampleRoutine {
        id: "routine-001",
        title: "Morning Stretch",
        difficulty: Difficulty::Easy,
        categories: &["flexibility"],
        exercises: &[
            (1, "Reach for the sky", 30, None),
            (2, "Toe touches", 45, Some(10)),
            (3, "Side bends", 30, Some(8)),
        ],
    },
    SampleRoutine {
        id: "routine-002",
        title: "Balance Basics",
        difficulty: Difficulty::Easy,
        categories: &["balance"],
        exercises: &[
            (1, "Stand on one foot", 30, None),
            (2, "Heel to toe walk", 30, Some(10)),
            (3, "Tree pose", 45, None),
        ],
    },
    SampleRoutine {
        id: "routine-003",
        title: "Jumping Jacks Warmup",
        difficulty: Difficulty::Medium,
        categories: &["cardio", "warmup"],
        exercises: &[
            (1, "Jumping jacks", 40, Some(20)),
            (2, "High knees", 30, None),
            (3, "Arm circles", 30, Some(15)),
            (4, "Squat jumps", 45, Some(10)),
        ],
    },
];

const KIDS: &[(&str, &str)] = &[("kid-1", "Mia"), ("kid-2", "Leo")];

const SAMPLE_TUTOR: &str = "tutor-1";

fn sample_kids() -> Result<Vec<Kid>, routine_core::Error> {
    let tutor = TutorId::new(SAMPLE_TUTOR);
    let mut kids = Vec::with_capacity(KIDS.len());
    for (id, name) in KIDS {
        kids.push(Kid::new(KidId::new(*id), *name, tutor.clone())?);
    }
    Ok(kids)
}

fn sample_routines() -> Result<Vec<Routine>, routine_core::Error> {
    let mut routines = Vec::with_capacity(ROUTINES.len());
    for sample in ROUTINES {
        let exercises = sample
            .exercises
            .iter()
            .map(|(id, name, secs, reps)| Exercise::new(ExerciseId::new(*id), *name, *secs, *reps))
            .collect::<Result<Vec<_>, _>>()?;
        routines.push(Routine::new(
            RoutineId::new(sample.id),
            sample.title,
            exercises,
            sample.difficulty,
            sample.categories.iter().map(ToString::to_string),
            RoutineAuthor::System,
            true,
        )?);
    }
    Ok(routines)
}

/// Upsert the sample kids and routines. Returns `(kids, routines)` written.
pub async fn seed(catalog: &CatalogService) -> anyhow::Result<(usize, usize)> {
    let kids = sample_kids()?;
    let routines = sample_routines()?;
    for kid in &kids {
        catalog.save_kid(kid).await?;
    }
    for routine in &routines {
        catalog.save_routine(routine).await?;
    }
    Ok((kids.len(), routines.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_are_valid() {
        let routines = sample_routines().unwrap();
        assert_eq!(routines.len(), 3);
        assert!(routines.iter().all(Routine::is_public));
        assert_eq!(routines[1].id(), &RoutineId::new("routine-002"));
        assert_eq!(sample_kids().unwrap().len(), 2);
    }
}
