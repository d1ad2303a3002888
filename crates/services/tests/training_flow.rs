use chrono::NaiveDate;
use routine_core::model::{
    Actor, AssignmentStatus, Difficulty, Exercise, ExerciseId, Kid, KidId, Routine, RoutineAuthor,
    RoutineId, SessionState, Tier, TutorId,
};
use routine_core::time::fixed_clock;
use routine_core::{Capability, DateRange, Requirement};
use services::{AppServices, DEFAULT_SESSION_KEY, SchedulerError, TrainingError};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

async fn services(url: &str) -> AppServices {
    let app = AppServices::new_sqlite(url, fixed_clock(), DEFAULT_SESSION_KEY)
        .await
        .expect("sqlite services");
    let catalog = app.catalog();
    catalog
        .save_kid(&Kid::new(KidId::new("kid-1"), "Ada", TutorId::new("tutor-1")).unwrap())
        .await
        .unwrap();
    let routine = Routine::new(
        RoutineId::new("routine-002"),
        "Balance Basics",
        vec![
            Exercise::new(ExerciseId::new(1), "Stand on one foot", 30, None).unwrap(),
            Exercise::new(ExerciseId::new(2), "Heel to toe", 30, Some(10)).unwrap(),
            Exercise::new(ExerciseId::new(3), "Tree pose", 45, None).unwrap(),
        ],
        Difficulty::Easy,
        vec!["balance".to_string()],
        RoutineAuthor::System,
        true,
    )
    .unwrap();
    catalog.save_routine(&routine).await.unwrap();
    app
}

#[tokio::test]
async fn tutor_assigns_and_kid_trains_across_restarts() {
    let app = services("sqlite:file:memdb_training_flow?mode=memory&cache=shared").await;
    let tutor = Actor::tutor(Tier::Free);
    assert!(
        app.gate()
            .allows(Some(&tutor), &Requirement::One(Capability::AssignRoutines))
    );

    let scheduler = app.scheduler();
    let assignment = scheduler
        .create(
            &KidId::new("kid-1"),
            day(5),
            &RoutineId::new("routine-002"),
            &TutorId::new("tutor-1"),
        )
        .await
        .unwrap();
    let err = scheduler
        .create(
            &KidId::new("kid-1"),
            day(5),
            &RoutineId::new("routine-001"),
            &TutorId::new("tutor-1"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulerError::NotFound(_)));
    let err = scheduler
        .create(
            &KidId::new("kid-1"),
            day(5),
            &RoutineId::new("routine-002"),
            &TutorId::new("tutor-1"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulerError::DuplicateAssignment { .. }));

    let kid = Actor::kid(Tier::Free);
    assert!(
        app.gate()
            .allows(Some(&kid), &Requirement::One(Capability::StartTraining))
    );
    assert!(!app.gate().allows(None, &Requirement::One(Capability::StartTraining)));

    {
        let mut manager = app.training();
        manager.start(assignment.id()).await.unwrap();
        manager
            .complete_exercise(ExerciseId::new(1), 30, false)
            .await
            .unwrap();
    }

    // new process: the session comes back where it stopped
    let mut manager = app.training();
    assert_eq!(manager.recover().await.unwrap(), SessionState::InProgress);
    assert_eq!(manager.progress().unwrap().processed, 1);
    let err = manager.complete_routine().await.unwrap_err();
    assert!(matches!(err, TrainingError::SessionNotReady { .. }));

    manager
        .complete_exercise(ExerciseId::new(2), 25, false)
        .await
        .unwrap();
    manager
        .complete_exercise(ExerciseId::new(3), 40, false)
        .await
        .unwrap();
    let done = manager.complete_routine().await.unwrap();
    assert_eq!(done.total_time_spent_seconds(), Some(95));

    let mut fresh = app.training();
    assert_eq!(fresh.recover().await.unwrap(), SessionState::NotStarted);

    let history = scheduler
        .list_for_kid(&KidId::new("kid-1"), DateRange::ending_on(day(7), 7))
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status(), AssignmentStatus::Completed);
}

#[tokio::test]
async fn editing_an_assigned_routine_cannot_strand_a_session() {
    let app = services("sqlite:file:memdb_frozen_routine?mode=memory&cache=shared").await;
    let assignment = app
        .scheduler()
        .create(
            &KidId::new("kid-1"),
            day(5),
            &RoutineId::new("routine-002"),
            &TutorId::new("tutor-1"),
        )
        .await
        .unwrap();
    {
        let mut manager = app.training();
        manager.start(assignment.id()).await.unwrap();
        manager
            .complete_exercise(ExerciseId::new(1), 30, false)
            .await
            .unwrap();
    }

    let shortened = Routine::new(
        RoutineId::new("routine-002"),
        "Balance Basics",
        vec![Exercise::new(ExerciseId::new(1), "Stand on one foot", 30, None).unwrap()],
        Difficulty::Easy,
        vec!["balance".to_string()],
        RoutineAuthor::System,
        true,
    )
    .unwrap();
    let err = app.catalog().save_routine(&shortened).await.unwrap_err();
    assert!(matches!(err, SchedulerError::RoutineInUse(_)));

    let mut manager = app.training();
    assert_eq!(manager.recover().await.unwrap(), SessionState::InProgress);
    assert_eq!(manager.progress().unwrap().total, 3);
    assert_eq!(manager.progress().unwrap().processed, 1);
}
