mod cli;
mod db;
mod seed;

use anyhow::{Context, bail};
use clap::Parser;
use routine_core::model::{Actor, Assignment, ExerciseResult, KidId};
use routine_core::permissions::CapabilityMatrix;
use routine_core::{Capability, Clock, DateRange, Requirement};
use services::{AppServices, TrainingSessionManager};
use tracing::debug;

use cli::{Cli, Commands, SessionSubcommand};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("error: {e:#}");
        std::process::exit(2);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let clock = match cli.today {
        Some(day) => {
            let noon = day.and_hms_opt(12, 0, 0).context("invalid --today")?;
            Clock::fixed(noon.and_utc())
        }
        None => Clock::default_clock(),
    };

    let db_url = db::normalize_sqlite_url(&cli.db);
    db::prepare_sqlite_file(&db_url)?;
    let app = AppServices::new_sqlite(&db_url, clock, cli.session_key.as_str())
        .await
        .with_context(|| format!("opening {db_url}"))?;

    // Every run starts by picking up whatever session a previous run left.
    let mut training = app.training();
    let recovered = training.recover().await?;
    debug!(state = %recovered, "session recovered at startup");

    match cli.command {
        Commands::Seed => {
            let (kids, routines) = seed::seed(&app.catalog()).await?;
            println!("seeded {kids} kids and {routines} routines");
        }
        Commands::Permissions { kind, tier } => {
            let permissions = CapabilityMatrix::resolve(kind, tier);
            println!("{}", serde_json::to_string_pretty(&permissions)?);
        }
        Commands::Routines => {
            for routine in app.catalog().routines().await? {
                println!(
                    "{}  {} ({}, {} exercises, ~{} min)",
                    routine.id(),
                    routine.title(),
                    routine.difficulty(),
                    routine.exercise_count(),
                    routine.total_duration_minutes()
                );
            }
        }
        Commands::Assign {
            kid,
            routine,
            date,
            tutor,
            tier,
        } => {
            require(&app, &Actor::tutor(tier), Capability::AssignRoutines)?;
            let date = date.unwrap_or_else(|| app.clock().today());
            let assignment = app
                .scheduler()
                .create(&kid, date, &routine, &tutor)
                .await?;
            print_assignment(&assignment);
        }
        Commands::Skip { assignment } => {
            let skipped = app.scheduler().skip(&assignment).await?;
            print_assignment(&skipped);
        }
        Commands::Today { kid } => today(&app, &kid).await?,
        Commands::History { kid, days } => {
            let range = DateRange::ending_on(app.clock().today(), days);
            let history = app.scheduler().list_for_kid(&kid, range).await?;
            if history.is_empty() {
                println!("no assignments for {kid} between {} and {}", range.start(), range.end());
            }
            for assignment in &history {
                print_assignment(assignment);
            }
        }
        Commands::Session { subcommand } => session(&app, &mut training, subcommand).await?,
    }
    Ok(())
}

fn require(app: &AppServices, actor: &Actor, capability: Capability) -> anyhow::Result<()> {
    if app.gate().allows(Some(actor), &Requirement::One(capability)) {
        Ok(())
    } else {
        bail!("{} ({}) lacks {capability}", actor.kind(), actor.tier())
    }
}

async fn today(app: &AppServices, kid: &KidId) -> anyhow::Result<()> {
    let day = app.clock().today();
    let Some(assignment) = app.scheduler().assignment_for(kid, day).await? else {
        println!("nothing assigned to {kid} on {day}");
        return Ok(());
    };
    print_assignment(&assignment);
    if let Some(routine) = app.catalog().routine(assignment.routine_id()).await? {
        println!("  {} (~{} min)", routine.title(), routine.total_duration_minutes());
        for exercise in routine.exercises() {
            let reps = exercise
                .repetitions()
                .map(|r| format!(" x{r}"))
                .unwrap_or_default();
            println!(
                "  - [{}] {} {}s{reps}",
                exercise.id(),
                exercise.name(),
                exercise.duration_seconds()
            );
        }
    }
    Ok(())
}

async fn session(
    app: &AppServices,
    training: &mut TrainingSessionManager,
    subcommand: SessionSubcommand,
) -> anyhow::Result<()> {
    match subcommand {
        SessionSubcommand::Start { assignment, tier } => {
            require(app, &Actor::kid(tier), Capability::StartTraining)?;
            let session = training.start(&assignment).await?;
            println!("started {} at {}", session.assignment_id(), session.started_at());
        }
        SessionSubcommand::Exercise {
            exercise,
            seconds,
            skipped,
        } => {
            let exercise_id = match exercise {
                Some(id) => id,
                None => training
                    .current_exercise()
                    .map(|e| e.id())
                    .context("no exercise to record; start a session first")?,
            };
            let result = training
                .complete_exercise(exercise_id, seconds, skipped)
                .await?;
            print_result(&result);
        }
        SessionSubcommand::Pause => training.pause().await?,
        SessionSubcommand::Resume => training.resume().await?,
        SessionSubcommand::Finish => {
            let assignment = training.complete_routine().await?;
            print_assignment(&assignment);
        }
        SessionSubcommand::Cancel => training.cancel().await?,
        SessionSubcommand::Status { json: true } => {
            let status = serde_json::json!({
                "state": training.state(),
                "assignmentId": training.session().map(|s| s.assignment_id()),
                "progress": training.progress(),
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
            return Ok(());
        }
        SessionSubcommand::Status { json: false } => {}
    }
    print_status(training);
    Ok(())
}

fn print_assignment(assignment: &Assignment) {
    let total = assignment
        .total_time_spent_seconds()
        .map(|t| format!(" {t}s"))
        .unwrap_or_default();
    println!(
        "{}  {}  {} -> {}  [{}]{total}",
        assignment.id(),
        assignment.assigned_date(),
        assignment.routine_id(),
        assignment.kid_id(),
        assignment.status()
    );
}

fn print_result(result: &ExerciseResult) {
    let outcome = if result.skipped() { "skipped" } else { "done" };
    println!(
        "exercise {} {outcome} in {}s",
        result.exercise_id(),
        result.time_spent_seconds()
    );
}

fn print_status(training: &TrainingSessionManager) {
    println!("session: {}", training.state());
    if let Some(progress) = training.progress() {
        println!("  {} of {} exercises processed", progress.processed, progress.total);
    }
    if let Some(exercise) = training.current_exercise() {
        println!("  next: [{}] {}", exercise.id(), exercise.name());
    }
}
