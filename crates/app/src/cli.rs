use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use routine_core::model::{ActorKind, AssignmentId, ExerciseId, KidId, RoutineId, Tier, TutorId};
use services::DEFAULT_SESSION_KEY;

#[derive(Parser)]
#[command(
    name = "routine",
    about = "Assign daily exercise routines to kids and run resumable training sessions",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// SQLite database URL or path
    #[arg(
        long,
        global = true,
        env = "ROUTINE_DB_URL",
        default_value = "sqlite://routine.sqlite3"
    )]
    pub db: String,

    /// Key under which the active training session is stored
    #[arg(long, global = true, env = "ROUTINE_SESSION_KEY", default_value = DEFAULT_SESSION_KEY)]
    pub session_key: String,

    /// Pin "today" to a date (YYYY-MM-DD) instead of the system clock
    #[arg(long, global = true, env = "ROUTINE_TODAY")]
    pub today: Option<NaiveDate>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Insert the sample tutor, kids and routines (idempotent)
    Seed,

    /// Print the resolved permissions for an actor as JSON
    Permissions {
        /// Actor kind (kid or tutor); omit for anonymous
        #[arg(long)]
        kind: Option<ActorKind>,
        /// Subscription tier (free or premium)
        #[arg(long)]
        tier: Option<Tier>,
    },

    /// List the routine library
    Routines,

    /// Assign a routine to a kid for a day
    Assign {
        #[arg(long)]
        kid: KidId,
        #[arg(long)]
        routine: RoutineId,
        /// Day to assign (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value = "tutor-1")]
        tutor: TutorId,
        /// Tier of the assigning tutor
        #[arg(long, default_value = "free")]
        tier: Tier,
    },

    /// Skip an assignment, freeing its day
    Skip { assignment: AssignmentId },

    /// Show a kid's assignment for today
    Today {
        #[arg(long)]
        kid: KidId,
    },

    /// Show a kid's recent assignments
    History {
        #[arg(long)]
        kid: KidId,
        /// Number of days back from today, inclusive
        #[arg(long, default_value_t = 7)]
        days: u32,
    },

    /// Drive the training session
    Session {
        #[command(subcommand)]
        subcommand: SessionSubcommand,
    },
}

#[derive(Subcommand)]
pub enum SessionSubcommand {
    /// Start training on an assignment
    Start {
        assignment: AssignmentId,
        /// Tier of the training kid
        #[arg(long, default_value = "free")]
        tier: Tier,
    },
    /// Record the current exercise and advance
    Exercise {
        /// Exercise being recorded (defaults to the current one)
        #[arg(long)]
        exercise: Option<ExerciseId>,
        #[arg(long)]
        seconds: u32,
        #[arg(long)]
        skipped: bool,
    },
    Pause,
    Resume,
    /// Complete the routine once every exercise is processed
    Finish,
    Cancel,
    /// Show the live session
    Status {
        /// Print progress as JSON
        #[arg(long)]
        json: bool,
    },
}
