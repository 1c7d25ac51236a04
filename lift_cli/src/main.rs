use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use lift_core::config::{database_path, state_path};
use lift_core::history::{export_history_csv, EditReport};
use lift_core::workout::{parse_weight, ExerciseProgress};
use lift_core::*;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "lift")]
#[command(about = "Strength program logger with progressive overload", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log as this user instead of the configured one
    #[arg(long, global = true)]
    user: Option<String>,

    /// Treat this date (YYYY-MM-DD) as today
    #[arg(long, global = true)]
    date: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the log database and seed the program catalog
    Init {
        /// CSV program sheet to seed from (replaces the current catalog)
        #[arg(long)]
        program: Option<PathBuf>,

        /// Leading rows of the program sheet to ignore
        #[arg(long, default_value_t = 0)]
        skip_rows: usize,
    },

    /// List the sessions in the program
    Program,

    /// Show the current workout state (default)
    Status,

    /// Stage the next session in the rotation with suggested weights
    Preview,

    /// Start the previewed session
    Begin,

    /// Pick up today's incomplete workout
    Resume,

    /// Record the weight for one set of the active workout
    Log {
        /// Exercise name as listed in the session
        exercise: String,

        /// Set number, starting at 1
        set: u32,

        /// Weight lifted; 0 leaves the set unlogged
        weight: String,
    },

    /// Show logged sets of the active workout
    Show,

    /// Request to finish the active workout
    Finish,

    /// Confirm a finish request
    Confirm,

    /// Withdraw a finish request and keep logging
    Cancel,

    /// List past workouts
    History,

    /// Replace logged weights of a past workout
    Edit {
        /// Workout id as shown by `lift history`
        workout_id: i64,

        /// One or more EXERCISE=w1,w2,... edits
        #[arg(required = true)]
        edits: Vec<String>,
    },

    /// Heaviest completed set per exercise
    Bests,

    /// Write every logged set to a CSV file
    Export {
        /// Destination CSV file
        path: PathBuf,
    },
}

/// Everything a command needs, resolved once from config and flags
struct AppContext {
    config: Config,
    data_dir: PathBuf,
    identity: Identity,
    today: NaiveDate,
    store: LogStore,
}

impl AppContext {
    fn engine(&self) -> Result<WorkoutEngine<'_>> {
        Ok(WorkoutEngine::new(&self.store, &self.identity, self.today)?
            .with_increment(self.config.progression.increment))
    }

    fn state_path(&self) -> Result<PathBuf> {
        let username = self.identity.require_authenticated()?;
        Ok(state_path(&self.data_dir, username))
    }
}

fn main() -> Result<()> {
    lift_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli
        .data_dir
        .unwrap_or_else(|| config.data.data_dir.clone());
    let identity = Identity::resolve(&config.user, cli.user.as_deref());
    let today = cli
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    tracing::debug!(
        "Using data dir {:?} as '{}' on {}",
        data_dir,
        identity.username,
        today
    );

    let store = LogStore::new(database_path(&data_dir));
    store.init()?;

    let ctx = AppContext {
        config,
        data_dir,
        identity,
        today,
        store,
    };

    match cli.command.unwrap_or(Commands::Status) {
        Commands::Init { program, skip_rows } => cmd_init(&ctx, program, skip_rows),
        Commands::Program => cmd_program(&ctx),
        Commands::Status => cmd_status(&ctx),
        Commands::Preview => cmd_preview(&ctx),
        Commands::Begin => cmd_begin(&ctx),
        Commands::Resume => cmd_resume(&ctx),
        Commands::Log {
            exercise,
            set,
            weight,
        } => cmd_log(&ctx, &exercise, set, &weight),
        Commands::Show => cmd_show(&ctx),
        Commands::Finish => cmd_finish(&ctx),
        Commands::Confirm => cmd_confirm(&ctx),
        Commands::Cancel => cmd_cancel(&ctx),
        Commands::History => cmd_history(&ctx),
        Commands::Edit { workout_id, edits } => cmd_edit(&ctx, workout_id, &edits),
        Commands::Bests => cmd_bests(&ctx),
        Commands::Export { path } => cmd_export(&ctx, &path),
    }
}

fn cmd_init(ctx: &AppContext, program: Option<PathBuf>, skip_rows: usize) -> Result<()> {
    let catalog = match program {
        Some(path) => lift_core::seed::load_program(&path, skip_rows)?,
        None if ctx.store.session_count()? > 0 => {
            println!(
                "✓ Log database ready at {} ({} sessions)",
                ctx.store.path().display(),
                ctx.store.session_count()?
            );
            return Ok(());
        }
        None => get_default_catalog().clone(),
    };

    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Program validation errors:");
        for error in &errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid program".into()));
    }

    ctx.store.replace_catalog(&catalog)?;
    println!(
        "✓ Seeded {} sessions into {}",
        catalog.len(),
        ctx.store.path().display()
    );
    Ok(())
}

fn cmd_program(ctx: &AppContext) -> Result<()> {
    let catalog = ctx.store.load_catalog()?;
    if catalog.is_empty() {
        println!("No program loaded. Run `lift init` first.");
        return Ok(());
    }

    for session in &catalog.sessions {
        println!("{}. {}", session.index, session.name);
        for ex in &session.exercises {
            println!("     {} — {}x{}", ex.name, ex.target_sets, ex.target_reps);
        }
    }
    Ok(())
}

fn cmd_status(ctx: &AppContext) -> Result<()> {
    let engine = ctx.engine()?;
    let state = WorkoutState::load(&ctx.state_path()?)?;

    println!("Welcome back, {}!", ctx.identity.display_name);
    println!("Workout state: {}", state.name());

    match &state {
        WorkoutState::Idle => {
            if let Some(attempt) = engine.find_resumable()? {
                println!(
                    "⏳ Incomplete workout from today: session {} (run `lift resume`)",
                    attempt.session_index
                );
            }
            match engine.next_session_index() {
                Ok(index) => println!("Next session: {} (run `lift preview`)", index),
                Err(Error::NotFound(_)) => println!("No program loaded. Run `lift init` first."),
                Err(e) => return Err(e),
            }
        }
        WorkoutState::Previewed(staged) => display_staged(staged),
        WorkoutState::Active(_) | WorkoutState::FinishRequested { .. } => {
            display_progress(&engine.progress(&state)?);
        }
    }
    Ok(())
}

fn cmd_preview(ctx: &AppContext) -> Result<()> {
    let engine = ctx.engine()?;
    let (_, staged) = WorkoutState::update(&ctx.state_path()?, |state| engine.preview(state))?;
    display_staged(&staged);
    println!("Run `lift begin` to start this workout.");
    Ok(())
}

fn cmd_begin(ctx: &AppContext) -> Result<()> {
    let engine = ctx.engine()?;
    let (_, active) = WorkoutState::update(&ctx.state_path()?, |state| engine.begin(state))?;
    println!(
        "✓ Started session {} (workout #{})",
        active.session_index, active.workout_id
    );
    display_targets(&active.exercises);
    Ok(())
}

fn cmd_resume(ctx: &AppContext) -> Result<()> {
    let engine = ctx.engine()?;
    let (state, active) =
        WorkoutState::update(&ctx.state_path()?, |state| engine.resume(state))?;
    println!(
        "🔄 Resumed session {} (workout #{})",
        active.session_index, active.workout_id
    );
    display_progress(&engine.progress(&state)?);
    Ok(())
}

fn cmd_log(ctx: &AppContext, exercise: &str, set: u32, weight: &str) -> Result<()> {
    let weight = parse_weight(weight)?;
    let engine = ctx.engine()?;
    let state = WorkoutState::load(&ctx.state_path()?)?;

    match engine.record_set(&state, exercise, set, weight)? {
        SetWrite::Recorded { previous: None } => {
            println!("✓ {} set {}: {} lbs", exercise, set, weight)
        }
        SetWrite::Recorded {
            previous: Some(previous),
        } => println!(
            "✓ {} set {}: {} lbs (was {})",
            exercise, set, weight, previous
        ),
        SetWrite::Unchanged => println!("= {} set {} already at {} lbs", exercise, set, weight),
        SetWrite::Skipped => println!("- 0 leaves {} set {} unlogged", exercise, set),
    }
    Ok(())
}

fn cmd_show(ctx: &AppContext) -> Result<()> {
    let engine = ctx.engine()?;
    let state = WorkoutState::load(&ctx.state_path()?)?;
    display_progress(&engine.progress(&state)?);
    Ok(())
}

fn cmd_finish(ctx: &AppContext) -> Result<()> {
    let engine = ctx.engine()?;
    let (_, incomplete) = WorkoutState::update(&ctx.state_path()?, |state| engine.finish(state))?;

    if incomplete.is_empty() {
        println!("All sets are filled in.");
    } else {
        println!("⚠ Not all sets are filled in:");
        for ex in &incomplete {
            println!(
                "  - {}: {} of {} sets completed",
                ex.exercise_name, ex.logged, ex.target
            );
        }
    }
    println!("Run `lift confirm` to finish, or `lift cancel` to keep logging.");
    Ok(())
}

fn cmd_confirm(ctx: &AppContext) -> Result<()> {
    let (_, workout) = WorkoutState::update(&ctx.state_path()?, |state| state.confirm())?;
    println!(
        "✓ Workout #{} finished (session {})",
        workout.workout_id, workout.session_index
    );
    Ok(())
}

fn cmd_cancel(ctx: &AppContext) -> Result<()> {
    WorkoutState::update(&ctx.state_path()?, |state| state.cancel_finish())?;
    println!("⬅ Back to logging.");
    Ok(())
}

fn cmd_history(ctx: &AppContext) -> Result<()> {
    let username = ctx.identity.require_authenticated()?;
    let catalog = ctx.store.load_catalog()?;
    let history = load_history(&ctx.store, username, &catalog)?;

    if history.is_empty() {
        println!("No workout history yet.");
        return Ok(());
    }

    for workout in &history {
        println!(
            "#{}  {} - Session {}",
            workout.workout_id, workout.date, workout.session_index
        );
        for ex in &workout.exercises {
            let target = ex
                .target
                .map(|(sets, reps)| format!(" ({}x{})", sets, reps))
                .unwrap_or_default();
            let weights = if ex.sets.is_empty() {
                "-".to_string()
            } else {
                ex.weights_text()
            };
            println!("     {}{}: {}", ex.exercise_name, target, weights);
        }
    }
    Ok(())
}

fn cmd_edit(ctx: &AppContext, workout_id: i64, edits: &[String]) -> Result<()> {
    let username = ctx.identity.require_authenticated()?;
    let edits = edits
        .iter()
        .map(|e| WeightEdit::parse(e))
        .collect::<Result<Vec<_>>>()?;

    let report = edit_workout_weights(&ctx.store, username, workout_id, &edits)?;
    display_edit_report(workout_id, &report);
    Ok(())
}

fn cmd_bests(ctx: &AppContext) -> Result<()> {
    let username = ctx.identity.require_authenticated()?;
    let bests = ctx.store.personal_bests(username)?;

    if bests.is_empty() {
        println!("No personal bests yet. Start your first session!");
        return Ok(());
    }

    println!("🏆 Personal Bests");
    for best in &bests {
        println!("  - {}: {} lbs", best.exercise_name, best.weight);
    }
    Ok(())
}

fn cmd_export(ctx: &AppContext, path: &Path) -> Result<()> {
    let username = ctx.identity.require_authenticated()?;
    let count = export_history_csv(&ctx.store, username, path)?;
    println!("✓ Exported {} sets to {}", count, path.display());
    Ok(())
}

fn display_staged(staged: &StagedSession) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  SESSION {}", staged.session_index);
    println!("╰─────────────────────────────────────────╯");
    println!("  {}", staged.session_name);
    display_targets(&staged.exercises);
}

fn display_targets(exercises: &[PlannedExercise]) {
    for ex in exercises {
        let note = match ex.suggestion {
            SuggestionKind::New => "new exercise, pick your starting weight".to_string(),
            SuggestionKind::Increase => format!("target {} lbs, weight increased", ex.suggested_weight),
            SuggestionKind::Repeat => format!("target {} lbs, let's try it again", ex.suggested_weight),
        };
        println!(
            "  • {} — {}x{}: {}",
            ex.name, ex.target_sets, ex.target_reps, note
        );
    }
    println!();
}

fn display_progress(progress: &[ExerciseProgress]) {
    for ex in progress {
        let mark = if ex.is_complete() { "✓" } else { " " };
        println!(
            "{} {} — {}x{} ({} of {} sets)",
            mark,
            ex.exercise.name,
            ex.exercise.target_sets,
            ex.exercise.target_reps,
            ex.sets.len(),
            ex.exercise.target_sets
        );
        for set in 1..=ex.exercise.target_sets {
            match ex.sets.iter().find(|s| s.set_number == set) {
                Some(logged) => println!("    set {}: {} lbs", set, logged.weight),
                None if ex.exercise.suggested_weight > 0.0 => println!(
                    "    set {}: -  (target {} lbs)",
                    set, ex.exercise.suggested_weight
                ),
                None => println!("    set {}: -", set),
            }
        }
    }
}

fn display_edit_report(workout_id: i64, report: &EditReport) {
    if report.updated_sets > 0 {
        println!(
            "✓ Updated {} weights for workout #{} ({})",
            report.updated_sets,
            workout_id,
            report.applied.join(", ")
        );
    }
    for rejection in &report.rejected {
        println!(
            "⚠ {} not changed: {}",
            rejection.exercise_name, rejection.reason
        );
    }
}
