//! liftlog - personal workout tracker

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};

use liftlog::catalog;
use liftlog::db::Database;
use liftlog::model::{Exercise, ExerciseSet, Template, WeightUnit};
use liftlog::stats::{Analytics, ProgressPredictor};
use liftlog::tui::App;

const DB_PATH: &str = "liftlog.db";

#[derive(Parser)]
#[command(name = "liftlog")]
#[command(author, version, about = "Personal workout tracker")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open TUI dashboard
    Tui,

    /// Log a single lift into today's workout
    Log {
        /// Exercise name (e.g. "Bench Press")
        exercise: String,

        /// Reps performed
        #[arg(short, long, default_value = "5")]
        reps: u32,

        /// Weight, in the configured unit
        #[arg(short, long, default_value = "0")]
        weight: f64,

        /// Rest after the set in seconds (catalog default when omitted)
        #[arg(long)]
        rest: Option<u32>,
    },

    /// List the built-in exercise catalog
    Exercises,

    /// List workout history
    History {
        /// Number of workouts to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Manage workout templates
    Templates {
        #[command(subcommand)]
        action: TemplateAction,
    },

    /// Show training statistics
    Stats {
        /// Filter by exercise name
        exercise: Option<String>,
    },

    /// Show or change settings
    Settings {
        /// Weight unit: kg or lb
        #[arg(long)]
        unit: Option<String>,

        /// Allow more than one workout per day
        #[arg(long)]
        multiple_per_day: Option<bool>,
    },

    /// Start Telegram bot
    Bot {
        /// Telegram bot token (or set TELOXIDE_TOKEN env var)
        #[arg(short, long, env = "TELOXIDE_TOKEN")]
        token: String,
    },
}

#[derive(Subcommand)]
enum TemplateAction {
    /// List saved templates
    List,

    /// Save an existing workout as a template
    Save { workout_id: i64, name: String },

    /// Start today's workout from a template
    Start { name: String },

    /// Delete a template
    Delete { name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut db = Database::open(DB_PATH)?;

    match cli.command {
        Some(Commands::Tui) | None => {
            let mut app = App::new(db)?;
            app.run()?;
        }

        Some(Commands::Log { exercise, reps, weight, rest }) => {
            let unit = db.weight_unit()?;
            let weight_kg = unit.to_kg(weight);
            let rest_secs = rest
                .or_else(|| catalog::find_by_name(&exercise).map(|d| d.default_rest_secs))
                .unwrap_or(90);

            let id = db.quick_log(
                Exercise {
                    def: exercise.clone(),
                    rest_secs,
                    sets: vec![ExerciseSet { reps, weight_kg }],
                },
                Utc::now(),
            )?;
            println!("Logged: {} - {} x {} (workout {})", exercise, reps, unit.format(weight_kg), id);
        }

        Some(Commands::Exercises) => {
            println!("Built-in exercises:");
            println!("{:-<52}", "");
            for def in catalog::BUILTIN_EXERCISES {
                println!(
                    "{:24} | {:10} | rest {}s",
                    def.name,
                    def.group.name(),
                    def.default_rest_secs
                );
            }
        }

        Some(Commands::History { limit }) => {
            let unit = db.weight_unit()?;
            let workouts = db.workouts()?;
            println!("Recent workouts:");
            println!("{:-<72}", "");
            for w in workouts.iter().take(limit) {
                println!(
                    "{:>4} | {} | {:24} | {:2} items | {:3} sets | {}",
                    w.id.unwrap_or_default(),
                    w.date.format("%Y-%m-%d %H:%M"),
                    w.name,
                    w.items.len(),
                    w.total_sets(),
                    unit.format(w.total_volume_kg()),
                );
            }
        }

        Some(Commands::Templates { action }) => match action {
            TemplateAction::List => {
                let templates = db.templates()?;
                if templates.is_empty() {
                    println!("No templates yet. Save one with: liftlog templates save <workout-id> <name>");
                }
                for t in templates {
                    let sets: usize = t.items.iter().map(|i| i.set_count()).sum();
                    println!("{:24} | {} items | {} sets", t.name, t.items.len(), sets);
                }
            }

            TemplateAction::Save { workout_id, name } => {
                let workout = db
                    .workout(workout_id)?
                    .with_context(|| format!("no workout with id {}", workout_id))?;
                db.add_template(&Template { id: None, name: name.clone(), items: workout.items })?;
                println!("Saved template '{}'", name);
            }

            TemplateAction::Start { name } => {
                let template = db
                    .template_by_name(&name)?
                    .with_context(|| format!("no template named '{}'", name))?;
                let now = Utc::now();
                if !db.can_log_on(now.date_naive())? {
                    println!(
                        "A workout is already logged today. \
                         Enable multiple workouts with: liftlog settings --multiple-per-day true"
                    );
                } else {
                    let id = db.add_workout(&template.instantiate(now))?;
                    println!("Started '{}' (workout {}). Open the TUI to run the session.", template.name, id);
                }
            }

            TemplateAction::Delete { name } => {
                if db.delete_template(&name)? {
                    println!("Deleted template '{}'", name);
                } else {
                    println!("No template named '{}'", name);
                }
            }
        },

        Some(Commands::Stats { exercise }) => {
            let unit = db.weight_unit()?;
            let workouts = db.workouts()?;
            let analytics = Analytics::new(workouts.clone());

            println!("Training Statistics");
            println!("{:-<40}", "");

            if let Some(ex) = exercise {
                if let Some((weight_kg, reps)) = analytics.personal_record(&ex) {
                    println!("Exercise: {}", ex);
                    println!("PR: {} x {}", reps, unit.format(weight_kg));
                } else {
                    println!("No sets logged for {}", ex);
                }
                if let Some((reps, kg)) = analytics.suggest_next_load(&ex) {
                    println!("Suggested next: {} x {}", reps, unit.format(kg));
                }
                if let Some(predictor) = ProgressPredictor::train(&workouts, &ex) {
                    println!();
                    println!("{}", predictor.format_summary(&ex));
                }
            } else {
                println!("Workouts: {}", analytics.workout_count());
                println!("Sets: {}", analytics.total_sets());
                println!("Volume: {}", unit.format(analytics.total_volume_kg()));
                println!("Weekly frequency: {:.1} workouts/week", analytics.weekly_frequency());
            }
        }

        Some(Commands::Settings { unit, multiple_per_day }) => {
            if let Some(label) = unit {
                let parsed = WeightUnit::from_label(&label)
                    .with_context(|| format!("unknown unit '{}', expected kg or lb", label))?;
                db.set_weight_unit(parsed)?;
            }
            if let Some(allow) = multiple_per_day {
                db.set_allow_multiple_per_day(allow)?;
            }
            println!("weight unit:       {}", db.weight_unit()?.label());
            println!("multiple per day:  {}", db.allow_multiple_per_day()?);
        }

        Some(Commands::Bot { token }) => {
            println!("Starting Telegram bot...");
            println!("Database: {}", DB_PATH);
            liftlog::bot::run_bot(token, DB_PATH).await?;
        }
    }

    Ok(())
}
