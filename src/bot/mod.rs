//! Telegram bot module - remote quick-logging with training reminders

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use teloxide::{
    dispatching::dialogue::{Dialogue, InMemStorage},
    prelude::*,
    types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup},
    utils::command::BotCommands,
};
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::catalog::{BUILTIN_EXERCISES, find};
use crate::db::Database;
use crate::model::{Exercise, ExerciseSet, Workout};
use crate::stats::{Analytics, ProgressPredictor};

type MyDialogue = Dialogue<State, InMemStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
type Subscribers = Arc<Mutex<HashSet<ChatId>>>;

/// Reminder interval (24 hours)
const REMINDER_INTERVAL_SECS: u64 = 86_400;

#[derive(Clone, Default)]
pub enum State {
    #[default]
    Start,
    /// Waiting for the rep count of the logged set
    WaitingForReps {
        def_id: String,
        def_name: String,
    },
    /// Waiting for the weight of the logged set
    WaitingForWeight {
        def_id: String,
        def_name: String,
        reps: u32,
    },
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Bot commands:")]
pub enum Command {
    #[command(description = "start")]
    Start,
    #[command(description = "show help")]
    Help,
    #[command(description = "log a lift")]
    Log,
    #[command(description = "today's workouts")]
    Today,
    #[command(description = "training statistics")]
    Stats,
    #[command(description = "enable daily training reminders")]
    Remind,
    #[command(description = "disable reminders")]
    Stop,
}

/// Create inline keyboard with the built-in exercise catalog
fn make_exercises_keyboard() -> InlineKeyboardMarkup {
    let buttons: Vec<Vec<InlineKeyboardButton>> = BUILTIN_EXERCISES
        .chunks(2)
        .map(|chunk| {
            chunk
                .iter()
                .map(|def| {
                    let label = format!("{} {}", def.group.emoji(), def.name);
                    InlineKeyboardButton::callback(label, format!("ex:{}", def.id))
                })
                .collect()
        })
        .collect();

    InlineKeyboardMarkup::new(buttons)
}

/// Background task that nudges subscribers to train
async fn reminder_task(bot: Bot, subscribers: Subscribers) {
    info!("Reminder task started (interval: {} seconds)", REMINDER_INTERVAL_SECS);

    loop {
        tokio::time::sleep(Duration::from_secs(REMINDER_INTERVAL_SECS)).await;

        let subs = subscribers.lock().await;
        if subs.is_empty() {
            continue;
        }

        info!("Sending reminders to {} subscribers", subs.len());
        for chat_id in subs.iter() {
            let result = bot
                .send_message(*chat_id, "🏋️ Time to train!\n\n/log to record a lift")
                .await;

            if let Err(e) = result {
                error!("Failed to send reminder to {}: {}", chat_id, e);
            }
        }
    }
}

/// Start the Telegram bot with reminders
pub async fn run_bot(token: String, db_path: &str) -> anyhow::Result<()> {
    let bot = Bot::new(token);
    let db = Arc::new(Mutex::new(Database::open(db_path)?));
    let subscribers: Subscribers = Arc::new(Mutex::new(HashSet::new()));

    let reminder_bot = bot.clone();
    let reminder_subs = subscribers.clone();
    tokio::spawn(async move {
        reminder_task(reminder_bot, reminder_subs).await;
    });

    let handler = dptree::entry()
        .enter_dialogue::<Update, InMemStorage<State>, State>()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_callback_query().endpoint(handle_callback));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![InMemStorage::<State>::new(), db, subscribers])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    _dialogue: MyDialogue,
    db: Arc<Mutex<Database>>,
    subscribers: Subscribers,
) -> HandlerResult {
    match cmd {
        Command::Start => {
            let text = "🏋️ liftlog\n\n\
                Personal workout tracker\n\n\
                /log - log a lift\n\
                /today - today's workouts\n\
                /stats - statistics\n\
                /remind - daily reminders\n\
                /stop - disable reminders";
            bot.send_message(msg.chat.id, text).await?;
        }

        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }

        Command::Log => {
            let keyboard = make_exercises_keyboard();
            bot.send_message(msg.chat.id, "Pick an exercise:")
                .reply_markup(keyboard)
                .await?;
        }

        Command::Today => {
            let db = db.lock().await;
            let today = Utc::now().date_naive();
            let today_workouts = db.workouts_on(today)?;

            if today_workouts.is_empty() {
                bot.send_message(msg.chat.id, "Nothing logged today. /log to start!")
                    .await?;
            } else {
                let mut text = String::from("📊 Today:\n\n");
                for workout in &today_workouts {
                    text.push_str(&format!(
                        "{} ({} sets, {:.0} kg volume)\n",
                        workout.name,
                        workout.total_sets(),
                        workout.total_volume_kg(),
                    ));
                    for item in &workout.items {
                        text.push_str(&format!("• {}\n", item.label()));
                    }
                }
                bot.send_message(msg.chat.id, text).await?;
            }
        }

        Command::Stats => {
            let db = db.lock().await;
            let workouts = db.workouts()?;
            let analytics = Analytics::new(workouts.clone());

            let mut text = format!(
                "📈 Statistics\n\n\
                Workouts: {}\n\
                Sets: {}\n\
                Volume: {:.0} kg\n\
                Frequency: {:.1}/week\n",
                analytics.workout_count(),
                analytics.total_sets(),
                analytics.total_volume_kg(),
                analytics.weekly_frequency(),
            );

            if let Some(def) = analytics.most_frequent_exercise() {
                if let Some((weight_kg, reps)) = analytics.personal_record(&def) {
                    text.push_str(&format!("\nPR {}: {} x {:.1} kg\n", def, reps, weight_kg));
                }
                if let Some(predictor) = ProgressPredictor::train(&workouts, &def) {
                    text.push('\n');
                    text.push_str(&predictor.format_summary(&def));
                }
            }

            bot.send_message(msg.chat.id, text).await?;
        }

        Command::Remind => {
            let mut subs = subscribers.lock().await;
            subs.insert(msg.chat.id);

            bot.send_message(
                msg.chat.id,
                "✅ Reminders on!\n\nI'll nudge you once a day.\n/stop - disable",
            )
            .await?;

            info!("User {} subscribed to reminders", msg.chat.id);
        }

        Command::Stop => {
            let mut subs = subscribers.lock().await;
            let was_subscribed = subs.remove(&msg.chat.id);

            if was_subscribed {
                bot.send_message(msg.chat.id, "🔕 Reminders off.\n\n/remind - enable again")
                    .await?;
                info!("User {} unsubscribed from reminders", msg.chat.id);
            } else {
                bot.send_message(msg.chat.id, "Reminders are already off.\n\n/remind - enable")
                    .await?;
            }
        }
    }

    Ok(())
}

async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    dialogue: MyDialogue,
    _db: Arc<Mutex<Database>>,
    _subscribers: Subscribers,
) -> HandlerResult {
    if let Some(data) = &q.data {
        if let Some(def_id) = data.strip_prefix("ex:") {
            if let Some(def) = find(def_id) {
                dialogue
                    .update(State::WaitingForReps {
                        def_id: def_id.to_string(),
                        def_name: def.name.to_string(),
                    })
                    .await?;

                let text = format!("{} {}\n\nHow many reps?", def.group.emoji(), def.name);

                if let Some(msg) = q.message {
                    bot.edit_message_text(msg.chat().id, msg.id(), text).await?;
                }
            }
        }
    }

    bot.answer_callback_query(q.id).await?;
    Ok(())
}

async fn handle_message(
    bot: Bot,
    msg: Message,
    dialogue: MyDialogue,
    db: Arc<Mutex<Database>>,
    _subscribers: Subscribers,
) -> HandlerResult {
    let state = dialogue.get().await?.unwrap_or_default();

    match state {
        State::WaitingForReps { def_id, def_name } => {
            if let Some(text) = msg.text() {
                if let Ok(reps) = text.trim().parse::<u32>() {
                    if reps == 0 || reps > 500 {
                        bot.send_message(msg.chat.id, "Reps must be between 1 and 500")
                            .await?;
                        return Ok(());
                    }

                    dialogue
                        .update(State::WaitingForWeight {
                            def_id,
                            def_name: def_name.clone(),
                            reps,
                        })
                        .await?;

                    let response = format!("{} - {} reps\n\nWeight in kg? (0 for bodyweight)", def_name, reps);
                    bot.send_message(msg.chat.id, response).await?;
                } else {
                    bot.send_message(msg.chat.id, "Enter the rep count (a number)").await?;
                }
            }
        }

        State::WaitingForWeight { def_id, def_name, reps } => {
            if let Some(text) = msg.text() {
                if let Ok(weight_kg) = text.trim().parse::<f64>() {
                    if !(0.0..=1000.0).contains(&weight_kg) {
                        bot.send_message(msg.chat.id, "Weight must be between 0 and 1000 kg")
                            .await?;
                        return Ok(());
                    }

                    let (today_sets, today_volume) = {
                        let mut db = db.lock().await;
                        log_set(&mut db, &def_id, &def_name, reps, weight_kg)?;

                        let today = Utc::now().date_naive();
                        let today_workouts = db.workouts_on(today)?;
                        let sets: usize = today_workouts.iter().map(Workout::total_sets).sum();
                        let volume: f64 =
                            today_workouts.iter().map(Workout::total_volume_kg).sum();
                        (sets, volume)
                    };

                    let response = format!(
                        "Logged!\n\n\
                        {} - {} x {:.1} kg\n\n\
                        Today: {} sets, {:.0} kg volume\n\n\
                        /log - next lift",
                        def_name, reps, weight_kg, today_sets, today_volume
                    );

                    bot.send_message(msg.chat.id, response).await?;
                    dialogue.reset().await?;
                } else {
                    bot.send_message(msg.chat.id, "Enter the weight in kg (a number)").await?;
                }
            }
        }

        State::Start => {
            bot.send_message(msg.chat.id, "/log to record a lift").await?;
        }
    }

    Ok(())
}

/// Append a set to today's workout, creating one when the day is empty
fn log_set(
    db: &mut Database,
    def_id: &str,
    def_name: &str,
    reps: u32,
    weight_kg: f64,
) -> anyhow::Result<()> {
    let rest_secs = find(def_id).map(|d| d.default_rest_secs).unwrap_or(90);
    db.quick_log(
        Exercise {
            def: def_name.to_string(),
            rest_secs,
            sets: vec![ExerciseSet { reps, weight_kg }],
        },
        Utc::now(),
    )?;
    Ok(())
}
