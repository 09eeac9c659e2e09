//! TUI module - workout dashboard and live session screen with ratatui

use anyhow::Result;
use chrono::Utc;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Sparkline, Table, TableState},
};
use std::io::{Stdout, stdout};

use crate::db::Database;
use crate::hints;
use crate::model::{WeightUnit, Workout};
use crate::notify::{Notification, PendingNotifications};
use crate::session::{SessionHooks, WorkoutSession};
use crate::stats::Analytics;
use crate::surface::{RestCard, RestSurface};

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Screens the app can show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    History,
    Session,
    Stats,
}

/// In-app rest surface: holds the latest card for the session screen
#[derive(Default)]
pub struct CardSurface {
    card: Option<RestCard>,
}

impl CardSurface {
    pub fn card(&self) -> Option<&RestCard> {
        self.card.as_ref()
    }
}

impl RestSurface for CardSurface {
    fn show(&mut self, card: RestCard) {
        self.card = Some(card);
    }

    fn clear(&mut self) {
        self.card = None;
    }
}

struct ActiveSession {
    workout: Workout,
    session: WorkoutSession,
}

/// App state for TUI
pub struct App {
    db: Database,
    workouts: Vec<Workout>,
    unit: WeightUnit,
    view: View,
    table_state: TableState,
    active: Option<ActiveSession>,
    notifications: PendingNotifications,
    surface: CardSurface,
    banner: Option<Notification>,
    hint: Option<&'static str>,
    should_quit: bool,
}

impl App {
    pub fn new(db: Database) -> Result<Self> {
        let workouts = db.workouts()?;
        let unit = db.weight_unit()?;
        let mut table_state = TableState::default();
        if !workouts.is_empty() {
            table_state.select(Some(0));
        }
        Ok(Self {
            db,
            workouts,
            unit,
            view: View::History,
            table_state,
            active: None,
            notifications: PendingNotifications::new(),
            surface: CardSurface::default(),
            banner: None,
            hint: None,
            should_quit: false,
        })
    }

    /// Run the TUI application
    pub fn run(&mut self) -> Result<()> {
        let mut terminal = init_terminal()?;

        while !self.should_quit {
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events()?;
            self.tick()?;
        }

        restore_terminal()?;
        Ok(())
    }

    /// Drive the rest countdown and deliver due notifications
    fn tick(&mut self) -> Result<()> {
        let now = Utc::now();
        if let Some(active) = self.active.as_mut() {
            let mut hooks = SessionHooks {
                timers: &self.db,
                notifier: &mut self.notifications,
                surface: &mut self.surface,
            };
            active.session.tick(&active.workout, &mut hooks, now)?;
        }
        if let Some(notification) = self.notifications.due(now).pop() {
            self.banner = Some(notification);
        }
        Ok(())
    }

    fn handle_events(&mut self) -> Result<()> {
        if event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press {
                    match self.view {
                        View::Session => self.handle_session_key(key.code)?,
                        _ => self.handle_browse_key(key.code)?,
                    }
                }
        Ok(())
    }

    fn handle_browse_key(&mut self, code: KeyCode) -> Result<()> {
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab => {
                self.view = match self.view {
                    View::History => View::Stats,
                    _ => View::History,
                };
            }
            KeyCode::Char('r') => {
                self.workouts = self.db.workouts()?;
            }
            KeyCode::Char('u') => {
                self.unit = match self.unit {
                    WeightUnit::Kg => WeightUnit::Lb,
                    WeightUnit::Lb => WeightUnit::Kg,
                };
                self.db.set_weight_unit(self.unit)?;
            }
            KeyCode::Down => self.select_offset(1),
            KeyCode::Up => self.select_offset(-1),
            KeyCode::Enter => self.start_session()?,
            _ => {}
        }
        Ok(())
    }

    fn handle_session_key(&mut self, code: KeyCode) -> Result<()> {
        let now = Utc::now();
        let Some(active) = self.active.as_mut() else {
            self.view = View::History;
            return Ok(());
        };
        let mut hooks = SessionHooks {
            timers: &self.db,
            notifier: &mut self.notifications,
            surface: &mut self.surface,
        };

        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char(' ') | KeyCode::Enter => {
                let was_resting = active.session.is_resting();
                active.session.finish_set(&active.workout, &mut hooks, now)?;
                if !was_resting && active.session.is_resting() {
                    self.hint = Some(hints::random());
                }
            }
            KeyCode::Char('s') => {
                active.session.skip_rest(&active.workout, &mut hooks, now)?;
                self.hint = None;
            }
            KeyCode::Char('b') => {
                active.session.regress(&active.workout, &mut hooks, now)?;
                self.hint = None;
            }
            KeyCode::Char('x') => {
                active.session.stop(&mut hooks)?;
                self.active = None;
                self.banner = None;
                self.hint = None;
                self.view = View::History;
            }
            _ => {}
        }
        Ok(())
    }

    fn select_offset(&mut self, delta: i64) {
        if self.workouts.is_empty() {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0) as i64;
        let last = self.workouts.len() as i64 - 1;
        let next = (current + delta).clamp(0, last) as usize;
        self.table_state.select(Some(next));
    }

    fn start_session(&mut self) -> Result<()> {
        let Some(selected) = self.table_state.selected() else {
            return Ok(());
        };
        let Some(workout) = self.workouts.get(selected).cloned() else {
            return Ok(());
        };
        let mut session = WorkoutSession::new();
        session.start();
        self.active = Some(ActiveSession { workout, session });
        self.banner = None;
        self.hint = None;
        self.view = View::Session;
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(3),
            ])
            .split(area);

        let header = Paragraph::new(format!(
            "liftlog - Workout Tracker   [{}]",
            self.unit.label()
        ))
        .style(Style::default().fg(Color::Cyan).bold())
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, chunks[0]);

        match self.view {
            View::History => self.render_history(frame, chunks[1]),
            View::Session => self.render_session(frame, chunks[1]),
            View::Stats => self.render_stats(frame, chunks[1]),
        }

        let help = match self.view {
            View::History => "q: quit | tab: stats | enter: start session | u: kg/lb | r: refresh",
            View::Session => "space: set done | s: skip rest | b: back one set | x: end session | q: quit",
            View::Stats => "q: quit | tab: history | u: kg/lb",
        };
        let footer = Paragraph::new(help)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, chunks[2]);
    }

    fn render_history(&mut self, frame: &mut Frame, area: Rect) {
        let unit = self.unit;
        let rows: Vec<Row> = self
            .workouts
            .iter()
            .map(|w| {
                Row::new(vec![
                    Cell::from(w.date.format("%Y-%m-%d").to_string()),
                    Cell::from(w.name.clone()),
                    Cell::from(w.items.len().to_string()),
                    Cell::from(w.total_sets().to_string()),
                    Cell::from(unit.format(w.total_volume_kg())),
                ])
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(12),
                Constraint::Min(20),
                Constraint::Length(7),
                Constraint::Length(6),
                Constraint::Length(12),
            ],
        )
        .header(
            Row::new(vec!["Date", "Workout", "Items", "Sets", "Volume"])
                .style(Style::default().bold()),
        )
        .row_highlight_style(Style::default().bg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL).title("Workouts"));

        frame.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn render_session(&self, frame: &mut Frame, area: Rect) {
        let Some(active) = self.active.as_ref() else {
            frame.render_widget(
                Paragraph::new("No active session")
                    .block(Block::default().borders(Borders::ALL)),
                area,
            );
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(6),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(2),
            ])
            .split(area);

        let now = Utc::now();
        let session = &active.session;
        let workout = &active.workout;

        let mut lines: Vec<Line> = Vec::new();
        if session.is_complete() {
            lines.push(Line::from("Workout complete 💪").bold().fg(Color::Green));
        } else if let Some(slot) = session.current_slot(workout) {
            let exercise = slot.exercise(workout);
            let set = slot.set(workout);
            if let (Some(exercise), Some(set)) = (exercise, set) {
                lines.push(Line::from(exercise.def.clone()).bold());
                lines.push(Line::from(format!(
                    "Set {} of {}   {} x {}",
                    slot.set_index + 1,
                    exercise.sets.len(),
                    set.reps,
                    self.unit.format(set.weight_kg),
                )));
                if slot.in_superset {
                    lines.push(Line::from("superset").fg(Color::Magenta));
                }
            }
        } else {
            lines.push(Line::from("This workout has no sets").fg(Color::DarkGray));
        }
        if let Some(next) = session.next_slot(workout)
            && let (Some(exercise), Some(set)) = (next.exercise(workout), next.set(workout)) {
                lines.push(Line::from(format!(
                    "Next up: {} - set {}: {} x {}",
                    exercise.def,
                    next.set_index + 1,
                    set.reps,
                    self.unit.format(set.weight_kg),
                ))
                .fg(Color::DarkGray));
            }
        frame.render_widget(
            Paragraph::new(lines).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(workout.name.clone()),
            ),
            chunks[0],
        );

        // Rest gauge, drawn from the surface card's own copy of the interval
        if session.is_resting()
            && let Some(card) = self.surface.card() {
                let total = (card.ends_at - card.started_at).num_seconds().max(1) as f64;
                let remaining = (card.ends_at - now).num_seconds().max(0);
                let gauge = Gauge::default()
                    .block(Block::default().borders(Borders::ALL).title("Rest"))
                    .gauge_style(Style::default().fg(Color::Green))
                    .ratio((remaining as f64 / total).clamp(0.0, 1.0))
                    .label(format!("{}s", remaining));
                frame.render_widget(gauge, chunks[1]);
            }

        if let Some(banner) = &self.banner {
            let text = format!("🔔 {}: {}", banner.title, banner.body);
            frame.render_widget(
                Paragraph::new(text).style(Style::default().fg(Color::Yellow)),
                chunks[2],
            );
        }

        if session.is_resting()
            && let Some(hint) = self.hint {
                frame.render_widget(
                    Paragraph::new(hint).style(Style::default().fg(Color::DarkGray).italic()),
                    chunks[3],
                );
            }
    }

    fn render_stats(&self, frame: &mut Frame, area: Rect) {
        let analytics = Analytics::new(self.workouts.clone());
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(7), Constraint::Min(5)])
            .split(area);

        let mut lines = vec![
            Line::from(format!("Workouts: {}", analytics.workout_count())),
            Line::from(format!("Sets: {}", analytics.total_sets())),
            Line::from(format!(
                "Volume: {}",
                self.unit.format(analytics.total_volume_kg())
            )),
            Line::from(format!(
                "Frequency: {:.1} workouts/week",
                analytics.weekly_frequency()
            )),
        ];
        if let Some(def) = analytics.most_frequent_exercise() {
            if let Some((weight_kg, reps)) = analytics.personal_record(&def) {
                lines.push(Line::from(format!(
                    "PR {}: {} x {}",
                    def,
                    reps,
                    self.unit.format(weight_kg)
                )));
            }
            if let Some((reps, kg)) = analytics.suggest_next_load(&def) {
                lines.push(Line::from(format!(
                    "Suggested next {}: {} x {}",
                    def,
                    reps,
                    self.unit.format(kg)
                )));
            }
        }
        frame.render_widget(
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Stats")),
            chunks[0],
        );

        let series = analytics.volume_series();
        let sparkline = Sparkline::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Volume per workout"),
            )
            .style(Style::default().fg(Color::Cyan))
            .data(&series);
        frame.render_widget(sparkline, chunks[1]);
    }
}

fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}
