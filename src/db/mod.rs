//! Database module - SQLite storage for workouts, templates and settings

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, params};

use crate::model::{
    Exercise, ExerciseSet, Superset, Template, WeightUnit, Workout, WorkoutItem,
};
use crate::session::timer::TimerStore;

/// Database wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Throwaway database for tests
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS workouts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                date TEXT NOT NULL,
                notes TEXT
            );
            CREATE TABLE IF NOT EXISTS workout_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                workout_id INTEGER NOT NULL REFERENCES workouts(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                kind TEXT NOT NULL,
                rest_secs INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS item_exercises (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                item_id INTEGER NOT NULL REFERENCES workout_items(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                def TEXT NOT NULL,
                rest_secs INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS exercise_sets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                exercise_id INTEGER NOT NULL REFERENCES item_exercises(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                reps INTEGER NOT NULL,
                weight_kg REAL NOT NULL
            );
            CREATE TABLE IF NOT EXISTS templates (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                items TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS rest_timers (
                key TEXT PRIMARY KEY,
                end_time TEXT NOT NULL
            );",
        )?;

        // Migration: add notes column if missing
        let has_notes: bool = self
            .conn
            .prepare("SELECT notes FROM workouts LIMIT 1")
            .is_ok();
        if !has_notes {
            let _ = self
                .conn
                .execute("ALTER TABLE workouts ADD COLUMN notes TEXT", []);
        }

        Ok(())
    }

    // --- workouts ---

    /// Insert a workout with its full item graph; returns the new id
    pub fn add_workout(&mut self, workout: &Workout) -> Result<i64> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO workouts (name, date, notes) VALUES (?1, ?2, ?3)",
            params![workout.name, workout.date.to_rfc3339(), workout.notes],
        )?;
        let workout_id = tx.last_insert_rowid();
        insert_items(&tx, workout_id, &workout.items)?;
        tx.commit()?;
        Ok(workout_id)
    }

    /// Replace a workout's items, keeping the workout row
    pub fn update_workout_items(&mut self, workout_id: i64, items: &[WorkoutItem]) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM workout_items WHERE workout_id = ?1",
            params![workout_id],
        )?;
        insert_items(&tx, workout_id, items)?;
        tx.commit()?;
        Ok(())
    }

    pub fn workout(&self, id: i64) -> Result<Option<Workout>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, date, notes FROM workouts WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], workout_row)?;
        match rows.next() {
            Some(row) => {
                let mut workout = row?;
                workout.items = self.load_items(id)?;
                Ok(Some(workout))
            }
            None => Ok(None),
        }
    }

    /// All workouts with their item graphs, newest first
    pub fn workouts(&self) -> Result<Vec<Workout>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, date, notes FROM workouts ORDER BY date DESC")?;
        let headers = stmt
            .query_map([], workout_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut workouts = Vec::with_capacity(headers.len());
        for mut workout in headers {
            let id = workout.id.unwrap_or_default();
            workout.items = self.load_items(id)?;
            workouts.push(workout);
        }
        Ok(workouts)
    }

    pub fn workouts_on(&self, date: NaiveDate) -> Result<Vec<Workout>> {
        Ok(self
            .workouts()?
            .into_iter()
            .filter(|w| w.date.date_naive() == date)
            .collect())
    }

    pub fn delete_workout(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM workouts WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    /// Append a single-exercise item to the day's workout, creating the
    /// workout when the day is empty
    pub fn quick_log(&mut self, exercise: Exercise, now: DateTime<Utc>) -> Result<i64> {
        let item = WorkoutItem::Single(exercise);
        match self.workouts_on(now.date_naive())?.into_iter().next() {
            Some(workout) => {
                let id = workout.id.unwrap_or_default();
                let mut items = workout.items;
                items.push(item);
                self.update_workout_items(id, &items)?;
                Ok(id)
            }
            None => self.add_workout(&Workout {
                id: None,
                name: "Quick log".to_string(),
                date: now,
                notes: None,
                items: vec![item],
            }),
        }
    }

    fn load_items(&self, workout_id: i64) -> Result<Vec<WorkoutItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, rest_secs FROM workout_items
             WHERE workout_id = ?1 ORDER BY position",
        )?;
        let rows = stmt
            .query_map(params![workout_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, u32>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut items = Vec::with_capacity(rows.len());
        for (item_id, kind, rest_secs) in rows {
            let mut exercises = self.load_exercises(item_id)?;
            let item = match kind.as_str() {
                "superset" => WorkoutItem::Superset(Superset { rest_secs, exercises }),
                _ => match exercises.pop() {
                    Some(exercise) => WorkoutItem::Single(exercise),
                    None => continue,
                },
            };
            items.push(item);
        }
        Ok(items)
    }

    fn load_exercises(&self, item_id: i64) -> Result<Vec<Exercise>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, def, rest_secs FROM item_exercises
             WHERE item_id = ?1 ORDER BY position",
        )?;
        let rows = stmt
            .query_map(params![item_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, u32>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut exercises = Vec::with_capacity(rows.len());
        for (exercise_id, def, rest_secs) in rows {
            let mut stmt = self.conn.prepare(
                "SELECT reps, weight_kg FROM exercise_sets
                 WHERE exercise_id = ?1 ORDER BY position",
            )?;
            let sets = stmt
                .query_map(params![exercise_id], |row| {
                    Ok(ExerciseSet { reps: row.get(0)?, weight_kg: row.get(1)? })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            exercises.push(Exercise { def, rest_secs, sets });
        }
        Ok(exercises)
    }

    // --- templates ---

    /// Insert or replace a template by name
    pub fn add_template(&self, template: &Template) -> Result<i64> {
        let items = serde_json::to_string(&template.items)?;
        self.conn.execute(
            "INSERT INTO templates (name, items) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET items = excluded.items",
            params![template.name, items],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn templates(&self) -> Result<Vec<Template>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, items FROM templates ORDER BY name")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut templates = Vec::with_capacity(rows.len());
        for (id, name, items) in rows {
            templates.push(Template {
                id: Some(id),
                name,
                items: serde_json::from_str(&items)?,
            });
        }
        Ok(templates)
    }

    pub fn template_by_name(&self, name: &str) -> Result<Option<Template>> {
        Ok(self
            .templates()?
            .into_iter()
            .find(|t| t.name.eq_ignore_ascii_case(name)))
    }

    pub fn delete_template(&self, name: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM templates WHERE name = ?1", params![name])?;
        Ok(deleted > 0)
    }

    // --- settings ---

    pub fn setting(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM settings WHERE key = ?1")?;
        let mut rows = stmt.query_map(params![key], |row| row.get::<_, String>(0))?;
        Ok(rows.next().transpose()?)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn weight_unit(&self) -> Result<WeightUnit> {
        Ok(self
            .setting("weight_unit")?
            .and_then(|v| WeightUnit::from_label(&v))
            .unwrap_or(WeightUnit::Kg))
    }

    pub fn set_weight_unit(&self, unit: WeightUnit) -> Result<()> {
        self.set_setting("weight_unit", unit.label())
    }

    pub fn allow_multiple_per_day(&self) -> Result<bool> {
        Ok(self
            .setting("allow_multiple_per_day")?
            .map(|v| v == "true")
            .unwrap_or(false))
    }

    pub fn set_allow_multiple_per_day(&self, allow: bool) -> Result<()> {
        self.set_setting("allow_multiple_per_day", if allow { "true" } else { "false" })
    }

    /// Whether a workout may be logged on `date` under the current settings
    pub fn can_log_on(&self, date: NaiveDate) -> Result<bool> {
        Ok(self.allow_multiple_per_day()? || self.workouts_on(date)?.is_empty())
    }
}

impl TimerStore for Database {
    fn timer_end(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT end_time FROM rest_timers WHERE key = ?1")?;
        let mut rows = stmt.query_map(params![key], |row| row.get::<_, String>(0))?;
        match rows.next().transpose()? {
            Some(raw) => Ok(Some(DateTime::parse_from_rfc3339(&raw)?.with_timezone(&Utc))),
            None => Ok(None),
        }
    }

    fn set_timer_end(&self, key: &str, end: DateTime<Utc>) -> Result<()> {
        self.conn.execute(
            "INSERT INTO rest_timers (key, end_time) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET end_time = excluded.end_time",
            params![key, end.to_rfc3339()],
        )?;
        Ok(())
    }

    fn clear_timer_end(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM rest_timers WHERE key = ?1", params![key])?;
        Ok(())
    }
}

fn workout_row(row: &rusqlite::Row) -> rusqlite::Result<Workout> {
    let date_str: String = row.get(2)?;
    Ok(Workout {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        date: DateTime::parse_from_rfc3339(&date_str)
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        notes: row.get(3)?,
        items: Vec::new(),
    })
}

fn insert_items(tx: &rusqlite::Transaction, workout_id: i64, items: &[WorkoutItem]) -> Result<()> {
    for (position, item) in items.iter().enumerate() {
        let (kind, rest_secs, exercises): (&str, u32, Vec<&Exercise>) = match item {
            WorkoutItem::Single(e) => ("single", 0, vec![e]),
            WorkoutItem::Superset(s) => ("superset", s.rest_secs, s.exercises.iter().collect()),
        };
        tx.execute(
            "INSERT INTO workout_items (workout_id, position, kind, rest_secs)
             VALUES (?1, ?2, ?3, ?4)",
            params![workout_id, position as i64, kind, rest_secs],
        )?;
        let item_id = tx.last_insert_rowid();

        for (exercise_position, exercise) in exercises.iter().enumerate() {
            tx.execute(
                "INSERT INTO item_exercises (item_id, position, def, rest_secs)
                 VALUES (?1, ?2, ?3, ?4)",
                params![item_id, exercise_position as i64, exercise.def, exercise.rest_secs],
            )?;
            let exercise_id = tx.last_insert_rowid();

            for (set_position, set) in exercise.sets.iter().enumerate() {
                tx.execute(
                    "INSERT INTO exercise_sets (exercise_id, position, reps, weight_kg)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![exercise_id, set_position as i64, set.reps, set.weight_kg],
                )?;
            }
        }
    }
    Ok(())
}
