use crate::dlog;
use crate::error::{Error, Quantity, Result};
use crate::metrics::{DEFAULT_WEIGHT_LBS, ensure_positive};
use crate::types::{NewWorkout, UserProfile, Workout};
use chrono::{TimeZone, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::HashMap;
use std::path::Path;

const WORKOUT_COLUMNS: &str = r"
    id,
    duration,
    distance,
    route_nickname,
    heart_rate,
    date_ms,
    image_filename,
    profile_id
";

/// What remains of a workout after deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedWorkout {
    pub id: i64,
    pub route_nickname: String,
    pub image_filename: Option<String>,
}

/// SQLite-backed storage for workouts and profiles.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        tracing::debug!(path = %path.display(), "opened workout database");
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let store = Self { conn };
        store.ensure_schema()?;
        Ok(store)
    }

    fn ensure_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS workouts (
              id              INTEGER PRIMARY KEY AUTOINCREMENT,
              duration        REAL NOT NULL,
              distance        REAL NOT NULL,
              route_nickname  TEXT NOT NULL,
              heart_rate      INTEGER,
              date_ms         INTEGER NOT NULL,
              image_filename  TEXT,
              profile_id      INTEGER NOT NULL DEFAULT 1,
              source_path     TEXT
            );

            CREATE INDEX IF NOT EXISTS workouts_date_idx ON workouts (date_ms DESC);

            CREATE TABLE IF NOT EXISTS user_profiles (
              id      INTEGER PRIMARY KEY,
              name    TEXT,
              weight  REAL NOT NULL
            );
            ",
        )?;

        // databases created before GPX imports were keyed lack the column
        let has_source: bool = self.conn.query_row(
            "SELECT COUNT(*) > 0 FROM pragma_table_info('workouts') WHERE name = 'source_path'",
            [],
            |row| row.get(0),
        )?;
        if !has_source {
            self.conn
                .execute("ALTER TABLE workouts ADD COLUMN source_path TEXT", [])?;
            tracing::info!("added source_path column to workouts");
        }
        self.conn.execute(
            "CREATE UNIQUE INDEX IF NOT EXISTS workouts_source_idx ON workouts (source_path, date_ms)",
            [],
        )?;
        Ok(())
    }

    /// Validates and stores a workout candidate, returning it with its new id.
    pub fn insert_workout(&self, candidate: &NewWorkout) -> Result<Workout> {
        validate_candidate(candidate)?;

        self.conn.execute(
            r"
            INSERT INTO workouts (
              duration, distance, route_nickname, heart_rate,
              date_ms, image_filename, profile_id
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
            params![
                candidate.duration,
                candidate.distance,
                candidate.route_nickname.trim(),
                candidate.heart_rate,
                candidate.date.timestamp_millis(),
                candidate.image_filename,
                candidate.profile_id_or_default(),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        let mut stored = candidate.clone();
        stored.route_nickname = candidate.route_nickname.trim().to_string();
        Ok(stored.into_workout(id))
    }

    /// Inserts or refreshes a workout imported from `source_path`.
    ///
    /// `(source_path, date)` identifies an imported track, so importing the
    /// same file again updates the existing row. Returns the workout and
    /// whether it was newly created.
    pub fn upsert_imported_workout(
        &self,
        candidate: &NewWorkout,
        source_path: &str,
    ) -> Result<(Workout, bool)> {
        validate_candidate(candidate)?;

        let date_ms = candidate.date.timestamp_millis();
        let existed = self
            .conn
            .query_row(
                "SELECT 1 FROM workouts WHERE source_path = ?1 AND date_ms = ?2",
                params![source_path, date_ms],
                |_| Ok(()),
            )
            .optional()?
            .is_some();

        let id: i64 = self.conn.query_row(
            r"
            INSERT INTO workouts (
              duration, distance, route_nickname, heart_rate,
              date_ms, image_filename, profile_id, source_path
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT (source_path, date_ms) DO UPDATE SET
              duration = excluded.duration,
              distance = excluded.distance,
              route_nickname = excluded.route_nickname,
              heart_rate = excluded.heart_rate,
              profile_id = excluded.profile_id
            RETURNING id
            ",
            params![
                candidate.duration,
                candidate.distance,
                candidate.route_nickname.trim(),
                candidate.heart_rate,
                date_ms,
                candidate.image_filename,
                candidate.profile_id_or_default(),
                source_path,
            ],
            |row| row.get(0),
        )?;

        Ok((self.get_workout(id)?, !existed))
    }

    /// All workouts, newest first.
    pub fn list_workouts(&self) -> Result<Vec<Workout>> {
        let sql = format!("SELECT {WORKOUT_COLUMNS} FROM workouts ORDER BY date_ms DESC, id DESC");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            if let Some(w) = workout_from_row(row)? {
                out.push(w);
            }
        }
        Ok(out)
    }

    pub fn get_workout(&self, id: i64) -> Result<Workout> {
        let sql = format!("SELECT {WORKOUT_COLUMNS} FROM workouts WHERE id = ?1");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([id])?;

        match rows.next()? {
            Some(row) => workout_from_row(row)?.ok_or(Error::NotFound {
                entity: "workout",
                id,
            }),
            None => Err(Error::NotFound {
                entity: "workout",
                id,
            }),
        }
    }

    /// Deletes a workout by id. Only the columns needed for cleanup are
    /// read, so rows with an undecodable date can still be removed.
    pub fn delete_workout(&self, id: i64) -> Result<DeletedWorkout> {
        let deleted = self
            .conn
            .query_row(
                "SELECT id, route_nickname, image_filename FROM workouts WHERE id = ?1",
                [id],
                |row| {
                    Ok(DeletedWorkout {
                        id: row.get(0)?,
                        route_nickname: row.get(1)?,
                        image_filename: row.get(2)?,
                    })
                },
            )
            .optional()?
            .ok_or(Error::NotFound {
                entity: "workout",
                id,
            })?;

        self.conn.execute("DELETE FROM workouts WHERE id = ?1", [id])?;
        Ok(deleted)
    }

    pub fn list_profiles(&self) -> Result<HashMap<i64, UserProfile>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, weight FROM user_profiles ORDER BY id")?;
        let profiles = stmt
            .query_map([], profile_from_row)?
            .map(|r| r.map(|p| (p.id, p)))
            .collect::<rusqlite::Result<HashMap<_, _>>>()?;
        Ok(profiles)
    }

    pub fn get_profile(&self, id: i64) -> Result<Option<UserProfile>> {
        let profile = self
            .conn
            .query_row(
                "SELECT id, name, weight FROM user_profiles WHERE id = ?1",
                [id],
                profile_from_row,
            )
            .optional()?;
        Ok(profile)
    }

    /// Returns the profile, creating it with the default weight on first access.
    pub fn get_or_create_profile(&self, id: i64) -> Result<UserProfile> {
        if let Some(p) = self.get_profile(id)? {
            return Ok(p);
        }

        tracing::info!(profile_id = id, weight = DEFAULT_WEIGHT_LBS, "creating default profile");
        self.conn.execute(
            "INSERT INTO user_profiles (id, name, weight) VALUES (?1, NULL, ?2)",
            params![id, DEFAULT_WEIGHT_LBS],
        )?;
        Ok(UserProfile {
            id,
            name: None,
            weight: DEFAULT_WEIGHT_LBS,
        })
    }

    /// Creates or updates a profile. A `None` name keeps whatever is stored.
    pub fn upsert_profile(&self, id: i64, weight: f64, name: Option<&str>) -> Result<UserProfile> {
        let weight = ensure_positive(Quantity::Weight, weight)?;

        self.conn.execute(
            r"
            INSERT INTO user_profiles (id, name, weight)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (id) DO UPDATE SET
              name = COALESCE(excluded.name, user_profiles.name),
              weight = excluded.weight
            ",
            params![id, name, weight],
        )?;

        self.get_profile(id)?.ok_or(Error::NotFound {
            entity: "profile",
            id,
        })
    }

    pub fn delete_profile(&self, id: i64) -> Result<UserProfile> {
        let profile = self.get_profile(id)?.ok_or(Error::NotFound {
            entity: "profile",
            id,
        })?;
        self.conn
            .execute("DELETE FROM user_profiles WHERE id = ?1", [id])?;
        Ok(profile)
    }
}

/// Creation-time invariants: positive finite duration and distance, non-empty route.
pub fn validate_candidate(candidate: &NewWorkout) -> Result<()> {
    ensure_positive(Quantity::Duration, candidate.duration)?;
    ensure_positive(Quantity::Distance, candidate.distance)?;
    if candidate.route_nickname.trim().is_empty() {
        return Err(Error::MissingField("route_nickname"));
    }
    Ok(())
}

fn workout_from_row(row: &Row<'_>) -> rusqlite::Result<Option<Workout>> {
    let id: i64 = row.get(0)?;
    let date_ms: i64 = row.get(5)?;

    let Some(date) = Utc.timestamp_millis_opt(date_ms).single() else {
        dlog!("db_bad_date_ms date_ms={date_ms} workout_id={id}");
        return Ok(None);
    };

    Ok(Some(Workout {
        id,
        duration: row.get(1)?,
        distance: row.get(2)?,
        route_nickname: row.get(3)?,
        heart_rate: row.get(4)?,
        date,
        image_filename: row.get(6)?,
        profile_id: row.get(7)?,
    }))
}

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<UserProfile> {
    Ok(UserProfile {
        id: row.get(0)?,
        name: row.get(1)?,
        weight: row.get(2)?,
    })
}
