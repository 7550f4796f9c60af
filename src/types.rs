use crate::error::MeasurementError;
use crate::metrics::DEFAULT_WEIGHT_LBS;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile assumed for workouts recorded without one.
pub const DEFAULT_PROFILE_ID: i64 = 1;
/// Id carried by the synthesized fallback profile.
pub const UNKNOWN_PROFILE_ID: i64 = 0;
pub const UNKNOWN_PROFILE_NAME: &str = "Unknown";
pub const UPLOAD_URL_PREFIX: &str = "/static/uploads/";

/// A stored workout session. Duration is in minutes, distance in miles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: i64,
    pub duration: f64,
    pub distance: f64,
    pub route_nickname: String,
    pub heart_rate: Option<i32>,
    pub date: DateTime<Utc>,
    pub image_filename: Option<String>,
    pub profile_id: i64,
}

impl Workout {
    pub fn image_url(&self) -> Option<String> {
        self.image_filename
            .as_deref()
            .filter(|f| !f.is_empty())
            .map(|f| format!("{UPLOAD_URL_PREFIX}{f}"))
    }
}

/// Workout candidate handed in by the creation path, before an id exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWorkout {
    pub duration: f64,
    pub distance: f64,
    pub route_nickname: String,
    pub heart_rate: Option<i32>,
    pub date: DateTime<Utc>,
    pub image_filename: Option<String>,
    pub profile_id: Option<i64>,
}

impl NewWorkout {
    pub fn profile_id_or_default(&self) -> i64 {
        self.profile_id.unwrap_or(DEFAULT_PROFILE_ID)
    }

    pub fn into_workout(self, id: i64) -> Workout {
        let profile_id = self.profile_id_or_default();
        Workout {
            id,
            duration: self.duration,
            distance: self.distance,
            route_nickname: self.route_nickname,
            heart_rate: self.heart_rate,
            date: self.date,
            image_filename: self.image_filename,
            profile_id,
        }
    }
}

/// Body weight (lbs) used for calorie estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub name: Option<String>,
    pub weight: f64,
}

impl UserProfile {
    /// Substituted whenever a workout's profile cannot be found.
    pub fn fallback() -> Self {
        Self {
            id: UNKNOWN_PROFILE_ID,
            name: Some(UNKNOWN_PROFILE_NAME.to_string()),
            weight: DEFAULT_WEIGHT_LBS,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNKNOWN_PROFILE_NAME)
    }
}

impl Default for UserProfile {
    fn default() -> Self {
        Self::fallback()
    }
}

/// Read-side projection of a workout; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedWorkout {
    #[serde(flatten)]
    pub workout: Workout,
    pub pace: f64,
    pub calories_burned: f64,
    pub image_url: Option<String>,
    pub profile_name: Option<String>,
}

/// Per-item marker for a workout whose metrics could not be computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemFailure {
    #[serde(flatten)]
    pub workout: Workout,
    pub error: MeasurementError,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EnrichedEntry {
    Enriched(EnrichedWorkout),
    Failed(ItemFailure),
}

impl EnrichedEntry {
    pub const fn workout(&self) -> &Workout {
        match self {
            Self::Enriched(e) => &e.workout,
            Self::Failed(f) => &f.workout,
        }
    }

    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

#[derive(Debug, Clone)]
pub struct TrackPoint {
    pub t: DateTime<Utc>,
    pub lat: f64,
    pub lon: f64,
    pub hr: Option<i32>,
}

/// What a GPX file contributes to a workout candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSummary {
    pub name: Option<String>,
    pub start: DateTime<Utc>,
    pub duration_minutes: f64,
    pub distance_miles: f64,
    pub avg_heart_rate: Option<i32>,
    pub points: usize,
}
