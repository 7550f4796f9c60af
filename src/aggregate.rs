//! Read-side join of workouts with profiles.

use crate::error::{Error, MeasurementError};
use crate::metrics::{compute_calories_burned, compute_pace};
use crate::types::{EnrichedEntry, EnrichedWorkout, ItemFailure, UserProfile, Workout};
use std::collections::HashMap;

/// Result of enriching a batch. Entries keep the input order; a workout
/// whose metrics fail is reported in place instead of aborting the batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    pub entries: Vec<EnrichedEntry>,
}

impl Enrichment {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemFailure> {
        self.entries.iter().filter_map(|e| match e {
            EnrichedEntry::Failed(f) => Some(f),
            EnrichedEntry::Enriched(_) => None,
        })
    }

    pub fn enriched(&self) -> impl Iterator<Item = &EnrichedWorkout> {
        self.entries.iter().filter_map(|e| match e {
            EnrichedEntry::Enriched(w) => Some(w),
            EnrichedEntry::Failed(_) => None,
        })
    }

    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }

    /// `Err(PartialAggregationFailure)` summarizing the batch if any item failed.
    pub fn check(&self) -> Result<(), Error> {
        match self.failed_count() {
            0 => Ok(()),
            failed => Err(Error::PartialAggregationFailure {
                failed,
                total: self.len(),
            }),
        }
    }

    /// All enriched workouts, or the batch summary error if any item failed.
    pub fn into_complete(self) -> Result<Vec<EnrichedWorkout>, Error> {
        self.check()?;
        Ok(self
            .entries
            .into_iter()
            .filter_map(|e| match e {
                EnrichedEntry::Enriched(w) => Some(w),
                EnrichedEntry::Failed(_) => None,
            })
            .collect())
    }
}

/// Profile for `profile_id`, or `default` when none is stored.
pub fn resolve_profile<'a>(
    profiles: &'a HashMap<i64, UserProfile>,
    default: &'a UserProfile,
    profile_id: i64,
) -> &'a UserProfile {
    profiles.get(&profile_id).unwrap_or(default)
}

/// Pace, calories and presentation fields for one workout.
pub fn enrich_workout(
    workout: &Workout,
    profile: &UserProfile,
    default: &UserProfile,
) -> Result<EnrichedWorkout, MeasurementError> {
    let pace = compute_pace(workout.duration, workout.distance)?;
    let calories_burned = compute_calories_burned(workout.duration, workout.distance, profile.weight)?;

    let profile_name = profile.name.clone().or_else(|| default.name.clone());

    Ok(EnrichedWorkout {
        workout: workout.clone(),
        pace,
        calories_burned,
        image_url: workout.image_url(),
        profile_name,
    })
}

pub fn enrich_workouts(
    workouts: &[Workout],
    profiles: &HashMap<i64, UserProfile>,
    default: &UserProfile,
) -> Enrichment {
    let entries = workouts
        .iter()
        .map(|w| {
            let profile = resolve_profile(profiles, default, w.profile_id);
            match enrich_workout(w, profile, default) {
                Ok(e) => EnrichedEntry::Enriched(e),
                Err(error) => {
                    tracing::warn!(workout_id = w.id, err = %error, "could not compute workout metrics");
                    EnrichedEntry::Failed(ItemFailure {
                        workout: w.clone(),
                        error,
                    })
                }
            }
        })
        .collect();

    Enrichment { entries }
}

/// Case-insensitive substring match on the route nickname. An empty query keeps everything.
pub fn filter_by_substring(workouts: Vec<Workout>, query: &str) -> Vec<Workout> {
    if query.is_empty() {
        return workouts;
    }

    let needle = query.to_lowercase();
    workouts
        .into_iter()
        .filter(|w| w.route_nickname.to_lowercase().contains(&needle))
        .collect()
}
