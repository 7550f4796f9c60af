use crate::database::{DeletedWorkout, Store, validate_candidate};
use crate::dlog;
use crate::gpx::{parse_gpx_file, summarize_track};
use crate::types::{NewWorkout, Workout};
use crate::uploads::{remove_image, store_image};
use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Validates a candidate, stores its image (if any) and inserts it.
///
/// Nothing is written to the upload dir for a rejected candidate.
pub fn record_workout(
    store: &Store,
    mut candidate: NewWorkout,
    image: Option<&Path>,
    upload_dir: &Path,
) -> Result<Workout> {
    validate_candidate(&candidate)?;

    if let Some(src) = image {
        let filename = store_image(src, upload_dir, Local::now().naive_local())
            .with_context(|| format!("storing image: {}", src.display()))?;
        candidate.image_filename = Some(filename);
    }

    let workout = match store.insert_workout(&candidate) {
        Ok(w) => w,
        Err(e) => {
            if let Some(f) = candidate.image_filename.as_deref() {
                discard_image(upload_dir, f);
            }
            return Err(e).context("inserting workout");
        }
    };

    tracing::info!(
        workout_id = workout.id,
        route = %workout.route_nickname,
        duration = workout.duration,
        distance = workout.distance,
        "recorded workout"
    );
    Ok(workout)
}

/// Removes a workout and its stored image. Once the row is gone the
/// delete has succeeded; a leftover image is only logged.
pub fn delete_workout(store: &Store, id: i64, upload_dir: &Path) -> Result<DeletedWorkout> {
    let deleted = store.delete_workout(id)?;
    if let Some(f) = deleted.image_filename.as_deref() {
        discard_image(upload_dir, f);
    }
    tracing::info!(workout_id = id, "deleted workout");
    Ok(deleted)
}

/// Best-effort image removal for cleanup paths.
fn discard_image(upload_dir: &Path, filename: &str) {
    if let Err(e) = remove_image(upload_dir, filename) {
        tracing::warn!(
            upload_dir = %upload_dir.display(),
            filename,
            err = %e,
            "could not remove workout image"
        );
    }
}

#[derive(Debug, Clone, Default)]
pub struct GpxImportOptions {
    /// Overrides the track name for every imported file.
    pub route: Option<String>,
    pub profile_id: Option<i64>,
}

#[derive(Debug, Default)]
pub struct ImportReport {
    /// Newly created or refreshed workouts.
    pub imported: Vec<Workout>,
    /// How many of `imported` already existed from an earlier import.
    pub updated: usize,
    pub skipped: Vec<PathBuf>,
}

/// `.gpx` files under `path` (or `path` itself), sorted.
pub fn collect_gpx_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|s| s.to_str())
                .is_some_and(|s| s.eq_ignore_ascii_case("gpx"))
        })
        .collect();
    files.sort();
    files
}

/// Turns each GPX track into a workout. Unreadable files and tracks that
/// cannot form a valid workout (no timed points, zero distance) are
/// skipped, not fatal.
///
/// Re-importing a file updates the workout it produced before.
pub fn import_gpx(store: &Store, path: &Path, opts: &GpxImportOptions) -> Result<ImportReport> {
    if !path.exists() {
        anyhow::bail!("GPX path does not exist: {}", path.display());
    }

    let files = collect_gpx_files(path);
    tracing::info!(path = %path.display(), files = files.len(), "found GPX files");

    let mut report = ImportReport::default();
    for file in files {
        let parsed = match parse_gpx_file(&file) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(path = %file.display(), err = %e, "skipping unreadable GPX file");
                report.skipped.push(file);
                continue;
            }
        };

        let summary = match summarize_track(&parsed) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(path = %file.display(), err = %e, "skipping GPX file");
                report.skipped.push(file);
                continue;
            }
        };
        dlog!(
            "gpx_summary path={} points={} minutes={:.2} miles={:.3}",
            file.display(),
            summary.points,
            summary.duration_minutes,
            summary.distance_miles
        );

        let route_nickname = opts
            .route
            .clone()
            .or(summary.name)
            .or_else(|| file.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_default();

        let candidate = NewWorkout {
            duration: summary.duration_minutes,
            distance: summary.distance_miles,
            route_nickname,
            heart_rate: summary.avg_heart_rate,
            date: summary.start,
            image_filename: None,
            profile_id: opts.profile_id,
        };

        let source = fs::canonicalize(&file).unwrap_or_else(|_| file.clone());
        match store.upsert_imported_workout(&candidate, &source.to_string_lossy()) {
            Ok((w, created)) => {
                if !created {
                    dlog!("gpx_reimport path={} workout_id={}", file.display(), w.id);
                    report.updated += 1;
                }
                report.imported.push(w);
            }
            Err(e) if e.is_client_error() => {
                tracing::warn!(path = %file.display(), err = %e, "skipping GPX file");
                report.skipped.push(file);
            }
            Err(e) => return Err(e).context("inserting imported workout"),
        }
    }

    tracing::info!(
        imported = report.imported.len(),
        updated = report.updated,
        skipped = report.skipped.len(),
        "GPX import done"
    );
    Ok(report)
}
