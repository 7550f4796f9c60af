#![deny(
    warnings,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo
)]
#![allow(clippy::multiple_crate_versions)]

use anyhow::{Context, Result};
use clap::Parser;
use stridelog::aggregate::{enrich_workouts, filter_by_substring};
use stridelog::cli::{self, Cmd, OutputArgs, ProfileCmd};
use stridelog::database::Store;
use stridelog::ingest::{self, GpxImportOptions};
use stridelog::types::{EnrichedEntry, NewWorkout, UserProfile, Workout};
use stridelog::utils;

#[macro_use]
extern crate stridelog;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    utils::init_logging(cli.verbose, cli.quiet);

    let store = Store::open(&cli.db)
        .with_context(|| format!("Opening workout database: {}", cli.db.display()))?;
    dlog!(
        "db={} upload_dir={}",
        cli.db.display(),
        cli.upload_dir.display()
    );

    match cli.cmd {
        Cmd::Add(args) => {
            let candidate = NewWorkout {
                duration: args.duration,
                distance: args.distance,
                route_nickname: args.route_nickname,
                heart_rate: args.heart_rate,
                date: utils::parse_date(&args.date)?,
                image_filename: None,
                profile_id: args.profile,
            };
            let workout =
                ingest::record_workout(&store, candidate, args.image.as_deref(), &cli.upload_dir)?;
            println!("{}", serde_json::to_string_pretty(&workout)?);
        }
        Cmd::ImportGpx {
            path,
            route,
            profile,
        } => {
            let opts = GpxImportOptions {
                route,
                profile_id: profile,
            };
            let report = ingest::import_gpx(&store, &path, &opts)?;
            for w in &report.imported {
                println!("imported\t{}\t{}", w.id, w.route_nickname);
            }
            for p in &report.skipped {
                println!("skipped\t{}", p.display());
            }
            if report.updated > 0 {
                println!("updated\t{} previously imported", report.updated);
            }
        }
        Cmd::List { count, output } => {
            let mut workouts = store.list_workouts()?;
            if let Some(n) = count {
                workouts.truncate(n);
            }
            print_listing(&store, &workouts, &output)?;
        }
        Cmd::Search { query, output } => {
            let workouts = filter_by_substring(store.list_workouts()?, &query);
            dlog!("search query={query:?} matches={}", workouts.len());
            print_listing(&store, &workouts, &output)?;
        }
        Cmd::Delete { id } => {
            let w = ingest::delete_workout(&store, id, &cli.upload_dir)?;
            println!("deleted\t{}\t{}", w.id, w.route_nickname);
        }
        Cmd::Profile(cmd) => run_profile(&store, cmd)?,
    }

    Ok(())
}

fn run_profile(store: &Store, cmd: ProfileCmd) -> Result<()> {
    match cmd {
        ProfileCmd::Show { id } => {
            let p = store.get_or_create_profile(id)?;
            println!("{}", serde_json::to_string_pretty(&p)?);
        }
        ProfileCmd::Set { id, weight, name } => {
            let p = store.upsert_profile(id, weight, name.as_deref())?;
            tracing::info!(profile_id = p.id, weight = p.weight, "updated profile");
            println!("{}", serde_json::to_string_pretty(&p)?);
        }
        ProfileCmd::List => {
            let mut profiles: Vec<UserProfile> = store.list_profiles()?.into_values().collect();
            profiles.sort_by_key(|p| p.id);
            for p in profiles {
                println!("{}\t{}\t{:.1}", p.id, p.display_name(), p.weight);
            }
        }
        ProfileCmd::Delete { id } => {
            let p = store.delete_profile(id)?;
            println!("deleted\tprofile {}", p.id);
        }
    }
    Ok(())
}

fn print_listing(store: &Store, workouts: &[Workout], output: &OutputArgs) -> Result<()> {
    let profiles = store.list_profiles()?;
    let enrichment = enrich_workouts(workouts, &profiles, &UserProfile::fallback());

    if let Err(e) = enrichment.check() {
        tracing::warn!(err = %e, "some workouts are listed without metrics");
    }

    if output.json {
        println!("{}", serde_json::to_string_pretty(&enrichment.entries)?);
        return Ok(());
    }

    for entry in &enrichment.entries {
        println!("{}", format_row(entry));
    }
    Ok(())
}

fn format_row(entry: &EnrichedEntry) -> String {
    let w = entry.workout();
    let head = format!(
        "{}\t{}\t{}\t{}\t{:.2} mi",
        w.id,
        w.date.format("%Y-%m-%d %H:%M"),
        w.route_nickname,
        utils::format_minutes(w.duration),
        w.distance
    );

    match entry {
        EnrichedEntry::Enriched(e) => format!(
            "{head}\t{:.2} min/mi\t{:.2} kcal\t{}\t{}",
            e.pace,
            e.calories_burned,
            e.profile_name.as_deref().unwrap_or("-"),
            e.image_url.as_deref().unwrap_or("-"),
        ),
        EnrichedEntry::Failed(f) => format!("{head}\terror: {}", f.error),
    }
}
