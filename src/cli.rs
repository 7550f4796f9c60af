use crate::types::DEFAULT_PROFILE_ID;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

const DEFAULT_DB_PATH: &str = "workouts.db";
const DEFAULT_UPLOAD_DIR: &str = "static/uploads";

#[derive(Parser, Debug)]
#[command(
    name = "stridelog",
    about = "Record workouts and profile weight; list them with pace and calories burned"
)]
pub struct Cli {
    /// SQLite database file (created if missing)
    #[arg(long, global = true, default_value = DEFAULT_DB_PATH)]
    pub db: PathBuf,

    /// Directory that workout images are copied into
    #[arg(long, global = true, default_value = DEFAULT_UPLOAD_DIR)]
    pub upload_dir: PathBuf,

    /// Increase log verbosity (-v, -vv). Defaults to INFO.
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Decrease log verbosity (-q, -qq). Defaults to INFO.
    #[arg(short = 'q', long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Record a workout
    Add(AddArgs),

    /// Import workouts from a GPX file or a directory of GPX files
    ImportGpx {
        /// GPX file or directory (searched recursively)
        path: PathBuf,

        /// Route nickname to use instead of the track name
        #[arg(long)]
        route: Option<String>,

        /// Profile the workouts belong to
        #[arg(long)]
        profile: Option<i64>,
    },

    /// List workouts, newest first
    List {
        /// Show at most N workouts
        #[arg(short = 'n', long)]
        count: Option<usize>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List workouts whose route nickname contains QUERY (case-insensitive)
    Search {
        #[arg(default_value = "")]
        query: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Delete a workout (and its image)
    Delete { id: i64 },

    /// Show or change profile weights
    #[command(subcommand)]
    Profile(ProfileCmd),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Duration in minutes
    #[arg(long)]
    pub duration: f64,

    /// Distance in miles
    #[arg(long)]
    pub distance: f64,

    /// Name of the route
    #[arg(long = "route")]
    pub route_nickname: String,

    /// When the workout happened (ISO 8601, e.g. 2024-05-01T07:30:00Z)
    #[arg(long)]
    pub date: String,

    /// Average heart rate
    #[arg(long)]
    pub heart_rate: Option<i32>,

    /// Photo to attach
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Profile the workout belongs to (default: 1)
    #[arg(long)]
    pub profile: Option<i64>,
}

#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCmd {
    /// Show a profile, creating it with the default weight if missing
    Show {
        #[arg(long, default_value_t = DEFAULT_PROFILE_ID)]
        id: i64,
    },

    /// Set a profile's weight (lbs) and optionally its name
    Set {
        #[arg(long, default_value_t = DEFAULT_PROFILE_ID)]
        id: i64,

        /// Weight in lbs
        #[arg(long)]
        weight: f64,

        #[arg(long)]
        name: Option<String>,
    },

    /// List all stored profiles
    List,

    /// Delete a profile; its workouts fall back to the default weight
    Delete {
        #[arg(long)]
        id: i64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add() {
        let cli = Cli::try_parse_from([
            "stridelog",
            "add",
            "--duration",
            "30",
            "--distance",
            "3.1",
            "--route",
            "morning loop",
            "--date",
            "2024-05-01T07:30:00Z",
        ])
        .unwrap();

        assert_eq!(cli.db, PathBuf::from("workouts.db"));
        assert_eq!(cli.upload_dir, PathBuf::from("static/uploads"));
        let Cmd::Add(args) = cli.cmd else {
            panic!("expected add");
        };
        assert_eq!(args.duration, 30.0);
        assert_eq!(args.route_nickname, "morning loop");
        assert_eq!(args.profile, None);
    }

    #[test]
    fn test_parse_profile_set_defaults_id() {
        let cli = Cli::try_parse_from(["stridelog", "-v", "profile", "set", "--weight", "162.5"])
            .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.cmd {
            Cmd::Profile(ProfileCmd::Set { id, weight, name }) => {
                assert_eq!(id, 1);
                assert_eq!(weight, 162.5);
                assert_eq!(name, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_search_without_query() {
        let cli = Cli::try_parse_from(["stridelog", "search", "--json"]).unwrap();
        match cli.cmd {
            Cmd::Search { query, output } => {
                assert_eq!(query, "");
                assert!(output.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
