use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clipdeck_core::{JobId, SortKey};

use super::config::DEFAULT_CONFIG_FILE;

#[derive(Debug, Parser)]
#[command(name = "clipdeck")]
#[command(about = "Submit clip-scraping jobs, follow them and browse their clips")]
#[command(version)]
pub struct Cli {
    /// Configuration file (RON)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Job service base URL, overriding the configuration file
    #[arg(long, global = true)]
    pub api: Option<String>,

    /// Directory downloaded spreadsheets are saved to
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List known jobs
    Jobs {
        /// Keep polling and reprint whenever something changes
        #[arg(short, long)]
        watch: bool,

        /// With --watch, stop once every job has finished
        #[arg(long, requires = "watch")]
        until_done: bool,
    },

    /// Start a top-clips job
    Top {
        #[arg(long, default_value_t = 1)]
        days: u32,

        #[arg(long, default_value_t = 150)]
        limit: u32,

        /// Include clips in every language
        #[arg(long)]
        all_languages: bool,

        /// Only scrape this game
        #[arg(long)]
        game: Option<String>,

        /// Follow the job until it finishes
        #[arg(short, long)]
        wait: bool,
    },

    /// Start a channel-highlights job
    Channels {
        /// Channel names, comma separated
        #[arg(value_delimiter = ',', required = true)]
        names: Vec<String>,

        #[arg(long, default_value_t = 7)]
        days: u32,

        #[arg(long, default_value_t = 10)]
        per_channel: u32,

        #[arg(short, long)]
        wait: bool,
    },

    /// Show a server-side channel preset, optionally submitting it
    Preset {
        name: String,

        #[arg(long)]
        submit: bool,

        #[arg(short, long, requires = "submit")]
        wait: bool,
    },

    /// Delete a job and its results
    Delete { job_id: JobId },

    /// Browse the clips of a completed job
    Clips {
        job_id: JobId,

        /// Case-insensitive match on title, creator or broadcaster
        #[arg(short, long)]
        search: Option<String>,

        /// Exact game name
        #[arg(short, long)]
        game: Option<String>,

        /// views, date or duration
        #[arg(long, default_value_t = SortKey::Views)]
        sort: SortKey,
    },

    /// Try to load a clip's embedded player, falling back to its link
    Play { job_id: JobId, clip_id: String },

    /// Save a completed job's spreadsheet
    Download { job_id: JobId },

    /// Check that the job service is up and authenticated
    Health,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_channel_list_and_global_flags() {
        let cli = Cli::try_parse_from([
            "clipdeck",
            "channels",
            "Shroud,xqc",
            "--per-channel",
            "5",
            "--api",
            "http://example.com/api",
        ])
        .unwrap();

        assert_eq!(cli.api.as_deref(), Some("http://example.com/api"));
        match cli.command {
            Command::Channels {
                names,
                days,
                per_channel,
                wait,
            } => {
                assert_eq!(names, vec!["Shroud", "xqc"]);
                assert_eq!(days, 7);
                assert_eq!(per_channel, 5);
                assert!(!wait);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_sort_key() {
        let cli = Cli::try_parse_from(["clipdeck", "clips", "4", "--sort", "Duration"]).unwrap();
        match cli.command {
            Command::Clips { job_id, sort, .. } => {
                assert_eq!(job_id, 4);
                assert_eq!(sort, SortKey::Duration);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Cli::try_parse_from(["clipdeck", "clips", "4", "--sort", "likes"]).is_err());
    }

    #[test]
    fn until_done_needs_watch() {
        assert!(Cli::try_parse_from(["clipdeck", "jobs", "--until-done"]).is_err());
        assert!(Cli::try_parse_from(["clipdeck", "jobs", "-w", "--until-done"]).is_ok());
    }
}
