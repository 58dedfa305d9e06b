use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mirror_client::ArtifactKind;

/// Mirror websites through a sitemirror service and track the jobs.
#[derive(Debug, Parser)]
#[command(name = "sitemirror", version)]
pub struct Cli {
    /// Config file (RON). Defaults to ./sitemirror.ron when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the service, overrides the config file.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Where fetched artifacts are written, overrides the config file.
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Submit URLs and follow the jobs until they finish.
    Submit {
        #[arg(required = true)]
        urls: Vec<String>,
        /// Save this artifact for every job that completes.
        #[arg(long)]
        fetch: Option<ArtifactKind>,
    },
    /// Follow jobs that were submitted elsewhere.
    Attach {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Save an artifact of a finished job.
    Fetch {
        id: String,
        #[arg(long, default_value = "full")]
        kind: ArtifactKind,
    },
    /// Mirror a URL in a single request and save the archive.
    Grab { url: String },
    /// List jobs known to the service.
    List,
    /// Print the site map of a finished job.
    Sitemap { id: String },
    /// Check that the service and its tooling are available.
    Health,
}
