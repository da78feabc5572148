use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "insight", author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// API root, e.g. http://localhost:8000/api
    #[arg(long, global = true, env = "INSIGHT_BASE_URL")]
    pub base_url: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    pub output: OutputFormat,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an account
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        /// Prompted for when omitted
        #[arg(long, env = "INSIGHT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },

    /// Sign in and store the session credential
    Login {
        #[arg(long)]
        email: String,
        /// Prompted for when omitted
        #[arg(long, env = "INSIGHT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget the stored session credential
    Logout,

    /// Upload an interview video for analysis
    Upload {
        /// Video file
        file: PathBuf,
        /// Candidate name recorded with the analysis
        #[arg(long)]
        candidate: String,
    },

    /// List analysed interviews
    List,

    /// Show one analysis
    Show { id: i64 },

    /// Dashboard statistics over all analyses
    Summary,

    /// Show the profile
    Profile,

    /// Update profile fields
    ProfileUpdate {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },

    /// Search practice questions
    Questions { query: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable output
    Pretty,
    /// JSON output
    Json,
}
