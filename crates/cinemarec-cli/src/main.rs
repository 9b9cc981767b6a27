use clap::{ArgAction, Parser, Subcommand};
use commands::{auth, clear, config, preferences, quizzes, recommendations, reviews, stats, watch};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "cinemarec")]
#[command(about = "CinemaRec - movie recommendations, statistics, reviews and quizzes")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Write logs to the daily-rotated log file instead of stderr
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    log_file: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login {
        /// Account email (prompted when omitted)
        #[arg(long)]
        email: Option<String>,
    },
    /// Create an account and sign in
    Register {
        #[arg(long)]
        email: Option<String>,
    },
    /// Sign in with a Google ID token credential
    #[command(long_about = "Sign in with the ID token (JWT credential) returned by Google Sign-In. The email and name are read from the credential and exchanged for a CinemaRec session.")]
    GoogleLogin {
        /// The Google credential (prompted when omitted)
        credential: Option<String>,
    },
    /// Sign out and forget the cached session
    Logout,
    /// Show the signed-in user and session expiry
    Whoami,
    /// Resolve a route such as /dashboard?tab=reviews through the session guard
    Open { route: String },
    /// View or edit your taste profile
    Preferences {
        #[command(subcommand)]
        cmd: PreferencesCommands,
    },
    /// Personalized recommendations
    #[command(alias = "recs")]
    Recommendations {
        #[command(subcommand)]
        cmd: RecommendationsCommands,
    },
    /// Viewing statistics and the movie browser
    Stats {
        #[command(subcommand)]
        cmd: StatsCommands,
    },
    /// Community reviews
    Reviews {
        #[command(subcommand)]
        cmd: ReviewsCommands,
    },
    /// Movie quizzes
    Quizzes {
        #[command(subcommand)]
        cmd: QuizzesCommands,
    },
    /// Trailers and details for one movie
    Watch {
        movie_id: Option<u64>,

        /// User whose player is opened (defaults to the signed-in user)
        #[arg(long)]
        email: Option<String>,
    },
    /// Manage service endpoints and settings
    #[command(long_about = "Manage the CinemaRec configuration file. Running without a subcommand shows the current configuration.")]
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },
    /// Clear the cached session or all stored credentials
    Clear {
        /// Remove every stored credential
        #[arg(long, action = ArgAction::SetTrue, conflicts_with = "session")]
        all: bool,

        /// Remove the cached session and pending route
        #[arg(long, action = ArgAction::SetTrue)]
        session: bool,
    },
}

#[derive(Subcommand)]
pub(crate) enum PreferencesCommands {
    /// Show the saved profile
    Show,
    /// Pick genres, actors, directors, movies and a minimum rating
    Edit,
}

#[derive(Subcommand)]
pub(crate) enum RecommendationsCommands {
    /// List recommendations grouped by what produced them
    List,
    /// Mark a recommended movie watched
    Watched { movie_id: u64 },
    /// Regenerate recommendations and wait for the new list
    Refresh,
    /// Show extended details for a recommended movie
    Details { movie_id: u64 },
}

#[derive(Subcommand)]
pub(crate) enum StatsCommands {
    /// Totals and distributions
    Summary,
    /// Movies you have watched
    Watched,
    /// Search the catalog
    Browse {
        /// Search keywords (popular titles when omitted)
        query: Option<String>,

        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Show one movie's details
    Movie { movie_id: u64 },
    /// Mark a movie watched
    Mark { movie_id: u64 },
    /// Remove a movie from your watched list
    Unmark { movie_id: u64 },
}

#[derive(Subcommand)]
pub(crate) enum ReviewsCommands {
    /// List reviews
    List {
        /// Only titles containing this text
        #[arg(long)]
        title: Option<String>,

        /// Only your own reviews
        #[arg(long, action = ArgAction::SetTrue)]
        mine: bool,
    },
    /// Open one review with its images
    Show { review_id: u64 },
    /// Write a review
    Create {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        rating: Option<u8>,
        #[arg(long)]
        text: Option<String>,

        /// Image to attach (repeatable)
        #[arg(long = "image", value_name = "PATH")]
        images: Vec<PathBuf>,
    },
    /// Edit one of your reviews
    Edit {
        review_id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        rating: Option<u8>,
        #[arg(long)]
        text: Option<String>,

        /// Image to add (repeatable)
        #[arg(long = "image", value_name = "PATH")]
        images: Vec<PathBuf>,

        /// Stored image URL to remove (repeatable)
        #[arg(long = "delete-image", value_name = "URL")]
        delete_images: Vec<String>,
    },
    /// Delete one of your reviews
    Delete {
        review_id: u64,

        /// Skip the confirmation prompt
        #[arg(long, short, action = ArgAction::SetTrue)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub(crate) enum QuizzesCommands {
    /// List quizzes
    List,
    /// Play a quiz
    Play { quiz_id: u64 },
    /// Author a new quiz
    Create,
    /// Edit a quiz you created
    Edit { quiz_id: u64 },
    /// Your most recent results
    Results,
}

#[derive(Subcommand)]
pub(crate) enum ConfigCommands {
    /// Show current configuration (masks the TMDB token)
    Show {
        /// Show the TMDB token unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },
    /// Write a configuration file with default settings
    Init {
        /// Overwrite an existing file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
    /// Point a service at a different base URL
    #[command(long_about = "Set the base URL of one backend service: auth, users, recommendations, reviews, quizzes, statistics or tmdb.")]
    SetEndpoint { service: String, url: String },
    /// Choose where the preferences catalog comes from (proxy or tmdb)
    SetCatalog { provider: String },
    /// Store a TMDB API read token for the direct catalog
    SetTmdbToken {
        /// The token (prompted when omitted)
        token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let log_file = if cli.log_file {
        Some(cinemarec_config::PathManager::default().log_file())
    } else {
        None
    };
    logging::init_logging(cli.verbose, cli.quiet, log_file).map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Login { email } => auth::run_login(email, &output).await,
        Commands::Register { email } => auth::run_register(email, &output).await,
        Commands::GoogleLogin { credential } => auth::run_google_login(credential, &output).await,
        Commands::Logout => auth::run_logout(&output),
        Commands::Whoami => auth::run_whoami(&output),
        Commands::Open { route } => auth::run_open(&route, &output),
        Commands::Preferences { cmd } => preferences::run_preferences(cmd, &output).await,
        Commands::Recommendations { cmd } => recommendations::run_recommendations(cmd, &output).await,
        Commands::Stats { cmd } => stats::run_stats(cmd, &output).await,
        Commands::Reviews { cmd } => reviews::run_reviews(cmd, &output).await,
        Commands::Quizzes { cmd } => quizzes::run_quizzes(cmd, &output).await,
        Commands::Watch { movie_id, email } => watch::run_watch(movie_id, email, &output).await,
        Commands::Config { cmd } => {
            let cmd = cmd.unwrap_or(ConfigCommands::Show { full: false });
            config::run_config(cmd, &output)
        }
        Commands::Clear { all, session } => clear::run_clear(all, session, &output),
    }
}
