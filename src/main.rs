// src/main.rs
mod api;
mod browser;
mod config;
mod extractors;
mod screener;
mod utils;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};

use api::ErrorBody;
use browser::ChromeLauncher;
use config::{Credentials, Settings, SiteConfig, Timeouts, DEFAULT_BASE_URL};
use screener::{LookupClient, Scraper, SearchResolver, SearchStrategy};
use utils::AppError;

/// Authenticated scraper for screener-style company pages
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Origin of the site to scrape
    #[arg(long, env = "SCREENER_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Login username (required for scrape)
    #[arg(long, env = "SCREENER_USERNAME")]
    username: Option<String>,

    /// Login password (required for scrape)
    #[arg(long, env = "SCREENER_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Chrome/Chromium binary to launch instead of the detected one
    #[arg(long, env = "CHROME_BIN")]
    chrome_bin: Option<PathBuf>,

    /// Show the browser window
    #[arg(long)]
    headful: bool,

    /// Page load timeout in seconds
    #[arg(long, default_value_t = 120)]
    navigation_timeout: u64,

    /// Wait for the post-login navigation, in seconds
    #[arg(long, default_value_t = 30)]
    login_timeout: u64,

    /// Wait for form fields and page markers, in seconds
    #[arg(long, default_value_t = 30)]
    selector_timeout: u64,

    /// Wait for each optional section, in seconds
    #[arg(long, default_value_t = 15)]
    section_timeout: u64,

    /// Reveal/collapse wait per schedule, in seconds
    #[arg(long, default_value_t = 10)]
    schedule_timeout: u64,

    /// Budget for a whole scrape, in seconds
    #[arg(long, default_value_t = 300)]
    total_timeout: u64,

    /// Directory for failure snapshots (HTML + screenshot)
    #[arg(short, long)]
    debug_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List companies matching a query
    Search {
        query: String,

        #[arg(long, value_enum, default_value_t = SearchStrategy::Lookup)]
        strategy: SearchStrategy,
    },
    /// Scrape one company by exact name or canonical path ("/company/ACME/")
    Scrape {
        name: String,

        /// Don't expand quarterly schedules
        #[arg(long)]
        no_schedules: bool,
    },
}

impl Args {
    fn timeouts(&self) -> Timeouts {
        Timeouts {
            navigation: Duration::from_secs(self.navigation_timeout),
            login: Duration::from_secs(self.login_timeout),
            selector: Duration::from_secs(self.selector_timeout),
            section: Duration::from_secs(self.section_timeout),
            schedule: Duration::from_secs(self.schedule_timeout),
            total: Duration::from_secs(self.total_timeout),
            ..Timeouts::default()
        }
    }
}

fn chrome_launcher(chrome_bin: Option<PathBuf>, headless: bool, timeouts: &Timeouts) -> ChromeLauncher {
    ChromeLauncher { chrome_bin, headless, launch_timeout: timeouts.navigation }
}

fn credentials(username: Option<String>, password: Option<String>) -> Result<Credentials, AppError> {
    match (username, password) {
        (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
            Ok(Credentials { username, password })
        }
        _ => Err(AppError::Config(
            "SCREENER_USERNAME and SCREENER_PASSWORD must be set to scrape".to_string(),
        )),
    }
}

async fn run(args: Args) -> Result<String, AppError> {
    let site = SiteConfig::new(&args.base_url)?;
    let timeouts = args.timeouts();
    let lookup = LookupClient::new(site.clone(), timeouts.selector)?;
    let headless = !args.headful;

    match args.command {
        Command::Search { query, strategy } => {
            let launcher = chrome_launcher(args.chrome_bin, headless, &timeouts);
            let resolver = SearchResolver::new(lookup, launcher, timeouts);
            let response = api::resolve_company(&resolver, &query, strategy).await?;
            Ok(serde_json::to_string_pretty(&response)?)
        }
        Command::Scrape { name, no_schedules } => {
            let settings = Settings {
                site,
                credentials: credentials(args.username, args.password)?,
                timeouts,
                chrome_bin: args.chrome_bin,
                headless,
                debug_dir: args.debug_dir,
                expand_schedules: !no_schedules,
            };
            let launcher = chrome_launcher(settings.chrome_bin.clone(), settings.headless, &settings.timeouts);
            let resolver = SearchResolver::new(lookup, launcher.clone(), settings.timeouts);
            let scraper = Scraper::new(launcher, &settings);

            let result = api::scrape_company(&scraper, &resolver, &name).await?;
            Ok(serde_json::to_string_pretty(&result)?)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env is optional; real environment variables win
    dotenvy::dotenv().ok();
    utils::logging::setup_logging();

    let args = Args::parse();

    match run(args).await {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{} ({})", e, e.kind());
            let body = ErrorBody::from(&e);
            match serde_json::to_string_pretty(&body) {
                Ok(json) => println!("{}", json),
                Err(_) => println!("{}", body.message),
            }
            ExitCode::from(if e.is_client_error() { 2 } else { 1 })
        }
    }
}
