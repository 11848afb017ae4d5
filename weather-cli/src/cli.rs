use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use inquire::{InquireError, Password, PasswordDisplayMode, Text};
use tracing::{debug, info};
use weather_core::{
    Config, Coordinates, FixedLocation, IpApiLocator, LocationSource, OpenWeatherProvider,
    Session, fetch, locate_once,
};

use crate::render::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Current weather for your location or any city")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key in the config file.
    Configure,

    /// Show current weather for a city or a coordinate pair, then exit.
    Show {
        /// City name, e.g. "London" or "Paris,FR".
        #[arg(required_unless_present = "lat", conflicts_with_all = ["lat", "lon"])]
        city: Option<String>,

        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,
    },

    /// Detect the current location, then search interactively (default).
    Interactive {
        /// Skip location detection and start idle.
        #[arg(long)]
        no_locate: bool,

        /// Use these coordinates instead of IP geolocation.
        #[arg(long, requires = "lon", conflicts_with = "no_locate", allow_negative_numbers = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let command = self.command.unwrap_or(Command::Interactive {
            no_locate: false,
            lat: None,
            lon: None,
        });

        match command {
            Command::Configure => configure(),
            Command::Show { city, lat, lon } => {
                let config = Config::load()?.with_env_overrides();
                let coords = lat.zip(lon).map(|(lat, lon)| Coordinates::new(lat, lon));
                show(&config, city, coords).await
            }
            Command::Interactive { no_locate, lat, lon } => {
                let config = Config::load()?.with_env_overrides();
                let coords = lat.zip(lon).map(|(lat, lon)| Coordinates::new(lat, lon));
                interactive(&config, no_locate, coords).await
            }
        }
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;

    let key = key.trim();
    if key.is_empty() {
        bail!("API key must not be empty");
    }

    config.set_api_key(key.to_string());
    config.save()?;

    println!("Saved API key to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(config: &Config, city: Option<String>, coords: Option<Coordinates>) -> Result<()> {
    let provider = OpenWeatherProvider::from_config(config);
    let mut session = Session::new();

    let pending = match (city, coords) {
        (Some(city), None) => {
            session.set_query(city);
            session.submit()?
        }
        (None, Some(coords)) => session.locate(coords),
        _ => bail!("Pass either a city name or both --lat and --lon"),
    };

    session.complete(fetch(&provider, pending).await);
    print!("{}", render(&session));

    if session.phase().is_error() {
        return Err(anyhow!("No weather found for '{}'", session.query()));
    }
    Ok(())
}

async fn interactive(
    config: &Config,
    no_locate: bool,
    coords: Option<Coordinates>,
) -> Result<()> {
    let provider = OpenWeatherProvider::from_config(config);
    let mut session = Session::new();

    let ip_locator = IpApiLocator::new(config.locator_url.clone());
    let fixed = coords.map(FixedLocation);
    let source: Option<&dyn LocationSource> = match (&fixed, no_locate) {
        (_, true) => None,
        (Some(fixed), false) => Some(fixed as &dyn LocationSource),
        (None, false) => Some(&ip_locator as &dyn LocationSource),
    };

    if let Some(coords) = locate_once(source, &config.geolocation).await {
        let pending = session.locate(coords);
        session.complete(fetch(&provider, pending).await);
    }
    println!("{}", render(&session));

    loop {
        let input = Text::new("City:")
            .with_initial_value(session.query())
            .with_help_message("Enter to search, empty line to clear, Esc to quit")
            .prompt();

        let text = match input {
            Ok(text) => text,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                debug!("search prompt closed");
                break;
            }
            Err(e) => return Err(e).context("Failed to read search input"),
        };

        session.set_query(text);
        if session.query().trim().is_empty() {
            println!("{}", render(&session));
            continue;
        }

        match session.submit() {
            Ok(pending) => {
                session.complete(fetch(&provider, pending).await);
                println!("{}", render(&session));
            }
            Err(e) => eprintln!("{e}"),
        }
    }

    info!("leaving interactive session");
    Ok(())
}
