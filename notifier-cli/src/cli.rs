use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use inquire::{Password, Text};
use notifier_core::{
    Config, GeoService, Notifier, NotifyRequest, WeatherService, get_suggestion,
};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-notifier", version, about = "Email a weather summary for a city or IP")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively set API key, sender credentials and default city.
    Configure,

    /// Send a weather notification email.
    Notify(NotifyArgs),

    /// Print the forecast and suggestion for a city.
    Forecast {
        city: String,
    },

    /// Print the city detected for an IP address.
    Locate {
        /// IP address; omitted means local, which resolves to the default city.
        ip: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct NotifyArgs {
    /// Recipient address.
    #[arg(long, required_unless_present = "event", conflicts_with = "event")]
    pub email: Option<String>,

    /// City to report on; detected from --ip when omitted.
    #[arg(long)]
    pub city: Option<String>,

    /// Client IP used to detect the city.
    #[arg(long)]
    pub ip: Option<String>,

    /// JSON event file (`-` for stdin), e.g. {"email": "a@b.com", "city": "Paris"}.
    #[arg(long, conflicts_with_all = ["city", "ip"])]
    pub event: Option<String>,
}

impl NotifyArgs {
    fn into_request(self) -> anyhow::Result<NotifyRequest> {
        if let Some(source) = self.event {
            let raw = if source == "-" {
                io::read_to_string(io::stdin()).context("Failed to read event from stdin")?
            } else {
                fs::read_to_string(&source)
                    .with_context(|| format!("Failed to read event file: {source}"))?
            };
            return serde_json::from_str(&raw).context("Failed to parse event JSON");
        }

        let email = self.email.context("--email is required")?;
        Ok(NotifyRequest { email, city: self.city, ip: self.ip })
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(self.config),
            Command::Notify(args) => {
                let config = load_config(self.config.as_deref())?;
                let notifier = Notifier::from_config(&config)?;
                let request = args.into_request()?;
                tracing::debug!(?request, "Handling notify request");

                let status = notifier.handle(&request).await;
                println!("{status}");
                Ok(())
            }
            Command::Forecast { city } => {
                let config = load_config(self.config.as_deref())?;
                let weather = WeatherService::from_config(&config)?;

                let forecast = weather.current(&city).await?;
                let line = forecast.to_string();
                let observed = forecast.observed_at.format("%Y-%m-%d %H:%M UTC");
                println!("{} ({observed})", forecast.location_name);
                println!("  {line}");
                println!("  {}", get_suggestion(&line));
                Ok(())
            }
            Command::Locate { ip } => {
                let config = load_config(self.config.as_deref())?;
                let geo = GeoService::from_config(&config)?;

                let city = geo.detect_city(ip.as_deref()).await;
                match city.failure() {
                    Some(err) => println!("{} (fallback: {err:#})", city.value()),
                    None => println!("{}", city.value()),
                }
                Ok(())
            }
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.apply_env();
    Ok(config)
}

fn configure(path: Option<PathBuf>) -> anyhow::Result<()> {
    // Edit the file contents only, without env overrides baked in.
    let mut config = match &path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let api_key = Text::new("OpenWeather API key:")
        .with_default(config.openweather_api_key.as_deref().unwrap_or_default())
        .prompt()?;
    let from_email = Text::new("Sender address (SMTP login):")
        .with_default(config.smtp.from_email.as_deref().unwrap_or_default())
        .prompt()?;
    let password = Password::new("SMTP app password (leave empty to keep current):")
        .without_confirmation()
        .prompt()?;
    let default_city = Text::new("Default city:")
        .with_default(&config.default_city)
        .prompt()?;

    config.openweather_api_key = Some(api_key).filter(|k| !k.is_empty());
    config.smtp.from_email = Some(from_email).filter(|e| !e.is_empty());
    if !password.is_empty() {
        config.smtp.password = Some(password);
    }
    if !default_city.is_empty() {
        config.default_city = default_city;
    }

    match &path {
        Some(path) => config.save_to(path)?,
        None => config.save()?,
    }

    let saved_to = match path {
        Some(path) => path,
        None => Config::config_file_path()?,
    };
    println!("Saved configuration to {}", saved_to.display());
    Ok(())
}
