use std::{env::current_dir, fs::write, path::PathBuf, time::Duration};

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::Parser;
use lc_core::{
    config::{Config, DEFAULT_CALENDAR_URL, DEFAULT_LOG_LEVEL, DEFAULT_REQUEST_TIMEOUT},
    event::GetIcalProperty,
    menu_client::{self, Feed, HttpMenuSource, PeriodStatus},
    page::ClassExtractor,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(version)]
pub struct Arguments {
    /// the school code, e.g. sre
    pub school: String,
    /// the first month to include as YYYY-MM, defaults to the current month
    #[arg(long, value_parser = parse_month)]
    pub month: Option<NaiveDate>,
    /// the file to write, defaults to <school>.ics in the current directory
    #[arg(long, short)]
    pub output: Option<PathBuf>,
    /// root url of the published menu pages
    #[arg(long, env = "CALENDAR_URL", default_value = DEFAULT_CALENDAR_URL)]
    pub calendar_url: String,
    /// seconds to wait for a menu page
    #[arg(long, env = "REQUEST_TIMEOUT", default_value_t = DEFAULT_REQUEST_TIMEOUT)]
    pub request_timeout: u64,
    /// log level, overridden by RUST_LOG
    #[arg(long, env = "LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,
}

impl From<&Arguments> for Config {
    fn from(value: &Arguments) -> Self {
        Config {
            calendar_url: value.calendar_url.clone(),
            request_timeout: Duration::from_secs(value.request_timeout),
            log_level: value.log_level.clone(),
            ..Config::default()
        }
    }
}

fn parse_month(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d")
        .map_err(|err| format!("expected YYYY-MM: {err}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Arguments::parse();
    let config = Config::from(&args);
    init_tracing(&config.log_level);
    let source = HttpMenuSource::new(&config)?;
    let today = args.month.unwrap_or_else(|| Local::now().date_naive());
    let feed = menu_client::get(&source, &ClassExtractor::default(), &args.school, today).await;
    print_report(&feed);
    let path = match args.output {
        Some(path) => path,
        None => {
            let mut path = current_dir()?;
            path.push(format!("{}.ics", args.school));
            path
        }
    };
    write(&path, feed.to_ics())?;
    println!("wrote {}", path.display());
    Ok(())
}

fn print_report(feed: &Feed) {
    if let Some(title) = &feed.title {
        println!("{title}");
    }
    for report in &feed.periods {
        match report.status {
            PeriodStatus::Unavailable => println!("{}: unavailable", report.period),
            PeriodStatus::Fetched { events } => println!("{}: {events} days", report.period),
        }
    }
    for event in feed.events() {
        if let (Some(uid), Some(summary)) = (
            event.get_ical_property_value("UID"),
            event.get_ical_property_value("SUMMARY"),
        ) {
            tracing::debug!("{uid}: {summary}");
        }
    }
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_level.to_lowercase())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_parse_month() {
        assert_eq!(
            parse_month("2023-12").unwrap(),
            NaiveDate::from_str("2023-12-01").unwrap()
        );
        assert!(parse_month("2023-13").is_err());
        assert!(parse_month("december").is_err());
    }

    #[test]
    fn test_arguments() {
        let args = Arguments::try_parse_from([
            "lc_cli",
            "sre",
            "--month",
            "2023-01",
            "-o",
            "menu.ics",
            "--request-timeout",
            "5",
        ])
        .unwrap();
        assert_eq!(args.school, "sre");
        assert_eq!(args.month, NaiveDate::from_ymd_opt(2023, 1, 1));
        assert_eq!(args.output, Some(PathBuf::from("menu.ics")));
        let config = Config::from(&args);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }
}
