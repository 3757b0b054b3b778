//! This client fetches the monthly menu pages of a school and assembles them into one calendar.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use ical::{
    generator::{IcalCalendar, IcalCalendarBuilder, IcalEvent, Property},
    ical_property,
};
use scraper::Html;

use crate::{
    config::Config,
    error::FetchError,
    event::{self, STAMP_FORMAT},
    ics,
    page::PageExtractor,
    period::Period,
};

static FALLBACK_TITLE: &str = "lunch-calendar";

/// Where menu pages come from.
#[async_trait]
pub trait MenuSource: Send + Sync {
    /// The markup of a school's menu page, `None` if it is not available.
    async fn fetch(&self, school: &str, period: Period) -> Option<String>;
}

/// Fetches menu pages from the published site.
#[derive(Debug, Clone)]
pub struct HttpMenuSource {
    client: reqwest::Client,
    root: String,
}

impl HttpMenuSource {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            root: config.calendar_root().to_string(),
        })
    }

    /// The address of a school's menu page.
    pub fn url(&self, school: &str, period: Period) -> Result<String, FetchError> {
        let calendar_name = period
            .calendar_name(school)
            .ok_or(FetchError::InvalidPeriod(period.month))?;
        Ok(format!("{}/{calendar_name}.html", self.root))
    }

    async fn get_page(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl MenuSource for HttpMenuSource {
    async fn fetch(&self, school: &str, period: Period) -> Option<String> {
        let url = match self.url(school, period) {
            Ok(url) => url,
            Err(err) => {
                tracing::error!("could not build menu url for {school}: {err}");
                return None;
            }
        };
        match self.get_page(&url).await {
            Ok(page) => Some(page),
            Err(err) => {
                tracing::error!("could not get calendar from {url}: {err}");
                None
            }
        }
    }
}

/// What happened to one period while assembling a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodStatus {
    /// The page could not be fetched.
    Unavailable,
    /// The page was fetched and yielded this many events.
    Fetched { events: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodReport {
    pub period: Period,
    pub status: PeriodStatus,
}

/// A school's assembled menu calendar.
#[derive(Debug)]
pub struct Feed {
    pub calendar: IcalCalendar,
    pub title: Option<String>,
    pub periods: Vec<PeriodReport>,
}

impl Feed {
    pub fn events(&self) -> &[IcalEvent] {
        &self.calendar.events
    }

    /// The calendar in the iCalendar wire format.
    pub fn to_ics(&self) -> String {
        ics::to_ics(&self.calendar)
    }
}

/// Everything taken from a single menu page.
struct MenuPage {
    title: Option<String>,
    events: Vec<IcalEvent>,
}

/// Get the calendar of a school for the month containing `today` and the month after.
pub async fn get(
    source: &dyn MenuSource,
    extractor: &dyn PageExtractor,
    school: &str,
    today: NaiveDate,
) -> Feed {
    let changed = Utc::now().format(STAMP_FORMAT).to_string();
    let current = Period::containing(today);
    let mut title: Option<String> = None;
    let mut events: Vec<IcalEvent> = vec![];
    let mut periods: Vec<PeriodReport> = vec![];
    for period in [current, current.next()] {
        let Some(html) = source.fetch(school, period).await else {
            periods.push(PeriodReport {
                period,
                status: PeriodStatus::Unavailable,
            });
            continue;
        };
        let menu_page = parse(&html, extractor, school, period, &changed);
        tracing::info!(
            "{school} {period}: {} menu days found",
            menu_page.events.len()
        );
        periods.push(PeriodReport {
            period,
            status: PeriodStatus::Fetched {
                events: menu_page.events.len(),
            },
        });
        events.extend(menu_page.events);
        if title.is_none() {
            title = menu_page.title;
        }
    }
    let mut calendar = get_calendar(title.as_deref());
    calendar.events = events;
    Feed {
        calendar,
        title,
        periods,
    }
}

/// Parse a menu page into events.
///
/// Kept synchronous so the parsed document never lives across an await point.
fn parse(
    html: &str,
    extractor: &dyn PageExtractor,
    school: &str,
    period: Period,
    changed: &str,
) -> MenuPage {
    let document = Html::parse_document(html);
    let meal_days = extractor.meal_days(&document);
    MenuPage {
        title: extractor.heading(&document).filter(|title| !title.is_empty()),
        events: event::get_events(extractor, &meal_days, school, period, changed),
    }
}

/// Build an empty calendar carrying the feed metadata.
fn get_calendar(title: Option<&str>) -> IcalCalendar {
    let mut calendar = IcalCalendarBuilder::version("2.0")
        .gregorian()
        .prodid(prod_id(title.unwrap_or(FALLBACK_TITLE)))
        .build();
    calendar
        .properties
        .push(ical_property!("METHOD", "PUBLISH"));
    if let Some(title) = title {
        calendar
            .properties
            .push(ical_property!("X-WR-CALNAME", event::escape_text(title)));
    }
    calendar
}

fn prod_id(title: &str) -> String {
    format!("-//{}//", event::escape_text(title))
}
