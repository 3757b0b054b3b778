//! Reading menu pages.
//!
//! The markup a menu page has to follow is described by a [`MarkupContract`].
//! Everything downstream only sees [`MealDay`]s and plain text lines, so a
//! change of the upstream markup stays inside this module.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// The literal escape sequence some published pages carry instead of a line break.
static NEWLINE_ARTIFACT: &str = "\\n";

/// One day container of a menu page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MealDay {
    /// The day of the month as printed, e.g. `"3"`.
    pub day: String,
    /// The markup of the meal description.
    pub fragment: String,
}

/// Access to the parts of a menu page the calendar is built from.
pub trait PageExtractor: Send + Sync {
    /// All days with both a date number and a meal description, in page order.
    fn meal_days(&self, page: &Html) -> Vec<MealDay>;

    /// The lines of a meal description.
    fn meal_lines(&self, meal_day: &MealDay) -> Vec<String>;

    /// The page heading used as calendar title.
    fn heading(&self, page: &Html) -> Option<String>;
}

/// Class names, ids and tags of the menu page markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupContract {
    pub day_class: String,
    pub date_class: String,
    pub meal_class: String,
    pub heading_id: String,
    pub line_tag: String,
}

impl Default for MarkupContract {
    fn default() -> Self {
        Self {
            day_class: String::from("day"),
            date_class: String::from("dateNumber"),
            meal_class: String::from("meal-desc"),
            heading_id: String::from("reportHeadingHeader"),
            line_tag: String::from("span"),
        }
    }
}

/// A [`PageExtractor`] selecting elements by the names of a [`MarkupContract`].
#[derive(Debug, Clone, Default)]
pub struct ClassExtractor {
    contract: MarkupContract,
}

impl ClassExtractor {
    pub fn new(contract: MarkupContract) -> Self {
        Self { contract }
    }

    pub fn contract(&self) -> &MarkupContract {
        &self.contract
    }
}

impl PageExtractor for ClassExtractor {
    fn meal_days(&self, page: &Html) -> Vec<MealDay> {
        let (Some(day_selector), Some(date_selector), Some(meal_selector)) = (
            selector(&format!(".{}", self.contract.day_class)),
            selector(&format!(".{}", self.contract.date_class)),
            selector(&format!(".{}", self.contract.meal_class)),
        ) else {
            return vec![];
        };
        let mut meal_days: Vec<MealDay> = vec![];
        for day_element in page.select(&day_selector) {
            let (Some(date_element), Some(meal_element)) = (
                day_element.select(&date_selector).next(),
                day_element.select(&meal_selector).next(),
            ) else {
                continue;
            };
            let meal_day = MealDay {
                day: clean_text(&element_text(&date_element)),
                fragment: meal_element.html(),
            };
            match meal_days.iter_mut().find(|known| known.day == meal_day.day) {
                Some(known) => known.fragment = meal_day.fragment,
                None => meal_days.push(meal_day),
            }
        }
        meal_days
    }

    fn meal_lines(&self, meal_day: &MealDay) -> Vec<String> {
        let Some(line_selector) = selector(&self.contract.line_tag) else {
            return vec![];
        };
        let fragment = Html::parse_fragment(&meal_day.fragment);
        let lines = fragment
            .select(&line_selector)
            .map(|line| clean_line(&element_text(&line)))
            .filter(|line| !line.is_empty())
            .collect();
        lines
    }

    fn heading(&self, page: &Html) -> Option<String> {
        let heading_selector = selector(&format!("#{}", self.contract.heading_id))?;
        page.select(&heading_selector)
            .next()
            .map(|heading| clean_line(&element_text(&heading)))
    }
}

fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(err) => {
            tracing::warn!("invalid selector {css:?} in markup contract: {err}");
            None
        }
    }
}

fn element_text(element: &ElementRef) -> String {
    element.text().collect()
}

/// Remove newline artifacts and surrounding whitespace.
pub fn clean_text(text: &str) -> String {
    text.replace(NEWLINE_ARTIFACT, "").trim().to_string()
}

/// Like [`clean_text`], but also collapse inner whitespace to single spaces.
pub fn clean_line(text: &str) -> String {
    WHITESPACE
        .replace_all(&clean_text(text), " ")
        .into_owned()
}
