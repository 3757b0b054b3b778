//! Turning menu days into calendar events.

use ical::{
    generator::{IcalEvent, IcalEventBuilder, Property},
    ical_property,
};

use crate::{
    page::{MealDay, PageExtractor},
    period::Period,
};

static TIMEZONE: &str = "UTC";
pub static DATE_FORMAT: &str = "%Y%m%d";
pub static STAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Build the events of all days of one period, in the order of `meal_days`.
pub fn get_events(
    extractor: &dyn PageExtractor,
    meal_days: &[MealDay],
    school: &str,
    period: Period,
    changed: &str,
) -> Vec<IcalEvent> {
    meal_days
        .iter()
        .filter_map(|meal_day| {
            let lines = extractor.meal_lines(meal_day);
            get_event(school, period, &meal_day.day, &lines, changed)
        })
        .collect()
}

/// Build the event of a single day, `None` if there is nothing to show.
pub fn get_event(
    school: &str,
    period: Period,
    day: &str,
    lines: &[String],
    changed: &str,
) -> Option<IcalEvent> {
    let Some(summary) = lines.first() else {
        tracing::debug!("skipping {period} day {day:?} of {school}: no meal lines");
        return None;
    };
    let Some(date) = day.parse::<u32>().ok().and_then(|day| period.date(day)) else {
        tracing::warn!("skipping {period} day {day:?} of {school}: not a day of the month");
        return None;
    };
    let uid = uid(school, period, day)?;
    Some(
        IcalEventBuilder::tzid(TIMEZONE)
            .uid(uid)
            .changed_utc(changed)
            .one_day(date.format(DATE_FORMAT).to_string())
            .set(ical_property!("SUMMARY", escape_text(summary)))
            .set(ical_property!("DESCRIPTION", escape_text(&lines.join("\n"))))
            .build(),
    )
}

/// Get a unique id for a school's menu on one day.
///
/// Changing this function is a breaking change!
pub fn uid(school: &str, period: Period, day: &str) -> Option<String> {
    let calendar_name = period.calendar_name(school)?;
    Some(format!("{calendar_name}-{day}"))
}

/// Escape a TEXT value for the iCalendar wire format.
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Look up the value of an event property by name.
pub trait GetIcalProperty {
    fn get_ical_property_value(&self, name: &str) -> Option<&String>;
}

impl GetIcalProperty for IcalEvent {
    fn get_ical_property_value(&self, name: &str) -> Option<&String> {
        self.properties
            .iter()
            .find(|property| property.name == name)
            .and_then(|property| property.value.as_ref())
    }
}
