//! Writing calendars in the iCalendar wire format.
//!
//! Content lines end with CRLF and are folded after at most 75 octets without splitting a
//! character, so meal names with accents survive serialization.

use ical::{
    generator::{IcalCalendar, IcalEvent, Property},
    parser::ical::component::IcalAlarm,
};

const LINE_OCTETS: usize = 75;
static LINE_BREAK: &str = "\r\n";

/// Serialize a calendar with its events.
pub fn to_ics(calendar: &IcalCalendar) -> String {
    let mut ics = String::new();
    write_component(&mut ics, "VCALENDAR", &calendar.properties, |ics| {
        for event in &calendar.events {
            write_event(ics, event);
        }
    });
    ics
}

fn write_event(ics: &mut String, event: &IcalEvent) {
    write_component(ics, "VEVENT", &event.properties, |ics| {
        for alarm in &event.alarms {
            write_alarm(ics, alarm);
        }
    });
}

fn write_alarm(ics: &mut String, alarm: &IcalAlarm) {
    write_component(ics, "VALARM", &alarm.properties, |_| {});
}

fn write_component(
    ics: &mut String,
    name: &str,
    properties: &[Property],
    children: impl FnOnce(&mut String),
) {
    write_line(ics, &format!("BEGIN:{name}"));
    for property in properties {
        write_line(ics, &content_line(property));
    }
    children(ics);
    write_line(ics, &format!("END:{name}"));
}

/// `NAME;PARAM=a,b:value`, unfolded.
fn content_line(property: &Property) -> String {
    let mut line = property.name.clone();
    for (name, values) in property.params.iter().flatten() {
        line.push(';');
        line.push_str(name);
        line.push('=');
        let values: Vec<String> = values.iter().map(|value| param_value(value)).collect();
        line.push_str(&values.join(","));
    }
    line.push(':');
    line.push_str(property.value.as_deref().unwrap_or_default());
    line
}

/// Quote a parameter value if it contains a delimiter. Quotes themselves are not allowed.
fn param_value(value: &str) -> String {
    let value: String = value
        .chars()
        .filter(|c| *c != '"' && !c.is_control())
        .collect();
    if value.contains([';', ':', ',']) {
        format!("\"{value}\"")
    } else {
        value
    }
}

fn write_line(ics: &mut String, line: &str) {
    ics.push_str(&fold_line(line));
    ics.push_str(LINE_BREAK);
}

/// Fold a content line so no physical line exceeds 75 octets.
pub fn fold_line(line: &str) -> String {
    let mut folded = String::with_capacity(line.len() + line.len() / LINE_OCTETS * 3);
    let mut octets = 0;
    for c in line.chars() {
        let len = c.len_utf8();
        if octets + len > LINE_OCTETS {
            folded.push_str(LINE_BREAK);
            folded.push(' ');
            // the leading space counts
            octets = 1;
        }
        folded.push(c);
        octets += len;
    }
    folded
}
