//! This crate turns a school's published monthly lunch menus into an iCalendar feed.
//!
//! The menus are read from pages named `{school}-{mon}-{yy}.html` below a configurable root,
//! e.g. <http://www.belchertownps.org/sites/default/files/menus/sre-jan-23.html>.

pub use ical;

pub mod config;
pub mod error;
pub mod event;
pub mod ics;
pub mod menu_client;
pub mod page;
pub mod period;
