use std::{ffi::OsStr, path::Path as FilePath};

use axum::{
    extract::{Path, State},
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};
use chrono::Local;
use lc_core::menu_client::{self, PeriodStatus};

use crate::route::AppState;

/// Handle calendar requests.
///
/// The school is the file stem of the requested path, e.g. `sre` for `/sre.ics`.
/// Unavailable menus never fail the request, they just leave the calendar emptier.
pub async fn handler(
    State(state): State<AppState>,
    Path(calendar_path): Path<String>,
) -> Response {
    let cache_key = format!("/{calendar_path}");
    match state.cache.get(&cache_key).await {
        Ok(Some(ics)) => {
            tracing::debug!("serving {cache_key} from cache");
            return calendar_response(ics);
        }
        Ok(None) => tracing::debug!("{cache_key} is not cached"),
        Err(err) => tracing::warn!("could not read {cache_key} from cache: {err}"),
    }
    let school = school(&calendar_path);
    let feed = menu_client::get(
        state.source.as_ref(),
        state.extractor.as_ref(),
        school,
        Local::now().date_naive(),
    )
    .await;
    for report in &feed.periods {
        if report.status == PeriodStatus::Unavailable {
            tracing::info!("{school} {}: menu unavailable", report.period);
        }
    }
    let ics = feed.to_ics();
    if let Err(err) = state.cache.set(&cache_key, &ics).await {
        tracing::warn!("could not cache {cache_key}: {err}");
    }
    calendar_response(ics)
}

fn calendar_response(ics: String) -> Response {
    ([(CONTENT_TYPE, "text/calendar")], ics).into_response()
}

/// The school code of a calendar path, i.e. the path without its extension.
fn school(calendar_path: &str) -> &str {
    FilePath::new(calendar_path)
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or(calendar_path)
}
