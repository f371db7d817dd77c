use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
};

use crate::{
    error::Error,
    fetch::{fetch_page, Portlet, OFFICE_HOURS_PORTLET, SEARCH_PORTLET},
    params::{self, Params},
    parse::{PortalPage, Record},
    respond::{self, Format, ResultSet},
    AppState,
};

/// Usage listing, keyed by the public paths of the deployed function.
const HELP: [(&str, &str); 3] = [
    (
        "/salutelazio",
        "Search a doctor. Valid keys: taxCode, surname, zip.",
    ),
    ("/salutelazio/{taxCode}", "Not implemented."),
    (
        "/salutelazio/{taxCode}/orari",
        "Info for a doctor office hours.",
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    /// `/`
    Search,
    /// `/{taxCode}`, reserved for a direct lookup.
    Doctor(&'a str),
    /// `/{taxCode}/orari`
    OfficeHours(&'a str),
    Help,
}

impl<'a> Route<'a> {
    /// Empty segments are ignored, so `//x/orari/` is `/x/orari`.
    pub fn from_path(path: &'a str) -> Self {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments[..] {
            [] => Self::Search,
            [tax_code] => Self::Doctor(tax_code),
            [tax_code, "orari"] => Self::OfficeHours(tax_code),
            _ => Self::Help,
        }
    }
}

/// Handler for `/`.
pub async fn root(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<Params>,
) -> Response {
    dispatch(&state, "/", &headers, &params).await
}

/// Handler for every other path. `Path` hands over the percent-decoded remainder.
pub async fn nested(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    headers: HeaderMap,
    Query(params): Query<Params>,
) -> Response {
    let path = format!("/{}", path.trim_start_matches('/'));
    dispatch(&state, &path, &headers, &params).await
}

async fn dispatch(state: &AppState, path: &str, headers: &HeaderMap, params: &Params) -> Response {
    let format = Format::negotiate(headers);
    let result = match Route::from_path(path) {
        Route::Search => search(state, params, format).await,
        Route::Doctor(tax_code) => {
            log::debug!("direct lookup requested for {tax_code}");
            Err(Error::NotImplemented)
        }
        Route::OfficeHours(tax_code) => office_hours(state, tax_code, format).await,
        Route::Help => Ok(help()),
    };
    result.unwrap_or_else(|e| {
        if e.status().is_server_error() {
            log::error!("{path}: {e}");
        } else {
            log::warn!("{path}: {e}");
        }
        e.problem(path).into_response()
    })
}

async fn search(state: &AppState, params: &Params, format: Format) -> crate::Result<Response> {
    params::validate(params, SEARCH_PORTLET.required_any, SEARCH_PORTLET.fields)?;
    let page = fetch_page(&state.client, &state.portal, &SEARCH_PORTLET, params).await?;
    let doctors = records_from_page(&page, &SEARCH_PORTLET)?;
    log::info!("found {} doctors", doctors.len());
    respond::records(format, &ResultSet::doctors(&doctors))
}

async fn office_hours(state: &AppState, tax_code: &str, format: Format) -> crate::Result<Response> {
    let params = Params::from([("taxCode".to_owned(), tax_code.to_owned())]);
    params::validate(
        &params,
        OFFICE_HOURS_PORTLET.required_any,
        OFFICE_HOURS_PORTLET.fields,
    )?;
    let page = fetch_page(&state.client, &state.portal, &OFFICE_HOURS_PORTLET, &params).await?;
    if format == Format::Tables {
        return Ok(respond::tables(&page));
    }
    let ambulatories = records_from_page(&page, &OFFICE_HOURS_PORTLET)?;
    log::info!("found {} ambulatories", ambulatories.len());
    respond::records(format, &ResultSet::ambulatories(&ambulatories))
}

/// A page without the portlet's results input is a 404 for both flows.
fn records_from_page(page: &str, portlet: &Portlet) -> crate::Result<Vec<Record>> {
    PortalPage::parse(page)
        .records(&portlet.results)?
        .ok_or_else(|| {
            Error::NotFound(format!(
                "Target html tag not found: {}",
                portlet.results.as_str()
            ))
        })
}

fn help() -> Response {
    let help: serde_json::Map<String, serde_json::Value> = HELP
        .iter()
        .map(|(path, text)| ((*path).to_owned(), (*text).into()))
        .collect();
    (
        [(header::CONTENT_TYPE, "application/json")],
        serde_json::Value::Object(help).to_string(),
    )
        .into_response()
}
