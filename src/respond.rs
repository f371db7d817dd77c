use axum::{
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::parse::{PortalPage, Record};

/// Body format picked from the `Accept` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
    /// Raw office-hours `<table>` markup.
    Tables,
}

impl Format {
    /// Exact matches only: `text/plain` and `application/json`. Everything else is YAML.
    pub fn negotiate(headers: &HeaderMap) -> Self {
        match headers.get(header::ACCEPT).and_then(|v| v.to_str().ok()) {
            Some("text/plain") => Self::Tables,
            Some("application/json") => Self::Json,
            _ => Self::Yaml,
        }
    }

    /// Same format, minus the tables variant that only office hours have.
    pub const fn structured(self) -> Self {
        match self {
            Self::Tables => Self::Yaml,
            other => other,
        }
    }
}

/// `{<name>: [record, ...]}`
#[derive(Debug, Clone, Copy)]
pub struct ResultSet<'a> {
    name: &'static str,
    records: &'a [Record],
}

impl<'a> ResultSet<'a> {
    pub const fn doctors(records: &'a [Record]) -> Self {
        Self {
            name: "doctors",
            records,
        }
    }

    pub const fn ambulatories(records: &'a [Record]) -> Self {
        Self {
            name: "ambulatories",
            records,
        }
    }
}

impl Serialize for ResultSet<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.name, self.records)?;
        map.end()
    }
}

pub fn records(format: Format, results: &ResultSet<'_>) -> crate::Result<Response> {
    let response = match format.structured() {
        Format::Json => (
            [(header::CONTENT_TYPE, "application/json")],
            serde_json::to_string_pretty(results)?,
        )
            .into_response(),
        _ => (
            [(header::CONTENT_TYPE, "application/yaml")],
            serde_yaml::to_string(results)?,
        )
            .into_response(),
    };
    Ok(response)
}

/// Every office-hours table of the page, one per line.
pub fn tables(page: &str) -> Response {
    let body = office_hours_markup(page);
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}

fn office_hours_markup(page: &str) -> String {
    let page = PortalPage::parse(page);
    for paragraph in page.paragraphs() {
        log::debug!("{paragraph}");
    }
    page.tables_containing("Orari").join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::fs;

    fn accept(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_negotiate() {
        assert_eq!(Format::negotiate(&HeaderMap::new()), Format::Yaml);
        assert_eq!(Format::negotiate(&accept("text/plain")), Format::Tables);
        assert_eq!(Format::negotiate(&accept("application/json")), Format::Json);
        assert_eq!(Format::negotiate(&accept("text/plain, */*")), Format::Yaml);
        assert_eq!(Format::negotiate(&accept("*/*")), Format::Yaml);
    }

    #[test]
    fn test_structured() {
        assert_eq!(Format::Tables.structured(), Format::Yaml);
        assert_eq!(Format::Json.structured(), Format::Json);
    }

    #[test]
    fn test_result_set_shape() {
        let parsed = Record::all_from_value("{a=1},{a=2, b=3}").unwrap();
        let value = serde_json::to_value(ResultSet::doctors(&parsed)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"doctors": [{"a": "1"}, {"a": "2", "b": "3"}]})
        );

        let yaml = serde_yaml::to_string(&ResultSet::ambulatories(&parsed)).unwrap();
        let back: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back["ambulatories"][1]["b"].as_str(), Some("3"));
    }

    #[test]
    fn test_empty_result_set() {
        let yaml = serde_yaml::to_string(&ResultSet::doctors(&[])).unwrap();
        let back: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back["doctors"].as_sequence().map(Vec::len), Some(0));
    }

    #[test]
    fn test_records_content_type() {
        let parsed = Record::all_from_value("{a=1}").unwrap();
        let set = ResultSet::doctors(&parsed);
        let yaml = records(Format::Tables, &set).unwrap();
        assert_eq!(yaml.headers()[header::CONTENT_TYPE], "application/yaml");
        let json = records(Format::Json, &set).unwrap();
        assert_eq!(json.headers()[header::CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_office_hours_markup() {
        let html =
            fs::read_to_string("./src/parse/html_examples/ricerca_medici/office_hours.html")
                .unwrap();
        let markup = office_hours_markup(&html);
        assert!(markup.contains("Orari"));
        assert!(markup.starts_with("<table"));
        assert!(!markup.contains("Telefono"));
    }

    #[test]
    fn test_office_hours_markup_without_tables() {
        let html =
            fs::read_to_string("./src/parse/html_examples/ricerca_medici/no_office_hours.html")
                .unwrap();
        assert_eq!(office_hours_markup(&html), "");
    }
}
