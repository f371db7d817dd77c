use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Serialize, Serializer};

use crate::{params, parse};
use std::fmt::{self, Display, Formatter};

#[derive(Debug)]
pub enum Error {
    Validation(params::Error),
    NotImplemented,
    NotFound(String),
    Parse(parse::Error),
    Request(reqwest::Error),
    Yaml(serde_yaml::Error),
    Json(serde_json::Error),
    Config(String),
}

impl From<params::Error> for Error {
    fn from(e: params::Error) -> Self {
        Error::Validation(e)
    }
}

impl From<parse::Error> for Error {
    fn from(e: parse::Error) -> Self {
        Error::Parse(e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Yaml(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::Validation(e) => write!(f, "{e}"),
            Error::NotImplemented => write!(f, "Not Implemented"),
            Error::NotFound(what) => write!(f, "Not found: {what}"),
            Error::Parse(e) => write!(f, "Parse error: {e}"),
            Error::Request(e) => write!(f, "Request error: {e}"),
            Error::Yaml(e) => write!(f, "Yaml error: {e}"),
            Error::Json(e) => write!(f, "Json error: {e}"),
            Error::Config(msg) => write!(f, "Config error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub const fn status(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotImplemented | Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Request(_) => StatusCode::BAD_GATEWAY,
            Error::Parse(_) | Error::Yaml(_) | Error::Json(_) | Error::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The problem document answering the request for `path`.
    pub fn problem(&self, path: &str) -> Problem {
        let status = self.status();
        let (title, detail) = match self {
            Error::Validation(e) => (e.to_string(), None),
            Error::NotImplemented => ("Not Found".to_owned(), Some(self.to_string())),
            Error::NotFound(what) => ("Not Found".to_owned(), Some(what.clone())),
            // the full error carries the portal URL and query, it only goes to the log
            Error::Request(e) if e.is_timeout() => (
                "Bad Gateway".to_owned(),
                Some("upstream portal timed out".to_owned()),
            ),
            Error::Request(_) => (
                "Bad Gateway".to_owned(),
                Some("upstream portal unavailable".to_owned()),
            ),
            Error::Parse(_) | Error::Yaml(_) | Error::Json(_) | Error::Config(_) => (
                "Internal Server Error".to_owned(),
                Some(self.to_string()),
            ),
        };
        Problem {
            status,
            title,
            kind: "about:blank",
            detail,
            args: path.to_owned(),
        }
    }
}

/// `application/problem+json` error body.
#[derive(Debug, Serialize)]
pub struct Problem {
    #[serde(serialize_with = "serialize_status")]
    status: StatusCode,
    title: String,
    #[serde(rename = "type")]
    kind: &'static str,
    detail: Option<String>,
    /// the request path
    args: String,
}

fn serialize_status<S: Serializer>(status: &StatusCode, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u16(status.as_u16())
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let body = serde_json::to_string(&self).unwrap_or_else(|e| {
            log::error!("Failed to serialize problem: {e}");
            format!(r#"{{"status":{},"title":"{}"}}"#, self.status.as_u16(), self.status)
        });
        (
            self.status,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/problem+json"),
            )],
            body,
        )
            .into_response()
    }
}
