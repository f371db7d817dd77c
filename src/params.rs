//! Allow-list and character checks for incoming query parameters.
use std::{
    collections::BTreeMap,
    fmt::{self, Display, Formatter},
};

pub type Params = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// None of the mandatory-or parameters was given.
    Missing(&'static [&'static str]),
    Unsupported(String),
    InvalidCharacters(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(names) => write!(
                f,
                "At least one of the following parameter is required: [{}]",
                names.join(", ")
            ),
            Self::Unsupported(name) => write!(f, "Parameter not supported: {name}"),
            Self::InvalidCharacters(name) => write!(
                f,
                "Only alphanumeric ascii characters are allowed for: {name}"
            ),
        }
    }
}

impl std::error::Error for Error {}

/// Accepts `params` when at least one of `mandatory_or` is present, every
/// name is in `mandatory_or` or `extra`, and every value is non-empty ASCII
/// alphanumeric. Each rejection is logged before it is returned.
pub fn validate(
    params: &Params,
    mandatory_or: &'static [&'static str],
    extra: &[&str],
) -> Result<(), Error> {
    let check = || {
        if !params.keys().any(|name| listed(mandatory_or, name)) {
            return Err(Error::Missing(mandatory_or));
        }
        for (name, value) in params {
            if !listed(mandatory_or, name) && !listed(extra, name) {
                return Err(Error::Unsupported(name.clone()));
            }
            if value.is_empty() || !value.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(Error::InvalidCharacters(name.clone()));
            }
        }
        Ok(())
    };
    check().inspect_err(|e| log::error!("{e}"))
}

fn listed(names: &[&str], name: &str) -> bool {
    names.iter().any(|n| *n == name)
}
