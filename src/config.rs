use std::{env, net::SocketAddr, str::FromStr, time::Duration};

use url::Url;

use crate::error::Error;

pub const DEFAULT_PORTAL_URL: &str = "https://www.salutelazio.it/ricerca-medici";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub addr: SocketAddr,
    pub portal: Url,
    /// Upper bound for the single upstream request.
    pub timeout: Duration,
}

impl Config {
    /// Reads `HOST`, `PORT`, `PORTAL_URL` and `PORTAL_TIMEOUT_SECS`.
    pub fn from_env() -> crate::Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> crate::Result<Self> {
        let host = var("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = var("PORT").unwrap_or_else(|| "3000".to_string());
        let addr = SocketAddr::from_str(format!("{host}:{port}").as_str())
            .map_err(|e| Error::Config(format!("invalid HOST/PORT {host}:{port}: {e}")))?;

        let portal = var("PORTAL_URL").unwrap_or_else(|| DEFAULT_PORTAL_URL.to_string());
        let portal = Url::parse(&portal)
            .map_err(|e| Error::Config(format!("invalid PORTAL_URL {portal}: {e}")))?;

        let timeout = match var("PORTAL_TIMEOUT_SECS") {
            Some(secs) => secs
                .parse()
                .map_err(|e| Error::Config(format!("invalid PORTAL_TIMEOUT_SECS {secs}: {e}")))?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        if timeout == 0 {
            return Err(Error::Config("PORTAL_TIMEOUT_SECS must be positive".into()));
        }

        Ok(Self {
            addr,
            portal,
            timeout: Duration::from_secs(timeout),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> crate::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.addr, "127.0.0.1:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.portal.as_str(), DEFAULT_PORTAL_URL);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "8080"),
            ("PORTAL_URL", "http://localhost:9000/ricerca-medici"),
            ("PORTAL_TIMEOUT_SECS", "3"),
        ])
        .unwrap();
        assert_eq!(config.addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.portal.port(), Some(9000));
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_invalid() {
        assert!(matches!(config(&[("PORT", "http")]), Err(Error::Config(_))));
        assert!(matches!(config(&[("PORTAL_URL", "not a url")]), Err(Error::Config(_))));
        assert!(matches!(
            config(&[("PORTAL_TIMEOUT_SECS", "soon")]),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            config(&[("PORTAL_TIMEOUT_SECS", "0")]),
            Err(Error::Config(_))
        ));
    }
}
