use std::time::{Duration, Instant};

use reqwest::{Client, Error as RequestError};
use tracing::{instrument, Level};
use url::Url;

use crate::params::Params;
use crate::parse::static_selector::StaticSelector;

/// Boilerplate every `ricerca-medici` request carries, captured from the portal.
const BASE_QUERY: [(&str, &str); 11] = [
    ("p_l_id", "16262"),
    ("p_p_lifecycle", "0"),
    ("p_t_lifecycle", "0"),
    ("p_p_state", "normal"),
    ("p_p_mode", "view"),
    ("p_p_col_id", "column-1"),
    ("p_p_col_pos", "2"),
    ("p_p_col_count", "4"),
    ("p_p_isolated", "1"),
    ("currentURL", "/ricerca-medici"),
    ("portletAjaxable", "1"),
];

/// One portlet instance of the portal page.
///
/// Its parameters travel as `_<id>_<field>` and its results come back in the
/// `value` of the hidden `<input>` matched by `results`. A request must carry
/// at least one of `required_any`; `fields` is everything it may carry.
#[derive(Debug)]
pub struct Portlet {
    pub id: &'static str,
    pub required_any: &'static [&'static str],
    pub fields: &'static [&'static str],
    pub results: StaticSelector<'static>,
}

pub static SEARCH_PORTLET: Portlet = Portlet {
    id: "genericlist_WAR_laitumsportlet_INSTANCE_gIo787T487Lc",
    required_any: &["surname", "zip"],
    fields: &["surname", "zip", "asl", "name", "type", "delta"],
    results: StaticSelector::new(
        r#"input[name="_genericlist_WAR_laitumsportlet_INSTANCE_gIo787T487Lc_doctorsSearchContainerPrimaryKeys"]"#,
    ),
};

pub static OFFICE_HOURS_PORTLET: Portlet = Portlet {
    id: "genericlist_WAR_laitumsportlet_INSTANCE_zCFf5bBop3s7",
    required_any: &["taxCode"],
    fields: &["taxCode"],
    results: StaticSelector::new(
        r#"input[name="_genericlist_WAR_laitumsportlet_INSTANCE_zCFf5bBop3s7_ambulatoriesSearchContainerPrimaryKeys"]"#,
    ),
};

impl Portlet {
    /// Base template, then `p_p_id`, then the recognized `params` in field order.
    /// Anything in `params` the portlet does not declare is left out.
    pub fn query(&self, params: &Params) -> Vec<(String, String)> {
        let mut query: Vec<(String, String)> = BASE_QUERY
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        query.push(("p_p_id".to_owned(), self.id.to_owned()));
        for field in self.fields {
            if let Some(value) = params.get(*field) {
                query.push((format!("_{}_{field}", self.id), value.clone()));
            }
        }
        query
    }
}

pub fn make_client(timeout: Duration) -> Result<Client, RequestError> {
    Client::builder().gzip(true).timeout(timeout).build()
}

/// Performs the single upstream GET for a request. No retries.
#[instrument(skip_all, fields(portlet = portlet.id), level = Level::TRACE)]
pub async fn fetch_page(
    client: &Client,
    portal: &Url,
    portlet: &Portlet,
    params: &Params,
) -> Result<String, RequestError> {
    let mut url = portal.clone();
    url.query_pairs_mut().extend_pairs(portlet.query(params));
    let start = Instant::now();
    let res = client.get(url).send().await?.error_for_status()?;
    let text = res.text().await?;
    log::debug!("Got portal page in \t {:?}", start.elapsed());
    Ok(text)
}
