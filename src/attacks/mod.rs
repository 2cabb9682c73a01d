//! Attack probes and the engine that dispatches them
//!
//! Every probe has the same shape: it receives a shared reference to a
//! fetched page, the client (and therefore the run's cookie session) and
//! the result log, and records what it finds in the log. Probes are
//! registered in [`all_attacks`], which fixes the order they run in.

mod cms;
mod detect;
mod engine;
mod forms;
mod headers;
mod sqli;
mod xss;

pub use cms::{attack_cms, cms_paths};
pub use detect::{app_detect, detect_from_page, group_by_category, CMS_CATEGORY};
pub use engine::AttackEngine;

use crate::crawler::{Client, FetchError, Page};
use crate::output::Log;
use futures::future::BoxFuture;
use std::fmt;
use thiserror::Error;
use url::Url;

/// Future returned by a probe
pub type AttackFuture<'a> = BoxFuture<'a, Result<(), AttackError>>;

/// Probe entry point
pub type AttackFn = for<'a> fn(&'a Page, &'a Client, &'a Log) -> AttackFuture<'a>;

/// Errors a probe can fail with
#[derive(Debug, Error)]
pub enum AttackError {
    #[error("Request failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("{0}")]
    Failed(String),
}

/// A registered probe
#[derive(Clone, Copy)]
pub struct Attack {
    pub name: &'static str,
    pub run: AttackFn,
}

impl fmt::Debug for Attack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attack").field("name", &self.name).finish()
    }
}

/// Returns every probe, in the order they run
pub fn all_attacks() -> Vec<Attack> {
    vec![
        Attack {
            name: "xss",
            run: xss::run,
        },
        Attack {
            name: "sqli",
            run: sqli::run,
        },
        Attack {
            name: "security_headers",
            run: headers::run,
        },
        Attack {
            name: "insecure_form",
            run: forms::run,
        },
    ]
}

/// Returns the probes named in `enabled`, keeping registry order
///
/// `None` selects every probe.
pub fn select_attacks(enabled: Option<&[String]>) -> Vec<Attack> {
    match enabled {
        None => all_attacks(),
        Some(names) => all_attacks()
            .into_iter()
            .filter(|attack| names.iter().any(|n| n == attack.name))
            .collect(),
    }
}

/// Fetches a mutated URL for an active probe
///
/// Recoverable fetch failures yield `Ok(None)`; transport failures are
/// returned so the engine can end the run.
pub(crate) async fn fetch_variant(client: &Client, url: &Url) -> Result<Option<Page>, AttackError> {
    match client.get(url).await {
        Ok(page) => Ok(Some(page)),
        Err(err) if err.is_fatal() => Err(err.into()),
        Err(err) => {
            tracing::debug!("Variant {} not usable: {}", url, err);
            Ok(None)
        }
    }
}

/// Returns a copy of `url` with the value of the `index`-th query
/// parameter replaced
pub(crate) fn replace_query_param(url: &Url, index: usize, value: &str) -> Url {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .enumerate()
        .map(|(i, (k, v))| {
            if i == index {
                (k.into_owned(), value.to_string())
            } else {
                (k.into_owned(), v.into_owned())
            }
        })
        .collect();

    let mut mutated = url.clone();
    mutated.query_pairs_mut().clear().extend_pairs(pairs);
    mutated
}

/// Names of the query parameters of `url`, in order
pub(crate) fn query_param_names(url: &Url) -> Vec<String> {
    url.query_pairs().map(|(k, _)| k.into_owned()).collect()
}
