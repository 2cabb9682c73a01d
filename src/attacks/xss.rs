//! Reflected XSS probe
//!
//! Each query parameter in turn is replaced by a payload carrying a
//! unique tag-shaped marker. If the marker comes back unescaped, the
//! parameter is reflected into markup.

use crate::attacks::{fetch_variant, query_param_names, replace_query_param, AttackError, AttackFuture};
use crate::crawler::{Client, Page};
use crate::output::Log;
use futures::FutureExt;

const NAME: &str = "xss";

pub(crate) fn run<'a>(page: &'a Page, client: &'a Client, log: &'a Log) -> AttackFuture<'a> {
    probe(page, client, log).boxed()
}

fn marker(index: usize) -> String {
    format!("<scnr{}>", index)
}

fn payload(index: usize) -> String {
    format!("\"'>{}", marker(index))
}

async fn probe(page: &Page, client: &Client, log: &Log) -> Result<(), AttackError> {
    let url = page.final_url();

    for (index, param) in query_param_names(url).iter().enumerate() {
        let mutated = replace_query_param(url, index, &payload(index));
        let Some(response) = fetch_variant(client, &mutated).await? else {
            continue;
        };

        if response.text().contains(&marker(index)) {
            log.add_finding(
                NAME,
                url.as_str(),
                format!("Parameter '{}' is reflected unescaped ({})", param, mutated),
            );
        }
    }

    Ok(())
}
