//! Passive check for password forms over plain HTTP

use crate::attacks::{AttackError, AttackFuture};
use crate::crawler::{Client, Page};
use crate::output::Log;
use futures::FutureExt;
use scraper::{Html, Selector};

const NAME: &str = "insecure_form";

pub(crate) fn run<'a>(page: &'a Page, _client: &'a Client, log: &'a Log) -> AttackFuture<'a> {
    async move {
        for issue in insecure_password_forms(page) {
            log.add_finding(NAME, page.final_url().as_str(), issue);
        }
        Ok::<(), AttackError>(())
    }
    .boxed()
}

/// Describes every password form that is served or submitted over http
pub(crate) fn insecure_password_forms(page: &Page) -> Vec<String> {
    let (Ok(form_selector), Ok(password_selector)) = (
        Selector::parse("form"),
        Selector::parse("input[type=password]"),
    ) else {
        return Vec::new();
    };

    let document = Html::parse_document(&page.text());
    let page_url = page.final_url();
    let mut issues = Vec::new();

    for form in document.select(&form_selector) {
        if form.select(&password_selector).next().is_none() {
            continue;
        }

        let action = form
            .value()
            .attr("action")
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .and_then(|a| page_url.join(a).ok())
            .unwrap_or_else(|| page_url.clone());

        if page_url.scheme() == "http" {
            issues.push(format!("Password form served over plain HTTP (action {})", action));
        } else if action.scheme() == "http" {
            issues.push(format!("Password form submitted over plain HTTP to {}", action));
        }
    }

    issues
}
