//! Technology detection for the scan target
//!
//! Signatures look at response headers, cookies, the generator meta tag
//! and a few well-known body markers. The result maps every detected
//! application to the categories it belongs to.

use crate::crawler::{Client, FetchError, Page};
use reqwest::header::SET_COOKIE;
use scraper::{Html, Selector};
use std::collections::{BTreeMap, BTreeSet};
use url::Url;

/// Category name under which content management systems are reported
pub const CMS_CATEGORY: &str = "CMS";

const WEB_SERVERS: &str = "Web servers";
const LANGUAGES: &str = "Programming languages";
const FRAMEWORKS: &str = "Web frameworks";
const JS_LIBRARIES: &str = "JavaScript libraries";

/// Where a signature looks
#[derive(Debug, Clone, Copy)]
enum Evidence {
    /// Header name and lowercase fragment of its value
    Header(&'static str, &'static str),
    /// Lowercase fragment of a cookie name
    Cookie(&'static str),
    /// Lowercase fragment of `<meta name="generator">`
    Generator(&'static str),
    /// Lowercase fragment of the body
    Body(&'static str),
}

struct Signature {
    app: &'static str,
    categories: &'static [&'static str],
    evidence: &'static [Evidence],
}

const SIGNATURES: &[Signature] = &[
    Signature {
        app: "WordPress",
        categories: &[CMS_CATEGORY],
        evidence: &[
            Evidence::Generator("wordpress"),
            Evidence::Body("/wp-content/"),
            Evidence::Body("/wp-includes/"),
            Evidence::Header("link", "wp-json"),
        ],
    },
    Signature {
        app: "Joomla",
        categories: &[CMS_CATEGORY],
        evidence: &[
            Evidence::Generator("joomla"),
            Evidence::Body("/media/jui/"),
            Evidence::Body("/media/system/js/"),
        ],
    },
    Signature {
        app: "Drupal",
        categories: &[CMS_CATEGORY],
        evidence: &[
            Evidence::Generator("drupal"),
            Evidence::Header("x-generator", "drupal"),
            Evidence::Header("x-drupal-cache", ""),
            Evidence::Body("drupal.settings"),
            Evidence::Body("/sites/default/files/"),
        ],
    },
    Signature {
        app: "Nginx",
        categories: &[WEB_SERVERS],
        evidence: &[Evidence::Header("server", "nginx")],
    },
    Signature {
        app: "Apache",
        categories: &[WEB_SERVERS],
        evidence: &[Evidence::Header("server", "apache")],
    },
    Signature {
        app: "IIS",
        categories: &[WEB_SERVERS],
        evidence: &[Evidence::Header("server", "microsoft-iis")],
    },
    Signature {
        app: "PHP",
        categories: &[LANGUAGES],
        evidence: &[
            Evidence::Header("x-powered-by", "php"),
            Evidence::Cookie("phpsessid"),
        ],
    },
    Signature {
        app: "ASP.NET",
        categories: &[FRAMEWORKS],
        evidence: &[
            Evidence::Header("x-powered-by", "asp.net"),
            Evidence::Header("x-aspnet-version", ""),
            Evidence::Cookie("asp.net_sessionid"),
            Evidence::Body("__viewstate"),
        ],
    },
    Signature {
        app: "Express",
        categories: &[FRAMEWORKS],
        evidence: &[Evidence::Header("x-powered-by", "express")],
    },
    Signature {
        app: "Django",
        categories: &[FRAMEWORKS],
        evidence: &[Evidence::Body("csrfmiddlewaretoken")],
    },
    Signature {
        app: "Laravel",
        categories: &[FRAMEWORKS],
        evidence: &[Evidence::Cookie("laravel_session")],
    },
    Signature {
        app: "jQuery",
        categories: &[JS_LIBRARIES],
        evidence: &[Evidence::Body("jquery")],
    },
];

/// Detects the technologies behind `target`
///
/// A target that cannot be fetched as a page yields an empty map; only a
/// transport failure is returned as an error.
pub async fn app_detect(
    target: &Url,
    client: &Client,
) -> Result<BTreeMap<String, BTreeSet<String>>, FetchError> {
    match client.get(target).await {
        Ok(page) => Ok(detect_from_page(&page)),
        Err(err) if err.is_fatal() => Err(err),
        Err(err) => {
            tracing::warn!("Technology detection skipped for {}: {}", target, err);
            Ok(BTreeMap::new())
        }
    }
}

/// Runs every signature against an already fetched page
pub fn detect_from_page(page: &Page) -> BTreeMap<String, BTreeSet<String>> {
    let body = page.text().to_lowercase();
    let generator = meta_generator(&body);
    let cookies: Vec<String> = page
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split('=').next())
        .map(|name| name.trim().to_lowercase())
        .collect();

    let matches = |evidence: &Evidence| match *evidence {
        Evidence::Header(name, needle) => page
            .header(name)
            .map(|v| v.to_lowercase().contains(needle))
            .unwrap_or(false),
        Evidence::Cookie(needle) => cookies.iter().any(|c| c.contains(needle)),
        Evidence::Generator(needle) => generator.as_deref().map_or(false, |g| g.contains(needle)),
        Evidence::Body(needle) => body.contains(needle),
    };

    let mut detected = BTreeMap::new();
    for signature in SIGNATURES {
        if signature.evidence.iter().any(|e| matches(e)) {
            tracing::debug!("Detected {}", signature.app);
            detected.insert(
                signature.app.to_string(),
                signature.categories.iter().map(|c| c.to_string()).collect(),
            );
        }
    }
    detected
}

/// Inverts the detection map into category → applications
pub fn group_by_category(
    apps: &BTreeMap<String, BTreeSet<String>>,
) -> BTreeMap<String, Vec<String>> {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (app, categories) in apps {
        for category in categories {
            grouped.entry(category.clone()).or_default().push(app.clone());
        }
    }
    grouped
}

fn meta_generator(lowercase_body: &str) -> Option<String> {
    let selector = Selector::parse("meta[name=generator]").ok()?;
    let document = Html::parse_document(lowercase_body);
    let content = document
        .select(&selector)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .map(str::to_string);
    content
}
