//! Error-based SQL injection probe

use crate::attacks::{query_param_names, replace_query_param, AttackError, AttackFuture};
use crate::crawler::{Client, FetchError, Page};
use crate::output::Log;
use futures::FutureExt;

const NAME: &str = "sqli";

/// Lowercased fragments of database error messages
const SQL_ERRORS: &[&str] = &[
    "you have an error in your sql syntax",
    "warning: mysql_",
    "mysql_fetch_",
    "mysqli_sql_exception",
    "unclosed quotation mark after the character string",
    "quoted string not properly terminated",
    "ora-01756",
    "ora-00933",
    "pg_query(): query failed",
    "syntax error at or near",
    "unterminated quoted string at or near",
    "sqlite3::",
    "sqlite_error",
    "sqlstate[",
    "microsoft ole db provider for sql server",
    "odbc sql server driver",
];

pub(crate) fn run<'a>(page: &'a Page, client: &'a Client, log: &'a Log) -> AttackFuture<'a> {
    probe(page, client, log).boxed()
}

/// Returns the first SQL error signature found in `body`
pub(crate) fn find_sql_error(body: &str) -> Option<&'static str> {
    let body = body.to_lowercase();
    SQL_ERRORS.iter().copied().find(|sig| body.contains(sig))
}

async fn probe(page: &Page, client: &Client, log: &Log) -> Result<(), AttackError> {
    let url = page.final_url();

    // A page that already shows a database error proves nothing
    if find_sql_error(&page.text()).is_some() {
        tracing::debug!("{} already contains SQL errors, skipping", url);
        return Ok(());
    }

    for (index, param) in query_param_names(url).iter().enumerate() {
        let original = url
            .query_pairs()
            .nth(index)
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default();
        let mutated = replace_query_param(url, index, &format!("{}'", original));

        match client.get(&mutated).await {
            Ok(response) => {
                if let Some(signature) = find_sql_error(&response.text()) {
                    log.add_finding(
                        NAME,
                        url.as_str(),
                        format!(
                            "Parameter '{}' triggers a database error (\"{}\")",
                            param, signature
                        ),
                    );
                }
            }
            Err(FetchError::BadStatus(500)) => {
                log.add_finding(
                    NAME,
                    url.as_str(),
                    format!("Parameter '{}' causes a server error with a quote appended", param),
                );
            }
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => tracing::debug!("{} not usable: {}", mutated, err),
        }
    }

    Ok(())
}
