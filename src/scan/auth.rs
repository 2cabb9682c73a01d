//! Login form submission before the scan

use crate::crawler::Client;
use crate::url::normalize_url;
use crate::{ConfigError, ScanError};
use url::Url;

/// A login request given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthData {
    pub url: Url,
    pub fields: Vec<(String, String)>,
}

impl AuthData {
    /// Builds the login request from `URL name=value name=value`
    ///
    /// Each field is split on its first `=`; a field without `=` is sent
    /// with an empty value.
    pub fn from_args(url: &str, user_field: &str, pass_field: &str) -> Result<Self, ConfigError> {
        let url = normalize_url(url)
            .map_err(|e| ConfigError::InvalidAuth(format!("login URL '{}': {}", url, e)))?;

        let fields = [user_field, pass_field]
            .iter()
            .map(|arg| parse_field(arg))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { url, fields })
    }
}

fn parse_field(arg: &str) -> Result<(String, String), ConfigError> {
    let (name, value) = arg.split_once('=').unwrap_or((arg, ""));
    if name.trim().is_empty() {
        return Err(ConfigError::InvalidAuth(format!(
            "'{}' has no field name, expected name=value",
            arg
        )));
    }
    Ok((name.trim().to_string(), value.to_string()))
}

/// Submits the login form through the shared session
///
/// A login that does not land on a page is logged and the scan goes on
/// unauthenticated; only a transport failure is returned.
pub async fn authenticate(auth: &AuthData, client: &Client) -> Result<(), ScanError> {
    tracing::info!("Logging in at {}", auth.url);

    match client.post(&auth.url, &auth.fields).await {
        Ok(page) => {
            tracing::info!(
                "Login request answered [{}] {}",
                page.status_code(),
                page.final_url()
            );
            Ok(())
        }
        Err(err) if err.is_fatal() => Err(err.into()),
        Err(err) => {
            tracing::warn!("Login failed ({}), continuing unauthenticated", err);
            Ok(())
        }
    }
}
