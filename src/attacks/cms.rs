//! CMS-specific checks, run once per scan

use crate::attacks::AttackError;
use crate::crawler::{Client, FetchError};
use crate::output::Log;
use url::Url;

const NAME: &str = "cms";

/// Sensitive paths worth checking for a given CMS
///
/// Paths are relative to the CMS install directory.
pub fn cms_paths(cms: &str) -> &'static [&'static str] {
    match cms.to_lowercase().as_str() {
        "wordpress" => &[
            "wp-login.php",
            "xmlrpc.php",
            "readme.html",
            "wp-config.php.bak",
            "wp-json/wp/v2/users",
        ],
        "joomla" => &[
            "administrator/",
            "configuration.php~",
            "README.txt",
            "htaccess.txt",
        ],
        "drupal" => &[
            "CHANGELOG.txt",
            "core/CHANGELOG.txt",
            "user/login",
            "install.php",
        ],
        _ => &[],
    }
}

/// Directories the CMS may be installed under: the target's own
/// directory, then the host root when that differs
pub(crate) fn install_bases(target: &Url) -> Vec<Url> {
    let mut bases: Vec<Url> = Vec::new();
    for base in [target.join("./"), target.join("/")].into_iter().flatten() {
        if !bases.contains(&base) {
            bases.push(base);
        }
    }
    bases
}

/// Probes the sensitive paths of `cms` on the target
///
/// Every path that answers (as a page or as static content) is recorded
/// as a finding against the target URL.
pub async fn attack_cms(
    cms: &str,
    target: &Url,
    client: &Client,
    log: &Log,
) -> Result<(), AttackError> {
    let paths = cms_paths(cms);
    if paths.is_empty() {
        tracing::debug!("No CMS checks for {}", cms);
        return Ok(());
    }

    tracing::info!("Running {} checks against {}", cms, target);
    for base in install_bases(target) {
        for path in paths {
            let url = base
                .join(path)
                .map_err(|e| AttackError::Failed(format!("bad path {}: {}", path, e)))?;

            let exposed = match client.get(&url).await {
                Ok(_) | Err(FetchError::NotAPage { .. }) => true,
                Err(err) if err.is_fatal() => return Err(err.into()),
                Err(_) => false,
            };

            if exposed {
                log.add_finding(
                    NAME,
                    target.as_str(),
                    format!("{} resource exposed: {}", cms, url),
                );
            }
        }
    }

    Ok(())
}
