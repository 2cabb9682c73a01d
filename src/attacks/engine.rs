//! Attack engine: runs the probe registry against each page

use crate::attacks::{select_attacks, Attack, AttackError};
use crate::cancel::Cancellation;
use crate::config::AttacksConfig;
use crate::crawler::{Client, Page};
use crate::output::Log;
use crate::ScanError;
use futures::FutureExt;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Applies an ordered set of probes to pages
///
/// A probe that fails or panics is recorded in the log and the next probe
/// still runs. The only errors that escape are a transport failure (which
/// ends the run) and cancellation.
#[derive(Debug, Clone)]
pub struct AttackEngine {
    attacks: Vec<Attack>,
}

impl AttackEngine {
    pub fn new(attacks: Vec<Attack>) -> Self {
        Self { attacks }
    }

    /// Builds an engine with the probes enabled in the configuration
    pub fn from_config(config: &AttacksConfig) -> Self {
        Self::new(select_attacks(config.enabled.as_deref()))
    }

    pub fn attacks(&self) -> &[Attack] {
        &self.attacks
    }

    /// Runs every probe once against `page`
    ///
    /// # Returns
    ///
    /// * `Ok(())` - All probes ran (some may have recorded errors)
    /// * `Err(ScanError::Transport)` - A probe hit a transport failure
    /// * `Err(ScanError::Interrupted)` - Cancellation was requested between probes
    pub async fn run(
        &self,
        page: &Page,
        client: &Client,
        log: &Log,
        cancel: &Cancellation,
    ) -> Result<(), ScanError> {
        let page_url = page.final_url().as_str();

        for attack in &self.attacks {
            if cancel.is_cancelled() {
                return Err(ScanError::Interrupted);
            }

            tracing::debug!("Running {} against {}", attack.name, page_url);
            // A probe can panic while building its future or while polling it
            let started = panic::catch_unwind(AssertUnwindSafe(|| (attack.run)(page, client, log)));
            let outcome = match started {
                Ok(probe) => AssertUnwindSafe(probe).catch_unwind().await,
                Err(panic) => Err(panic),
            };

            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(AttackError::Fetch(err))) if err.is_fatal() => {
                    log.add_error(attack.name, page_url, err.to_string());
                    return Err(err.into());
                }
                Ok(Err(err)) => {
                    tracing::warn!("{} failed on {}: {}", attack.name, page_url, err);
                    log.add_error(attack.name, page_url, err.to_string());
                }
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    tracing::warn!("{} panicked on {}: {}", attack.name, page_url, message);
                    log.add_error(attack.name, page_url, format!("probe panicked: {}", message));
                }
            }
        }

        Ok(())
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
