//! One invocation: credentials, session, pipeline, terminal outcome.
use anyhow::anyhow;
use trawl_common::{ErrorRecord, PostRecord, Result, TrawlError};
use trawl_config::{CredentialError, Credentials, TwitterSettings};
use trawl_social::twitter::{FetchPlan, SearchSession, TwitterSession, collect_posts};

use crate::output;

/// How a run ended; every variant renders to exactly one stdout line.
#[derive(Debug)]
pub enum Outcome {
    Records(Vec<PostRecord>),
    Failed(TrawlError),
}

impl Outcome {
    /// Only a session that cannot be built is reported as a process failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Outcome::Failed(TrawlError::ClientUnavailable(_)) => 1,
            _ => 0,
        }
    }

    pub fn render(&self) -> String {
        match self {
            Outcome::Records(records) => output::render(records),
            Outcome::Failed(err) => output::render_error(&ErrorRecord::from(err)),
        }
    }
}

/// Run the pipeline for `plan`.
///
/// Credentials are checked before anything touches the network. The fetch itself runs
/// on its own task so a panic inside it is reported like any other failure.
pub async fn execute(
    plan: FetchPlan,
    settings: TwitterSettings,
    credentials: std::result::Result<Credentials, CredentialError>,
) -> Outcome {
    match run(plan, settings, credentials).await {
        Ok(records) => {
            tracing::info!(records = records.len(), "trawl.done");
            Outcome::Records(records)
        }
        Err(err) => {
            tracing::error!(error = %err, "trawl.failed");
            Outcome::Failed(err)
        }
    }
}

async fn run(
    plan: FetchPlan,
    settings: TwitterSettings,
    credentials: std::result::Result<Credentials, CredentialError>,
) -> Result<Vec<PostRecord>> {
    let credentials = credentials.map_err(|CredentialError::Missing(vars)| {
        TrawlError::MissingCredentials(vars.join(" and "))
    })?;

    let mut session = TwitterSession::new(&settings)
        .map_err(|e| TrawlError::ClientUnavailable(e.to_string()))?;
    session
        .set_cookies(&credentials, true)
        .map_err(|e| TrawlError::CredentialsRejected(e.to_string()))?;

    let plan = plan.with_trend_category(settings.trend_category);
    tracing::info!(
        keywords = plan.keywords.len(),
        count = plan.count,
        product = plan.product.as_str(),
        "trawl.fetch"
    );

    fetch_on_task(session, plan).await
}

/// Run [`collect_posts`] on its own task; a panic there comes back as [`TrawlError::Runtime`].
async fn fetch_on_task<S>(session: S, plan: FetchPlan) -> Result<Vec<PostRecord>>
where
    S: SearchSession + 'static,
{
    tokio::spawn(async move { collect_posts(&session, &plan).await })
        .await
        .map_err(|e| TrawlError::Runtime(anyhow!("fetch task failed: {e}")))
}
