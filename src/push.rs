//! Pushgateway client.
//!
//! The exporter is push-based: after each ingested batch the rendered
//! registry snapshot is POSTed to a Prometheus Pushgateway under a job
//! (and optional instance) grouping. Transport and status failures are
//! surfaced to the caller; a swallowed push would silently lose
//! telemetry.

use tracing::{info, warn};

use crate::error::{ExporterError, Result};

/// Client for one configured Pushgateway endpoint.
#[derive(Debug, Clone)]
pub struct PushClient {
    base_url: String,
    job: String,
    instance: Option<String>,
    client: reqwest::Client,
}

impl PushClient {
    pub fn new(base_url: impl Into<String>, job: impl Into<String>, instance: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            job: job.into(),
            instance,
            client: reqwest::Client::new(),
        }
    }

    /// Grouping URL: `{base}/metrics/job/{job}[/instance/{instance}]`.
    pub fn push_url(&self) -> String {
        let mut url = format!(
            "{}/metrics/job/{}",
            self.base_url.trim_end_matches('/'),
            self.job
        );
        if let Some(instance) = &self.instance {
            url.push_str(&format!("/instance/{}", instance));
        }
        url
    }

    /// Push a rendered snapshot to the gateway.
    pub async fn push(&self, snapshot: String) -> Result<()> {
        let url = self.push_url();
        info!("pushgateway: pushing {} bytes to {}", snapshot.len(), url);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "text/plain; version=0.0.4")
            .body(snapshot)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("pushgateway: push failed with status={}", status.as_u16());
            return Err(ExporterError::Push { status: status.as_u16(), body });
        }

        info!("pushgateway: push succeeded for job={}", self.job);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_url_includes_job_grouping() {
        let client = PushClient::new("http://localhost:9091", "tenzir", None);
        assert_eq!(client.push_url(), "http://localhost:9091/metrics/job/tenzir");
    }

    #[test]
    fn push_url_appends_instance_when_set() {
        let client =
            PushClient::new("http://localhost:9091/", "tenzir", Some("node-1".to_string()));
        assert_eq!(
            client.push_url(),
            "http://localhost:9091/metrics/job/tenzir/instance/node-1"
        );
    }
}
