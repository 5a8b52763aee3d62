//! NATS message producer for fraud reports

use crate::types::FraudReport;
use anyhow::Result;
use async_nats::Client;
use tracing::{debug, error};

/// Producer for publishing fraud reports to NATS
#[derive(Clone)]
pub struct ReportProducer {
    client: Client,
    subject: String,
}

impl ReportProducer {
    /// Create a new report producer
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Publish a fraud report
    pub async fn publish(&self, report: &FraudReport) -> Result<()> {
        let payload = serde_json::to_vec(report)?;

        self.client
            .publish(self.subject.clone(), payload.into())
            .await?;

        debug!(
            report_id = %report.report_id,
            posting_id = %report.posting_id,
            confidence_score = report.confidence_score,
            "Published fraud report"
        );

        Ok(())
    }

    /// Publish multiple reports in batch
    pub async fn publish_batch(&self, reports: &[FraudReport]) -> Result<()> {
        for report in reports {
            if let Err(e) = self.publish(report).await {
                error!(
                    report_id = %report.report_id,
                    error = %e,
                    "Failed to publish report"
                );
            }
        }
        Ok(())
    }

    /// Get the subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

#[cfg(test)]
mod tests {
    // Integration tests would require a running NATS server
}
