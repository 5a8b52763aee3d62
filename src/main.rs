//! Job Fraud Detector - Main Entry Point
//!
//! Consumes job postings from NATS, runs the ensemble, and publishes fraud
//! reports. Supports parallel posting processing for high throughput.

use anyhow::Result;
use futures::StreamExt;
use job_fraud_detector::{
    config::AppConfig,
    consumer::PostingConsumer,
    metrics::{DetectorMetrics, MetricsReporter},
    models::EnsembleDetector,
    producer::ReportProducer,
    types::JobPosting,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("job_fraud_detector=info".parse()?),
        )
        .init();

    info!("Starting Job Fraud Detector");

    // Load configuration
    let config = AppConfig::load()?;
    info!("Configuration loaded successfully");

    // Initialize metrics
    let metrics = Arc::new(DetectorMetrics::new());

    // Load the ensemble snapshot
    let mut detector = EnsembleDetector::load(
        &config.models.models_dir,
        config.models.onnx_threads,
        config.explanation.clone(),
    )?;
    detector.set_weights(config.models.weights.clone())?;
    info!(
        "Ensemble detector initialized with {} models: {:?}",
        detector.model_count(),
        detector.model_names()
    );
    let detector = Arc::new(detector);

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    // Initialize consumer and producer
    let consumer = PostingConsumer::new(client.clone(), &config.nats.posting_subject);
    let producer = Arc::new(ReportProducer::new(client.clone(), &config.nats.report_subject));

    let num_workers = config.pipeline.workers;
    info!(
        "Starting posting processing loop with {} parallel workers",
        num_workers
    );
    info!("Listening on subject: {}", config.nats.posting_subject);
    info!("Publishing reports to: {}", config.nats.report_subject);

    // Semaphore to limit concurrent processing
    let semaphore = Arc::new(Semaphore::new(num_workers));
    let processed_count = Arc::new(AtomicU64::new(0));

    // Start metrics reporter (prints summary every 30 seconds)
    let metrics_clone = metrics.clone();
    tokio::spawn(async move {
        let reporter = MetricsReporter::new(metrics_clone, 30);
        reporter.start().await;
    });

    // Process postings in parallel
    let mut subscription = consumer.subscribe().await?;

    while let Some(message) = subscription.next().await {
        // Acquire permit (limits concurrent tasks)
        let permit = semaphore.clone().acquire_owned().await.unwrap();

        let detector = detector.clone();
        let producer = producer.clone();
        let metrics = metrics.clone();
        let processed_count = processed_count.clone();

        tokio::spawn(async move {
            let start_time = Instant::now();

            match serde_json::from_slice::<JobPosting>(&message.payload) {
                Ok(posting) => {
                    let posting_id = posting.posting_id.clone();

                    match detector.predict(&posting) {
                        Ok(prediction) => {
                            let processing_time = start_time.elapsed();

                            metrics.record_posting(
                                processing_time,
                                prediction.consensus.fraud_probability,
                            );
                            metrics.record_model_agreement(prediction.consensus.confidence);

                            let report = prediction.to_report(&posting);

                            if report.is_fraudulent {
                                metrics.record_flagged(
                                    &format!("{:?}", report.risk_tier).to_lowercase(),
                                );
                                info!(
                                    posting_id = %posting_id,
                                    confidence_score = report.confidence_score,
                                    risk_tier = ?report.risk_tier,
                                    reasons = report.reasons.len(),
                                    processing_time_us = processing_time.as_micros(),
                                    "Posting flagged as fraudulent"
                                );
                            } else {
                                debug!(
                                    posting_id = %posting_id,
                                    confidence_score = report.confidence_score,
                                    processing_time_us = processing_time.as_micros(),
                                    "Posting looks legitimate"
                                );
                            }

                            if let Err(e) = producer.publish(&report).await {
                                error!(
                                    posting_id = %posting_id,
                                    error = %e,
                                    "Failed to publish fraud report"
                                );
                            }

                            let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;

                            // Log progress every 100 postings
                            if count % 100 == 0 {
                                let throughput = metrics.get_throughput();
                                let processing_stats = metrics.get_processing_stats();
                                info!(
                                    processed = count,
                                    throughput = format!("{:.1} postings/s", throughput),
                                    avg_latency_us = processing_stats.mean_us,
                                    "Processing milestone"
                                );
                            }
                        }
                        Err(e) => {
                            error!(
                                posting_id = %posting_id,
                                error = %e,
                                "Prediction failed"
                            );
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to deserialize posting");
                }
            }

            drop(permit);
        });
    }

    info!("Detector shutting down...");
    metrics.print_summary();

    Ok(())
}
