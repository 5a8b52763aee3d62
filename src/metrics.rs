//! Runtime statistics for the detection service.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for the detection service
pub struct DetectorMetrics {
    /// Total postings analyzed
    pub postings_analyzed: AtomicU64,
    /// Postings flagged as fraudulent
    pub postings_flagged: AtomicU64,
    /// Flagged postings by risk tier
    flagged_by_tier: RwLock<HashMap<String, u64>>,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Fraud probability distribution buckets
    score_buckets: RwLock<[u64; 10]>,
    /// Start time for rate calculation
    start_time: Instant,
    /// Model agreement tracking (how often models agree)
    model_agreements: RwLock<Vec<f64>>,
}

impl DetectorMetrics {
    pub fn new() -> Self {
        Self {
            postings_analyzed: AtomicU64::new(0),
            postings_flagged: AtomicU64::new(0),
            flagged_by_tier: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            score_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
            model_agreements: RwLock::new(Vec::with_capacity(1000)),
        }
    }

    /// Record an analyzed posting
    pub fn record_posting(&self, processing_time: Duration, fraud_probability: f64) {
        self.postings_analyzed.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only the recent window
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }

        let bucket = (fraud_probability * 10.0).min(9.0) as usize;
        if let Ok(mut buckets) = self.score_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Record a flagged posting
    pub fn record_flagged(&self, risk_tier: &str) {
        self.postings_flagged.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut by_tier) = self.flagged_by_tier.write() {
            *by_tier.entry(risk_tier.to_string()).or_insert(0) += 1;
        }
    }

    /// Record the consensus confidence for a prediction (1.0 = the models
    /// fully agreed)
    pub fn record_model_agreement(&self, confidence: f64) {
        if let Ok(mut agreements) = self.model_agreements.write() {
            agreements.push(confidence);
            if agreements.len() > 1000 {
                agreements.drain(0..500);
            }
        }
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let times = self.processing_times.read().unwrap();
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Get average model agreement
    pub fn get_avg_agreement(&self) -> f64 {
        let agreements = self.model_agreements.read().unwrap();
        if agreements.is_empty() {
            return 0.0;
        }
        agreements.iter().sum::<f64>() / agreements.len() as f64
    }

    /// Get current throughput (postings per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.postings_analyzed.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get fraud probability distribution
    pub fn get_score_distribution(&self) -> [u64; 10] {
        *self.score_buckets.read().unwrap()
    }

    /// Get flagged postings by risk tier
    pub fn get_flagged_by_tier(&self) -> HashMap<String, u64> {
        self.flagged_by_tier.read().unwrap().clone()
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let analyzed = self.postings_analyzed.load(Ordering::Relaxed);
        let flagged = self.postings_flagged.load(Ordering::Relaxed);
        let flag_rate = if analyzed > 0 {
            (flagged as f64 / analyzed as f64) * 100.0
        } else {
            0.0
        };

        let processing = self.get_processing_stats();
        let throughput = self.get_throughput();
        let agreement = self.get_avg_agreement();
        let by_tier = self.get_flagged_by_tier();
        let score_dist = self.get_score_distribution();

        info!("=== Job Fraud Detector - Metrics Summary ===");
        info!(
            analyzed = analyzed,
            flagged = flagged,
            flag_rate = format!("{:.1}%", flag_rate),
            throughput = format!("{:.1} postings/s", throughput),
            "Volume"
        );
        info!(
            mean_us = processing.mean_us,
            p50_us = processing.p50_us,
            p95_us = processing.p95_us,
            p99_us = processing.p99_us,
            "Processing time"
        );
        info!(
            agreement = format!("{:.1}%", agreement * 100.0),
            "Model agreement (higher = models agree more)"
        );
        for (tier, count) in &by_tier {
            let pct = if flagged > 0 {
                (*count as f64 / flagged as f64) * 100.0
            } else {
                0.0
            };
            info!(tier = %tier, count = count, share = format!("{:.1}%", pct), "Flagged by tier");
        }
        let total: u64 = score_dist.iter().sum();
        for (i, &count) in score_dist.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let pct = if total > 0 {
                (count as f64 / total as f64) * 100.0
            } else {
                0.0
            };
            info!(
                bucket = format!("{:.1}-{:.1}", i as f64 / 10.0, (i + 1) as f64 / 10.0),
                count = count,
                share = format!("{:.1}%", pct),
                "Score distribution"
            );
        }
    }
}

impl Default for DetectorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Periodic metrics reporter
pub struct MetricsReporter {
    metrics: std::sync::Arc<DetectorMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: std::sync::Arc<DetectorMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
