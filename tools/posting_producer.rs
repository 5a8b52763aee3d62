//! Test Posting Producer
//!
//! Generates and publishes sample job postings to NATS for pipeline testing.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Posting structure matching the detector's expected format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct JobPosting {
    posting_id: String,
    title: String,
    description: String,
    requirements: String,
    benefits: String,
    company_profile: String,
    company: String,
    location: String,
    employment_type: String,
    industry: String,
    contact: ContactInfo,
    source_url: String,
    scraped_at: chrono::DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ContactInfo {
    emails: Vec<String>,
    phones: Vec<String>,
}

/// Posting generator for testing
struct PostingGenerator {
    rng: rand::rngs::ThreadRng,
    posting_counter: u64,
}

impl PostingGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            posting_counter: 0,
        }
    }

    /// Generate a plausible legitimate posting
    fn generate_legitimate(&mut self) -> JobPosting {
        self.posting_counter += 1;

        let title = self
            .random_choice(&[
                "Backend Engineer",
                "Accountant",
                "Warehouse Operative",
                "Customer Support Specialist",
                "Registered Nurse",
            ])
            .to_string();

        JobPosting {
            posting_id: format!("post_{:012}", self.posting_counter),
            title,
            description: "We are expanding our team and looking for a motivated colleague. \
                You will work with an experienced group on day-to-day operations, receive \
                structured onboarding, and report to the department lead. The annual salary \
                range is 48000-62000 depending on experience, with 25 days of paid leave, \
                a pension plan, and an annual training budget. The interview process has \
                two rounds: a phone screening with HR and an on-site conversation with the \
                team. We value reliability, clear communication and attention to detail, \
                and we support flexible working hours where the role allows it."
                .to_string(),
            requirements: "2+ years of relevant experience, fluent English, eligibility to \
                work in the EU."
                .to_string(),
            benefits: "Pension plan, annual training budget, subsidized lunch.".to_string(),
            company_profile: "Nordvik Logistics A/S operates distribution centers in four \
                countries, employs around 900 people and has been family-owned since 1974. \
                Learn more at nordvik-logistics.example."
                .to_string(),
            company: "Nordvik Logistics".to_string(),
            location: self.random_choice(&["Oslo", "Hamburg", "Rotterdam", "Gdansk"]).to_string(),
            employment_type: self.random_choice(&["Full-time", "Part-time"]).to_string(),
            industry: self
                .random_choice(&["Logistics", "Healthcare", "Finance", "Technology"])
                .to_string(),
            contact: ContactInfo {
                emails: vec!["careers@nordvik-logistics.example".to_string()],
                phones: vec!["+47 22 00 00 00".to_string()],
            },
            source_url: "https://jobs.example/nordvik".to_string(),
            scraped_at: Utc::now(),
        }
    }

    /// Generate a suspicious posting full of known red flags
    fn generate_suspicious(&mut self) -> JobPosting {
        self.posting_counter += 1;

        JobPosting {
            posting_id: format!("post_{:012}", self.posting_counter),
            title: "URGENT - no experience needed - immediate start!!!".to_string(),
            description: "Earn thousands per week from home with this easy money \
                opportunity! Unlimited income potential, be your own boss, no risk at all. \
                Apply today, positions filling fast. To secure your spot, pay the small \
                registration fee and send your bank account details and a copy of your \
                passport over WhatsApp. Financial freedom is one click away!"
                .to_string(),
            requirements: String::new(),
            benefits: "Quick money".to_string(),
            company_profile: String::new(),
            company: String::new(),
            location: "Remote".to_string(),
            employment_type: String::new(),
            industry: String::new(),
            contact: ContactInfo {
                emails: vec![
                    format!("hiring{}@gmail.com", self.rng.gen_range(100..999)),
                    "recruiter.fast@yahoo.com".to_string(),
                ],
                phones: vec![],
            },
            source_url: "https://jobs.example/unknown".to_string(),
            scraped_at: Utc::now(),
        }
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("posting_producer=info".parse()?),
        )
        .init();

    info!("Starting Test Posting Producer");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("postings");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let fraud_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.1);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        fraud_rate = fraud_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    // Connect to NATS
    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, fraud_rate, delay_ms).await;
        }
    };

    // Generate and publish postings
    let mut generator = PostingGenerator::new();
    let mut rng = rand::thread_rng();

    info!("Starting to publish {} postings...", count);

    let mut legitimate_count = 0;
    let mut suspicious_count = 0;

    for i in 0..count {
        let posting = if rng.gen_bool(fraud_rate) {
            suspicious_count += 1;
            generator.generate_suspicious()
        } else {
            legitimate_count += 1;
            generator.generate_legitimate()
        };

        let payload = serde_json::to_vec(&posting)?;

        client.publish(subject.to_string(), payload.into()).await?;

        if (i + 1) % 10 == 0 {
            info!(
                "Published {}/{} postings ({} legitimate, {} suspicious)",
                i + 1,
                count,
                legitimate_count,
                suspicious_count
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Published {} postings ({} legitimate, {} suspicious)",
        count, legitimate_count, suspicious_count
    );

    Ok(())
}

async fn run_dry_mode(count: u64, fraud_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = PostingGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let posting = if rng.gen_bool(fraud_rate) {
            generator.generate_suspicious()
        } else {
            generator.generate_legitimate()
        };

        let json = serde_json::to_string_pretty(&posting)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample posting {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
