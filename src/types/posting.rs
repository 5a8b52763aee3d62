//! Job posting data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Contact details extracted from a posting.
///
/// Populated by the scraping layer; any subset may be empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactInfo {
    /// Email addresses found in the posting
    #[serde(default)]
    pub emails: Vec<String>,

    /// Phone numbers found in the posting
    #[serde(default)]
    pub phones: Vec<String>,
}

/// A job posting to be evaluated for fraud.
///
/// No field is guaranteed non-empty. A missing field deserializes to its
/// default and is treated as "unknown" downstream, never as an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPosting {
    /// Identifier used to correlate reports with postings
    #[serde(default)]
    pub posting_id: String,

    /// Job title
    #[serde(default)]
    pub title: String,

    /// Full job description
    #[serde(default)]
    pub description: String,

    /// Listed requirements
    #[serde(default)]
    pub requirements: String,

    /// Listed benefits
    #[serde(default)]
    pub benefits: String,

    /// Company self-description
    #[serde(default)]
    pub company_profile: String,

    /// Company name
    #[serde(default)]
    pub company: String,

    /// Location string as posted
    #[serde(default)]
    pub location: String,

    /// Employment type (full-time, part-time, contract, ...)
    #[serde(default)]
    pub employment_type: String,

    /// Industry label as posted
    #[serde(default)]
    pub industry: String,

    /// Contact channels listed in the posting
    #[serde(default)]
    pub contact: ContactInfo,

    /// URL the posting was scraped from
    #[serde(default)]
    pub source_url: String,

    /// Ingestion timestamp
    #[serde(default = "Utc::now")]
    pub scraped_at: DateTime<Utc>,
}

impl Default for JobPosting {
    fn default() -> Self {
        Self {
            posting_id: String::new(),
            title: String::new(),
            description: String::new(),
            requirements: String::new(),
            benefits: String::new(),
            company_profile: String::new(),
            company: String::new(),
            location: String::new(),
            employment_type: String::new(),
            industry: String::new(),
            contact: ContactInfo::default(),
            source_url: String::new(),
            scraped_at: Utc::now(),
        }
    }
}

impl JobPosting {
    /// Create a posting with the fields most tests and tools need.
    pub fn new(posting_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            posting_id: posting_id.into(),
            title: title.into(),
            scraped_at: Utc::now(),
            ..Default::default()
        }
    }

    /// All free-text fields concatenated and lowercased.
    ///
    /// The text models and most explanation rules operate on this view.
    pub fn combined_text(&self) -> String {
        let mut text = String::with_capacity(
            self.title.len()
                + self.description.len()
                + self.requirements.len()
                + self.benefits.len()
                + self.company_profile.len()
                + 5,
        );
        for field in [
            &self.title,
            &self.description,
            &self.requirements,
            &self.benefits,
            &self.company_profile,
        ] {
            if !field.is_empty() {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(field);
            }
        }
        text.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_posting_deserializes_with_missing_fields() {
        let posting: JobPosting =
            serde_json::from_str(r#"{"title": "Data entry clerk"}"#).unwrap();

        assert_eq!(posting.title, "Data entry clerk");
        assert!(posting.description.is_empty());
        assert!(posting.contact.emails.is_empty());
    }

    #[test]
    fn test_combined_text_lowercases_and_joins() {
        let mut posting = JobPosting::new("p1", "Urgent HIRING");
        posting.description = "Earn Thousands weekly".to_string();

        let text = posting.combined_text();
        assert_eq!(text, "urgent hiring earn thousands weekly");
    }

    #[test]
    fn test_posting_serialization_roundtrip() {
        let mut posting = JobPosting::new("p42", "Engineer");
        posting.contact.emails.push("hr@example.com".to_string());

        let json = serde_json::to_string(&posting).unwrap();
        let back: JobPosting = serde_json::from_str(&json).unwrap();

        assert_eq!(back.posting_id, "p42");
        assert_eq!(back.contact.emails, vec!["hr@example.com"]);
    }
}
