//! Declarative rule catalogue for explanation generation.
//!
//! A rule pairs a trigger with a fixed human-readable message, grouped by
//! evidence category. Triggers are case-insensitive substring tests, word
//! boundary regexes, or structural checks over the posting, its contact
//! fields, and the per-model probabilities. Rules are evaluated in insertion
//! order within a category, and every category is evaluated unconditionally
//! so independent reasons can surface in one pass.

use crate::error::DetectorError;
use crate::models::adapter::ModelVerdict;
use crate::models::consensus::ConsensusResult;
use crate::types::JobPosting;
use regex::Regex;
use tracing::warn;

/// Evidence category a rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleCategory {
    TitlePhrasing,
    UnrealisticPromise,
    FeeRequest,
    VagueDescription,
    UnprofessionalLanguage,
    UnusualContactChannel,
    SensitiveInfoRequest,
    MissingCompanyEvidence,
    MissingSalaryEvidence,
    ModelSignal,
}

/// Everything a trigger may inspect, with the text views lowercased once.
pub struct RuleContext<'a> {
    pub posting: &'a JobPosting,
    pub consensus: &'a ConsensusResult,
    pub verdicts: &'a [(String, ModelVerdict)],
    pub title: String,
    pub description: String,
    pub combined: String,
}

impl<'a> RuleContext<'a> {
    pub fn new(
        posting: &'a JobPosting,
        consensus: &'a ConsensusResult,
        verdicts: &'a [(String, ModelVerdict)],
    ) -> Self {
        Self {
            posting,
            consensus,
            verdicts,
            title: posting.title.to_lowercase(),
            description: posting.description.to_lowercase(),
            combined: posting.combined_text(),
        }
    }

    fn verdict(&self, model: &str) -> Option<f64> {
        self.verdicts
            .iter()
            .find(|(name, _)| name == model)
            .map(|(_, v)| v.probability)
    }
}

/// Which text view a pattern is tested against.
#[derive(Debug, Clone, Copy)]
enum Scope {
    Title,
    Description,
    Combined,
}

enum Trigger {
    /// Case-insensitive substring test (patterns are stored lowercase).
    Contains(Scope, &'static str),
    /// Regex test against a lowercased text view.
    Matches(Scope, Regex),
    /// Structural check over posting, contact fields, or model outputs.
    Check(fn(&RuleContext) -> Result<bool, DetectorError>),
}

/// One explanation rule.
pub struct Rule {
    pub category: RuleCategory,
    pub message: &'static str,
    trigger: Trigger,
}

impl Rule {
    /// Whether this rule fires for the given context.
    ///
    /// A failing structural check is an error for the caller to isolate,
    /// never a panic.
    pub fn matches(&self, ctx: &RuleContext) -> Result<bool, DetectorError> {
        let text_for = |scope: Scope| match scope {
            Scope::Title => &ctx.title,
            Scope::Description => &ctx.description,
            Scope::Combined => &ctx.combined,
        };
        match &self.trigger {
            Trigger::Contains(scope, pattern) => Ok(text_for(*scope).contains(pattern)),
            Trigger::Matches(scope, regex) => Ok(regex.is_match(text_for(*scope))),
            Trigger::Check(check) => check(ctx),
        }
    }
}

/// Ordered rule catalogue.
pub struct RuleSet {
    rules: Vec<Rule>,
}

/// Email providers that indicate a personal rather than corporate sender.
const PERSONAL_EMAIL_DOMAINS: [&str; 6] = [
    "gmail.com",
    "yahoo.com",
    "hotmail.com",
    "outlook.com",
    "aol.com",
    "mail.com",
];

fn has_personal_email(ctx: &RuleContext) -> Result<bool, DetectorError> {
    Ok(ctx.posting.contact.emails.iter().any(|email| {
        let email = email.to_lowercase();
        PERSONAL_EMAIL_DOMAINS
            .iter()
            .any(|domain| email.ends_with(&format!("@{domain}")))
    }))
}

fn has_multiple_emails(ctx: &RuleContext) -> Result<bool, DetectorError> {
    Ok(ctx.posting.contact.emails.len() > 1)
}

fn company_name_missing(ctx: &RuleContext) -> Result<bool, DetectorError> {
    Ok(ctx.posting.company.trim().len() < 2)
}

fn company_profile_thin(ctx: &RuleContext) -> Result<bool, DetectorError> {
    Ok(ctx.posting.company_profile.len() < 100)
}

fn description_short(ctx: &RuleContext) -> Result<bool, DetectorError> {
    let words = ctx.posting.description.split_whitespace().count();
    Ok(words > 0 && words < 100)
}

fn salary_unmentioned(ctx: &RuleContext) -> Result<bool, DetectorError> {
    Ok(!ctx.description.contains("salary"))
}

fn text_model_confident(ctx: &RuleContext) -> Result<bool, DetectorError> {
    Ok(ctx.verdict("logistic_regression").unwrap_or(0.0) > 0.8)
}

fn forest_model_confident(ctx: &RuleContext) -> Result<bool, DetectorError> {
    Ok(ctx.verdict("random_forest").unwrap_or(0.0) > 0.8)
}

fn most_models_confident(ctx: &RuleContext) -> Result<bool, DetectorError> {
    let confident = ctx
        .verdicts
        .iter()
        .filter(|(_, v)| v.probability > 0.7)
        .count();
    Ok(confident >= 3)
}

impl RuleSet {
    /// The standard catalogue.
    pub fn standard() -> Self {
        let mut set = Self { rules: Vec::new() };

        // Title phrasing and urgency tactics
        set.contains(RuleCategory::TitlePhrasing, Scope::Title, "unlimited income",
            "Job title promises \"unlimited income\" (common in scams)");
        set.contains(RuleCategory::TitlePhrasing, Scope::Title, "opportunity of a lifetime",
            "Job titled as \"opportunity of a lifetime\" (suspicious phrasing)");
        set.contains(RuleCategory::TitlePhrasing, Scope::Title, "urgent",
            "Urgency in job title creates pressure to apply quickly (common scam tactic)");
        set.contains(RuleCategory::TitlePhrasing, Scope::Title, "no experience",
            "Job title indicates \"no experience\" needed despite high pay");
        set.contains(RuleCategory::TitlePhrasing, Scope::Title, "immediate start",
            "Job title emphasizes \"immediate start\" (creates artificial urgency)");
        for pattern in [
            "immediate start",
            "urgent",
            "apply now",
            "don't delay",
            "immediate opening",
            "apply today",
            "positions filling fast",
        ] {
            set.contains(RuleCategory::TitlePhrasing, Scope::Combined, pattern,
                "Creates false urgency to pressure quick applications");
        }

        // Unrealistic promises
        set.contains(RuleCategory::UnrealisticPromise, Scope::Description, "unlimited earning",
            "Promises \"unlimited earning potential\" (unrealistic)");
        set.contains(RuleCategory::UnrealisticPromise, Scope::Description, "unlimited income",
            "Claims \"unlimited income\" is possible (unrealistic)");
        set.contains(RuleCategory::UnrealisticPromise, Scope::Description, "quick money",
            "Promises \"quick money\" or fast wealth");
        set.contains(RuleCategory::UnrealisticPromise, Scope::Description, "earn thousands",
            "Guarantees unrealistic earnings like \"thousands per week\"");
        set.contains(RuleCategory::UnrealisticPromise, Scope::Description, "millionaire",
            "Suggests you can become a millionaire quickly");
        set.contains(RuleCategory::UnrealisticPromise, Scope::Description, "easy money",
            "Promotes \"easy money\" with minimal effort");
        set.contains(RuleCategory::UnrealisticPromise, Scope::Description, "be your own boss",
            "Emphasizes \"be your own boss\" without business details");
        set.contains(RuleCategory::UnrealisticPromise, Scope::Description, "no risk",
            "Claims there is \"no risk\" involved (unrealistic)");
        set.contains(RuleCategory::UnrealisticPromise, Scope::Description, "money back guarantee",
            "Offers \"money back guarantee\" (unusual for legitimate jobs)");
        set.regex(RuleCategory::UnrealisticPromise, Scope::Description, r"\bsecret\b",
            "Mentions a \"secret\" method or system for making money");
        set.contains(RuleCategory::UnrealisticPromise, Scope::Description, "financial freedom",
            "Promises vague \"financial freedom\" instead of concrete salary");
        for pattern in [
            "excellent salary",
            "top salary",
            "unbelievable pay",
            "lucrative",
            "high paying",
        ] {
            set.contains(RuleCategory::UnrealisticPromise, Scope::Combined, pattern,
                "Suspicious salary claims that seem too good to be true");
        }

        // Fee and payment requests
        set.regex(RuleCategory::FeeRequest, Scope::Description, r"\bfees?\b",
            "Requests payment or fees from applicants");
        set.contains(RuleCategory::FeeRequest, Scope::Description, "investment",
            "Asks for an \"investment\" or startup costs");
        set.contains(RuleCategory::FeeRequest, Scope::Description, "training fee",
            "Requires payment for training materials");
        set.contains(RuleCategory::FeeRequest, Scope::Description, "background check fee",
            "Charges for background check (legitimate employers cover this)");
        set.contains(RuleCategory::FeeRequest, Scope::Description, "registration fee",
            "Requests a registration fee to apply");
        set.contains(RuleCategory::FeeRequest, Scope::Description, "starter kit",
            "Requires purchase of a \"starter kit\" to begin work");
        set.contains(RuleCategory::FeeRequest, Scope::Description, "certification fee",
            "Charges for job-specific certifications");

        // Vague descriptions
        set.check(RuleCategory::VagueDescription, description_short,
            "Unusually short or vague job description");

        // Unprofessional language. Word boundaries keep "ur"/"u" from
        // matching inside "your" or "you".
        for pattern in [r"\bur\b", r"\bu\b", r"\b4 u\b"] {
            set.regex(RuleCategory::UnprofessionalLanguage, Scope::Combined, pattern,
                "Contains unprofessional language or grammar errors");
        }
        set.contains(RuleCategory::UnprofessionalLanguage, Scope::Combined, "thankyou",
            "Contains unprofessional language or grammar errors");
        set.regex(RuleCategory::UnprofessionalLanguage, Scope::Combined, r"[!?]{3,}",
            "Excessive punctuation suggests an unprofessionally written posting");

        // Unusual contact channels
        for pattern in [
            "whatsapp",
            "telegram",
            "personal email",
            "text us",
            "message us",
            "personal phone",
        ] {
            set.contains(RuleCategory::UnusualContactChannel, Scope::Combined, pattern,
                "Requests contact through unusual channels outside the job platform");
        }
        set.check(RuleCategory::UnusualContactChannel, has_personal_email,
            "Uses personal email domain instead of company email");
        set.check(RuleCategory::UnusualContactChannel, has_multiple_emails,
            "Lists multiple different email addresses for contact");

        // Sensitive information requests
        for pattern in [
            "bank details",
            "bank account",
            "ssn",
            "social security",
            "passport",
            "identity card",
            "credit card",
            "payment details",
        ] {
            set.contains(RuleCategory::SensitiveInfoRequest, Scope::Combined, pattern,
                "Requests sensitive personal or financial information");
        }

        // Missing company evidence
        set.check(RuleCategory::MissingCompanyEvidence, company_name_missing,
            "Company name is missing or unusually vague");
        set.check(RuleCategory::MissingCompanyEvidence, company_profile_thin,
            "Posting lacks specific company information or history");

        // Missing salary evidence
        set.check(RuleCategory::MissingSalaryEvidence, salary_unmentioned,
            "No salary information provided");

        // Model-specific signals
        set.check(RuleCategory::ModelSignal, text_model_confident,
            "Text analysis shows language patterns common in fraudulent listings");
        set.check(RuleCategory::ModelSignal, forest_model_confident,
            "Job characteristics match known patterns of fake job postings");
        set.check(RuleCategory::ModelSignal, most_models_confident,
            "Multiple detection methods flagged this posting as suspicious");

        set
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    fn contains(
        &mut self,
        category: RuleCategory,
        scope: Scope,
        pattern: &'static str,
        message: &'static str,
    ) {
        self.rules.push(Rule {
            category,
            message,
            trigger: Trigger::Contains(scope, pattern),
        });
    }

    fn regex(
        &mut self,
        category: RuleCategory,
        scope: Scope,
        pattern: &'static str,
        message: &'static str,
    ) {
        match Regex::new(pattern) {
            Ok(regex) => self.rules.push(Rule {
                category,
                message,
                trigger: Trigger::Matches(scope, regex),
            }),
            Err(e) => warn!(pattern = %pattern, error = %e, "Dropping rule with invalid pattern"),
        }
    }

    fn check(
        &mut self,
        category: RuleCategory,
        check: fn(&RuleContext) -> Result<bool, DetectorError>,
        message: &'static str,
    ) {
        self.rules.push(Rule {
            category,
            message,
            trigger: Trigger::Check(check),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RiskTier;

    fn consensus(probability: f64) -> ConsensusResult {
        ConsensusResult {
            fraud_probability: probability,
            agreement_percent: 100.0,
            confidence: 1.0,
            risk_tier: RiskTier::from_probability(probability),
            is_fraudulent: probability > 0.5,
        }
    }

    fn fired(posting: &JobPosting, verdicts: &[(String, ModelVerdict)]) -> Vec<&'static str> {
        let consensus = consensus(0.9);
        let ctx = RuleContext::new(posting, &consensus, verdicts);
        RuleSet::standard()
            .rules()
            .iter()
            .filter(|r| r.matches(&ctx).unwrap())
            .map(|r| r.message)
            .collect()
    }

    #[test]
    fn test_title_urgency_rule_fires() {
        let posting = JobPosting::new("p", "URGENT hiring - start today");
        let messages = fired(&posting, &[]);
        assert!(messages
            .contains(&"Urgency in job title creates pressure to apply quickly (common scam tactic)"));
    }

    #[test]
    fn test_fee_word_boundary_does_not_match_coffee() {
        let mut posting = JobPosting::new("p", "Barista");
        posting.description = "Serve coffee and pastries to customers. Salary discussed at interview."
            .repeat(20);
        let messages = fired(&posting, &[]);
        assert!(!messages.contains(&"Requests payment or fees from applicants"));
    }

    #[test]
    fn test_secret_word_boundary_does_not_match_secretary() {
        let mut posting = JobPosting::new("p", "Office assistant");
        posting.description = "We are hiring a secretary for our front office team.".to_string();
        let messages = fired(&posting, &[]);
        assert!(!messages.contains(&"Mentions a \"secret\" method or system for making money"));
    }

    #[test]
    fn test_personal_email_and_multiple_emails() {
        let mut posting = JobPosting::new("p", "Assistant");
        posting.contact.emails = vec![
            "recruiter99@gmail.com".to_string(),
            "hr.team@yahoo.com".to_string(),
        ];
        let messages = fired(&posting, &[]);
        assert!(messages.contains(&"Uses personal email domain instead of company email"));
        assert!(messages.contains(&"Lists multiple different email addresses for contact"));
    }

    #[test]
    fn test_model_signal_rules() {
        let posting = JobPosting::new("p", "Assistant");
        let verdicts: Vec<(String, ModelVerdict)> = vec![
            ("logistic_regression".to_string(), ModelVerdict::new(0.92)),
            ("mlp".to_string(), ModelVerdict::new(0.75)),
            ("random_forest".to_string(), ModelVerdict::new(0.6)),
            ("svm".to_string(), ModelVerdict::new(0.8)),
        ];
        let messages = fired(&posting, &verdicts);
        assert!(messages
            .contains(&"Text analysis shows language patterns common in fraudulent listings"));
        // random_forest is below 0.8
        assert!(!messages
            .contains(&"Job characteristics match known patterns of fake job postings"));
        // three models above 0.7
        assert!(messages
            .contains(&"Multiple detection methods flagged this posting as suspicious"));
    }

    #[test]
    fn test_empty_posting_is_low_signal_not_an_error() {
        let posting = JobPosting::default();
        let messages = fired(&posting, &[]);
        // Structural rules fire on the absent evidence; nothing panics.
        assert!(messages.contains(&"Company name is missing or unusually vague"));
        assert!(messages.contains(&"No salary information provided"));
    }
}
