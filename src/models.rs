use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The five report sections, in presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKey {
    Introduction,
    IndustryTrends,
    AiSolutions,
    Analysis,
    Conclusion,
}

impl SectionKey {
    pub const ORDER: [SectionKey; 5] = [
        SectionKey::Introduction,
        SectionKey::IndustryTrends,
        SectionKey::AiSolutions,
        SectionKey::Analysis,
        SectionKey::Conclusion,
    ];

    pub fn title(self) -> &'static str {
        match self {
            SectionKey::Introduction => "Introduction",
            SectionKey::IndustryTrends => "Industry Trends",
            SectionKey::AiSolutions => "AI Solutions",
            SectionKey::Analysis => "Analysis",
            SectionKey::Conclusion => "Conclusion",
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            SectionKey::Introduction => "Introduction section is unavailable.",
            SectionKey::IndustryTrends => "Industry trends section is unavailable.",
            SectionKey::AiSolutions => "AI solutions section is unavailable.",
            SectionKey::Analysis => "Analysis section is unavailable.",
            SectionKey::Conclusion => "Conclusion section is unavailable.",
        }
    }
}

/// Which sections the caller asked for. A section toggled off still shows up
/// in the assembled body, but as its "unavailable" placeholder so the layout
/// stays stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionToggles {
    pub introduction: bool,
    pub industry_trends: bool,
    pub ai_solutions: bool,
    pub analysis: bool,
    pub conclusion: bool,
}

impl Default for SectionToggles {
    fn default() -> Self {
        Self {
            introduction: true,
            industry_trends: true,
            ai_solutions: true,
            analysis: true,
            conclusion: true,
        }
    }
}

impl SectionToggles {
    pub fn enabled(&self, key: SectionKey) -> bool {
        match key {
            SectionKey::Introduction => self.introduction,
            SectionKey::IndustryTrends => self.industry_trends,
            SectionKey::AiSolutions => self.ai_solutions,
            SectionKey::Analysis => self.analysis,
            SectionKey::Conclusion => self.conclusion,
        }
    }
}

/// Raw POST /generate_report body, captured loosely as a field map. Typing
/// happens in [`ReportRequest::validate`], so a wrong-typed field (say a
/// numeric `client_name`) becomes a validation detail instead of failing
/// body deserialization. Question fields are `question1..questionN` with N
/// set by configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ReportParams(pub BTreeMap<String, Value>);

/// Field -> reasons map returned with 400 responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(pub BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn push(&mut self, field: &str, reason: &str) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(reason.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

const MISSING_FIELD: &str = "Missing data for required field.";
const BLANK_FIELD: &str = "Field may not be blank.";
const INVALID_EMAIL: &str = "Not a valid email address.";
const INVALID_STRING: &str = "Not a valid string.";
const INVALID_BOOL: &str = "Not a valid boolean.";

/// A validated questionnaire, ready for the pipeline.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub client_name: String,
    pub client_email: String,
    pub industry: String,
    pub answers: Vec<String>,
    pub toggles: SectionToggles,
}

impl ReportRequest {
    /// Checks every field before any collaborator is touched. Collects all
    /// violations rather than stopping at the first one.
    pub fn validate(params: &ReportParams, question_count: usize) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let client_name = string_field(params, "client_name", &mut errors);
        let client_email = string_field(params, "client_email", &mut errors);
        let industry = string_field(params, "industry", &mut errors);

        if let Some(email) = &client_email {
            if !is_valid_email(email) {
                errors.push("client_email", INVALID_EMAIL);
            }
        }

        let mut answers = Vec::with_capacity(question_count);
        for i in 1..=question_count {
            let field = format!("question{i}");
            if let Some(answer) = string_field(params, &field, &mut errors) {
                answers.push(answer);
            }
        }

        let toggles = SectionToggles {
            introduction: flag_field(params, "includeIntroduction", &mut errors),
            industry_trends: flag_field(params, "includeIndustryTrends", &mut errors),
            ai_solutions: flag_field(params, "includeAISolutions", &mut errors),
            analysis: flag_field(params, "includeAnalysis", &mut errors),
            conclusion: flag_field(params, "includeConclusion", &mut errors),
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            client_name: client_name.unwrap_or_default(),
            client_email: client_email.unwrap_or_default(),
            industry: industry.unwrap_or_default(),
            answers,
            toggles,
        })
    }
}

fn string_field(
    params: &ReportParams,
    field: &str,
    errors: &mut ValidationErrors,
) -> Option<String> {
    match params.0.get(field) {
        None => {
            errors.push(field, MISSING_FIELD);
            None
        }
        Some(Value::String(s)) if s.trim().is_empty() => {
            errors.push(field, BLANK_FIELD);
            None
        }
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(_) => {
            errors.push(field, INVALID_STRING);
            None
        }
    }
}

// Include flags are optional and default on.
fn flag_field(params: &ReportParams, field: &str, errors: &mut ValidationErrors) -> bool {
    match params.0.get(field) {
        None => true,
        Some(Value::Bool(b)) => *b,
        Some(_) => {
            errors.push(field, INVALID_BOOL);
            true
        }
    }
}

fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    // Domain needs an interior dot: "a.b", not ".b" or "a."
    domain
        .split_once('.')
        .is_some_and(|(head, tail)| !head.is_empty() && !tail.is_empty())
}

/// Generated section texts. Every key in [`SectionKey::ORDER`] is always
/// present; missing or disabled sections carry their placeholder text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportContent {
    pub sections: BTreeMap<SectionKey, String>,
}

impl ReportContent {
    pub fn section(&self, key: SectionKey) -> &str {
        self.sections
            .get(&key)
            .map(String::as_str)
            .unwrap_or_else(|| key.placeholder())
    }
}

/// The durable artifact of one pipeline run. Built once, after rendering,
/// and handed to archives and notifiers read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub report_id: String,
    pub client_name: String,
    pub client_email: String,
    pub industry: String,
    pub pdf_url: Option<String>,
    pub doc_url: Option<String>,
    pub created_at: DateTime<Utc>,
}
