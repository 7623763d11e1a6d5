//! Domain records shared by every stage of the pipeline (C10).
//!
//! Source rows are treated as loosely-typed dictionaries upstream (CSV/SQL);
//! here coercion happens exactly once, at construction, and everything
//! downstream works with concrete, already-validated types.

use serde::{Deserialize, Serialize};

/// Literal manager value used when no suitable agent exists anywhere.
pub const ESCALATION_SENTINEL: &str = "CAPITAL_ESCALATION";

/// Closed category vocabulary. Wire representation keeps the original
/// Russian strings — they are the stable contract, not an implementation
/// detail (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Жалоба")]
    Complaint,
    #[serde(rename = "Смена данных")]
    ChangeOfData,
    #[serde(rename = "Консультация")]
    Consultation,
    #[serde(rename = "Претензия")]
    Claim,
    #[serde(rename = "Неработоспособность приложения")]
    AppFailure,
    #[serde(rename = "Мошеннические действия")]
    Fraud,
    #[serde(rename = "Спам")]
    Spam,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Complaint => "Жалоба",
            Category::ChangeOfData => "Смена данных",
            Category::Consultation => "Консультация",
            Category::Claim => "Претензия",
            Category::AppFailure => "Неработоспособность приложения",
            Category::Fraud => "Мошеннические действия",
            Category::Spam => "Спам",
        }
    }

    /// Categories that attract the high-priority bonus (spec §4.7.1).
    pub fn is_high_priority(&self) -> bool {
        matches!(self, Category::Fraud | Category::Complaint | Category::Claim)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed language vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    RU,
    KZ,
    ENG,
}

impl Language {
    /// Languages for which a manager must carry a matching skill (spec §4.8(b)).
    pub fn requires_skill_match(&self) -> bool {
        matches!(self, Language::KZ | Language::ENG)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::RU => "RU",
            Language::KZ => "KZ",
            Language::ENG => "ENG",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed sentiment vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    POS,
    NEU,
    NEG,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::POS => "POS",
            Sentiment::NEU => "NEU",
            Sentiment::NEG => "NEG",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client segment. Open-ended in the source data (`MASS`, `VIP`, `PRIORITY`,
/// and whatever else a CRM export happens to contain) — we normalise known
/// aliases to a canonical spelling and pass anything else through uppercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment(pub String);

impl Segment {
    /// Trim, uppercase, and fold known aliases ({ВИП→VIP, PRIOR→PRIORITY, …}).
    pub fn normalise(raw: &str) -> Self {
        let upper = raw.trim().to_uppercase();
        let canonical = match upper.as_str() {
            "VIP" | "ВИП" => "VIP",
            "PRIORITY" | "ПРИОРИТЕТ" | "PRIOR" => "PRIORITY",
            other => return Segment(other.to_string()),
        };
        Segment(canonical.to_string())
    }

    pub fn is_vip_or_priority(&self) -> bool {
        self.0 == "VIP" || self.0 == "PRIORITY"
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Office-selection reason (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfficeReason {
    ByCoords,
    ByDistance,
    ByMatch,
    #[serde(rename = "50_50")]
    FiftyFifty,
    Default,
    NearestOffice,
}

impl OfficeReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfficeReason::ByCoords => "by_coords",
            OfficeReason::ByDistance => "by_distance",
            OfficeReason::ByMatch => "by_match",
            OfficeReason::FiftyFifty => "50_50",
            OfficeReason::Default => "default",
            OfficeReason::NearestOffice => "nearest_office",
        }
    }
}

impl std::fmt::Display for OfficeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pending support ticket — read-only input to one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub guid: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub segment: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

/// Derived analytic attributes for one ticket (C7 output).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrichment {
    pub category: Category,
    pub language: Language,
    pub sentiment: Sentiment,
    pub priority: u8,
    pub summary: String,
    pub recommendation: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

/// A human agent eligible for ticket assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manager {
    pub name: String,
    pub position: String,
    pub office: String,
    #[serde(default)]
    pub skills: String,
    #[serde(default)]
    pub load: i64,

    /// Derived at load time — not part of the wire schema.
    #[serde(skip, default)]
    pub chief: bool,
    #[serde(skip, default)]
    pub skill_set: std::collections::HashSet<String>,
}

impl Manager {
    pub fn has_skill(&self, skill: &str) -> bool {
        self.skill_set.contains(skill)
    }
}

/// A physical office, optionally geocoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Office {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

/// Structured decision trace attached to every assignment (spec §4.8.2).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Trace {
    pub home_office: String,
    pub office_reason: String,
    pub initial_pool: usize,
    pub after_vip: Option<usize>,
    pub after_chief: Option<usize>,
    pub after_lang: Option<usize>,
    pub selected: Option<String>,
    pub top2: Vec<String>,
    pub rr_counter: Option<u64>,
    pub redirected_to_office: Option<String>,
    pub redirected_distance_km: Option<f64>,
    pub escalation: bool,
    pub escalation_reason: Option<String>,
    pub routing_ms: u64,
}

/// Final routing decision for one ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub guid: String,
    pub enrichment: Enrichment,
    pub office: String,
    pub office_reason: OfficeReason,
    pub distance_km: Option<f64>,
    pub manager: String,
    pub trace: Trace,
}

impl Assignment {
    pub fn is_escalated(&self) -> bool {
        self.manager == ESCALATION_SENTINEL
    }
}
