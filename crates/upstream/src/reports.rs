//! Catalogue of the statistical and HTML reports published by data.riksdagen.se.

use crate::error::UpstreamError;
use crate::http::excerpt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_REPORT_LIMIT: u32 = 200;
pub const MAX_REPORT_LIMIT: u32 = 500;

const TEXT_PREVIEW_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Ledamotsstatistik,
    Kontaktutskott,
    Aldersstatistik,
    Konstatsstatistik,
    Mandatperiod,
    Diarium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReportFormat {
    Json,
    Text,
}

impl ReportKind {
    pub const ALL: [ReportKind; 6] = [
        ReportKind::Ledamotsstatistik,
        ReportKind::Kontaktutskott,
        ReportKind::Aldersstatistik,
        ReportKind::Konstatsstatistik,
        ReportKind::Mandatperiod,
        ReportKind::Diarium,
    ];

    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            ReportKind::Ledamotsstatistik => "ledamotsstatistik",
            ReportKind::Kontaktutskott => "kontaktutskott",
            ReportKind::Aldersstatistik => "aldersstatistik",
            ReportKind::Konstatsstatistik => "konstatsstatistik",
            ReportKind::Mandatperiod => "mandatperiod",
            ReportKind::Diarium => "diarium",
        }
    }

    pub(crate) const fn path(self) -> &'static str {
        match self {
            ReportKind::Ledamotsstatistik | ReportKind::Kontaktutskott => "/dokumentlista/",
            ReportKind::Aldersstatistik => "/sv/rapport-alder",
            ReportKind::Konstatsstatistik => "/personlista/",
            ReportKind::Mandatperiod => "/uttag/mandatperiod",
            ReportKind::Diarium => "/dataset/diarium/",
        }
    }

    pub(crate) const fn params(self) -> &'static [(&'static str, &'static str)] {
        match self {
            ReportKind::Ledamotsstatistik => {
                &[("utformat", "json"), ("aktivi", "rdl"), ("avd", "ledamot")]
            }
            ReportKind::Kontaktutskott => &[
                ("utformat", "kontaktutskott"),
                ("aktivi", "rdl"),
                ("avd", "ledamot"),
            ],
            ReportKind::Konstatsstatistik => &[("utformat", "statkon")],
            ReportKind::Aldersstatistik | ReportKind::Mandatperiod | ReportKind::Diarium => &[],
        }
    }

    pub(crate) const fn format(self) -> ReportFormat {
        match self {
            ReportKind::Ledamotsstatistik => ReportFormat::Json,
            _ => ReportFormat::Text,
        }
    }

    /// Only the document-list reports honour a result size.
    pub(crate) const fn takes_limit(self) -> bool {
        matches!(self, ReportKind::Ledamotsstatistik | ReportKind::Kontaktutskott)
    }

    const fn title(self) -> &'static str {
        match self {
            ReportKind::Ledamotsstatistik => "Member statistics (rdlstat)",
            ReportKind::Kontaktutskott => "Committee contact details",
            ReportKind::Aldersstatistik => "Age statistics",
            ReportKind::Konstatsstatistik => "Gender statistics",
            ReportKind::Mandatperiod => "Electoral terms",
            ReportKind::Diarium => "Registry",
        }
    }

    const fn description(self) -> &'static str {
        match self {
            ReportKind::Ledamotsstatistik => "Per-member statistics with assignments and party (JSON).",
            ReportKind::Kontaktutskott => "Contact details for committee members (HTML preview).",
            ReportKind::Aldersstatistik => "Age distribution among members (HTML preview).",
            ReportKind::Konstatsstatistik => "Gender distribution special report (HTML preview).",
            ReportKind::Mandatperiod => "Electoral terms and their members (HTML preview).",
            ReportKind::Diarium => "Links to the yearly registry datasets (HTML preview).",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ReportKind {
    type Err = UpstreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|k| k.id() == wanted)
            .ok_or_else(|| {
                let known: Vec<_> = Self::ALL.iter().map(|k| k.id()).collect();
                UpstreamError::invalid(
                    "report",
                    format!("unknown report '{s}', expected one of: {}", known.join(", ")),
                )
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportInfo {
    pub id: ReportKind,
    pub title: &'static str,
    pub description: &'static str,
}

#[must_use]
pub fn report_catalog() -> Vec<ReportInfo> {
    ReportKind::ALL
        .into_iter()
        .map(|k| ReportInfo {
            id: k,
            title: k.title(),
            description: k.description(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub report: ReportKind,
    pub url: String,
    pub summary: String,
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// Preview of an HTML report body and a one-line description of what was kept.
pub(crate) fn text_preview(body: &str) -> (Value, String) {
    let total = body.chars().count();
    if total > TEXT_PREVIEW_CHARS {
        let mut preview = excerpt(body);
        preview.push_str("...\n[Content truncated - visit URL for full report]");
        (
            Value::String(preview),
            format!("HTML report truncated ({total} chars total, showing first {TEXT_PREVIEW_CHARS})"),
        )
    } else {
        (
            Value::String(body.to_string()),
            format!("HTML report ({total} chars)"),
        )
    }
}
