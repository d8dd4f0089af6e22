//! Derived ticket classifications shared by the rules and the pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Geographic tag derived from a ticket's entity path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StateTag {
    #[serde(rename = "PE")]
    Pe,
    #[serde(rename = "RN")]
    Rn,
    #[serde(rename = "Outros")]
    Outros,
}

impl StateTag {
    pub const ALL: [StateTag; 3] = [StateTag::Pe, StateTag::Rn, StateTag::Outros];

    pub fn as_str(&self) -> &'static str {
        match self {
            StateTag::Pe => "PE",
            StateTag::Rn => "RN",
            StateTag::Outros => "Outros",
        }
    }
}

impl fmt::Display for StateTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StateTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "PE" | "pe" => Ok(StateTag::Pe),
            "RN" | "rn" => Ok(StateTag::Rn),
            "Outros" | "outros" => Ok(StateTag::Outros),
            other => Err(format!("unknown state tag: {other}")),
        }
    }
}

/// SLA bucket derived from a ticket's category path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SlaCategory {
    #[serde(rename = "TI Infra")]
    TiInfra,
    #[serde(rename = "TI Sistema GPM")]
    TiSistemaGpm,
    #[serde(rename = "TI Sistema Telefonia")]
    TiSistemaTelefonia,
    #[serde(rename = "Outros")]
    Outros,
}

impl SlaCategory {
    /// The categories that carry an SLA, in display order.
    pub const TRACKED: [SlaCategory; 3] = [
        SlaCategory::TiInfra,
        SlaCategory::TiSistemaGpm,
        SlaCategory::TiSistemaTelefonia,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SlaCategory::TiInfra => "TI Infra",
            SlaCategory::TiSistemaGpm => "TI Sistema GPM",
            SlaCategory::TiSistemaTelefonia => "TI Sistema Telefonia",
            SlaCategory::Outros => "Outros",
        }
    }

    pub fn is_tracked(&self) -> bool {
        !matches!(self, SlaCategory::Outros)
    }
}

impl fmt::Display for SlaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Calendar year-month grouping key, rendered `YYYY-MM`.
///
/// Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthBucket {
    pub year: i32,
    pub month: u32,
}

impl MonthBucket {
    /// Returns `None` when `month` is outside 1..=12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }
}

impl fmt::Display for MonthBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| format!("expected YYYY-MM, got {s:?}"))?;
        let year: i32 = year
            .parse()
            .map_err(|_| format!("invalid year in {s:?}"))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("invalid month in {s:?}"))?;
        MonthBucket::new(year, month).ok_or_else(|| format!("month out of range in {s:?}"))
    }
}

impl TryFrom<String> for MonthBucket {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthBucket> for String {
    fn from(value: MonthBucket) -> Self {
        value.to_string()
    }
}
