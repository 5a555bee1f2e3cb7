//! # Risk Status State Machine
//!
//! A risk's status is a 1–3 character code `[state][severity][substate]`,
//! e.g. `TH` (triage, high) or `RLA` (remediated, low, accepted).
//!
//! ## States
//!
//! ```text
//! Triage (T) ──▶ Open (O) ──▶ Remediated (R)
//!     │             ▲               │
//!     │             └─── reopen ────┘   (visit: observed again)
//!     │
//!     └──────────▶ Deleted (D)          (merge only; visit never touches it)
//! ```
//!
//! ## Priority
//!
//! Derived from severity, lower is more urgent:
//! C=0, H=10, M=20, L=30, I=40, E=50, unspecified=99.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─── Components ──────────────────────────────────────────────────────

/// The workflow state: first character of a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskState {
    /// `T`: awaiting review.
    Triage,
    /// `O`: confirmed and open.
    Open,
    /// `R`: remediated.
    Remediated,
    /// `D`: deleted.
    Deleted,
}

impl RiskState {
    /// Status code character.
    pub fn code(self) -> char {
        match self {
            Self::Triage => 'T',
            Self::Open => 'O',
            Self::Remediated => 'R',
            Self::Deleted => 'D',
        }
    }

    /// Parse a state character.
    pub fn from_code(c: char) -> Option<Self> {
        match c {
            'T' => Some(Self::Triage),
            'O' => Some(Self::Open),
            'R' => Some(Self::Remediated),
            'D' => Some(Self::Deleted),
            _ => None,
        }
    }
}

impl std::fmt::Display for RiskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Triage => "TRIAGE",
            Self::Open => "OPEN",
            Self::Remediated => "REMEDIATED",
            Self::Deleted => "DELETED",
        };
        f.write_str(s)
    }
}

/// Severity: second character of a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// `I`.
    Info,
    /// `L`.
    Low,
    /// `M`.
    Medium,
    /// `H`.
    High,
    /// `C`.
    Critical,
    /// `E`: exposure rather than a vulnerability.
    Exposure,
}

impl Severity {
    /// Status code character.
    pub fn code(self) -> char {
        match self {
            Self::Info => 'I',
            Self::Low => 'L',
            Self::Medium => 'M',
            Self::High => 'H',
            Self::Critical => 'C',
            Self::Exposure => 'E',
        }
    }

    /// Parse a severity character.
    pub fn from_code(c: char) -> Option<Self> {
        match c {
            'I' => Some(Self::Info),
            'L' => Some(Self::Low),
            'M' => Some(Self::Medium),
            'H' => Some(Self::High),
            'C' => Some(Self::Critical),
            'E' => Some(Self::Exposure),
            _ => None,
        }
    }

    /// Triage priority; lower is more urgent.
    pub fn priority(self) -> i32 {
        match self {
            Self::Critical => 0,
            Self::High => 10,
            Self::Medium => 20,
            Self::Low => 30,
            Self::Info => 40,
            Self::Exposure => 50,
        }
    }
}

/// Closure reason: third character of a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Substate {
    /// `A`: risk accepted.
    Accepted,
    /// `F`: false positive.
    FalsePositive,
    /// `S`: out of scope.
    OutOfScope,
    /// `D`: duplicate of another risk.
    Duplicate,
    /// `R`: rejected.
    Rejected,
}

impl Substate {
    /// Status code character.
    pub fn code(self) -> char {
        match self {
            Self::Accepted => 'A',
            Self::FalsePositive => 'F',
            Self::OutOfScope => 'S',
            Self::Duplicate => 'D',
            Self::Rejected => 'R',
        }
    }

    /// Parse a substate character.
    pub fn from_code(c: char) -> Option<Self> {
        match c {
            'A' => Some(Self::Accepted),
            'F' => Some(Self::FalsePositive),
            'S' => Some(Self::OutOfScope),
            'D' => Some(Self::Duplicate),
            'R' => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Priority of a risk with no severity.
pub const UNSPECIFIED_PRIORITY: i32 = 99;

// ─── Errors ──────────────────────────────────────────────────────────

/// A status code could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RiskStatusError {
    /// Empty code.
    #[error("empty risk status code")]
    Empty,

    /// More than three characters.
    #[error("risk status code {0:?} is longer than three characters")]
    TooLong(String),

    /// A character is not valid at its position.
    #[error("invalid {position} {found:?} in risk status code {code:?}")]
    InvalidComponent {
        /// The whole code.
        code: String,
        /// `state`, `severity`, or `substate`.
        position: &'static str,
        /// The offending character.
        found: char,
    },
}

// ─── Risk Status ─────────────────────────────────────────────────────

/// A parsed risk status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RiskStatus {
    /// Workflow state.
    pub state: RiskState,
    /// Severity, if assessed.
    pub severity: Option<Severity>,
    /// Closure reason, if any.
    pub substate: Option<Substate>,
}

impl RiskStatus {
    /// A status with only a state.
    pub fn new(state: RiskState) -> Self {
        Self {
            state,
            severity: None,
            substate: None,
        }
    }

    /// Attach a severity.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Parse a status code.
    ///
    /// The second character is read as a severity; a two-character code
    /// whose second character is not a severity (`OF`) is read as a
    /// substate instead, since the two alphabets are disjoint.
    pub fn parse(code: &str) -> Result<Self, RiskStatusError> {
        let code = code.trim();
        let mut chars = code.chars();
        let first = chars.next().ok_or(RiskStatusError::Empty)?;
        if code.chars().count() > 3 {
            return Err(RiskStatusError::TooLong(code.to_string()));
        }
        let invalid = |position, found| RiskStatusError::InvalidComponent {
            code: code.to_string(),
            position,
            found,
        };

        let state = RiskState::from_code(first).ok_or_else(|| invalid("state", first))?;
        let mut status = Self::new(state);
        match (chars.next(), chars.next()) {
            (None, _) => {}
            (Some(second), None) => {
                if let Some(severity) = Severity::from_code(second) {
                    status.severity = Some(severity);
                } else {
                    status.substate =
                        Some(Substate::from_code(second).ok_or_else(|| invalid("severity", second))?);
                }
            }
            (Some(second), Some(third)) => {
                status.severity =
                    Some(Severity::from_code(second).ok_or_else(|| invalid("severity", second))?);
                status.substate =
                    Some(Substate::from_code(third).ok_or_else(|| invalid("substate", third))?);
            }
        }
        Ok(status)
    }

    /// The status code string.
    pub fn code(&self) -> String {
        let mut code = String::with_capacity(3);
        code.push(self.state.code());
        if let Some(severity) = self.severity {
            code.push(severity.code());
        }
        if let Some(substate) = self.substate {
            code.push(substate.code());
        }
        code
    }

    /// Rewrite only the state character.
    pub fn set(self, state: RiskState) -> Self {
        Self { state, ..self }
    }

    /// Triage priority derived from severity.
    pub fn priority(&self) -> i32 {
        self.severity.map_or(UNSPECIFIED_PRIORITY, Severity::priority)
    }

    /// Whether the risk is awaiting triage.
    pub fn is_triage(&self) -> bool {
        self.state == RiskState::Triage
    }

    /// The status after an authoritative update.
    ///
    /// The update's state always wins. Its severity wins when present. Its
    /// substate wins when present; otherwise the existing substate survives
    /// only if the state is unchanged.
    pub fn merged(&self, update: &RiskStatus) -> RiskStatus {
        let substate = match update.substate {
            Some(s) => Some(s),
            None if update.state == self.state => self.substate,
            None => None,
        };
        RiskStatus {
            state: update.state,
            severity: update.severity.or(self.severity),
            substate,
        }
    }

    /// The status after a passive observation, or `None` if unchanged.
    ///
    /// - Deleted risks are never touched, and observations never delete.
    /// - State moves forward only: Triage → Open → Remediated.
    /// - A remediated risk observed in Triage or Open is reopened.
    /// - The observed severity is adopted only while still in Triage.
    pub fn visited(&self, observed: &RiskStatus) -> Option<RiskStatus> {
        use RiskState::*;

        if self.state == Deleted || observed.state == Deleted {
            return None;
        }
        let next = match (self.state, observed.state) {
            (Remediated, Triage | Open) => RiskStatus {
                state: Open,
                severity: self.severity,
                substate: None,
            },
            (Triage, _) => RiskStatus {
                state: observed.state,
                severity: observed.severity.or(self.severity),
                substate: self.substate,
            },
            (Open, Remediated) => self.set(Remediated),
            _ => *self,
        };
        (next != *self).then_some(next)
    }
}

impl std::fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.code())
    }
}

impl std::str::FromStr for RiskStatus {
    type Err = RiskStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RiskStatus {
    type Error = RiskStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RiskStatus> for String {
    fn from(status: RiskStatus) -> Self {
        status.code()
    }
}

/// Serde adapter for an optional status stored as a plain code string,
/// where the empty string means "unspecified".
pub mod optional_code {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::RiskStatus;

    /// Serialize `None` as `""`.
    pub fn serialize<S: Serializer>(status: &Option<RiskStatus>, s: S) -> Result<S::Ok, S::Error> {
        match status {
            Some(status) => s.serialize_str(&status.code()),
            None => s.serialize_str(""),
        }
    }

    /// Deserialize `""` as `None`.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<RiskStatus>, D::Error> {
        let code = String::deserialize(d)?;
        if code.trim().is_empty() {
            return Ok(None);
        }
        RiskStatus::parse(&code).map(Some).map_err(serde::de::Error::custom)
    }
}
