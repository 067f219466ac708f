//! Intrusion classification for high-activity samples.

use chrono::{DateTime, Local};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::fmt;

/// Number of reachable intrusion kinds (the classifier draws from `0..KIND_COUNT`).
pub const KIND_COUNT: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IntrusionKind {
    #[serde(rename = "Malware Infection")]
    MalwareInfection,
    #[serde(rename = "Brute Force Attack")]
    BruteForce,
    #[serde(rename = "DDoS Attack")]
    DDoS,
    #[serde(rename = "Unknown Intrusion")]
    Unknown,
}

impl IntrusionKind {
    /// Map a policy draw to a kind. Anything outside `0..KIND_COUNT` is `Unknown`;
    /// `Classifier::classify` never produces such a draw.
    pub fn from_draw(draw: u8) -> Self {
        match draw {
            0 => Self::MalwareInfection,
            1 => Self::BruteForce,
            2 => Self::DDoS,
            _ => Self::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::MalwareInfection => "Malware Infection",
            Self::BruteForce => "Brute Force Attack",
            Self::DDoS => "DDoS Attack",
            Self::Unknown => "Unknown Intrusion",
        }
    }

    pub fn severity(&self) -> u8 {
        match self {
            Self::MalwareInfection => 1,
            Self::BruteForce => 2,
            Self::DDoS => 3,
            Self::Unknown => 0,
        }
    }

    pub fn remedy(&self) -> &'static str {
        match self {
            Self::MalwareInfection => "Isolate the infected system and run an antivirus scan.",
            Self::BruteForce => {
                "Block the source IP address and implement account lockout policies."
            }
            Self::DDoS => "Implement traffic filtering and request rate limiting.",
            Self::Unknown => "Unknown intrusion type. Consult with a security expert.",
        }
    }
}

impl fmt::Display for IntrusionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A detected intrusion. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Intrusion {
    kind: IntrusionKind,
    severity: u8,
    remedy: &'static str,
    observed_at: DateTime<Local>,
}

impl Intrusion {
    pub fn new(kind: IntrusionKind, observed_at: DateTime<Local>) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            remedy: kind.remedy(),
            observed_at,
        }
    }

    pub fn kind(&self) -> IntrusionKind {
        self.kind
    }

    pub fn severity(&self) -> u8 {
        self.severity
    }

    pub fn remedy(&self) -> &'static str {
        self.remedy
    }

    pub fn observed_at(&self) -> DateTime<Local> {
        self.observed_at
    }

    /// Log line emitted when the intrusion is detected.
    pub fn alert_line(&self) -> String {
        format!(
            "Security Alert / Intrusion detected: {}, Severity: {}",
            self.kind, self.severity
        )
    }

    /// Line used by the attack history dump.
    pub fn history_line(&self) -> String {
        format!(
            "Type: {}, Severity: {}, Remedy: {}",
            self.kind, self.severity, self.remedy
        )
    }
}

/// Evenly weighted random policy over the three reachable kinds.
pub struct Classifier {
    rng: StdRng,
}

impl Classifier {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_rng(&mut rand::rng()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn classify(&mut self) -> Intrusion {
        let draw = self.rng.random_range(0..KIND_COUNT);
        Intrusion::new(IntrusionKind::from_draw(draw), Local::now())
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}
