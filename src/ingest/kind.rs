//! Content kinds and their fixed dependency order

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::db::schemas::{
    DEITY_COLLECTION, PRARTHANA_COLLECTION, SHLOK_COLLECTION, STOTRA_COLLECTION,
};

/// One of the four content collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Deity,
    Shlok,
    Stotra,
    Prarthana,
}

impl Kind {
    /// All kinds in ingestion order
    pub const ORDER: [Kind; 4] = [Kind::Deity, Kind::Shlok, Kind::Stotra, Kind::Prarthana];

    /// MongoDB collection name
    pub fn collection(self) -> &'static str {
        match self {
            Kind::Deity => DEITY_COLLECTION,
            Kind::Shlok => SHLOK_COLLECTION,
            Kind::Stotra => STOTRA_COLLECTION,
            Kind::Prarthana => PRARTHANA_COLLECTION,
        }
    }

    /// Kinds whose registries must be populated before this kind resolves
    pub fn dependencies(self) -> &'static [Kind] {
        match self {
            Kind::Deity | Kind::Shlok => &[],
            Kind::Stotra => &[Kind::Shlok],
            Kind::Prarthana => &[Kind::Deity, Kind::Stotra],
        }
    }

    /// Parse the plural route/collection segment (`deities`, `stotras`, ...)
    pub fn from_collection(segment: &str) -> Option<Self> {
        Kind::ORDER.into_iter().find(|k| k.collection() == segment)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Deity => "deity",
            Kind::Shlok => "shlok",
            Kind::Stotra => "stotra",
            Kind::Prarthana => "prarthana",
        };
        f.write_str(name)
    }
}

impl FromStr for Kind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "deity" | "deities" => Ok(Kind::Deity),
            "shlok" | "shloks" => Ok(Kind::Shlok),
            "stotra" | "stotras" => Ok(Kind::Stotra),
            "prarthana" | "prarthanas" => Ok(Kind::Prarthana),
            other => Err(format!("unknown kind '{}'", other)),
        }
    }
}

/// Orchestrator state; one phase per kind, strictly sequential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Deities,
    Shloks,
    Stotras,
    Prarthanas,
    Done,
}

impl Phase {
    /// The kind ingested in this phase, `None` once done
    pub fn kind(self) -> Option<Kind> {
        match self {
            Phase::Deities => Some(Kind::Deity),
            Phase::Shloks => Some(Kind::Shlok),
            Phase::Stotras => Some(Kind::Stotra),
            Phase::Prarthanas => Some(Kind::Prarthana),
            Phase::Done => None,
        }
    }

    pub fn next(self) -> Phase {
        match self {
            Phase::Deities => Phase::Shloks,
            Phase::Shloks => Phase::Stotras,
            Phase::Stotras => Phase::Prarthanas,
            Phase::Prarthanas | Phase::Done => Phase::Done,
        }
    }
}
