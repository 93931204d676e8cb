// src/core/persona.rs
//! Role-keyword presets biasing which leadership profiles the search favours.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    #[default]
    Founder,
    Sales,
    Marketing,
    Technology,
    Hr,
}

impl Persona {
    pub fn keywords(self) -> Vec<String> {
        let words: &[&str] = match self {
            Persona::Founder => &["Owner", "Founder", "Co-founder", "CEO", "Managing Director"],
            Persona::Sales => &[
                "VP Sales",
                "Head of Sales",
                "Chief Revenue Officer",
                "Sales Director",
            ],
            Persona::Marketing => &[
                "CMO",
                "VP Marketing",
                "Head of Marketing",
                "Marketing Director",
            ],
            Persona::Technology => &["CTO", "VP Engineering", "Head of Engineering"],
            Persona::Hr => &["CHRO", "Head of People", "HR Director"],
        };
        words.iter().map(|w| w.to_string()).collect()
    }

    pub fn all() -> &'static [Persona] {
        &[
            Persona::Founder,
            Persona::Sales,
            Persona::Marketing,
            Persona::Technology,
            Persona::Hr,
        ]
    }
}

impl FromStr for Persona {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "founder" | "ceo" | "owner" => Ok(Persona::Founder),
            "sales" => Ok(Persona::Sales),
            "marketing" => Ok(Persona::Marketing),
            "technology" | "tech" | "engineering" => Ok(Persona::Technology),
            "hr" | "people" => Ok(Persona::Hr),
            other => anyhow::bail!(
                "Unknown persona: {}. Use founder, sales, marketing, technology or hr",
                other
            ),
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Persona::Founder => "founder",
            Persona::Sales => "sales",
            Persona::Marketing => "marketing",
            Persona::Technology => "technology",
            Persona::Hr => "hr",
        };
        f.write_str(name)
    }
}

/// Split a comma-separated keyword list, dropping blanks.
pub fn parse_role_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Explicit roles win over the persona preset.
pub fn resolve_roles(persona: Option<Persona>, roles: Option<&str>) -> Vec<String> {
    match roles.map(parse_role_list) {
        Some(list) if !list.is_empty() => list,
        _ => persona.unwrap_or_default().keywords(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_persona_is_founder_set() {
        assert_eq!(
            Persona::default().keywords(),
            vec!["Owner", "Founder", "Co-founder", "CEO", "Managing Director"]
        );
    }

    #[test]
    fn test_persona_from_str() {
        assert_eq!("Sales".parse::<Persona>().unwrap(), Persona::Sales);
        assert_eq!(" tech ".parse::<Persona>().unwrap(), Persona::Technology);
        assert!("astronaut".parse::<Persona>().is_err());
        for persona in Persona::all() {
            assert_eq!(persona.to_string().parse::<Persona>().unwrap(), *persona);
        }
    }

    #[test]
    fn test_explicit_roles_override_persona() {
        assert_eq!(
            resolve_roles(Some(Persona::Sales), Some("CFO, , Finance Director")),
            vec!["CFO", "Finance Director"]
        );
        assert_eq!(resolve_roles(Some(Persona::Hr), Some(" , ")), Persona::Hr.keywords());
        assert_eq!(resolve_roles(None, None), Persona::Founder.keywords());
    }
}
