//! Analyzed domains

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the three namespaces the analyzer understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// Native C++ source
    Cpp,
    /// Visual-scripting assets
    Blueprint,
    /// Binary content assets
    Asset,
}

impl Domain {
    pub const ALL: [Domain; 3] = [Domain::Cpp, Domain::Blueprint, Domain::Asset];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Cpp => "cpp",
            Domain::Blueprint => "blueprint",
            Domain::Asset => "asset",
        }
    }

    /// Domains served by the live introspection service
    pub fn is_live(&self) -> bool {
        !matches!(self, Domain::Cpp)
    }

    /// Parse a domain list where `all` (or an empty list) expands to every domain.
    /// Unknown names are dropped.
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Vec<Domain> {
        let mut domains = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            if name.eq_ignore_ascii_case("all") {
                return Domain::ALL.to_vec();
            }
            if let Ok(domain) = name.parse::<Domain>() {
                if !domains.contains(&domain) {
                    domains.push(domain);
                }
            }
        }
        if domains.is_empty() && names.is_empty() {
            return Domain::ALL.to_vec();
        }
        domains
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpp" | "c++" => Ok(Domain::Cpp),
            "blueprint" | "bp" => Ok(Domain::Blueprint),
            "asset" => Ok(Domain::Asset),
            other => Err(format!("unknown domain: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        assert_eq!(Domain::parse_list::<&str>(&[]), Domain::ALL.to_vec());
        assert_eq!(Domain::parse_list(&["all"]), Domain::ALL.to_vec());
        assert_eq!(
            Domain::parse_list(&["asset", "cpp", "asset", "nope"]),
            vec![Domain::Asset, Domain::Cpp]
        );
        assert!(Domain::parse_list(&["nope"]).is_empty());
    }
}
