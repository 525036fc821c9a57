use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A package ecosystem published in the OSV bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Ecosystem {
    #[serde(rename = "CRAN")]
    Cran,
    #[serde(rename = "crates.io")]
    CratesIo,
    #[serde(rename = "Go")]
    Go,
    #[serde(rename = "Hackage")]
    Hackage,
    #[serde(rename = "Hex")]
    Hex,
    #[serde(rename = "Maven")]
    Maven,
    #[serde(rename = "npm")]
    Npm,
    #[serde(rename = "NuGet")]
    NuGet,
    #[serde(rename = "Packagist")]
    Packagist,
    #[serde(rename = "Pub")]
    Pub,
    #[serde(rename = "PyPI")]
    PyPI,
    #[serde(rename = "RubyGems")]
    RubyGems,
}

impl Ecosystem {
    /// Every supported ecosystem, in download order.
    pub const ALL: [Ecosystem; 12] = [
        Ecosystem::Cran,
        Ecosystem::CratesIo,
        Ecosystem::Go,
        Ecosystem::Hackage,
        Ecosystem::Hex,
        Ecosystem::Maven,
        Ecosystem::Npm,
        Ecosystem::NuGet,
        Ecosystem::Packagist,
        Ecosystem::Pub,
        Ecosystem::PyPI,
        Ecosystem::RubyGems,
    ];

    /// The name used by OSV for bucket paths and local directories.
    pub fn as_str(&self) -> &'static str {
        match self {
            Ecosystem::Cran => "CRAN",
            Ecosystem::CratesIo => "crates.io",
            Ecosystem::Go => "Go",
            Ecosystem::Hackage => "Hackage",
            Ecosystem::Hex => "Hex",
            Ecosystem::Maven => "Maven",
            Ecosystem::Npm => "npm",
            Ecosystem::NuGet => "NuGet",
            Ecosystem::Packagist => "Packagist",
            Ecosystem::Pub => "Pub",
            Ecosystem::PyPI => "PyPI",
            Ecosystem::RubyGems => "RubyGems",
        }
    }

    pub fn language(&self) -> &'static str {
        match self {
            Ecosystem::Cran => "R",
            Ecosystem::CratesIo => "Rust",
            Ecosystem::Go => "Go",
            Ecosystem::Hackage => "Haskell",
            Ecosystem::Hex => "Elixir/Erlang",
            Ecosystem::Maven => "Java",
            Ecosystem::Npm => "JavaScript/Node.js",
            Ecosystem::NuGet => ".NET",
            Ecosystem::Packagist => "PHP",
            Ecosystem::Pub => "Dart",
            Ecosystem::PyPI => "Python",
            Ecosystem::RubyGems => "Ruby",
        }
    }
}

impl std::fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Ecosystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Ecosystem::ALL
            .iter()
            .find(|eco| eco.as_str().eq_ignore_ascii_case(wanted))
            .copied()
            .ok_or_else(|| {
                let names: Vec<&str> = Ecosystem::ALL.iter().map(|e| e.as_str()).collect();
                format!("Unknown ecosystem: {}. Use one of: {}", s, names.join(", "))
            })
    }
}
