use serde::{Deserialize, Serialize};

/// Prefix OSV uses for malicious-package reports.
const MALICIOUS_PREFIX: &str = "MAL-";

/// Whether an advisory reports a vulnerability or a malicious package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AdvisoryKind {
    Vulnerability,
    #[serde(rename = "Malicious Code")]
    MaliciousCode,
}

impl AdvisoryKind {
    /// Classifies an advisory by its ID prefix.
    pub fn classify(id: &str) -> Self {
        if id.starts_with(MALICIOUS_PREFIX) {
            AdvisoryKind::MaliciousCode
        } else {
            AdvisoryKind::Vulnerability
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AdvisoryKind::Vulnerability => "Vulnerability",
            AdvisoryKind::MaliciousCode => "Malicious Code",
        }
    }
}

impl std::fmt::Display for AdvisoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The subset of an OSV advisory document the flattener reads.
///
/// Every field is optional so that sparse records from any ecosystem
/// database still deserialize. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OsvRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub aliases: Option<Vec<String>>,
    #[serde(default)]
    pub affected: Option<Vec<OsvAffected>>,
    /// Free-form per-database metadata; only `severity` and `cwe_ids` are used.
    #[serde(default)]
    pub database_specific: Option<serde_json::Value>,
    #[serde(default)]
    pub modified: Option<String>,
    #[serde(default)]
    pub published: Option<String>,
    #[serde(default)]
    pub withdrawn: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OsvAffected {
    #[serde(default)]
    pub package: Option<OsvPackage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OsvPackage {
    #[serde(default)]
    pub name: Option<String>,
}

impl OsvRecord {
    pub fn affected(&self) -> &[OsvAffected] {
        self.affected.as_deref().unwrap_or_default()
    }

    /// Non-empty package names, in record order.
    pub fn package_names(&self) -> impl Iterator<Item = &str> {
        self.affected()
            .iter()
            .filter_map(|a| a.package.as_ref()?.name.as_deref())
            .filter(|name| !name.is_empty())
    }

    /// `database_specific.severity` as written, if the key is present.
    ///
    /// An explicit `null` yields an empty string and non-string values keep
    /// their JSON text.
    pub fn database_severity(&self) -> Option<String> {
        let severity = self.database_specific.as_ref()?.get("severity")?;
        Some(match severity {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        })
    }

    /// `database_specific.cwe_ids`, ignoring non-string entries.
    pub fn cwe_ids(&self) -> Vec<&str> {
        self.database_specific
            .as_ref()
            .and_then(|db| db.get("cwe_ids"))
            .and_then(|ids| ids.as_array())
            .map(|ids| ids.iter().filter_map(|id| id.as_str()).collect())
            .unwrap_or_default()
    }
}
