//! Seller rule set: three trust tiers, each with exact names and regex
//! patterns, loaded from YAML.
//!
//! ```yaml
//! official:
//!   exact: ["올리브영"]
//!   regex: ["^.+공식스토어$"]
//! reseller:
//!   regex: ["쿠팡", "G마켓"]
//! suspect:
//!   regex: ["병행", "해외"]
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use _model::SellerLabel;
use regex::Regex;
use serde::{de, Deserialize, Deserializer};
use serde_yaml::Value;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read rule file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid rule set: {0}")]
    Invalid(#[from] serde_yaml::Error),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRules {
    official: Option<RawTier>,
    reseller: Option<RawTier>,
    suspect: Option<RawTier>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTier {
    #[serde(default, deserialize_with = "string_list")]
    exact: Option<Vec<String>>,
    #[serde(default, deserialize_with = "string_list")]
    regex: Option<Vec<String>>,
}

// serde_yaml would otherwise coerce numbers and bools into strings
fn string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(values) = Option::<Vec<Value>>::deserialize(deserializer)? else {
        return Ok(None);
    };

    values
        .into_iter()
        .map(|x| match x {
            Value::String(x) => Ok(x),
            x => Err(de::Error::custom(format!("expected a string pattern, found {x:?}"))),
        })
        .collect::<Result<_, _>>()
        .map(Some)
}

/// A compiled tier pattern. Patterns the regex engine rejects are kept as
/// literal substrings.
#[derive(Debug, Clone)]
pub enum Pattern {
    Regex(Regex),
    Literal(String),
}

impl Pattern {
    pub fn compile(raw: &str) -> Self {
        match Regex::new(raw) {
            Ok(x) => Self::Regex(x),
            Err(err) => {
                warn!(pattern = raw, %err, "invalid regex, matching as literal substring");
                Self::Literal(raw.to_string())
            }
        }
    }

    /// Unanchored search; anchors come from the pattern itself.
    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Self::Regex(x) => x.is_match(text),
            Self::Literal(x) => text.contains(x.as_str()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Regex(x) => x.as_str(),
            Self::Literal(x) => x,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Tier {
    pub exact: Vec<String>,
    pub regex: Vec<Pattern>,
}

impl Tier {
    fn from_raw(label: SellerLabel, raw: Option<RawTier>) -> Self {
        let Some(raw) = raw else {
            debug!(%label, "tier missing, using empty pattern lists");
            return Self::default();
        };

        let exact = raw.exact.unwrap_or_default();
        if label != SellerLabel::Official && !exact.is_empty() {
            warn!(%label, count = exact.len(), "exact names are only used for the official tier");
        }

        Self {
            exact,
            regex: raw
                .regex
                .unwrap_or_default()
                .iter()
                .map(|x| Pattern::compile(x))
                .collect(),
        }
    }

    pub fn exact_match(&self, name: &str) -> Option<&str> {
        self.exact.iter().find(|x| *x == name).map(|x| x.as_str())
    }

    pub fn regex_match(&self, name: &str) -> Option<&Pattern> {
        self.regex.iter().find(|x| x.is_match(name))
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.regex.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Immutable once loaded; share it by reference.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    official: Tier,
    reseller: Tier,
    suspect: Tier,
}

impl RuleSet {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let raw: RawRules = serde_yaml::from_str(text)?;
        Ok(Self {
            official: Tier::from_raw(SellerLabel::Official, raw.official),
            reseller: Tier::from_raw(SellerLabel::Reseller, raw.reseller),
            suspect: Tier::from_raw(SellerLabel::Suspect, raw.suspect),
        })
    }

    pub fn tier(&self, label: SellerLabel) -> &Tier {
        match label {
            SellerLabel::Official => &self.official,
            SellerLabel::Reseller => &self.reseller,
            SellerLabel::Suspect => &self.suspect,
        }
    }

    pub fn literal_patterns(&self) -> Vec<(SellerLabel, &str)> {
        SellerLabel::all()
            .into_iter()
            .flat_map(|label| {
                self.tier(label).regex.iter().filter_map(move |x| match x {
                    Pattern::Literal(x) => Some((label, x.as_str())),
                    Pattern::Regex(_) => None,
                })
            })
            .collect()
    }
}
