use std::{fmt, str::FromStr};

use anyhow::bail;
use serde::{Deserialize, Serialize};

/// Trust tier of a seller.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SellerLabel {
    Official,
    Reseller,
    Suspect,
}

impl SellerLabel {
    /// In precedence order.
    pub fn all() -> [Self; 3] {
        [Self::Official, Self::Reseller, Self::Suspect]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Official => "official",
            Self::Reseller => "reseller",
            Self::Suspect => "suspect",
        }
    }
}

impl fmt::Display for SellerLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SellerLabel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "official" => Self::Official,
            "reseller" => Self::Reseller,
            "suspect" => Self::Suspect,
            _ => bail!("Unknown seller label: {s}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_label() {
        assert_eq!("official".parse::<SellerLabel>().unwrap(), SellerLabel::Official);
        assert_eq!("reseller".parse::<SellerLabel>().unwrap(), SellerLabel::Reseller);
        assert_eq!("suspect".parse::<SellerLabel>().unwrap(), SellerLabel::Suspect);
        assert!("Official".parse::<SellerLabel>().is_err());
    }
}
