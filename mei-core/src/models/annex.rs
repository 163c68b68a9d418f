use serde::{Deserialize, Serialize};

/// Simples Nacional annex a MEI activity is taxed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Annex {
    #[serde(rename = "I")]
    I,
    #[serde(rename = "III")]
    III,
    #[serde(rename = "V")]
    V,
}

impl Annex {
    pub fn all() -> &'static [Annex] {
        &[Annex::I, Annex::III, Annex::V]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::I => "I",
            Self::III => "III",
            Self::V => "V",
        }
    }

    /// Parses a roman-numeral annex tag. Case and surrounding whitespace are
    /// ignored; any other tag (including `"II"` or `"IV"`) is rejected.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "I" => Some(Self::I),
            "III" => Some(Self::III),
            "V" => Some(Self::V),
            _ => None,
        }
    }
}

impl std::fmt::Display for Annex {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
