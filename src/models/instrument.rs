use serde::{Deserialize, Serialize};

/// Futures instruments tracked by the ingestion pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instrument {
    /// Robusta coffee (ICE Europe), symbol root "RM"
    #[serde(rename = "RM")]
    Robusta,
    /// Arabica coffee (ICE US), symbol root "KC"
    #[serde(rename = "KC")]
    Arabica,
}

impl Instrument {
    /// Ingestion order: Robusta first, then Arabica.
    pub const ALL: [Instrument; 2] = [Instrument::Robusta, Instrument::Arabica];

    /// Two-letter code, used both as the storage key and the quote-site
    /// symbol root.
    pub fn code(&self) -> &'static str {
        match self {
            Instrument::Robusta => "RM",
            Instrument::Arabica => "KC",
        }
    }
}

impl std::fmt::Display for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::str::FromStr for Instrument {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "RM" => Ok(Instrument::Robusta),
            "KC" => Ok(Instrument::Arabica),
            _ => Err(format!("Unknown instrument: {}", s)),
        }
    }
}
