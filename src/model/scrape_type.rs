use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Output format the server produces for each page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrapeType {
    /// Raw page HTML
    #[default]
    Html,

    /// HTML with boilerplate stripped
    Cleaned,

    Markdown,
}

impl ScrapeType {
    pub fn as_api_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Cleaned => "cleaned",
            Self::Markdown => "markdown",
        }
    }

    pub fn from_api_str(s: &str) -> Option<Self> {
        match s {
            "html" => Some(Self::Html),
            "cleaned" => Some(Self::Cleaned),
            "markdown" => Some(Self::Markdown),
            _ => None,
        }
    }
}

impl FromStr for ScrapeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_api_str(s)
            .ok_or_else(|| format!("unknown scrape type '{}' (expected html, cleaned or markdown)", s))
    }
}

impl fmt::Display for ScrapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_api_str())
    }
}
