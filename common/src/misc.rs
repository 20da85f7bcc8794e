use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Standard,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Standard => "standard",
            Role::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "admin" => Role::Admin,
            _ => Role::Standard,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How order settlement obtains unit prices.
///
/// `Catalog` re-resolves every cart entry against the catalog and ignores
/// client-submitted price fields. `Trusted` accepts the submitted prices
/// unchanged and exists only for compatibility with legacy clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceResolution {
    Catalog,
    Trusted,
}
