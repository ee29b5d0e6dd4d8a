//! Enum types for passport records

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// PRODUCT CATEGORY
// ============================================================================

/// Regulation-specific category selecting the schema and access policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProductCategory {
    #[serde(rename = "BATTERY_INDUSTRIAL")]
    BatteryIndustrial,
    #[serde(rename = "TEXTILE_APPAREL")]
    TextileApparel,
    #[serde(rename = "CONSUMER_ELECTRONIC")]
    ConsumerElectronic,
}

impl ProductCategory {
    /// Every declared category, including those without a shipped schema.
    pub const ALL: [ProductCategory; 3] = [
        ProductCategory::BatteryIndustrial,
        ProductCategory::TextileApparel,
        ProductCategory::ConsumerElectronic,
    ];

    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            ProductCategory::BatteryIndustrial => "BATTERY_INDUSTRIAL",
            ProductCategory::TextileApparel => "TEXTILE_APPAREL",
            ProductCategory::ConsumerElectronic => "CONSUMER_ELECTRONIC",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, ProductCategoryParseError> {
        match normalize_token(s).as_str() {
            "battery_industrial" => Ok(ProductCategory::BatteryIndustrial),
            "textile_apparel" => Ok(ProductCategory::TextileApparel),
            "consumer_electronic" => Ok(ProductCategory::ConsumerElectronic),
            _ => Err(ProductCategoryParseError(s.to_string())),
        }
    }
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for ProductCategory {
    type Err = ProductCategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid product category string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCategoryParseError(pub String);

impl fmt::Display for ProductCategoryParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid product category: {}", self.0)
    }
}

impl std::error::Error for ProductCategoryParseError {}

// ============================================================================
// PASSPORT STATUS
// ============================================================================

/// Lifecycle status of a passport.
///
/// Transitions are one-way: `Draft -> Published` or `Draft -> Revoked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PassportStatus {
    #[default]
    #[serde(rename = "DRAFT")]
    Draft,
    #[serde(rename = "PUBLISHED")]
    Published,
    #[serde(rename = "REVOKED")]
    Revoked,
}

impl PassportStatus {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            PassportStatus::Draft => "DRAFT",
            PassportStatus::Published => "PUBLISHED",
            PassportStatus::Revoked => "REVOKED",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, PassportStatusParseError> {
        match normalize_token(s).as_str() {
            "draft" => Ok(PassportStatus::Draft),
            "published" => Ok(PassportStatus::Published),
            "revoked" => Ok(PassportStatus::Revoked),
            _ => Err(PassportStatusParseError(s.to_string())),
        }
    }

    /// Whether the passport still accepts owner edits and transitions.
    pub fn is_mutable(&self) -> bool {
        matches!(self, PassportStatus::Draft)
    }

    /// Check whether `next` is a legal successor of this status.
    pub fn can_transition_to(&self, next: PassportStatus) -> bool {
        matches!(
            (self, next),
            (PassportStatus::Draft, PassportStatus::Published)
                | (PassportStatus::Draft, PassportStatus::Revoked)
        )
    }
}

impl fmt::Display for PassportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for PassportStatus {
    type Err = PassportStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid passport status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassportStatusParseError(pub String);

impl fmt::Display for PassportStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid passport status: {}", self.0)
    }
}

impl std::error::Error for PassportStatusParseError {}

// ============================================================================
// VIEW CONTEXT
// ============================================================================

/// Whether the reader is an anonymous member of the public or an
/// authenticated party with a resolved identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewContext {
    #[default]
    Public,
    Restricted,
}

impl ViewContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewContext::Public => "public",
            ViewContext::Restricted => "restricted",
        }
    }
}

impl fmt::Display for ViewContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ViewContext {
    type Err = ViewContextParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_token(s).as_str() {
            "public" => Ok(ViewContext::Public),
            "restricted" => Ok(ViewContext::Restricted),
            _ => Err(ViewContextParseError(s.to_string())),
        }
    }
}

/// Error when parsing an invalid view context string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewContextParseError(pub String);

impl fmt::Display for ViewContextParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid view context: {}", self.0)
    }
}

impl std::error::Error for ViewContextParseError {}

fn normalize_token(s: &str) -> String {
    s.trim().to_lowercase().replace('-', "_")
}
