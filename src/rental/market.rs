//! Market parameters and the market-name table.

use std::fmt;
use std::fs;
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::config::BidError;

/// Classification cut-offs on median ratio and dispersion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketThresholds {
    /// Median ratio below which a low-dispersion market is very cool.
    pub very_cool_median: f64,
    /// Dispersion below which a low-median market is very cool.
    pub very_cool_dispersion: f64,
    /// Median ratio below which a market is cooling.
    pub cooling_median: f64,
    /// Median ratio above which a high-dispersion market is very hot.
    pub very_hot_median: f64,
    /// Dispersion above which a high-median market is very hot.
    pub very_hot_dispersion: f64,
}

impl Default for MarketThresholds {
    fn default() -> Self {
        Self {
            very_cool_median: 0.95,
            very_cool_dispersion: 0.08,
            cooling_median: 1.0,
            very_hot_median: 1.05,
            very_hot_dispersion: 0.10,
        }
    }
}

/// Historical competitor behaviour in one market.
///
/// `median_ratio` is the typical winning bid as a fraction of the listing
/// price; `dispersion` is the log-normal shape parameter; `skew` in
/// `[-1, 1]` bends the distribution towards overbidding (positive) or
/// underbidding (negative).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketParams {
    /// Median bid-to-listing ratio.
    pub median_ratio: f64,
    /// Log-normal shape parameter.
    pub dispersion: f64,
    /// Mixture skew.
    #[serde(default)]
    pub skew: f64,
    /// Classification cut-offs.
    #[serde(default)]
    pub thresholds: MarketThresholds,
}

impl MarketParams {
    /// Create market parameters with default classification thresholds.
    pub fn new(median_ratio: f64, dispersion: f64, skew: f64) -> Self {
        Self {
            median_ratio,
            dispersion,
            skew,
            thresholds: MarketThresholds::default(),
        }
    }

    /// Downtown Vancouver: a cooling market where tenants expect discounts.
    pub fn downtown() -> Self {
        Self::new(0.94, 0.05, 0.1)
    }

    /// Burnaby: a more pronounced cooling market with almost no overbids.
    pub fn burnaby() -> Self {
        Self::new(0.92, 0.06, 0.05)
    }

    /// Check the parameters describe a usable distribution.
    pub fn validate(&self) -> Result<(), MarketError> {
        if self.median_ratio.is_nan() || self.median_ratio <= 0.0 {
            return Err(MarketError::InvalidMedian(self.median_ratio));
        }
        if self.dispersion.is_nan() || self.dispersion <= 0.0 {
            return Err(MarketError::InvalidDispersion(self.dispersion));
        }
        if !(-1.0..=1.0).contains(&self.skew) {
            return Err(MarketError::InvalidSkew(self.skew));
        }
        let t = &self.thresholds;
        if !(t.very_cool_median <= t.cooling_median && t.cooling_median <= t.very_hot_median) {
            return Err(MarketError::UnorderedThresholds);
        }
        Ok(())
    }

    /// Classify the market from its median ratio and dispersion.
    pub fn condition(&self) -> MarketCondition {
        let t = &self.thresholds;
        if self.median_ratio < t.very_cool_median && self.dispersion < t.very_cool_dispersion {
            MarketCondition::VeryCool
        } else if self.median_ratio < t.cooling_median {
            MarketCondition::Cooling
        } else if self.median_ratio > t.very_hot_median && self.dispersion > t.very_hot_dispersion {
            MarketCondition::VeryHot
        } else {
            MarketCondition::Balanced
        }
    }
}

/// Coarse market temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketCondition {
    /// Low median, tight spread.
    VeryCool,
    /// Median below the listing price.
    Cooling,
    /// Neither cooling nor very hot.
    Balanced,
    /// High median, wide spread.
    VeryHot,
}

impl MarketCondition {
    /// Shift of the round-one ladder centre, in listing-price ratio.
    pub fn ladder_shift(self) -> f64 {
        match self {
            MarketCondition::VeryCool => -0.02,
            MarketCondition::Cooling => -0.01,
            MarketCondition::Balanced => 0.0,
            MarketCondition::VeryHot => 0.02,
        }
    }

    /// Bid-to-asking ratio a moderate, fresh-listing landlord accepts at even odds.
    pub fn base_acceptance_ratio(self) -> f64 {
        match self {
            MarketCondition::VeryCool => 0.95,
            MarketCondition::Cooling => 0.98,
            MarketCondition::Balanced => 1.0,
            MarketCondition::VeryHot => 1.05,
        }
    }

    /// Whether tenants hold the upper hand.
    pub fn is_cool(self) -> bool {
        matches!(self, MarketCondition::VeryCool | MarketCondition::Cooling)
    }
}

impl fmt::Display for MarketCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MarketCondition::VeryCool => "Very Cool",
            MarketCondition::Cooling => "Cooling",
            MarketCondition::Balanced => "Balanced",
            MarketCondition::VeryHot => "Very Hot",
        };
        write!(f, "{}", name)
    }
}

/// Errors in market parameters or lookup.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MarketError {
    /// Median ratio is not positive.
    #[error("median ratio must be positive, got {0}")]
    InvalidMedian(f64),
    /// Dispersion is not positive.
    #[error("dispersion must be positive, got {0}")]
    InvalidDispersion(f64),
    /// Skew outside [-1, 1].
    #[error("skew must be within [-1, 1], got {0}")]
    InvalidSkew(f64),
    /// Classification thresholds are not increasing.
    #[error("classification thresholds must satisfy very_cool <= cooling <= very_hot")]
    UnorderedThresholds,
    /// No market with this name.
    #[error("unknown market: {0}")]
    UnknownMarket(String),
}

/// Named market parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketTable {
    markets: FxHashMap<String, MarketParams>,
}

impl MarketTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The two built-in Vancouver markets.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        table.insert("downtown", MarketParams::downtown());
        table.insert("burnaby", MarketParams::burnaby());
        table
    }

    /// Add or replace a market.
    pub fn insert(&mut self, name: impl Into<String>, params: MarketParams) {
        self.markets.insert(name.into().to_lowercase(), params);
    }

    /// Look up a market by case-insensitive name.
    pub fn get(&self, name: &str) -> Result<MarketParams, MarketError> {
        self.markets
            .get(&name.to_lowercase())
            .copied()
            .ok_or_else(|| MarketError::UnknownMarket(name.to_string()))
    }

    /// Market names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.markets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of markets.
    pub fn len(&self) -> usize {
        self.markets.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }

    /// Load a table from a JSON object of `name -> params`.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, BidError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| BidError::Io(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_json_str(&content)
    }

    /// Parse a table from a JSON object of `name -> params`.
    pub fn from_json_str(json: &str) -> Result<Self, BidError> {
        let raw: FxHashMap<String, MarketParams> =
            serde_json::from_str(json).map_err(|e| BidError::Parse(e.to_string()))?;
        let mut table = Self::new();
        for (name, params) in raw {
            params.validate()?;
            table.insert(name, params);
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_markets_are_very_cool() {
        let table = MarketTable::builtin();
        assert_eq!(table.names(), vec!["burnaby", "downtown"]);

        let downtown = table.get("Downtown").unwrap();
        assert_eq!(downtown, MarketParams::downtown());
        assert_eq!(downtown.condition(), MarketCondition::VeryCool);

        let burnaby = table.get("burnaby").unwrap();
        assert_eq!(burnaby.condition(), MarketCondition::VeryCool);
        assert!(burnaby.validate().is_ok());
    }

    #[test]
    fn test_classification() {
        assert_eq!(MarketParams::new(0.98, 0.05, 0.0).condition(), MarketCondition::Cooling);
        assert_eq!(MarketParams::new(0.94, 0.09, 0.0).condition(), MarketCondition::Cooling);
        assert_eq!(MarketParams::new(1.02, 0.08, 0.0).condition(), MarketCondition::Balanced);
        assert_eq!(MarketParams::new(1.08, 0.08, 0.0).condition(), MarketCondition::Balanced);
        assert_eq!(MarketParams::new(1.08, 0.12, 0.0).condition(), MarketCondition::VeryHot);
    }

    #[test]
    fn test_validate_rejects_degenerate_params() {
        assert_eq!(
            MarketParams::new(0.0, 0.05, 0.0).validate(),
            Err(MarketError::InvalidMedian(0.0))
        );
        assert_eq!(
            MarketParams::new(0.95, -0.1, 0.0).validate(),
            Err(MarketError::InvalidDispersion(-0.1))
        );
        assert!(MarketParams::new(0.95, 0.05, 1.5).validate().is_err());
        assert!(MarketParams::new(f64::NAN, 0.05, 0.0).validate().is_err());

        let mut unordered = MarketParams::downtown();
        unordered.thresholds.cooling_median = 0.9;
        assert_eq!(unordered.validate(), Err(MarketError::UnorderedThresholds));
    }

    #[test]
    fn test_unknown_market() {
        let table = MarketTable::builtin();
        assert_eq!(
            table.get("richmond"),
            Err(MarketError::UnknownMarket("richmond".to_string()))
        );
    }

    #[test]
    fn test_table_from_json() {
        let json = r#"{
            "Kitsilano": { "median_ratio": 1.02, "dispersion": 0.08, "skew": 0.2 },
            "surrey": { "median_ratio": 0.9, "dispersion": 0.07 }
        }"#;
        let table = MarketTable::from_json_str(json).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("kitsilano").unwrap().condition(), MarketCondition::Balanced);
        assert_eq!(table.get("surrey").unwrap().skew, 0.0);

        let bad = r#"{ "x": { "median_ratio": -1.0, "dispersion": 0.05 } }"#;
        assert!(matches!(
            MarketTable::from_json_str(bad),
            Err(BidError::Market(MarketError::InvalidMedian(_)))
        ));
        assert!(matches!(MarketTable::from_json_str("not json"), Err(BidError::Parse(_))));
    }
}
