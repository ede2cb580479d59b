//! Report formatting for recommendations.

use std::fs::File;
use std::io::Write;

use serde::{Deserialize, Serialize};

use super::market::{MarketCondition, MarketParams};
use super::state::{LandlordFeedback, Round, Situation};
use super::strategy::{Recommendation, StrategyLabel};

/// How fresh a listing is, from days on market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingFreshness {
    /// Under a week.
    Fresh,
    /// Under two weeks.
    Recent,
    /// Under a month.
    Aging,
    /// A month or more.
    Stale,
}

impl ListingFreshness {
    /// Classify by days on market.
    pub fn from_days(days_on_market: u32) -> Self {
        match days_on_market {
            0..=6 => ListingFreshness::Fresh,
            7..=13 => ListingFreshness::Recent,
            14..=29 => ListingFreshness::Aging,
            _ => ListingFreshness::Stale,
        }
    }

    /// Short description of what the freshness means for the bidder.
    pub fn describe(self) -> &'static str {
        match self {
            ListingFreshness::Fresh => "Fresh listing (high interest expected)",
            ListingFreshness::Recent => "Recent listing (moderate interest)",
            ListingFreshness::Aging => "Aging listing (negotiation opportunity)",
            ListingFreshness::Stale => "Stale listing (strong negotiation position)",
        }
    }

    /// Expected landlord behaviour at this freshness.
    pub fn landlord_outlook(self) -> [&'static str; 2] {
        match self {
            ListingFreshness::Fresh => ["Landlord likely firm on price", "May wait for multiple offers"],
            ListingFreshness::Recent => ["Landlord becoming more flexible", "Open to reasonable offers"],
            ListingFreshness::Aging => ["Landlord motivated to close", "Good negotiation opportunity"],
            ListingFreshness::Stale => ["Landlord very motivated", "Strong negotiation position for tenants"],
        }
    }
}

/// Market context printed above the recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketAnalysis {
    /// Market name as looked up.
    pub market: String,
    /// Classified condition.
    pub condition: MarketCondition,
    /// Typical winning bid as a ratio of listing.
    pub median_ratio: f64,
    /// Listing freshness.
    pub freshness: ListingFreshness,
}

impl MarketAnalysis {
    /// Analyse a situation in a named market.
    pub fn new(market_name: &str, market: &MarketParams, situation: &Situation) -> Self {
        Self {
            market: market_name.to_string(),
            condition: market.condition(),
            median_ratio: market.median_ratio,
            freshness: ListingFreshness::from_days(situation.days_on_market),
        }
    }

    /// Print as text.
    pub fn print(&self) {
        println!("\nMARKET ANALYSIS: {}", self.market);
        println!("{}", "-".repeat(40));
        println!("Market Condition: {}", self.condition);
        println!("Typical Winning Bid: {:.0}% of listing price", self.median_ratio * 100.0);
        println!("Property Freshness: {}", self.freshness.describe());
        println!("\nLandlord Behavior Prediction:");
        for line in self.freshness.landlord_outlook() {
            println!("   - {}", line);
        }
    }
}

/// Complete output of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationReport {
    /// Run metadata.
    pub metadata: ReportMetadata,
    /// Market context.
    pub analysis: MarketAnalysis,
    /// Situation the run was for.
    pub situation: Situation,
    /// Conservative, balanced and aggressive, in that order.
    pub recommendations: Vec<Recommendation>,
}

/// When and for which round the report was produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Round the recommendations are for.
    pub round: Round,
    /// Landlord feedback that opened the round, if any.
    pub feedback: LandlordFeedback,
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
}

impl RecommendationReport {
    /// Bundle recommendations with their context.
    pub fn new(
        analysis: MarketAnalysis,
        situation: Situation,
        feedback: LandlordFeedback,
        recommendations: [Recommendation; 3],
    ) -> Self {
        let round = recommendations[0].round;
        Self {
            metadata: ReportMetadata {
                round,
                feedback,
                timestamp: std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or(0),
            },
            analysis,
            situation,
            recommendations: recommendations.to_vec(),
        }
    }

    /// Recommendation for one strategy.
    pub fn get(&self, label: StrategyLabel) -> Option<&Recommendation> {
        self.recommendations.iter().find(|r| r.strategy == label)
    }

    /// Write the report as pretty JSON.
    pub fn save_json(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Print the analysis and every recommendation.
    pub fn print_summary(&self) {
        self.analysis.print();

        println!("\nROUND {} RECOMMENDATIONS:", self.metadata.round);
        println!("{}", "=".repeat(60));

        for (i, rec) in self.recommendations.iter().enumerate() {
            let tag = if rec.strategy == StrategyLabel::Balanced {
                " [RECOMMENDED - Best Expected Value]"
            } else {
                ""
            };
            println!("\n{}. {} STRATEGY{}", i + 1, rec.strategy.to_string().to_uppercase(), tag);
            println!("   Recommended Bid: ${:.0} ({:.1}% of listing)", rec.bid, rec.narrative_ratio);
            println!("   Win Probability: {:.0}%", rec.win_probability * 100.0);
            println!("   Likely Landlord Response: {}", rec.likely_response.message());
            if rec.requires_negotiation() {
                println!("   ! May require additional negotiation rounds");
            }

            let diff = rec.expected_overpayment_or_savings;
            if diff < 0.0 {
                println!("   Expected Savings: ${:.0} below market", -diff);
            } else {
                println!("   Expected Overpayment: ${:.0} above market", diff);
            }
            println!("   Strategy: {}", rec.strategy.description());
            println!(
                "   Algorithm Confidence: {} (expected utility {:.3})",
                rec.confidence, rec.expected_utility
            );
            if rec.fallback {
                println!("   ! No bid fit the budget; showing the lowest feasible bid");
            }
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rental::config::BidConfig;
    use crate::rental::strategy::StrategyGenerator;
    use crate::rental::test_support::{cooling_market, scenario};

    #[test]
    fn test_freshness_bands() {
        assert_eq!(ListingFreshness::from_days(0), ListingFreshness::Fresh);
        assert_eq!(ListingFreshness::from_days(7), ListingFreshness::Recent);
        assert_eq!(ListingFreshness::from_days(14), ListingFreshness::Aging);
        assert_eq!(ListingFreshness::from_days(30), ListingFreshness::Stale);
    }

    #[test]
    fn test_report_json() {
        let generator = StrategyGenerator::new(BidConfig::default()).unwrap();
        let recs = generator.generate_three_strategies(&scenario(), &cooling_market()).unwrap();
        let analysis = MarketAnalysis::new("test", &cooling_market(), &scenario());
        assert_eq!(analysis.condition, MarketCondition::Cooling);

        let report = RecommendationReport::new(analysis, scenario(), LandlordFeedback::None, recs);
        assert_eq!(report.metadata.round, Round::First);
        assert_eq!(report.get(StrategyLabel::Balanced).map(|r| r.strategy), Some(StrategyLabel::Balanced));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["recommendations"].as_array().map(Vec::len), Some(3));
        assert_eq!(json["recommendations"][0]["strategy"], "conservative");
        assert_eq!(json["analysis"]["freshness"], "recent");
        assert_eq!(json["metadata"]["feedback"]["kind"], "none");
    }
}
