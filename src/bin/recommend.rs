//! Rental Bid Recommender
//!
//! Builds a situation from flags or a JSON file, runs the three strategies
//! and prints the recommendations. Pass `--round-one-bid` and `--feedback`
//! to plan a second round.

use std::time::Instant;

use clap::{Parser, ValueEnum};
use tracing::info;

use rental_bid_solver::rental::{
    BidConfig, LandlordFeedback, MarketAnalysis, MarketTable, RecommendationReport, Situation,
    StrategyGenerator,
};

#[derive(Parser)]
#[command(name = "recommend")]
#[command(about = "Recommend bids for a contested rental unit")]
struct Args {
    /// Market name from the market table
    #[arg(short, long, default_value = "downtown")]
    market: String,

    /// JSON market table to use instead of the built-in one
    #[arg(long)]
    markets: Option<String>,

    /// JSON engine configuration
    #[arg(long)]
    config: Option<String>,

    /// JSON situation file; overrides the situation flags
    #[arg(long)]
    situation: Option<String>,

    /// Asking rent
    #[arg(long, default_value = "2200")]
    listing_price: f64,

    /// Average rent of comparable units nearby
    #[arg(long, default_value = "2100")]
    neighborhood_avg: f64,

    /// Days the listing has been up
    #[arg(long, default_value = "7")]
    days_on_market: u32,

    /// Landlord flexibility: 1 firm, 2 moderate, 3 flexible
    #[arg(long, default_value = "2")]
    landlord_flexibility: u8,

    /// Competition: 1 low, 2 medium, 3 high
    #[arg(long, default_value = "2")]
    competition: u8,

    /// Maximum budget
    #[arg(long, default_value = "2500")]
    budget: f64,

    /// How much you want this unit, 1-5
    #[arg(long, default_value = "4")]
    property_value: u8,

    /// Risk tolerance, 1-5
    #[arg(long, default_value = "3")]
    risk_tolerance: f64,

    /// Bid made in round one; plans round two
    #[arg(long, requires = "feedback")]
    round_one_bid: Option<f64>,

    /// Landlord's answer to the round-one bid
    #[arg(long, requires = "round_one_bid")]
    feedback: Option<FeedbackKind>,

    /// Price the landlord countered with
    #[arg(long, required_if_eq("feedback", "counter"))]
    counter_price: Option<f64>,

    /// Write the report as JSON
    #[arg(short, long)]
    output: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FeedbackKind {
    Counter,
    Final,
    Accept,
    Reject,
}

impl Args {
    fn feedback(&self) -> LandlordFeedback {
        match self.feedback {
            Some(FeedbackKind::Counter) => LandlordFeedback::Counter {
                price: self.counter_price.unwrap_or(self.listing_price),
            },
            Some(FeedbackKind::Final) => LandlordFeedback::Final,
            Some(FeedbackKind::Accept) => LandlordFeedback::Accept,
            Some(FeedbackKind::Reject) => LandlordFeedback::Reject,
            None => LandlordFeedback::None,
        }
    }

    fn situation(&self) -> Result<Situation, Box<dyn std::error::Error>> {
        if let Some(path) = &self.situation {
            let json = std::fs::read_to_string(path)?;
            return Ok(serde_json::from_str(&json)?);
        }
        Ok(Situation {
            listing_price: self.listing_price,
            neighborhood_avg: self.neighborhood_avg,
            days_on_market: self.days_on_market,
            price_sens_landlord: self.landlord_flexibility,
            competitive_level: self.competition,
            max_budget: self.budget,
            property_value: self.property_value,
            risk_tolerance: self.risk_tolerance,
        })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match &args.config {
        Some(path) => BidConfig::from_json_file(path)?,
        None => BidConfig::default(),
    };
    let markets = match &args.markets {
        Some(path) => MarketTable::from_json_file(path)?,
        None => MarketTable::builtin(),
    };
    let market = markets.get(&args.market)?;

    let situation = args.situation()?;
    situation.validate()?;

    let generator = StrategyGenerator::new(config)?;
    let feedback = args.feedback();

    let start = Instant::now();
    let recommendations = match args.round_one_bid {
        Some(bid) => generator.round_two(&situation, &market, bid, feedback)?,
        None => generator.generate_three_strategies(&situation, &market)?,
    };
    info!(elapsed_ms = start.elapsed().as_millis() as u64, "search finished");

    let analysis = MarketAnalysis::new(&args.market, &market, &situation);
    let report = RecommendationReport::new(analysis, situation, feedback, recommendations);
    report.print_summary();

    if let Some(path) = &args.output {
        report.save_json(path)?;
        println!("Saved report to {}", path);
    }

    Ok(())
}
