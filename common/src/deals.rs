//! Resale viability score for a single deal.
//!
//! Pure arithmetic, nothing here touches the crawl. The score can be fed to
//! result ranking as a caller supplied key.

use std::fmt::{Display, Formatter, Result};

use serde::{Deserialize, Serialize};
use strum_macros::{Display as StrumDisplay, EnumString};

const DISCOUNT_WEIGHT: f64 = 0.5;
const DISCOUNT_CAP: f64 = 30.0;
const MARGIN_WEIGHT: f64 = 2.0;
const MARGIN_CAP: f64 = 40.0;

const BUY_THRESHOLD: i64 = 70;
const MAYBE_THRESHOLD: i64 = 50;

#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize, Serialize, EnumString, StrumDisplay)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Effort {
    Low,
    #[default]
    Medium,
    High,
}

impl Effort {
    fn points(self) -> f64 {
        match self {
            Effort::Low => 15.0,
            Effort::Medium => 10.0,
            Effort::High => 5.0,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize, Serialize, EnumString, StrumDisplay)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DealCategory {
    Perfume,
    Sneakers,
    Lego,
    Electronics,
    Clothing,
    #[default]
    Other,
}

impl DealCategory {
    fn bonus(self) -> f64 {
        match self {
            DealCategory::Perfume => 15.0,
            DealCategory::Sneakers | DealCategory::Lego => 12.0,
            DealCategory::Clothing => 10.0,
            DealCategory::Electronics => 8.0,
            DealCategory::Other => 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub name: String,
    pub original_price: f64,
    pub deal_price: f64,
    pub estimated_resale_price: f64,
    #[serde(default)]
    pub category: DealCategory,
    /// Kilograms.
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub effort: Effort,
}

fn default_weight() -> f64 {
    0.5
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, StrumDisplay)]
pub enum Verdict {
    #[strum(serialize = "BUY")]
    Buy,
    #[strum(serialize = "MAYBE")]
    Maybe,
    #[strum(serialize = "SKIP")]
    Skip,
}

impl Verdict {
    pub fn from_score(score: i64) -> Self {
        if score >= BUY_THRESHOLD {
            Verdict::Buy
        } else if score >= MAYBE_THRESHOLD {
            Verdict::Maybe
        } else {
            Verdict::Skip
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealAnalysis {
    pub name: String,
    pub investment: f64,
    pub discount_percent: f64,
    pub gross_margin: f64,
    pub shipping_cost: f64,
    pub net_margin: f64,
    pub roi_percent: f64,
    pub score: i64,
    pub verdict: Verdict,
}

impl Display for DealAnalysis {
    fn fmt(&self, f: &mut Formatter) -> Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "  investment:   €{:.2}", self.investment)?;
        writeln!(f, "  discount:     {:.1}%", self.discount_percent)?;
        writeln!(f, "  gross margin: €{:.2}", self.gross_margin)?;
        writeln!(f, "  net margin:   €{:.2}", self.net_margin)?;
        writeln!(f, "  roi:          {:.1}%", self.roi_percent)?;
        write!(f, "  score:        {} ({})", self.score, self.verdict)
    }
}

/// Flat rate by parcel weight.
pub fn shipping_cost(weight: f64) -> f64 {
    if weight < 0.5 {
        3.0
    } else if weight < 2.0 {
        5.0
    } else {
        8.0
    }
}

// a zero price makes ratios meaningless, count them as nothing
fn ratio_percent(numerator: f64, denominator: f64) -> f64 {
    let ratio = numerator / denominator * 100.0;

    if ratio.is_finite() { ratio } else { 0.0 }
}

pub fn calculate_score(
    discount_percent: f64,
    net_margin: f64,
    effort: Effort,
    category: DealCategory,
) -> i64 {
    let score = (discount_percent * DISCOUNT_WEIGHT).min(DISCOUNT_CAP)
        + (net_margin * MARGIN_WEIGHT).min(MARGIN_CAP)
        + effort.points()
        + category.bonus();

    // half-up rounding, -2.5 goes to -2
    (score + 0.5).floor() as i64
}

pub fn analyze_deal(deal: &Deal) -> DealAnalysis {
    let discount_percent = ratio_percent(deal.original_price - deal.deal_price, deal.original_price);
    let gross_margin = deal.estimated_resale_price - deal.deal_price;
    let roi_percent = ratio_percent(gross_margin, deal.deal_price);

    let shipping_cost = shipping_cost(deal.weight);
    let net_margin = gross_margin - shipping_cost;

    let score = calculate_score(discount_percent, net_margin, deal.effort, deal.category);

    DealAnalysis {
        name: deal.name.clone(),
        investment: deal.deal_price,
        discount_percent,
        gross_margin,
        shipping_cost,
        net_margin,
        roi_percent,
        score,
        verdict: Verdict::from_score(score),
    }
}
