//! Post-processing of raw model output into published demand
//!
//! Raw predictions are halved and then rescaled by a stock-dependent
//! multiplier: low stock publishes high demand and high stock publishes low
//! demand, overriding the model's own signal.

/// Scale applied to every raw prediction before the stock multiplier
pub const BASE_SCALE: f64 = 0.5;

/// Disjoint stock bands with their demand multipliers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockBand {
    /// `< 10`
    Critical,
    /// `[10, 50)`
    Low,
    /// `[50, 100)`
    Moderate,
    /// `[100, 150]`
    Comfortable,
    /// `> 150`
    Overstocked,
}

impl StockBand {
    /// Band for `current_stock`; NaN lands in `Comfortable`
    pub fn for_stock(current_stock: f64) -> Self {
        if current_stock < 10.0 {
            StockBand::Critical
        } else if current_stock < 50.0 {
            StockBand::Low
        } else if current_stock < 100.0 {
            StockBand::Moderate
        } else if current_stock > 150.0 {
            StockBand::Overstocked
        } else {
            StockBand::Comfortable
        }
    }

    pub fn multiplier(&self) -> f64 {
        match self {
            StockBand::Critical => 3.0,
            StockBand::Low => 2.0,
            StockBand::Moderate => 1.2,
            StockBand::Comfortable => 0.6,
            StockBand::Overstocked => 0.3,
        }
    }
}

/// Halve, apply the band multiplier, clamp at zero
pub fn adjust(raw_prediction: f64, current_stock: f64) -> f64 {
    let base = raw_prediction * BASE_SCALE;
    let scaled = base * StockBand::for_stock(current_stock).multiplier();
    // f64::max returns the non-NaN operand
    scaled.max(0.0)
}
