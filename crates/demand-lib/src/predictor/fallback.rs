//! Rule-based demand estimate used when the model path fails

/// Demand assumed when nothing else is known
pub const BASE_DEMAND: f64 = 100.0;

/// Below this stock the base demand doubles
pub const LOW_STOCK_THRESHOLD: f64 = 10.0;

/// Above this stock the base demand halves
pub const HIGH_STOCK_THRESHOLD: f64 = 200.0;

/// Fallback predictor that uses simple heuristics when the model is unusable
pub struct FallbackPredictor;

impl FallbackPredictor {
    /// Estimate demand from stock alone; never fails
    pub fn estimate(current_stock: f64) -> u64 {
        let mut base = BASE_DEMAND;
        if current_stock < LOW_STOCK_THRESHOLD {
            base *= 2.0;
        } else if current_stock > HIGH_STOCK_THRESHOLD {
            base *= 0.5;
        }
        base.max(0.0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds() {
        assert_eq!(FallbackPredictor::estimate(0.0), 200);
        assert_eq!(FallbackPredictor::estimate(9.9), 200);
        assert_eq!(FallbackPredictor::estimate(10.0), 100);
        assert_eq!(FallbackPredictor::estimate(200.0), 100);
        assert_eq!(FallbackPredictor::estimate(200.1), 50);
    }

    #[test]
    fn test_non_increasing_in_stock() {
        let mut previous = u64::MAX;
        let mut stock = -50.0;
        while stock < 500.0 {
            let estimate = FallbackPredictor::estimate(stock);
            assert!(estimate <= previous, "stock {}", stock);
            previous = estimate;
            stock += 0.5;
        }
    }

    #[test]
    fn test_nan_stock_uses_base() {
        assert_eq!(FallbackPredictor::estimate(f64::NAN), 100);
    }
}
