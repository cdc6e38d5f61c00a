//! Prediction workflow: assembly, normalization, inference, adjustment,
//! fallback and importance reporting

mod fallback;
mod features;
mod forecaster;
mod importance;
mod inference;
mod normalizer;
mod output;

pub use fallback::{FallbackPredictor, BASE_DEMAND, HIGH_STOCK_THRESHOLD, LOW_STOCK_THRESHOLD};
pub use features::{
    AssembledFeatures, FeatureAssembler, BATCH_NUMBER_LIMIT, EXPIRY_HORIZON_DAYS, LOCATION,
    MANUFACTURE_AGE_DAYS, RESTOCK_OFFSET, TRANSACTION_TYPE,
};
pub use forecaster::{DemandForecaster, Forecast};
pub use importance::{importance_report, load_importance_report, reweight, PRICE_WEIGHT, STOCK_WEIGHT};
pub use inference::infer;
pub use normalizer::normalize;
pub use output::{adjust, StockBand, BASE_SCALE};
