//! Feature assembly for the CLI prediction path
//!
//! Derives the full training-time feature row from a logical request:
//! synthesized identifiers, fixed categorical constants, calendar fields
//! and day offsets. The derivation must match the rules the estimator was
//! fitted against, so constants here are not tunable.

use crate::error::{PredictionError, Result};
use crate::models::{FeatureValue, PredictionRequest, Row};
use chrono::{Datelike, NaiveDateTime, NaiveTime, TimeDelta};
use rand::rngs::ThreadRng;
use rand::Rng;

/// Stock assumed to have been on hand before the last restock
pub const RESTOCK_OFFSET: f64 = 10.0;

/// Shelf life added to the reference date
pub const EXPIRY_HORIZON_DAYS: i64 = 180;

/// Age of the batch at the reference date
pub const MANUFACTURE_AGE_DAYS: i64 = 30;

/// Exclusive upper bound of synthesized batch numbers
pub const BATCH_NUMBER_LIMIT: u32 = 5000;

pub const TRANSACTION_TYPE: &str = "sale";
pub const LOCATION: &str = "WH_A";

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Every field derived from one request, in derivation order
#[derive(Debug, Clone)]
pub struct AssembledFeatures {
    fields: Vec<(&'static str, FeatureValue)>,
}

impl AssembledFeatures {
    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(name, _)| *name)
    }

    /// Select `columns` in order; unknown names fail with `MissingFeature`
    pub fn select(&self, columns: &[String]) -> Result<Row> {
        columns
            .iter()
            .map(|column| {
                self.get(column)
                    .cloned()
                    .ok_or_else(|| PredictionError::MissingFeature(column.clone()))
            })
            .collect()
    }
}

/// Builds ordered feature rows from prediction requests
///
/// The random source only feeds the synthesized `batch_id`; inject a seeded
/// generator for reproducible rows.
pub struct FeatureAssembler<R: Rng> {
    rng: R,
}

impl FeatureAssembler<ThreadRng> {
    pub fn new() -> Self {
        Self { rng: rand::rng() }
    }
}

impl Default for FeatureAssembler<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> FeatureAssembler<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Derive every feature for `request`
    ///
    /// The reference time is read once from the request, so the day
    /// offsets and calendar fields always agree. A reference time too close
    /// to the calendar bounds leaves a date field underivable.
    pub fn derive(&mut self, request: &PredictionRequest) -> Result<AssembledFeatures> {
        let reference = request.reference_time;
        let expiry = reference
            .checked_add_signed(TimeDelta::days(EXPIRY_HORIZON_DAYS))
            .ok_or_else(|| PredictionError::MissingFeature("expiry_date".to_string()))?;
        let manufacture = reference
            .checked_sub_signed(TimeDelta::days(MANUFACTURE_AGE_DAYS))
            .ok_or_else(|| PredictionError::MissingFeature("manufacture_date".to_string()))?;
        let batch_number = self.rng.random_range(1..BATCH_NUMBER_LIMIT);

        let fields = vec![
            ("sku_id", FeatureValue::Text(format!("SKU_{:04}", request.product_id))),
            (
                "qty_in",
                FeatureValue::Number((request.current_stock - RESTOCK_OFFSET).max(0.0)),
            ),
            ("current_stock", FeatureValue::Number(request.current_stock)),
            ("batch_id", FeatureValue::Text(format!("BATCH_{:05}", batch_number))),
            (
                "expiry_date",
                FeatureValue::Text(expiry.format(DATE_FORMAT).to_string()),
            ),
            (
                "manufacture_date",
                FeatureValue::Text(manufacture.format(DATE_FORMAT).to_string()),
            ),
            ("transaction_type", FeatureValue::from(TRANSACTION_TYPE)),
            ("location", FeatureValue::from(LOCATION)),
            ("price", FeatureValue::Number(request.price)),
            (
                "timestamp",
                FeatureValue::Text(reference.format(TIMESTAMP_FORMAT).to_string()),
            ),
            ("year", FeatureValue::from(reference.year() as i64)),
            ("month", FeatureValue::from(reference.month() as i64)),
            ("day", FeatureValue::from(reference.day() as i64)),
            (
                "day_of_week",
                FeatureValue::from(reference.weekday().num_days_from_monday() as i64),
            ),
            (
                "expiry_days",
                FeatureValue::from(floor_days(midnight(expiry) - reference)),
            ),
            (
                "manufacture_days",
                FeatureValue::from(floor_days(reference - midnight(manufacture))),
            ),
        ];

        Ok(AssembledFeatures { fields })
    }

    /// Derive the features for `request` and order them as `input_columns`
    pub fn assemble(&mut self, request: &PredictionRequest, input_columns: &[String]) -> Result<Row> {
        self.derive(request)?.select(input_columns)
    }
}

/// Dates are written without a time, so offsets count from midnight
fn midnight(at: NaiveDateTime) -> NaiveDateTime {
    at.date().and_time(NaiveTime::MIN)
}

/// Whole days in `delta`, rounded toward negative infinity
fn floor_days(delta: TimeDelta) -> i64 {
    let days = delta.num_days();
    if delta < TimeDelta::days(days) {
        days - 1
    } else {
        days
    }
}
