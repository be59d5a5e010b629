//! CSV format handling for loyalty events and balance output
//!
//! This module centralizes the event stream's CSV concerns:
//! - `CsvEventRecord` structure for deserialization
//! - Conversion from CSV records to [`LoyaltyEvent`]s
//! - Timestamp and decimal field parsing shared with the catalog loader
//! - Balance output serialization
//!
//! All functions are pure (no I/O beyond the writer they are given).

use crate::types::{
    BranchId, LoyaltyError, LoyaltyEvent, MerchantId, PurchaseRequest, RedemptionRequest,
    RewardBalance, RewardType, UserId,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// Raw CSV row of the event stream
///
/// Fields that only one event type needs are optional; which ones are
/// required is checked during conversion.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvEventRecord {
    #[serde(rename = "type")]
    pub event_type: String,
    pub user: UserId,
    pub merchant: MerchantId,
    #[serde(default)]
    pub branch: Option<BranchId>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub reward_type: Option<String>,
}

/// Treat missing and blank fields alike
fn present(field: &Option<String>) -> Option<&str> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Parse a decimal field, naming the field in the error
pub fn parse_decimal(field: &str, value: &str) -> Result<Decimal, LoyaltyError> {
    Decimal::from_str(value.trim()).map_err(|_| {
        LoyaltyError::validation(field, format!("invalid decimal '{}'", value.trim()))
    })
}

/// Parse a timestamp: RFC 3339, or `YYYY-MM-DD` meaning midnight UTC
pub fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, LoyaltyError> {
    let value = value.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    parse_date(field, value)?
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| LoyaltyError::validation(field, format!("invalid date '{}'", value)))
}

/// Parse an inclusive end timestamp
///
/// A bare `YYYY-MM-DD` covers the whole day, up to its last nanosecond.
pub fn parse_end_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, LoyaltyError> {
    let value = value.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    parse_date(field, value)?
        .and_hms_nano_opt(23, 59, 59, 999_999_999)
        .map(|end_of_day| end_of_day.and_utc())
        .ok_or_else(|| LoyaltyError::validation(field, format!("invalid date '{}'", value)))
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, LoyaltyError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        LoyaltyError::validation(
            field,
            format!("'{}' is neither RFC 3339 nor YYYY-MM-DD", value),
        )
    })
}

/// Convert a CSV record to a LoyaltyEvent
///
/// # Arguments
///
/// * `record` - The raw CSV record
///
/// # Returns
///
/// * `Ok(LoyaltyEvent)` if the record is well formed
/// * `Err(LoyaltyError)` describing the first problem found
///
/// # Errors
///
/// Returns an error if:
/// - The event type is not `purchase` or `redeem` (case-insensitive)
/// - The amount is missing or not a decimal
/// - A purchase has no date, or the date cannot be parsed
/// - A redemption has no reward type, or it is not `points` or `cashback`
///
/// Amount sign is not checked here; the engines own that rule.
pub fn convert_csv_record(record: CsvEventRecord) -> Result<LoyaltyEvent, LoyaltyError> {
    let amount = present(&record.amount)
        .ok_or_else(|| {
            LoyaltyError::validation(
                "amount",
                format!("{} event for user {} requires an amount", record.event_type, record.user),
            )
        })
        .and_then(|amount| parse_decimal("amount", amount))?;

    match record.event_type.trim().to_lowercase().as_str() {
        "purchase" => {
            let date = present(&record.date).ok_or_else(|| {
                LoyaltyError::validation(
                    "date",
                    format!("purchase for user {} requires a date", record.user),
                )
            })?;
            Ok(LoyaltyEvent::Purchase(PurchaseRequest {
                user: record.user,
                merchant: record.merchant,
                branch: record.branch,
                amount,
                date: parse_timestamp("date", date)?,
            }))
        }
        "redeem" => {
            let reward_type = present(&record.reward_type).ok_or_else(|| {
                LoyaltyError::validation(
                    "reward_type",
                    format!("redemption for user {} requires a reward type", record.user),
                )
            })?;
            Ok(LoyaltyEvent::Redeem(RedemptionRequest {
                user: record.user,
                merchant: record.merchant,
                amount,
                reward_type: RewardType::from_str(reward_type)?,
            }))
        }
        other => Err(LoyaltyError::validation(
            "type",
            format!("invalid event type '{}' for user {}", other, record.user),
        )),
    }
}

/// Write balances as CSV
///
/// Rows are sorted by (user, merchant, reward type) for deterministic output
/// and balances are written with four decimal places.
///
/// # Errors
///
/// Returns an error if writing or flushing fails.
pub fn write_balances_csv(
    balances: &[RewardBalance],
    output: &mut dyn Write,
) -> Result<(), LoyaltyError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record(["user", "merchant", "reward_type", "balance"])?;

    let mut sorted = balances.to_vec();
    sorted.sort_by_key(|balance| balance.key);

    for balance in sorted {
        writer.write_record(&[
            balance.key.user.to_string(),
            balance.key.merchant.to_string(),
            balance.key.reward_type.to_string(),
            format!("{:.4}", balance.balance),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
