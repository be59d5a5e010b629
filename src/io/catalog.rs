//! Merchant and campaign catalog loading
//!
//! The catalog is configuration rather than streamed data: every row must be
//! valid, and the first bad row aborts the load with its line number.

use crate::core::store::{CampaignCatalog, MerchantDirectory};
use crate::io::csv_format::{parse_decimal, parse_end_timestamp, parse_timestamp};
use crate::io::sync_reader::{csv_reader, open};
use crate::types::{
    BranchId, Campaign, CampaignId, LoyaltyError, Merchant, MerchantId, RewardType,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// Raw row of the merchants CSV
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvMerchantRecord {
    pub id: MerchantId,
    pub name: String,
    pub conversion_factor: String,
    pub default_reward_type: String,
}

/// Raw row of the campaigns CSV
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvCampaignRecord {
    pub id: CampaignId,
    pub merchant: MerchantId,
    #[serde(default)]
    pub branch: Option<BranchId>,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    pub reward_type: String,
    pub value: String,
    #[serde(default)]
    pub min_amount: Option<String>,
}

fn blank_to_none(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.trim().is_empty())
}

impl TryFrom<CsvMerchantRecord> for Merchant {
    type Error = LoyaltyError;

    fn try_from(record: CsvMerchantRecord) -> Result<Self, Self::Error> {
        Ok(Merchant {
            id: record.id,
            name: record.name,
            conversion_factor: parse_decimal("conversion_factor", &record.conversion_factor)?,
            default_reward_type: RewardType::from_str(&record.default_reward_type)?,
        })
    }
}

impl TryFrom<CsvCampaignRecord> for Campaign {
    type Error = LoyaltyError;

    fn try_from(record: CsvCampaignRecord) -> Result<Self, Self::Error> {
        Ok(Campaign {
            id: record.id,
            merchant: record.merchant,
            branch: record.branch,
            start_date: parse_timestamp("start_date", &record.start_date)?,
            end_date: blank_to_none(record.end_date)
                .map(|end| parse_end_timestamp("end_date", &end))
                .transpose()?,
            reward_type: RewardType::from_str(&record.reward_type)?,
            value: parse_decimal("value", &record.value)?,
            min_amount: blank_to_none(record.min_amount)
                .map(|min| parse_decimal("min_amount", &min))
                .transpose()?,
        })
    }
}

/// Deserialize and convert every row, failing on the first bad one
fn read_rows<R, C, T>(mut reader: csv::Reader<R>) -> Result<Vec<T>, LoyaltyError>
where
    R: Read,
    C: DeserializeOwned,
    T: TryFrom<C, Error = LoyaltyError>,
{
    let mut rows = Vec::new();

    for (index, record) in reader.deserialize::<C>().enumerate() {
        let line = index as u64 + 2;
        let row = record
            .map_err(|e| LoyaltyError::parse_error(Some(line), e.to_string()))
            .and_then(|record| {
                T::try_from(record)
                    .map_err(|e| LoyaltyError::parse_error(Some(line), e.to_string()))
            })?;
        rows.push(row);
    }

    Ok(rows)
}

/// Parse merchants from any CSV source
pub fn read_merchants<R: Read>(source: R) -> Result<MerchantDirectory, LoyaltyError> {
    MerchantDirectory::new(read_rows::<_, CsvMerchantRecord, Merchant>(csv_reader(source))?)
}

/// Parse campaigns from any CSV source
pub fn read_campaigns<R: Read>(source: R) -> Result<CampaignCatalog, LoyaltyError> {
    CampaignCatalog::new(read_rows::<_, CsvCampaignRecord, Campaign>(csv_reader(source))?)
}

/// Read-only configuration the engines consult
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub merchants: Arc<MerchantDirectory>,
    pub campaigns: Arc<CampaignCatalog>,
}

impl Catalog {
    /// Load the merchants file and, if given, the campaigns file
    ///
    /// Without a campaigns file every purchase earns the merchant default.
    ///
    /// # Errors
    ///
    /// Returns an error if a file is missing or unreadable, a row is
    /// malformed, or the catalog fails validation.
    pub fn load(merchants: &Path, campaigns: Option<&Path>) -> Result<Self, LoyaltyError> {
        let merchants = read_merchants(open(merchants)?)?;
        let campaigns = match campaigns {
            Some(path) => read_campaigns(open(path)?)?,
            None => CampaignCatalog::default(),
        };

        info!(
            merchants = merchants.len(),
            campaigns = campaigns.len(),
            "catalog loaded"
        );

        Ok(Self {
            merchants: Arc::new(merchants),
            campaigns: Arc::new(campaigns),
        })
    }
}
