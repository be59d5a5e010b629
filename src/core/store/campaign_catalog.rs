//! Read-only campaign catalog
//!
//! Campaigns are configuration: they are loaded once, validated, and then
//! only queried. No interior mutability is needed, so a plain `HashMap` shared
//! behind an `Arc` is enough.

use crate::core::traits::CampaignQuery;
use crate::types::{BranchId, Campaign, LoyaltyError, MerchantId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

/// In-memory [`CampaignQuery`]
#[derive(Debug, Default, Clone)]
pub struct CampaignCatalog {
    /// Campaigns per merchant, ordered by campaign id
    by_merchant: HashMap<MerchantId, Vec<Campaign>>,
}

impl CampaignCatalog {
    /// Build a catalog, rejecting invalid or duplicate campaigns
    ///
    /// # Errors
    ///
    /// Returns a validation error if:
    /// - Two campaigns share an id
    /// - A value or minimum amount is negative
    /// - An end date precedes its start date
    pub fn new(campaigns: Vec<Campaign>) -> Result<Self, LoyaltyError> {
        let mut seen = HashSet::new();
        let mut by_merchant: HashMap<MerchantId, Vec<Campaign>> = HashMap::new();

        for campaign in campaigns {
            if !seen.insert(campaign.id) {
                return Err(LoyaltyError::validation(
                    "campaign id",
                    format!("duplicate campaign {}", campaign.id),
                ));
            }
            Self::validate(&campaign)?;
            by_merchant
                .entry(campaign.merchant)
                .or_default()
                .push(campaign);
        }

        for campaigns in by_merchant.values_mut() {
            campaigns.sort_by_key(|campaign| campaign.id);
        }

        Ok(Self { by_merchant })
    }

    fn validate(campaign: &Campaign) -> Result<(), LoyaltyError> {
        if campaign.value < Decimal::ZERO {
            return Err(LoyaltyError::validation(
                "campaign value",
                format!("campaign {} has negative value {}", campaign.id, campaign.value),
            ));
        }
        if campaign.min_amount.is_some_and(|min| min < Decimal::ZERO) {
            return Err(LoyaltyError::validation(
                "campaign min_amount",
                format!("campaign {} has a negative minimum amount", campaign.id),
            ));
        }
        if campaign
            .end_date
            .is_some_and(|end| end < campaign.start_date)
        {
            return Err(LoyaltyError::validation(
                "campaign end_date",
                format!("campaign {} ends before it starts", campaign.id),
            ));
        }
        Ok(())
    }

    /// Total number of campaigns
    pub fn len(&self) -> usize {
        self.by_merchant.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_merchant.is_empty()
    }
}

impl CampaignQuery for CampaignCatalog {
    fn find_active(
        &self,
        merchant: MerchantId,
        branch: Option<BranchId>,
        date: DateTime<Utc>,
    ) -> Result<Vec<Campaign>, LoyaltyError> {
        Ok(self
            .by_merchant
            .get(&merchant)
            .map(|campaigns| {
                campaigns
                    .iter()
                    .filter(|campaign| campaign.is_active(merchant, branch, date))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
