//! Campaign types
//!
//! A campaign multiplies the merchant's base accrual for purchases made within
//! its date window, optionally restricted to a single branch and to purchases
//! above a minimum amount.

use super::reward::RewardType;
use super::transaction::{BranchId, CampaignId, MerchantId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// A merchant reward campaign
#[derive(Debug, Clone, PartialEq)]
pub struct Campaign {
    pub id: CampaignId,
    pub merchant: MerchantId,

    /// Branch the campaign is limited to; `None` means merchant-wide
    pub branch: Option<BranchId>,

    /// First instant the campaign applies (inclusive)
    pub start_date: DateTime<Utc>,

    /// Last instant the campaign applies (inclusive); `None` means open-ended
    pub end_date: Option<DateTime<Utc>>,

    /// Reward type granted by this campaign
    pub reward_type: RewardType,

    /// Multiplier applied to the merchant's base accrual
    pub value: Decimal,

    /// Minimum purchase amount required to qualify
    pub min_amount: Option<Decimal>,
}

impl Campaign {
    /// Whether the campaign is running for a purchase at this merchant, branch and date
    ///
    /// A purchase without a known branch only matches merchant-wide campaigns.
    pub fn is_active(
        &self,
        merchant: MerchantId,
        branch: Option<BranchId>,
        date: DateTime<Utc>,
    ) -> bool {
        if self.merchant != merchant {
            return false;
        }

        let in_window = self.start_date <= date && self.end_date.is_none_or(|end| end >= date);

        let branch_matches = match (self.branch, branch) {
            (None, _) => true,
            (Some(campaign_branch), Some(purchase_branch)) => campaign_branch == purchase_branch,
            (Some(_), None) => false,
        };

        in_window && branch_matches
    }

    /// Whether a purchase amount meets the campaign minimum
    pub fn qualifies(&self, amount: Decimal) -> bool {
        self.min_amount.is_none_or(|min| amount >= min)
    }
}
