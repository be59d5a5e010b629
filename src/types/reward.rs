//! Reward ledger types
//!
//! A reward entry is a grant of points or cashback that a user holds with a
//! merchant. Entries are created by accrual and consumed by redemption; an
//! entry whose balance reaches zero is deleted rather than kept around.

use super::error::LoyaltyError;
use super::transaction::{MerchantId, RewardId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kinds of reward a merchant can grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardType {
    /// Loyalty points
    Points,

    /// Cashback credited in currency units
    Cashback,
}

impl RewardType {
    /// Lowercase tag used in CSV files and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardType::Points => "points",
            RewardType::Cashback => "cashback",
        }
    }
}

impl fmt::Display for RewardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RewardType {
    type Err = LoyaltyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "points" => Ok(RewardType::Points),
            "cashback" => Ok(RewardType::Cashback),
            _ => Err(LoyaltyError::invalid_reward_type(s)),
        }
    }
}

/// The scope a balance is tracked and redeemed in
///
/// Redemption only ever draws from entries sharing the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RewardKey {
    pub user: UserId,
    pub merchant: MerchantId,
    pub reward_type: RewardType,
}

impl RewardKey {
    pub fn new(user: UserId, merchant: MerchantId, reward_type: RewardType) -> Self {
        RewardKey {
            user,
            merchant,
            reward_type,
        }
    }
}

impl fmt::Display for RewardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "user {} / merchant {} / {}",
            self.user, self.merchant, self.reward_type
        )
    }
}

/// A single reward grant in the ledger
#[derive(Debug, Clone, PartialEq)]
pub struct Reward {
    /// Ledger-assigned identifier; also defines retrieval order
    pub id: RewardId,

    /// The user holding the reward
    pub user: UserId,

    /// The merchant the reward can be redeemed with
    pub merchant: MerchantId,

    /// Points or cashback
    pub reward_type: RewardType,

    /// Remaining balance of this grant
    ///
    /// Always strictly positive while the entry exists.
    pub amount: Decimal,
}

impl Reward {
    /// The balance scope this entry belongs to
    pub fn key(&self) -> RewardKey {
        RewardKey::new(self.user, self.merchant, self.reward_type)
    }
}

/// Aggregated balance for one key, used for output
#[derive(Debug, Clone, PartialEq)]
pub struct RewardBalance {
    pub key: RewardKey,
    pub balance: Decimal,
}

/// Per-type totals across all merchants for a user
#[derive(Debug, Clone, PartialEq)]
pub struct RewardTotals {
    pub user: UserId,
    pub points: Decimal,
    pub cashback: Decimal,
}

impl RewardTotals {
    /// Sum a user's entries by reward type
    ///
    /// # Errors
    ///
    /// Returns an overflow error if a per-type total exceeds `Decimal::MAX`.
    pub fn from_rewards(user: UserId, rewards: &[Reward]) -> Result<Self, LoyaltyError> {
        let mut totals = RewardTotals {
            user,
            points: Decimal::ZERO,
            cashback: Decimal::ZERO,
        };
        for reward in rewards.iter().filter(|r| r.user == user) {
            let total = match reward.reward_type {
                RewardType::Points => &mut totals.points,
                RewardType::Cashback => &mut totals.cashback,
            };
            *total = total
                .checked_add(reward.amount)
                .ok_or_else(|| LoyaltyError::arithmetic_overflow("totals", user))?;
        }
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("points", RewardType::Points)]
    #[case("POINTS", RewardType::Points)]
    #[case(" cashback ", RewardType::Cashback)]
    #[case("CashBack", RewardType::Cashback)]
    fn test_reward_type_parses_case_insensitively(
        #[case] input: &str,
        #[case] expected: RewardType,
    ) {
        assert_eq!(input.parse::<RewardType>().unwrap(), expected);
    }

    #[test]
    fn test_reward_type_rejects_unknown_tag() {
        let err = "miles".parse::<RewardType>().unwrap_err();
        assert!(matches!(err, LoyaltyError::InvalidRewardType { .. }));
    }

    #[test]
    fn test_totals_split_by_type_and_ignore_other_users() {
        let rewards = vec![
            Reward {
                id: 1,
                user: 1,
                merchant: 2,
                reward_type: RewardType::Points,
                amount: Decimal::new(20, 0),
            },
            Reward {
                id: 2,
                user: 1,
                merchant: 3,
                reward_type: RewardType::Points,
                amount: Decimal::new(5, 0),
            },
            Reward {
                id: 3,
                user: 1,
                merchant: 2,
                reward_type: RewardType::Cashback,
                amount: Decimal::new(150, 2),
            },
            Reward {
                id: 4,
                user: 9,
                merchant: 2,
                reward_type: RewardType::Points,
                amount: Decimal::new(100, 0),
            },
        ];

        let totals = RewardTotals::from_rewards(1, &rewards).unwrap();
        assert_eq!(totals.points, Decimal::new(25, 0));
        assert_eq!(totals.cashback, Decimal::new(150, 2));
    }

    #[test]
    fn test_totals_overflow_is_an_error() {
        let max_points = Reward {
            id: 1,
            user: 1,
            merchant: 1,
            reward_type: RewardType::Points,
            amount: Decimal::MAX,
        };
        let rewards = vec![max_points.clone(), Reward { id: 2, ..max_points }];

        let err = RewardTotals::from_rewards(1, &rewards).unwrap_err();

        assert!(matches!(
            err,
            LoyaltyError::ArithmeticOverflow { ref operation, user: 1 } if operation == "totals"
        ));
    }
}
