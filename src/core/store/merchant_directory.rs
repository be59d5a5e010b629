//! Read-only merchant directory

use crate::core::traits::MerchantLookup;
use crate::types::{LoyaltyError, Merchant, MerchantId};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// In-memory [`MerchantLookup`]
#[derive(Debug, Default, Clone)]
pub struct MerchantDirectory {
    merchants: HashMap<MerchantId, Merchant>,
}

impl MerchantDirectory {
    /// Build a directory, rejecting duplicate ids and negative conversion factors
    pub fn new(merchants: Vec<Merchant>) -> Result<Self, LoyaltyError> {
        let mut by_id = HashMap::with_capacity(merchants.len());

        for merchant in merchants {
            if merchant.conversion_factor < Decimal::ZERO {
                return Err(LoyaltyError::validation(
                    "merchant conversion_factor",
                    format!(
                        "merchant {} has negative conversion factor {}",
                        merchant.id, merchant.conversion_factor
                    ),
                ));
            }
            let id = merchant.id;
            if by_id.insert(id, merchant).is_some() {
                return Err(LoyaltyError::validation(
                    "merchant id",
                    format!("duplicate merchant {}", id),
                ));
            }
        }

        Ok(Self { merchants: by_id })
    }

    pub fn len(&self) -> usize {
        self.merchants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.merchants.is_empty()
    }
}

impl MerchantLookup for MerchantDirectory {
    fn get(&self, merchant: MerchantId) -> Result<Merchant, LoyaltyError> {
        self.merchants
            .get(&merchant)
            .cloned()
            .ok_or_else(|| LoyaltyError::not_found("merchant", merchant.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RewardType;

    fn merchant(id: MerchantId, factor: Decimal) -> Merchant {
        Merchant {
            id,
            name: format!("Merchant {}", id),
            conversion_factor: factor,
            default_reward_type: RewardType::Points,
        }
    }

    #[test]
    fn test_get_known_merchant() {
        let directory = MerchantDirectory::new(vec![merchant(2, Decimal::new(1, 1))]).unwrap();
        let found = directory.get(2).unwrap();
        assert_eq!(found.conversion_factor, Decimal::new(1, 1));
    }

    #[test]
    fn test_get_unknown_merchant_is_not_found() {
        let directory = MerchantDirectory::default();
        assert!(matches!(
            directory.get(2).unwrap_err(),
            LoyaltyError::NotFound { id: 2, .. }
        ));
    }

    #[test]
    fn test_rejects_duplicates_and_negative_factor() {
        assert!(MerchantDirectory::new(vec![
            merchant(1, Decimal::ONE),
            merchant(1, Decimal::ONE)
        ])
        .is_err());
        assert!(MerchantDirectory::new(vec![merchant(1, Decimal::new(-1, 0))]).is_err());
    }
}
