//! In-memory collaborator implementations
//!
//! These back the CLI and the test suite. Mutable state (transactions and the
//! reward ledger) uses `DashMap` for fine-grained locking so engines can be
//! shared across tokio tasks; configuration (campaigns and merchants) is
//! read-only after loading.

pub mod campaign_catalog;
pub mod merchant_directory;
pub mod reward_ledger;
pub mod transaction_store;

pub use campaign_catalog::CampaignCatalog;
pub use merchant_directory::MerchantDirectory;
pub use reward_ledger::InMemoryRewardLedger;
pub use transaction_store::InMemoryTransactionStore;
