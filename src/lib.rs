//! Conditional Vault Program
//!
//! Binary-outcome claim vault on Solana.
//!
//! ## Architecture
//!
//! - Market registry entries (one per `u16` index, owner-administered)
//! - One vault per market/collateral pairing, holding collateral in a token
//!   account owned by the program authority PDA
//! - Two claim mints per vault (outcome A / outcome B), minted 1:1 against
//!   deposited collateral
//!
//! ## Key Features
//!
//! - Issue: 1 collateral = 1 claim A + 1 claim B
//! - Redeem both claims for collateral while the market is unresolved
//! - Redeem the winning claim 1:1 for collateral once a verdict is recorded
//! - Every account is located by PDA derivation and verified on entry

pub mod authority;
pub mod error;
pub mod instruction;
pub mod pda;
pub mod processor;
pub mod state;
pub mod token;
pub mod utils;

#[cfg(not(feature = "no-entrypoint"))]
pub mod entrypoint;

// Re-export commonly used items
pub use error::{ConditionalVaultError, ErrorKind};
pub use instruction::ConditionalVaultInstruction;
pub use state::*;

solana_program::declare_id!("CVau1tXH3dLhH6Q3mBqPZ2sYyM3nJbHkN8e9uQxX5kRt");
