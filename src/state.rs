//! State definitions for the Conditional Vault Program
//!
//! All account structures used by the program.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::error::ConditionalVaultError;

// ============================================================================
// Discriminators
// ============================================================================

pub const MARKET_ENTRY_DISCRIMINATOR: u64 = 0x4D4B545F454E5452; // "MKT_ENTR"
pub const VAULT_LEDGER_DISCRIMINATOR: u64 = 0x5641554C545F4C47; // "VAULT_LG"

// ============================================================================
// PDA Seeds
// ============================================================================

pub const MARKET_SEED: &[u8] = b"market";
pub const AUTHORITY_SEED: &[u8] = b"authority";
pub const VAULT_STATE_SEED: &[u8] = b"vault_state";
pub const VAULT_SEED: &[u8] = b"vault";
pub const CLAIM_A_SEED: &[u8] = b"claim_a";
pub const CLAIM_B_SEED: &[u8] = b"claim_b";

// ============================================================================
// Constants
// ============================================================================

/// Maximum length of market name (bytes)
pub const MAX_NAME_LEN: usize = 100;

/// Maximum length of market description (bytes)
pub const MAX_DESCRIPTION_LEN: usize = 100;

// ============================================================================
// Enums
// ============================================================================

/// Resolution status of a vault
#[derive(BorshSerialize, BorshDeserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    /// Claims trade freely; issue and redeem-both are legal
    #[default]
    Unresolved,
    /// Terminal; only the winning claim is redeemable
    Resolved { winning_mint: Pubkey },
}

/// Editable market entry field
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub enum MarketField {
    Name(String),
    Description(String),
    Expiration(i64),
    Owner(Pubkey),
}

// ============================================================================
// Account Structures
// ============================================================================

/// Registry entry for a single market
///
/// PDA Seeds: ["market", index.to_be_bytes()]
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct MarketEntry {
    /// Account discriminator
    pub discriminator: u64,

    /// Registry index
    pub index: u16,

    /// Market owner (registrar)
    pub owner: Pubkey,

    /// Market name
    pub name: String,

    /// Market description
    pub description: String,

    /// Creation timestamp
    pub created_at: i64,

    /// Expiration timestamp
    pub expiration: i64,

    /// Set once a verdict has been recorded on the vault
    pub resolved: bool,

    /// Vault ledger bound to this market (default until initialized)
    pub vault_ledger: Pubkey,

    /// Collateral vault token account
    pub vault: Pubkey,

    /// Outcome A claim mint
    pub claim_a_mint: Pubkey,

    /// Outcome B claim mint
    pub claim_b_mint: Pubkey,

    /// PDA bump
    pub bump: u8,

    /// Reserved for future use
    pub reserved: [u8; 32],
}

impl MarketEntry {
    pub const SIZE: usize = 8   // discriminator
        + 2   // index
        + 32  // owner
        + 4 + MAX_NAME_LEN        // name
        + 4 + MAX_DESCRIPTION_LEN // description
        + 8   // created_at
        + 8   // expiration
        + 1   // resolved
        + 32  // vault_ledger
        + 32  // vault
        + 32  // claim_a_mint
        + 32  // claim_b_mint
        + 1   // bump
        + 32; // reserved

    pub fn new(
        index: u16,
        owner: Pubkey,
        name: String,
        description: String,
        created_at: i64,
        expiration: i64,
        bump: u8,
    ) -> Result<Self, ConditionalVaultError> {
        validate_name(&name)?;
        validate_description(&description)?;
        Ok(Self {
            discriminator: MARKET_ENTRY_DISCRIMINATOR,
            index,
            owner,
            name,
            description,
            created_at,
            expiration,
            resolved: false,
            vault_ledger: Pubkey::default(),
            vault: Pubkey::default(),
            claim_a_mint: Pubkey::default(),
            claim_b_mint: Pubkey::default(),
            bump,
            reserved: [0u8; 32],
        })
    }

    /// Check if a vault has been bound to this market
    pub fn has_vault(&self) -> bool {
        self.vault_ledger != Pubkey::default()
    }

    pub fn ensure_owner(&self, signer: &Pubkey) -> Result<(), ConditionalVaultError> {
        if self.owner != *signer {
            return Err(ConditionalVaultError::OwnerMismatch);
        }
        Ok(())
    }

    /// Write the vault bindings. Only ever succeeds once.
    pub fn bind_vault(
        &mut self,
        vault_ledger: Pubkey,
        vault: Pubkey,
        claim_a_mint: Pubkey,
        claim_b_mint: Pubkey,
    ) -> Result<(), ConditionalVaultError> {
        if self.has_vault() {
            return Err(ConditionalVaultError::VaultAlreadyInitialized);
        }
        self.vault_ledger = vault_ledger;
        self.vault = vault;
        self.claim_a_mint = claim_a_mint;
        self.claim_b_mint = claim_b_mint;
        Ok(())
    }

    /// Apply an owner update. Vault bindings are not reachable from here.
    pub fn apply_update(&mut self, field: MarketField) -> Result<(), ConditionalVaultError> {
        match field {
            MarketField::Name(name) => {
                validate_name(&name)?;
                self.name = name;
            }
            MarketField::Description(description) => {
                validate_description(&description)?;
                self.description = description;
            }
            MarketField::Expiration(expiration) => self.expiration = expiration,
            MarketField::Owner(owner) => self.owner = owner,
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), ConditionalVaultError> {
    if name.len() > MAX_NAME_LEN {
        return Err(ConditionalVaultError::NameTooLong);
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), ConditionalVaultError> {
    if description.len() > MAX_DESCRIPTION_LEN {
        return Err(ConditionalVaultError::DescriptionTooLong);
    }
    Ok(())
}

/// Conservation ledger for one market/collateral pairing
///
/// PDA Seeds: ["vault_state", market_entry, collateral_mint]
///
/// While unresolved: `collateral_balance == supply(claim_a) == supply(claim_b)`.
/// Once resolved: `collateral_balance == supply(winning_mint)`.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct VaultLedger {
    /// Account discriminator
    pub discriminator: u64,

    /// Market entry this vault belongs to
    pub market: Pubkey,

    /// Vault creator
    pub creator: Pubkey,

    /// Collateral mint
    pub collateral_mint: Pubkey,

    /// Outcome A claim mint
    pub claim_a_mint: Pubkey,

    /// Outcome B claim mint
    pub claim_b_mint: Pubkey,

    /// Token program owning claim A
    pub claim_a_token_program: Pubkey,

    /// Token program owning claim B
    pub claim_b_token_program: Pubkey,

    /// Collateral vault token account (owned by the authority PDA)
    pub vault: Pubkey,

    /// Resolution status
    pub resolution: ResolutionState,

    /// Collateral held on behalf of claim holders
    pub collateral_balance: u64,

    /// Creation timestamp
    pub created_at: i64,

    /// Expiration copied from the market entry at initialization
    pub expiration: i64,

    /// PDA bump
    pub bump: u8,

    /// Reserved for future use
    pub reserved: [u8; 32],
}

impl VaultLedger {
    pub const SIZE: usize = 8   // discriminator
        + 32  // market
        + 32  // creator
        + 32  // collateral_mint
        + 32  // claim_a_mint
        + 32  // claim_b_mint
        + 32  // claim_a_token_program
        + 32  // claim_b_token_program
        + 32  // vault
        + 1 + 32 // resolution
        + 8   // collateral_balance
        + 8   // created_at
        + 8   // expiration
        + 1   // bump
        + 32; // reserved

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        market: Pubkey,
        creator: Pubkey,
        collateral_mint: Pubkey,
        claim_a_mint: Pubkey,
        claim_b_mint: Pubkey,
        token_program: Pubkey,
        vault: Pubkey,
        created_at: i64,
        expiration: i64,
        bump: u8,
    ) -> Self {
        Self {
            discriminator: VAULT_LEDGER_DISCRIMINATOR,
            market,
            creator,
            collateral_mint,
            claim_a_mint,
            claim_b_mint,
            claim_a_token_program: token_program,
            claim_b_token_program: token_program,
            vault,
            resolution: ResolutionState::Unresolved,
            collateral_balance: 0,
            created_at,
            expiration,
            bump,
            reserved: [0u8; 32],
        }
    }

    /// Check if the vault binding has been written
    pub fn is_active(&self) -> bool {
        self.vault != Pubkey::default()
    }

    pub fn ensure_active(&self) -> Result<(), ConditionalVaultError> {
        if !self.is_active() {
            return Err(ConditionalVaultError::VaultNotActivated);
        }
        Ok(())
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.resolution, ResolutionState::Resolved { .. })
    }

    pub fn ensure_unresolved(&self) -> Result<(), ConditionalVaultError> {
        if self.is_resolved() {
            return Err(ConditionalVaultError::MarketAlreadyResolved);
        }
        Ok(())
    }

    pub fn winning_mint(&self) -> Option<Pubkey> {
        match self.resolution {
            ResolutionState::Resolved { winning_mint } => Some(winning_mint),
            ResolutionState::Unresolved => None,
        }
    }

    pub fn is_claim_mint(&self, mint: &Pubkey) -> bool {
        *mint == self.claim_a_mint || *mint == self.claim_b_mint
    }

    /// Check that `mint` is redeemable for collateral
    pub fn ensure_winning_claim(&self, mint: &Pubkey) -> Result<(), ConditionalVaultError> {
        match self.winning_mint() {
            None => Err(ConditionalVaultError::MarketNotResolved),
            Some(winning_mint) if winning_mint != *mint => {
                Err(ConditionalVaultError::NotWinningClaim)
            }
            Some(_) => Ok(()),
        }
    }

    pub fn credit_collateral(&mut self, amount: u64) -> Result<(), ConditionalVaultError> {
        if amount == 0 {
            return Err(ConditionalVaultError::InvalidAmount);
        }
        self.collateral_balance = self
            .collateral_balance
            .checked_add(amount)
            .ok_or(ConditionalVaultError::ArithmeticOverflow)?;
        Ok(())
    }

    pub fn debit_collateral(&mut self, amount: u64) -> Result<(), ConditionalVaultError> {
        if amount == 0 {
            return Err(ConditionalVaultError::InvalidAmount);
        }
        self.collateral_balance = self
            .collateral_balance
            .checked_sub(amount)
            .ok_or(ConditionalVaultError::InsufficientVaultBalance)?;
        Ok(())
    }

    /// Record the verdict. There is no path back to `Unresolved` and a
    /// recorded winner is never overwritten.
    pub fn record_resolution(&mut self, winning_mint: Pubkey) -> Result<(), ConditionalVaultError> {
        self.ensure_active()?;
        self.ensure_unresolved()?;
        if !self.is_claim_mint(&winning_mint) {
            return Err(ConditionalVaultError::InvalidWinningMint);
        }
        self.resolution = ResolutionState::Resolved { winning_mint };
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
