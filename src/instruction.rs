//! Instruction definitions for the Conditional Vault Program

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};

use crate::pda::{
    find_authority_address, find_claim_a_mint_address, find_claim_b_mint_address,
    find_market_address, find_vault_address, find_vault_ledger_address,
};
use crate::state::MarketField;

/// All instructions supported by the Conditional Vault Program
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub enum ConditionalVaultInstruction {
    // =========================================================================
    // Market Registry
    // =========================================================================

    /// Register a new market entry; the signer becomes its owner
    ///
    /// Accounts:
    /// 0. `[signer, writable]` Owner (payer)
    /// 1. `[writable]` Market Entry PDA
    /// 2. `[]` System Program
    RegisterMarket(RegisterMarketArgs),

    /// Update a single field of a market entry (owner only)
    ///
    /// Accounts:
    /// 0. `[signer]` Owner
    /// 1. `[writable]` Market Entry PDA
    UpdateMarket(UpdateMarketArgs),

    // =========================================================================
    // Vault Lifecycle
    // =========================================================================

    /// Create the vault ledger, collateral vault and both claim mints for a
    /// market, and bind them into the market entry (owner only)
    ///
    /// Accounts:
    /// 0. `[signer, writable]` Owner (payer)
    /// 1. `[writable]` Market Entry PDA
    /// 2. `[writable]` Vault Ledger PDA
    /// 3. `[]` Collateral Mint
    /// 4. `[writable]` Vault Token Account PDA
    /// 5. `[writable]` Claim A Mint PDA
    /// 6. `[writable]` Claim B Mint PDA
    /// 7. `[]` Authority PDA
    /// 8. `[]` Token Program
    /// 9. `[]` System Program
    InitializeVault(InitializeVaultArgs),

    /// Record the resolution verdict (owner only, once)
    ///
    /// Accounts:
    /// 0. `[signer]` Owner
    /// 1. `[writable]` Market Entry PDA
    /// 2. `[writable]` Vault Ledger PDA
    RecordResolution(RecordResolutionArgs),

    // =========================================================================
    // Claim Operations
    // =========================================================================

    /// Deposit collateral and receive `amount` of each claim
    ///
    /// Accounts:
    /// 0. `[signer, writable]` Bettor (payer for claim accounts)
    /// 1. `[writable]` Vault Ledger PDA
    /// 2. `[writable]` Vault Token Account PDA
    /// 3. `[writable]` Bettor's Collateral Account
    /// 4. `[writable]` Claim A Mint
    /// 5. `[writable]` Claim B Mint
    /// 6. `[writable]` Bettor's Claim A Associated Account
    /// 7. `[writable]` Bettor's Claim B Associated Account
    /// 8. `[]` Authority PDA
    /// 9. `[]` Token Program
    /// 10. `[]` Associated Token Program
    /// 11. `[]` System Program
    Issue(IssueArgs),

    /// Burn `amount` of both claims and withdraw collateral (unresolved only)
    ///
    /// Accounts:
    /// 0. `[signer]` Holder
    /// 1. `[writable]` Vault Ledger PDA
    /// 2. `[writable]` Vault Token Account PDA
    /// 3. `[writable]` Holder's Collateral Account
    /// 4. `[writable]` Claim A Mint
    /// 5. `[writable]` Claim B Mint
    /// 6. `[writable]` Holder's Claim A Account
    /// 7. `[writable]` Holder's Claim B Account
    /// 8. `[]` Authority PDA
    /// 9. `[]` Token Program
    RedeemBoth(RedeemArgs),

    /// Burn `amount` of the winning claim and withdraw collateral 1:1
    ///
    /// Accounts:
    /// 0. `[signer]` Holder
    /// 1. `[writable]` Vault Ledger PDA
    /// 2. `[writable]` Vault Token Account PDA
    /// 3. `[writable]` Holder's Collateral Account
    /// 4. `[writable]` Winning Claim Mint
    /// 5. `[writable]` Holder's Winning Claim Account
    /// 6. `[]` Authority PDA
    /// 7. `[]` Token Program
    RedeemWinner(RedeemArgs),
}

// ============================================================================
// Argument Structs
// ============================================================================

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct RegisterMarketArgs {
    /// Registry index
    pub index: u16,
    /// Market name (max 100 bytes)
    pub name: String,
    /// Market description (max 100 bytes)
    pub description: String,
    /// Expiration (Unix timestamp)
    pub expiration: i64,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct UpdateMarketArgs {
    /// Registry index
    pub index: u16,
    /// Field to overwrite
    pub field: MarketField,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct InitializeVaultArgs {
    /// Registry index
    pub index: u16,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct RecordResolutionArgs {
    /// Claim mint that is redeemable for collateral
    pub winning_mint: Pubkey,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct IssueArgs {
    /// Collateral to deposit (= claims of each side to mint)
    pub amount: u64,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone)]
pub struct RedeemArgs {
    /// Claims to burn (= collateral to withdraw)
    pub amount: u64,
}

// ============================================================================
// Instruction Builders
// ============================================================================

fn build(
    program_id: &Pubkey,
    accounts: Vec<AccountMeta>,
    instruction: ConditionalVaultInstruction,
) -> Result<Instruction, ProgramError> {
    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data: instruction.try_to_vec()?,
    })
}

/// Addresses derived for one market/collateral vault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultAddresses {
    pub market: Pubkey,
    pub vault_ledger: Pubkey,
    pub vault: Pubkey,
    pub claim_a_mint: Pubkey,
    pub claim_b_mint: Pubkey,
    pub authority: Pubkey,
}

impl VaultAddresses {
    pub fn derive(index: u16, collateral_mint: &Pubkey, program_id: &Pubkey) -> Self {
        let market = find_market_address(index, program_id).0;
        let vault_ledger = find_vault_ledger_address(&market, collateral_mint, program_id).0;
        Self {
            market,
            vault_ledger,
            vault: find_vault_address(&vault_ledger, program_id).0,
            claim_a_mint: find_claim_a_mint_address(&vault_ledger, program_id).0,
            claim_b_mint: find_claim_b_mint_address(&vault_ledger, program_id).0,
            authority: find_authority_address(program_id).0,
        }
    }
}

pub fn register_market(
    program_id: &Pubkey,
    owner: &Pubkey,
    index: u16,
    name: String,
    description: String,
    expiration: i64,
) -> Result<Instruction, ProgramError> {
    let (market, _) = find_market_address(index, program_id);
    build(
        program_id,
        vec![
            AccountMeta::new(*owner, true),
            AccountMeta::new(market, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        ConditionalVaultInstruction::RegisterMarket(RegisterMarketArgs {
            index,
            name,
            description,
            expiration,
        }),
    )
}

pub fn update_market(
    program_id: &Pubkey,
    owner: &Pubkey,
    index: u16,
    field: MarketField,
) -> Result<Instruction, ProgramError> {
    let (market, _) = find_market_address(index, program_id);
    build(
        program_id,
        vec![
            AccountMeta::new_readonly(*owner, true),
            AccountMeta::new(market, false),
        ],
        ConditionalVaultInstruction::UpdateMarket(UpdateMarketArgs { index, field }),
    )
}

pub fn initialize_vault(
    program_id: &Pubkey,
    owner: &Pubkey,
    index: u16,
    collateral_mint: &Pubkey,
) -> Result<Instruction, ProgramError> {
    let addresses = VaultAddresses::derive(index, collateral_mint, program_id);
    build(
        program_id,
        vec![
            AccountMeta::new(*owner, true),
            AccountMeta::new(addresses.market, false),
            AccountMeta::new(addresses.vault_ledger, false),
            AccountMeta::new_readonly(*collateral_mint, false),
            AccountMeta::new(addresses.vault, false),
            AccountMeta::new(addresses.claim_a_mint, false),
            AccountMeta::new(addresses.claim_b_mint, false),
            AccountMeta::new_readonly(addresses.authority, false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        ConditionalVaultInstruction::InitializeVault(InitializeVaultArgs { index }),
    )
}

pub fn record_resolution(
    program_id: &Pubkey,
    owner: &Pubkey,
    index: u16,
    collateral_mint: &Pubkey,
    winning_mint: &Pubkey,
) -> Result<Instruction, ProgramError> {
    let addresses = VaultAddresses::derive(index, collateral_mint, program_id);
    build(
        program_id,
        vec![
            AccountMeta::new_readonly(*owner, true),
            AccountMeta::new(addresses.market, false),
            AccountMeta::new(addresses.vault_ledger, false),
        ],
        ConditionalVaultInstruction::RecordResolution(RecordResolutionArgs {
            winning_mint: *winning_mint,
        }),
    )
}

pub fn issue(
    program_id: &Pubkey,
    bettor: &Pubkey,
    index: u16,
    collateral_mint: &Pubkey,
    bettor_collateral: &Pubkey,
    amount: u64,
) -> Result<Instruction, ProgramError> {
    let addresses = VaultAddresses::derive(index, collateral_mint, program_id);
    let claim_a_account = spl_associated_token_account::get_associated_token_address(
        bettor,
        &addresses.claim_a_mint,
    );
    let claim_b_account = spl_associated_token_account::get_associated_token_address(
        bettor,
        &addresses.claim_b_mint,
    );
    build(
        program_id,
        vec![
            AccountMeta::new(*bettor, true),
            AccountMeta::new(addresses.vault_ledger, false),
            AccountMeta::new(addresses.vault, false),
            AccountMeta::new(*bettor_collateral, false),
            AccountMeta::new(addresses.claim_a_mint, false),
            AccountMeta::new(addresses.claim_b_mint, false),
            AccountMeta::new(claim_a_account, false),
            AccountMeta::new(claim_b_account, false),
            AccountMeta::new_readonly(addresses.authority, false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(spl_associated_token_account::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        ConditionalVaultInstruction::Issue(IssueArgs { amount }),
    )
}

pub fn redeem_both(
    program_id: &Pubkey,
    holder: &Pubkey,
    index: u16,
    collateral_mint: &Pubkey,
    holder_collateral: &Pubkey,
    amount: u64,
) -> Result<Instruction, ProgramError> {
    let addresses = VaultAddresses::derive(index, collateral_mint, program_id);
    let claim_a_account = spl_associated_token_account::get_associated_token_address(
        holder,
        &addresses.claim_a_mint,
    );
    let claim_b_account = spl_associated_token_account::get_associated_token_address(
        holder,
        &addresses.claim_b_mint,
    );
    build(
        program_id,
        vec![
            AccountMeta::new_readonly(*holder, true),
            AccountMeta::new(addresses.vault_ledger, false),
            AccountMeta::new(addresses.vault, false),
            AccountMeta::new(*holder_collateral, false),
            AccountMeta::new(addresses.claim_a_mint, false),
            AccountMeta::new(addresses.claim_b_mint, false),
            AccountMeta::new(claim_a_account, false),
            AccountMeta::new(claim_b_account, false),
            AccountMeta::new_readonly(addresses.authority, false),
            AccountMeta::new_readonly(spl_token::id(), false),
        ],
        ConditionalVaultInstruction::RedeemBoth(RedeemArgs { amount }),
    )
}

pub fn redeem_winner(
    program_id: &Pubkey,
    holder: &Pubkey,
    index: u16,
    collateral_mint: &Pubkey,
    holder_collateral: &Pubkey,
    claim_mint: &Pubkey,
    amount: u64,
) -> Result<Instruction, ProgramError> {
    let addresses = VaultAddresses::derive(index, collateral_mint, program_id);
    let claim_account = spl_associated_token_account::get_associated_token_address(
        holder,
        claim_mint,
    );
    build(
        program_id,
        vec![
            AccountMeta::new_readonly(*holder, true),
            AccountMeta::new(addresses.vault_ledger, false),
            AccountMeta::new(addresses.vault, false),
            AccountMeta::new(*holder_collateral, false),
            AccountMeta::new(*claim_mint, false),
            AccountMeta::new(claim_account, false),
            AccountMeta::new_readonly(addresses.authority, false),
            AccountMeta::new_readonly(spl_token::id(), false),
        ],
        ConditionalVaultInstruction::RedeemWinner(RedeemArgs { amount }),
    )
}

// ============================================================================
// Tests
// ============================================================================
