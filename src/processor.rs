//! Instruction processor for the Conditional Vault Program

use borsh::BorshDeserialize;
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program_error::ProgramError,
    pubkey::Pubkey,
};

use crate::authority::VaultAuthority;
use crate::error::ConditionalVaultError;
use crate::instruction::{
    ConditionalVaultInstruction, InitializeVaultArgs, IssueArgs, RecordResolutionArgs, RedeemArgs,
    RegisterMarketArgs, UpdateMarketArgs,
};
use crate::pda::{
    find_claim_a_mint_address, find_claim_b_mint_address, find_market_address,
    find_vault_address, find_vault_ledger_address, verify_address,
};
use crate::state::{
    MarketEntry, VaultLedger, CLAIM_A_SEED, CLAIM_B_SEED, MARKET_SEED, VAULT_SEED,
    VAULT_STATE_SEED,
};
use crate::token::{
    burn, check_token_program, create_associated_account_idempotent, create_claim_mint,
    create_vault_account, mint_to, transfer, transfer_from_vault, unpack_mint,
    unpack_token_account,
};
use crate::utils::{
    check_signer, check_system_program, create_pda_account, get_current_timestamp,
    load_market_entry, load_vault_ledger, store_account,
};

/// Process an instruction
pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    let instruction = ConditionalVaultInstruction::try_from_slice(instruction_data)
        .map_err(|_| ConditionalVaultError::InvalidInstruction)?;

    match instruction {
        // === Market Registry ===
        ConditionalVaultInstruction::RegisterMarket(args) => {
            msg!("Instruction: RegisterMarket");
            process_register_market(program_id, accounts, args)
        }
        ConditionalVaultInstruction::UpdateMarket(args) => {
            msg!("Instruction: UpdateMarket");
            process_update_market(program_id, accounts, args)
        }

        // === Vault Lifecycle ===
        ConditionalVaultInstruction::InitializeVault(args) => {
            msg!("Instruction: InitializeVault");
            process_initialize_vault(program_id, accounts, args)
        }
        ConditionalVaultInstruction::RecordResolution(args) => {
            msg!("Instruction: RecordResolution");
            process_record_resolution(program_id, accounts, args)
        }

        // === Claim Operations ===
        ConditionalVaultInstruction::Issue(args) => {
            msg!("Instruction: Issue");
            process_issue(program_id, accounts, args)
        }
        ConditionalVaultInstruction::RedeemBoth(args) => {
            msg!("Instruction: RedeemBoth");
            process_redeem_both(program_id, accounts, args)
        }
        ConditionalVaultInstruction::RedeemWinner(args) => {
            msg!("Instruction: RedeemWinner");
            process_redeem_winner(program_id, accounts, args)
        }
    }
}

// ============================================================================
// Market Registry
// ============================================================================

fn process_register_market(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    args: RegisterMarketArgs,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    // Account 0: Owner (signer, payer)
    let owner_info = next_account_info(account_info_iter)?;
    check_signer(owner_info)?;

    // Account 1: Market Entry PDA (writable)
    let market_info = next_account_info(account_info_iter)?;

    // Account 2: System Program
    let system_program_info = next_account_info(account_info_iter)?;
    check_system_program(system_program_info)?;

    let bump = verify_address("Market", market_info, &find_market_address(args.index, program_id))?;

    if !market_info.data_is_empty() {
        msg!("Error: Market {} already registered", args.index);
        return Err(ConditionalVaultError::AlreadyInitialized.into());
    }

    let current_time = get_current_timestamp()?;
    let entry = MarketEntry::new(
        args.index,
        *owner_info.key,
        args.name,
        args.description,
        current_time,
        args.expiration,
        bump,
    )?;

    let index_bytes = args.index.to_be_bytes();
    let market_seeds: &[&[u8]] = &[MARKET_SEED, &index_bytes, &[bump]];
    create_pda_account(
        owner_info,
        market_info,
        MarketEntry::SIZE,
        program_id,
        system_program_info,
        market_seeds,
    )?;
    store_account(&entry, market_info)?;

    msg!("Market {} registered by {}", args.index, owner_info.key);
    msg!("Name: {}", entry.name);
    msg!("Expiration: {}", entry.expiration);

    Ok(())
}

fn process_update_market(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    args: UpdateMarketArgs,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    // Account 0: Owner (signer)
    let owner_info = next_account_info(account_info_iter)?;
    check_signer(owner_info)?;

    // Account 1: Market Entry PDA (writable)
    let market_info = next_account_info(account_info_iter)?;
    verify_address("Market", market_info, &find_market_address(args.index, program_id))?;

    let mut entry = load_market_entry(market_info, program_id)?;
    if let Err(e) = entry.ensure_owner(owner_info.key) {
        msg!("Error: {} is not the owner of market {}", owner_info.key, args.index);
        return Err(e.into());
    }

    entry.apply_update(args.field)?;
    store_account(&entry, market_info)?;

    msg!("Market {} updated", args.index);

    Ok(())
}

// ============================================================================
// Vault Lifecycle
// ============================================================================

fn process_initialize_vault(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    args: InitializeVaultArgs,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    // Account 0: Owner (signer, payer)
    let owner_info = next_account_info(account_info_iter)?;
    check_signer(owner_info)?;

    // Account 1: Market Entry PDA (writable)
    let market_info = next_account_info(account_info_iter)?;

    // Account 2: Vault Ledger PDA (writable)
    let ledger_info = next_account_info(account_info_iter)?;

    // Account 3: Collateral Mint
    let collateral_mint_info = next_account_info(account_info_iter)?;

    // Account 4: Vault Token Account PDA (writable)
    let vault_info = next_account_info(account_info_iter)?;

    // Account 5: Claim A Mint PDA (writable)
    let claim_a_mint_info = next_account_info(account_info_iter)?;

    // Account 6: Claim B Mint PDA (writable)
    let claim_b_mint_info = next_account_info(account_info_iter)?;

    // Account 7: Authority PDA
    let authority_info = next_account_info(account_info_iter)?;

    // Account 8: Token Program
    let token_program_info = next_account_info(account_info_iter)?;
    check_token_program(token_program_info)?;

    // Account 9: System Program
    let system_program_info = next_account_info(account_info_iter)?;
    check_system_program(system_program_info)?;

    // Load and validate market entry
    verify_address("Market", market_info, &find_market_address(args.index, program_id))?;
    let mut entry = load_market_entry(market_info, program_id)?;
    if let Err(e) = entry.ensure_owner(owner_info.key) {
        msg!("Error: {} is not the owner of market {}", owner_info.key, args.index);
        return Err(e.into());
    }
    if entry.has_vault() {
        msg!("Error: Market {} already has vault {}", args.index, entry.vault_ledger);
        return Err(ConditionalVaultError::VaultAlreadyInitialized.into());
    }

    // Verify derived addresses
    let ledger_bump = verify_address(
        "Vault ledger",
        ledger_info,
        &find_vault_ledger_address(market_info.key, collateral_mint_info.key, program_id),
    )?;
    let vault_bump = verify_address(
        "Vault",
        vault_info,
        &find_vault_address(ledger_info.key, program_id),
    )?;
    let claim_a_bump = verify_address(
        "Claim A mint",
        claim_a_mint_info,
        &find_claim_a_mint_address(ledger_info.key, program_id),
    )?;
    let claim_b_bump = verify_address(
        "Claim B mint",
        claim_b_mint_info,
        &find_claim_b_mint_address(ledger_info.key, program_id),
    )?;
    let authority = VaultAuthority::verify(authority_info, program_id)?;

    if !ledger_info.data_is_empty() {
        msg!("Error: Vault ledger {} already exists", ledger_info.key);
        return Err(ConditionalVaultError::VaultAlreadyInitialized.into());
    }

    // Claims share the collateral's precision
    let collateral_mint = unpack_mint(collateral_mint_info)?;

    // Create vault ledger
    let ledger_seeds: &[&[u8]] = &[
        VAULT_STATE_SEED,
        market_info.key.as_ref(),
        collateral_mint_info.key.as_ref(),
        &[ledger_bump],
    ];
    create_pda_account(
        owner_info,
        ledger_info,
        VaultLedger::SIZE,
        program_id,
        system_program_info,
        ledger_seeds,
    )?;

    // Create claim mints
    let claim_a_seeds: &[&[u8]] = &[CLAIM_A_SEED, ledger_info.key.as_ref(), &[claim_a_bump]];
    create_claim_mint(
        owner_info,
        claim_a_mint_info,
        claim_a_seeds,
        &authority,
        collateral_mint.decimals,
        token_program_info,
        system_program_info,
    )?;

    let claim_b_seeds: &[&[u8]] = &[CLAIM_B_SEED, ledger_info.key.as_ref(), &[claim_b_bump]];
    create_claim_mint(
        owner_info,
        claim_b_mint_info,
        claim_b_seeds,
        &authority,
        collateral_mint.decimals,
        token_program_info,
        system_program_info,
    )?;

    // Create collateral vault
    let vault_seeds: &[&[u8]] = &[VAULT_SEED, ledger_info.key.as_ref(), &[vault_bump]];
    create_vault_account(
        owner_info,
        vault_info,
        vault_seeds,
        collateral_mint_info,
        &authority,
        token_program_info,
        system_program_info,
    )?;

    let current_time = get_current_timestamp()?;
    let ledger = VaultLedger::new(
        *market_info.key,
        *owner_info.key,
        *collateral_mint_info.key,
        *claim_a_mint_info.key,
        *claim_b_mint_info.key,
        *token_program_info.key,
        *vault_info.key,
        current_time,
        entry.expiration,
        ledger_bump,
    );
    store_account(&ledger, ledger_info)?;

    entry.bind_vault(
        *ledger_info.key,
        *vault_info.key,
        *claim_a_mint_info.key,
        *claim_b_mint_info.key,
    )?;
    store_account(&entry, market_info)?;

    msg!("Vault initialized for market {}", args.index);
    msg!("Collateral mint: {} (decimals {})", collateral_mint_info.key, collateral_mint.decimals);
    msg!("Claim A mint: {}", claim_a_mint_info.key);
    msg!("Claim B mint: {}", claim_b_mint_info.key);

    Ok(())
}

fn process_record_resolution(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    args: RecordResolutionArgs,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    // Account 0: Owner (signer)
    let owner_info = next_account_info(account_info_iter)?;
    check_signer(owner_info)?;

    // Account 1: Market Entry PDA (writable)
    let market_info = next_account_info(account_info_iter)?;

    // Account 2: Vault Ledger PDA (writable)
    let ledger_info = next_account_info(account_info_iter)?;

    let mut entry = load_market_entry(market_info, program_id)?;
    verify_address("Market", market_info, &find_market_address(entry.index, program_id))?;
    if let Err(e) = entry.ensure_owner(owner_info.key) {
        msg!("Error: {} is not the owner of market {}", owner_info.key, entry.index);
        return Err(e.into());
    }

    let mut ledger = load_vault_ledger(ledger_info, program_id)?;
    verify_address(
        "Vault ledger",
        ledger_info,
        &find_vault_ledger_address(market_info.key, &ledger.collateral_mint, program_id),
    )?;

    if let Err(e) = ledger.record_resolution(args.winning_mint) {
        msg!("Error: Cannot record {} as winner of market {}: {}", args.winning_mint, entry.index, e);
        return Err(e.into());
    }
    entry.resolved = true;

    store_account(&ledger, ledger_info)?;
    store_account(&entry, market_info)?;

    msg!("Market {} resolved, winning mint {}", entry.index, args.winning_mint);

    Ok(())
}

// ============================================================================
// Claim Operations
// ============================================================================

/// Load the vault ledger and verify it sits at its canonical address
fn load_verified_ledger(
    ledger_info: &AccountInfo,
    program_id: &Pubkey,
) -> Result<VaultLedger, ProgramError> {
    let ledger = load_vault_ledger(ledger_info, program_id)?;
    verify_address(
        "Vault ledger",
        ledger_info,
        &find_vault_ledger_address(&ledger.market, &ledger.collateral_mint, program_id),
    )?;
    ledger.ensure_active()?;
    Ok(ledger)
}

/// Verify the collateral vault against both its derivation and the ledger binding
fn verify_vault(
    vault_info: &AccountInfo,
    ledger_info: &AccountInfo,
    ledger: &VaultLedger,
    program_id: &Pubkey,
) -> ProgramResult {
    verify_address("Vault", vault_info, &find_vault_address(ledger_info.key, program_id))?;
    if *vault_info.key != ledger.vault {
        msg!("Error: Vault {} is not bound to ledger {}", vault_info.key, ledger_info.key);
        return Err(ConditionalVaultError::InvalidVault.into());
    }
    Ok(())
}

/// Verify both claim mints against their derivations and the ledger binding
fn verify_claim_mints(
    claim_a_mint_info: &AccountInfo,
    claim_b_mint_info: &AccountInfo,
    ledger_info: &AccountInfo,
    ledger: &VaultLedger,
    program_id: &Pubkey,
) -> ProgramResult {
    verify_address(
        "Claim A mint",
        claim_a_mint_info,
        &find_claim_a_mint_address(ledger_info.key, program_id),
    )?;
    verify_address(
        "Claim B mint",
        claim_b_mint_info,
        &find_claim_b_mint_address(ledger_info.key, program_id),
    )?;
    if *claim_a_mint_info.key != ledger.claim_a_mint || *claim_b_mint_info.key != ledger.claim_b_mint {
        msg!("Error: Claim mints are not bound to ledger {}", ledger_info.key);
        return Err(ConditionalVaultError::InvalidClaimMint.into());
    }
    Ok(())
}

fn process_issue(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    args: IssueArgs,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    // Account 0: Bettor (signer, payer)
    let bettor_info = next_account_info(account_info_iter)?;
    check_signer(bettor_info)?;

    // Account 1: Vault Ledger PDA (writable)
    let ledger_info = next_account_info(account_info_iter)?;

    // Account 2: Vault Token Account PDA (writable)
    let vault_info = next_account_info(account_info_iter)?;

    // Account 3: Bettor's Collateral Account (writable)
    let bettor_collateral_info = next_account_info(account_info_iter)?;

    // Account 4: Claim A Mint (writable)
    let claim_a_mint_info = next_account_info(account_info_iter)?;

    // Account 5: Claim B Mint (writable)
    let claim_b_mint_info = next_account_info(account_info_iter)?;

    // Account 6: Bettor's Claim A Account (writable)
    let bettor_claim_a_info = next_account_info(account_info_iter)?;

    // Account 7: Bettor's Claim B Account (writable)
    let bettor_claim_b_info = next_account_info(account_info_iter)?;

    // Account 8: Authority PDA
    let authority_info = next_account_info(account_info_iter)?;

    // Account 9: Token Program
    let token_program_info = next_account_info(account_info_iter)?;
    check_token_program(token_program_info)?;

    // Account 10: Associated Token Program
    let associated_token_program_info = next_account_info(account_info_iter)?;

    // Account 11: System Program
    let system_program_info = next_account_info(account_info_iter)?;
    check_system_program(system_program_info)?;

    if args.amount == 0 {
        return Err(ConditionalVaultError::InvalidAmount.into());
    }

    let mut ledger = load_verified_ledger(ledger_info, program_id)?;
    if let Err(e) = ledger.ensure_unresolved() {
        msg!("Error: Market {} is resolved, issuance closed", ledger.market);
        return Err(e.into());
    }
    verify_vault(vault_info, ledger_info, &ledger, program_id)?;
    verify_claim_mints(claim_a_mint_info, claim_b_mint_info, ledger_info, &ledger, program_id)?;
    let authority = VaultAuthority::verify(authority_info, program_id)?;

    // Collateral must cover the full amount before anything moves
    let bettor_collateral = unpack_token_account(
        bettor_collateral_info,
        &ledger.collateral_mint,
        Some(bettor_info.key),
    )?;
    if bettor_collateral.amount < args.amount {
        msg!("Error: Insufficient collateral: has {}, needs {}",
             bettor_collateral.amount, args.amount);
        return Err(ConditionalVaultError::InsufficientCollateral.into());
    }

    ledger.credit_collateral(args.amount)?;

    // Transfer collateral from bettor to vault
    transfer(
        token_program_info,
        bettor_collateral_info,
        vault_info,
        bettor_info,
        args.amount,
    )?;

    // Ensure claim accounts exist
    create_associated_account_idempotent(
        bettor_info,
        bettor_claim_a_info,
        bettor_info,
        claim_a_mint_info,
        system_program_info,
        token_program_info,
        associated_token_program_info,
    )?;
    create_associated_account_idempotent(
        bettor_info,
        bettor_claim_b_info,
        bettor_info,
        claim_b_mint_info,
        system_program_info,
        token_program_info,
        associated_token_program_info,
    )?;

    // Mint both claims
    mint_to(
        &authority,
        authority_info,
        token_program_info,
        claim_a_mint_info,
        bettor_claim_a_info,
        args.amount,
    )?;
    mint_to(
        &authority,
        authority_info,
        token_program_info,
        claim_b_mint_info,
        bettor_claim_b_info,
        args.amount,
    )?;

    store_account(&ledger, ledger_info)?;

    msg!("Issued {} claims to {}", args.amount, bettor_info.key);
    msg!("Vault collateral: {}", ledger.collateral_balance);

    Ok(())
}

fn process_redeem_both(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    args: RedeemArgs,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    // Account 0: Holder (signer)
    let holder_info = next_account_info(account_info_iter)?;
    check_signer(holder_info)?;

    // Account 1: Vault Ledger PDA (writable)
    let ledger_info = next_account_info(account_info_iter)?;

    // Account 2: Vault Token Account PDA (writable)
    let vault_info = next_account_info(account_info_iter)?;

    // Account 3: Holder's Collateral Account (writable)
    let holder_collateral_info = next_account_info(account_info_iter)?;

    // Account 4: Claim A Mint (writable)
    let claim_a_mint_info = next_account_info(account_info_iter)?;

    // Account 5: Claim B Mint (writable)
    let claim_b_mint_info = next_account_info(account_info_iter)?;

    // Account 6: Holder's Claim A Account (writable)
    let holder_claim_a_info = next_account_info(account_info_iter)?;

    // Account 7: Holder's Claim B Account (writable)
    let holder_claim_b_info = next_account_info(account_info_iter)?;

    // Account 8: Authority PDA
    let authority_info = next_account_info(account_info_iter)?;

    // Account 9: Token Program
    let token_program_info = next_account_info(account_info_iter)?;
    check_token_program(token_program_info)?;

    if args.amount == 0 {
        return Err(ConditionalVaultError::InvalidAmount.into());
    }

    let mut ledger = load_verified_ledger(ledger_info, program_id)?;
    if let Err(e) = ledger.ensure_unresolved() {
        msg!("Error: Market {} is resolved, use RedeemWinner", ledger.market);
        return Err(e.into());
    }
    verify_vault(vault_info, ledger_info, &ledger, program_id)?;
    verify_claim_mints(claim_a_mint_info, claim_b_mint_info, ledger_info, &ledger, program_id)?;
    let authority = VaultAuthority::verify(authority_info, program_id)?;

    unpack_token_account(holder_collateral_info, &ledger.collateral_mint, None)?;
    let claim_a = unpack_token_account(holder_claim_a_info, &ledger.claim_a_mint, Some(holder_info.key))?;
    let claim_b = unpack_token_account(holder_claim_b_info, &ledger.claim_b_mint, Some(holder_info.key))?;
    if claim_a.amount < args.amount || claim_b.amount < args.amount {
        msg!("Error: Insufficient claims: A {}, B {}, needs {}",
             claim_a.amount, claim_b.amount, args.amount);
        return Err(ConditionalVaultError::InsufficientClaimBalance.into());
    }

    ledger.debit_collateral(args.amount)?;

    // Burn both claims
    burn(token_program_info, holder_claim_a_info, claim_a_mint_info, holder_info, args.amount)?;
    burn(token_program_info, holder_claim_b_info, claim_b_mint_info, holder_info, args.amount)?;

    // Release collateral from vault
    transfer_from_vault(
        &authority,
        authority_info,
        token_program_info,
        vault_info,
        holder_collateral_info,
        args.amount,
    )?;

    store_account(&ledger, ledger_info)?;

    msg!("Redeemed {} claim pairs for {}", args.amount, holder_info.key);
    msg!("Vault collateral: {}", ledger.collateral_balance);

    Ok(())
}

fn process_redeem_winner(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    args: RedeemArgs,
) -> ProgramResult {
    let account_info_iter = &mut accounts.iter();

    // Account 0: Holder (signer)
    let holder_info = next_account_info(account_info_iter)?;
    check_signer(holder_info)?;

    // Account 1: Vault Ledger PDA (writable)
    let ledger_info = next_account_info(account_info_iter)?;

    // Account 2: Vault Token Account PDA (writable)
    let vault_info = next_account_info(account_info_iter)?;

    // Account 3: Holder's Collateral Account (writable)
    let holder_collateral_info = next_account_info(account_info_iter)?;

    // Account 4: Winning Claim Mint (writable)
    let claim_mint_info = next_account_info(account_info_iter)?;

    // Account 5: Holder's Winning Claim Account (writable)
    let holder_claim_info = next_account_info(account_info_iter)?;

    // Account 6: Authority PDA
    let authority_info = next_account_info(account_info_iter)?;

    // Account 7: Token Program
    let token_program_info = next_account_info(account_info_iter)?;
    check_token_program(token_program_info)?;

    if args.amount == 0 {
        return Err(ConditionalVaultError::InvalidAmount.into());
    }

    let mut ledger = load_verified_ledger(ledger_info, program_id)?;
    if let Err(e) = ledger.ensure_winning_claim(claim_mint_info.key) {
        msg!("Error: {} is not redeemable: {}", claim_mint_info.key, e);
        return Err(e.into());
    }
    verify_vault(vault_info, ledger_info, &ledger, program_id)?;
    let authority = VaultAuthority::verify(authority_info, program_id)?;

    unpack_token_account(holder_collateral_info, &ledger.collateral_mint, None)?;
    let claim = unpack_token_account(holder_claim_info, claim_mint_info.key, Some(holder_info.key))?;
    if claim.amount < args.amount {
        msg!("Error: Insufficient winning claims: has {}, needs {}", claim.amount, args.amount);
        return Err(ConditionalVaultError::InsufficientClaimBalance.into());
    }

    ledger.debit_collateral(args.amount)?;

    burn(token_program_info, holder_claim_info, claim_mint_info, holder_info, args.amount)?;

    // Winning claims pay out 1:1
    transfer_from_vault(
        &authority,
        authority_info,
        token_program_info,
        vault_info,
        holder_collateral_info,
        args.amount,
    )?;

    store_account(&ledger, ledger_info)?;

    msg!("Redeemed {} winning claims for {}", args.amount, holder_info.key);
    msg!("Vault collateral: {}", ledger.collateral_balance);

    Ok(())
}
