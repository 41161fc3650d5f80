//! Utility functions for the Conditional Vault Program

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    account_info::AccountInfo,
    clock::Clock,
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction,
    sysvar::Sysvar,
};

use crate::error::ConditionalVaultError;
use crate::state::{
    MarketEntry, VaultLedger, MARKET_ENTRY_DISCRIMINATOR, VAULT_LEDGER_DISCRIMINATOR,
};

/// Safely deserialize account data using BorshDeserialize::deserialize
/// This does NOT require the slice to be fully consumed, which is important
/// when the account has padding bytes at the end.
pub fn deserialize_account<T: BorshDeserialize>(data: &[u8]) -> Result<T, ProgramError> {
    T::deserialize(&mut &data[..])
        .map_err(|_| ProgramError::InvalidAccountData)
}

/// Serialize `value` into the account's data buffer
pub fn store_account<T: BorshSerialize>(value: &T, account: &AccountInfo) -> ProgramResult {
    let mut data = account.try_borrow_mut_data()?;
    value.serialize(&mut &mut data[..])?;
    Ok(())
}

/// Check if a signer is authorized
pub fn check_signer(account: &AccountInfo) -> ProgramResult {
    if !account.is_signer {
        msg!("Error: {} must sign", account.key);
        return Err(ConditionalVaultError::InvalidSigner.into());
    }
    Ok(())
}

/// Verify the System Program account
pub fn check_system_program(account: &AccountInfo) -> ProgramResult {
    if *account.key != solana_program::system_program::ID {
        msg!("Error: Invalid System Program");
        return Err(ProgramError::IncorrectProgramId);
    }
    Ok(())
}

/// Get current timestamp from Clock sysvar
pub fn get_current_timestamp() -> Result<i64, ProgramError> {
    let clock = Clock::get()?;
    Ok(clock.unix_timestamp)
}

/// Create a PDA account. An address already holding lamports is topped up to
/// rent exemption, then allocated and assigned, so a transfer to a derived
/// address cannot block its creation.
pub fn create_pda_account<'a>(
    payer: &AccountInfo<'a>,
    pda: &AccountInfo<'a>,
    space: usize,
    owner: &Pubkey,
    system_program: &AccountInfo<'a>,
    seeds: &[&[u8]],
) -> ProgramResult {
    let rent = Rent::get()?;
    let required_lamports = rent.minimum_balance(space).max(1);

    if pda.lamports() == 0 {
        return invoke_signed(
            &system_instruction::create_account(
                payer.key,
                pda.key,
                required_lamports,
                space as u64,
                owner,
            ),
            &[payer.clone(), pda.clone(), system_program.clone()],
            &[seeds],
        );
    }

    msg!("{} is pre-funded with {} lamports", pda.key, pda.lamports());
    let top_up = required_lamports.saturating_sub(pda.lamports());
    if top_up > 0 {
        invoke(
            &system_instruction::transfer(payer.key, pda.key, top_up),
            &[payer.clone(), pda.clone(), system_program.clone()],
        )?;
    }

    invoke_signed(
        &system_instruction::allocate(pda.key, space as u64),
        &[pda.clone(), system_program.clone()],
        &[seeds],
    )?;

    invoke_signed(
        &system_instruction::assign(pda.key, owner),
        &[pda.clone(), system_program.clone()],
        &[seeds],
    )
}

/// Load a market entry owned by this program
pub fn load_market_entry(
    account: &AccountInfo,
    program_id: &Pubkey,
) -> Result<MarketEntry, ProgramError> {
    if account.data_is_empty() {
        msg!("Error: Market entry {} not initialized", account.key);
        return Err(ConditionalVaultError::AccountNotInitialized.into());
    }
    if account.owner != program_id {
        return Err(ProgramError::IncorrectProgramId);
    }
    let entry = deserialize_account::<MarketEntry>(&account.data.borrow())?;
    if entry.discriminator != MARKET_ENTRY_DISCRIMINATOR {
        msg!("Error: Invalid MarketEntry discriminator");
        return Err(ConditionalVaultError::InvalidAccountData.into());
    }
    Ok(entry)
}

/// Load a vault ledger owned by this program
pub fn load_vault_ledger(
    account: &AccountInfo,
    program_id: &Pubkey,
) -> Result<VaultLedger, ProgramError> {
    if account.data_is_empty() {
        msg!("Error: Vault ledger {} not initialized", account.key);
        return Err(ConditionalVaultError::AccountNotInitialized.into());
    }
    if account.owner != program_id {
        return Err(ProgramError::IncorrectProgramId);
    }
    let ledger = deserialize_account::<VaultLedger>(&account.data.borrow())?;
    if ledger.discriminator != VAULT_LEDGER_DISCRIMINATOR {
        msg!("Error: Invalid VaultLedger discriminator");
        return Err(ConditionalVaultError::InvalidAccountData.into());
    }
    Ok(ledger)
}
