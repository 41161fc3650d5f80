//! SPL Token CPI helpers
//!
//! Helpers that sign with the program authority take a `VaultAuthority`;
//! the rest are signed by the user and go through plain `invoke`.

use solana_program::{
    account_info::AccountInfo,
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
};
use spl_token::state::{Account as TokenAccount, Mint};

use crate::authority::VaultAuthority;
use crate::error::ConditionalVaultError;
use crate::utils::create_pda_account;

/// Verify the supplied token program is SPL Token
pub fn check_token_program(token_program: &AccountInfo) -> ProgramResult {
    if *token_program.key != spl_token::id() {
        msg!("Error: Invalid Token Program {}", token_program.key);
        return Err(ConditionalVaultError::InvalidTokenProgram.into());
    }
    Ok(())
}

/// Unpack a mint owned by the token program
pub fn unpack_mint(mint_info: &AccountInfo) -> Result<Mint, ProgramError> {
    if *mint_info.owner != spl_token::id() {
        return Err(ConditionalVaultError::InvalidCollateralMint.into());
    }
    Mint::unpack(&mint_info.data.borrow())
        .map_err(|_| ConditionalVaultError::InvalidCollateralMint.into())
}

/// Unpack a token account and check its mint and (optionally) its owner
pub fn unpack_token_account(
    account_info: &AccountInfo,
    expected_mint: &Pubkey,
    expected_owner: Option<&Pubkey>,
) -> Result<TokenAccount, ProgramError> {
    if *account_info.owner != spl_token::id() {
        msg!("Error: {} is not a token account", account_info.key);
        return Err(ConditionalVaultError::InvalidTokenAccount.into());
    }
    let account = TokenAccount::unpack(&account_info.data.borrow())
        .map_err(|_| ProgramError::from(ConditionalVaultError::InvalidTokenAccount))?;
    if account.mint != *expected_mint {
        msg!("Error: Token account {} has mint {}, expected {}",
             account_info.key, account.mint, expected_mint);
        return Err(ConditionalVaultError::InvalidTokenAccount.into());
    }
    if let Some(owner) = expected_owner {
        if account.owner != *owner {
            msg!("Error: Token account {} is owned by {}, expected {}",
                 account_info.key, account.owner, owner);
            return Err(ConditionalVaultError::InvalidTokenAccount.into());
        }
    }
    Ok(account)
}

/// Create and initialize a claim mint at a PDA. The authority capability is
/// both mint and freeze authority.
pub fn create_claim_mint<'a>(
    payer: &AccountInfo<'a>,
    mint_info: &AccountInfo<'a>,
    mint_seeds: &[&[u8]],
    authority: &VaultAuthority,
    decimals: u8,
    token_program: &AccountInfo<'a>,
    system_program: &AccountInfo<'a>,
) -> ProgramResult {
    create_pda_account(
        payer,
        mint_info,
        Mint::LEN,
        token_program.key,
        system_program,
        mint_seeds,
    )?;

    invoke(
        &spl_token::instruction::initialize_mint2(
            token_program.key,
            mint_info.key,
            authority.address(),
            Some(authority.address()),
            decimals,
        )?,
        &[mint_info.clone(), token_program.clone()],
    )
}

/// Create and initialize the collateral vault token account at a PDA, owned
/// by the authority capability.
pub fn create_vault_account<'a>(
    payer: &AccountInfo<'a>,
    vault_info: &AccountInfo<'a>,
    vault_seeds: &[&[u8]],
    collateral_mint: &AccountInfo<'a>,
    authority: &VaultAuthority,
    token_program: &AccountInfo<'a>,
    system_program: &AccountInfo<'a>,
) -> ProgramResult {
    create_pda_account(
        payer,
        vault_info,
        TokenAccount::LEN,
        token_program.key,
        system_program,
        vault_seeds,
    )?;

    invoke(
        &spl_token::instruction::initialize_account3(
            token_program.key,
            vault_info.key,
            collateral_mint.key,
            authority.address(),
        )?,
        &[vault_info.clone(), collateral_mint.clone(), token_program.clone()],
    )
}

/// Create the wallet's associated token account if it does not exist yet
pub fn create_associated_account_idempotent<'a>(
    payer: &AccountInfo<'a>,
    associated_account: &AccountInfo<'a>,
    wallet: &AccountInfo<'a>,
    mint: &AccountInfo<'a>,
    system_program: &AccountInfo<'a>,
    token_program: &AccountInfo<'a>,
    associated_token_program: &AccountInfo<'a>,
) -> ProgramResult {
    let expected = spl_associated_token_account::get_associated_token_address_with_program_id(
        wallet.key,
        mint.key,
        token_program.key,
    );
    if *associated_account.key != expected {
        msg!("Error: Associated token account mismatch: expected {}, got {}",
             expected, associated_account.key);
        return Err(ConditionalVaultError::AddressMismatch.into());
    }
    if *associated_token_program.key != spl_associated_token_account::id() {
        return Err(ProgramError::IncorrectProgramId);
    }

    invoke(
        &spl_associated_token_account::instruction::create_associated_token_account_idempotent(
            payer.key,
            wallet.key,
            mint.key,
            token_program.key,
        ),
        &[
            payer.clone(),
            associated_account.clone(),
            wallet.clone(),
            mint.clone(),
            system_program.clone(),
            token_program.clone(),
            associated_token_program.clone(),
        ],
    )
}

/// Transfer tokens out of a user-owned account (user signs)
pub fn transfer<'a>(
    token_program: &AccountInfo<'a>,
    source: &AccountInfo<'a>,
    destination: &AccountInfo<'a>,
    owner: &AccountInfo<'a>,
    amount: u64,
) -> ProgramResult {
    invoke(
        &spl_token::instruction::transfer(
            token_program.key,
            source.key,
            destination.key,
            owner.key,
            &[],
            amount,
        )?,
        &[source.clone(), destination.clone(), owner.clone(), token_program.clone()],
    )
}

/// Transfer collateral out of the vault (authority signs)
pub fn transfer_from_vault<'a>(
    authority: &VaultAuthority,
    authority_info: &AccountInfo<'a>,
    token_program: &AccountInfo<'a>,
    vault: &AccountInfo<'a>,
    destination: &AccountInfo<'a>,
    amount: u64,
) -> ProgramResult {
    let ix = spl_token::instruction::transfer(
        token_program.key,
        vault.key,
        destination.key,
        authority.address(),
        &[],
        amount,
    )?;
    authority.with_signer_seeds(|seeds| {
        invoke_signed(
            &ix,
            &[vault.clone(), destination.clone(), authority_info.clone(), token_program.clone()],
            &[seeds],
        )
    })
}

/// Mint claim tokens (authority signs)
pub fn mint_to<'a>(
    authority: &VaultAuthority,
    authority_info: &AccountInfo<'a>,
    token_program: &AccountInfo<'a>,
    mint: &AccountInfo<'a>,
    destination: &AccountInfo<'a>,
    amount: u64,
) -> ProgramResult {
    let ix = spl_token::instruction::mint_to(
        token_program.key,
        mint.key,
        destination.key,
        authority.address(),
        &[],
        amount,
    )?;
    authority.with_signer_seeds(|seeds| {
        invoke_signed(
            &ix,
            &[mint.clone(), destination.clone(), authority_info.clone(), token_program.clone()],
            &[seeds],
        )
    })
}

/// Burn claim tokens from a holder's account (holder signs)
pub fn burn<'a>(
    token_program: &AccountInfo<'a>,
    account: &AccountInfo<'a>,
    mint: &AccountInfo<'a>,
    owner: &AccountInfo<'a>,
    amount: u64,
) -> ProgramResult {
    invoke(
        &spl_token::instruction::burn(
            token_program.key,
            account.key,
            mint.key,
            owner.key,
            &[],
            amount,
        )?,
        &[account.clone(), mint.clone(), owner.clone(), token_program.clone()],
    )
}
