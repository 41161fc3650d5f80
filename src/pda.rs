//! Program derived addresses
//!
//! Every account the program touches is located by one of these derivations.
//! Processors recompute the derivation and compare it against the supplied
//! account before reading or writing anything.

use solana_program::{
    account_info::AccountInfo,
    msg,
    program_error::ProgramError,
    pubkey::Pubkey,
};

use crate::error::ConditionalVaultError;
use crate::state::{
    AUTHORITY_SEED, CLAIM_A_SEED, CLAIM_B_SEED, MARKET_SEED, VAULT_SEED, VAULT_STATE_SEED,
};

/// Market entry: ["market", index (big-endian)]
pub fn find_market_address(index: u16, program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[MARKET_SEED, &index.to_be_bytes()], program_id)
}

/// Global authority capability: ["authority"]
pub fn find_authority_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[AUTHORITY_SEED], program_id)
}

/// Vault ledger: ["vault_state", market, collateral_mint]
pub fn find_vault_ledger_address(
    market: &Pubkey,
    collateral_mint: &Pubkey,
    program_id: &Pubkey,
) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[VAULT_STATE_SEED, market.as_ref(), collateral_mint.as_ref()],
        program_id,
    )
}

/// Collateral vault token account: ["vault", vault_ledger]
pub fn find_vault_address(vault_ledger: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[VAULT_SEED, vault_ledger.as_ref()], program_id)
}

/// Outcome A claim mint: ["claim_a", vault_ledger]
pub fn find_claim_a_mint_address(vault_ledger: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[CLAIM_A_SEED, vault_ledger.as_ref()], program_id)
}

/// Outcome B claim mint: ["claim_b", vault_ledger]
pub fn find_claim_b_mint_address(vault_ledger: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[CLAIM_B_SEED, vault_ledger.as_ref()], program_id)
}

/// Compare a supplied account against its derived address.
pub fn verify_address(
    label: &str,
    account: &AccountInfo,
    derived: &(Pubkey, u8),
) -> Result<u8, ProgramError> {
    let (expected, bump) = derived;
    if account.key != expected {
        msg!("Error: {} address mismatch: expected {}, got {}", label, expected, account.key);
        return Err(ConditionalVaultError::AddressMismatch.into());
    }
    Ok(*bump)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_is_deterministic() {
        let program_id = crate::id();
        assert_eq!(find_market_address(42, &program_id), find_market_address(42, &program_id));
        assert_eq!(find_authority_address(&program_id), find_authority_address(&program_id));
    }

    #[test]
    fn test_market_index_is_big_endian() {
        let program_id = crate::id();
        let (expected, _) =
            Pubkey::find_program_address(&[b"market".as_ref(), [0x01u8, 0x02].as_ref()], &program_id);
        assert_eq!(find_market_address(0x0102, &program_id).0, expected);
        assert_ne!(
            find_market_address(0x0102, &program_id).0,
            find_market_address(0x0201, &program_id).0
        );
    }

    #[test]
    fn test_roles_do_not_collide() {
        let program_id = crate::id();
        let market = find_market_address(1, &program_id).0;
        let collateral_mint = Pubkey::new_unique();
        let ledger = find_vault_ledger_address(&market, &collateral_mint, &program_id).0;

        let addresses = [
            market,
            ledger,
            find_authority_address(&program_id).0,
            find_vault_address(&ledger, &program_id).0,
            find_claim_a_mint_address(&ledger, &program_id).0,
            find_claim_b_mint_address(&ledger, &program_id).0,
        ];
        for (i, a) in addresses.iter().enumerate() {
            for b in addresses.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_ledger_depends_on_collateral() {
        let program_id = crate::id();
        let market = find_market_address(9, &program_id).0;
        let first = find_vault_ledger_address(&market, &Pubkey::new_unique(), &program_id);
        let second = find_vault_ledger_address(&market, &Pubkey::new_unique(), &program_id);
        assert_ne!(first.0, second.0);
    }

    #[test]
    fn test_verify_address() {
        let program_id = crate::id();
        let derived = find_market_address(3, &program_id);
        let owner = Pubkey::new_unique();
        let mut lamports = 0u64;
        let mut data: Vec<u8> = vec![];

        let key = derived.0;
        let good = AccountInfo::new(&key, false, true, &mut lamports, &mut data, &owner, false, 0);
        assert_eq!(verify_address("Market", &good, &derived).unwrap(), derived.1);

        let wrong_key = Pubkey::new_unique();
        let mut lamports = 0u64;
        let mut data: Vec<u8> = vec![];
        let bad =
            AccountInfo::new(&wrong_key, false, true, &mut lamports, &mut data, &owner, false, 0);
        assert_eq!(
            verify_address("Market", &bad, &derived),
            Err(ProgramError::from(ConditionalVaultError::AddressMismatch))
        );
    }
}
