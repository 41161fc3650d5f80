//! Program authority capability
//!
//! A single PDA (`["authority"]`) is the mint authority of every claim mint and
//! the owner of every collateral vault. It has no private key and no account
//! data; the program exercises it by re-deriving the address and signing with
//! its seeds. A `VaultAuthority` can only be obtained by verifying a supplied
//! account against that derivation, and it is handed explicitly to every
//! helper that signs on its behalf.

use solana_program::{
    account_info::AccountInfo,
    program_error::ProgramError,
    pubkey::Pubkey,
};

use crate::pda::{find_authority_address, verify_address};
use crate::state::AUTHORITY_SEED;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultAuthority {
    address: Pubkey,
    bump: u8,
}

impl VaultAuthority {
    /// Verify `authority_info` is the program authority PDA
    pub fn verify(authority_info: &AccountInfo, program_id: &Pubkey) -> Result<Self, ProgramError> {
        let derived = find_authority_address(program_id);
        let bump = verify_address("Authority", authority_info, &derived)?;
        Ok(Self {
            address: derived.0,
            bump,
        })
    }

    pub fn address(&self) -> &Pubkey {
        &self.address
    }

    /// Call `f` with the signer seeds for `invoke_signed`
    pub fn with_signer_seeds<R>(&self, f: impl FnOnce(&[&[u8]]) -> R) -> R {
        let bump = [self.bump];
        let seeds: &[&[u8]] = &[AUTHORITY_SEED, &bump];
        f(seeds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConditionalVaultError;

    #[test]
    fn test_verify_authority() {
        let program_id = crate::id();
        let (address, bump) = find_authority_address(&program_id);
        let owner = solana_program::system_program::id();
        let mut lamports = 0u64;
        let mut data: Vec<u8> = vec![];
        let info = AccountInfo::new(&address, false, false, &mut lamports, &mut data, &owner, false, 0);

        let authority = VaultAuthority::verify(&info, &program_id).unwrap();
        assert_eq!(*authority.address(), address);

        let signed = authority.with_signer_seeds(|seeds| {
            Pubkey::create_program_address(seeds, &program_id).unwrap()
        });
        assert_eq!(signed, address);
        assert_eq!(authority.with_signer_seeds(|seeds| seeds[1][0]), bump);
    }

    #[test]
    fn test_reject_impostor() {
        let program_id = crate::id();
        let impostor = Pubkey::new_unique();
        let owner = solana_program::system_program::id();
        let mut lamports = 0u64;
        let mut data: Vec<u8> = vec![];
        let info = AccountInfo::new(&impostor, true, false, &mut lamports, &mut data, &owner, false, 0);

        assert_eq!(
            VaultAuthority::verify(&info, &program_id),
            Err(ProgramError::from(ConditionalVaultError::AddressMismatch))
        );
    }
}
