//! Error types for the Conditional Vault Program

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use solana_program::{
    decode_error::DecodeError,
    program_error::ProgramError,
};
use thiserror::Error;

/// Errors that may be returned by the Conditional Vault Program
#[derive(Clone, Debug, Eq, Error, FromPrimitive, PartialEq)]
pub enum ConditionalVaultError {
    // === General Errors (0-99) ===

    #[error("Invalid instruction")]
    InvalidInstruction = 0,

    #[error("Invalid account data")]
    InvalidAccountData = 1,

    #[error("Account not initialized")]
    AccountNotInitialized = 2,

    #[error("Invalid signer")]
    InvalidSigner = 3,

    #[error("Invalid amount")]
    InvalidAmount = 4,

    #[error("Arithmetic overflow")]
    ArithmeticOverflow = 5,

    #[error("Market name too long")]
    NameTooLong = 6,

    #[error("Market description too long")]
    DescriptionTooLong = 7,

    // === Derivation Errors (100-199) ===

    #[error("Address does not match derivation")]
    AddressMismatch = 100,

    #[error("Invalid claim mint")]
    InvalidClaimMint = 101,

    #[error("Invalid vault token account")]
    InvalidVault = 102,

    #[error("Invalid collateral mint")]
    InvalidCollateralMint = 103,

    #[error("Invalid token program")]
    InvalidTokenProgram = 104,

    #[error("Invalid token account")]
    InvalidTokenAccount = 105,

    // === State Errors (200-299) ===

    #[error("Already initialized")]
    AlreadyInitialized = 200,

    #[error("Vault already initialized for this market")]
    VaultAlreadyInitialized = 201,

    #[error("Vault binding not set")]
    VaultNotActivated = 202,

    #[error("Market already resolved")]
    MarketAlreadyResolved = 203,

    #[error("Market not resolved")]
    MarketNotResolved = 204,

    #[error("Winning mint is not a claim mint of this vault")]
    InvalidWinningMint = 205,

    #[error("Claim is not the winning claim")]
    NotWinningClaim = 206,

    // === Authorization Errors (300-399) ===

    #[error("Signer is not the market owner")]
    OwnerMismatch = 300,

    // === Conservation Errors (400-499) ===

    #[error("Insufficient collateral balance")]
    InsufficientCollateral = 400,

    #[error("Insufficient claim balance")]
    InsufficientClaimBalance = 401,

    #[error("Insufficient vault balance")]
    InsufficientVaultBalance = 402,
}

/// Coarse classification of an error, telling client software whether a
/// retry can help.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Malformed request or arguments
    Input,
    /// Supplied address does not match the deterministic derivation
    Derivation,
    /// Wrong lifecycle state for the requested operation
    StatePrecondition,
    /// Caller is not the recorded owner
    Authorization,
    /// Not enough balance on the debited asset
    Conservation,
}

impl ConditionalVaultError {
    pub fn kind(&self) -> ErrorKind {
        match self.clone() as u32 {
            0..=99 => ErrorKind::Input,
            100..=199 => ErrorKind::Derivation,
            200..=299 => ErrorKind::StatePrecondition,
            300..=399 => ErrorKind::Authorization,
            _ => ErrorKind::Conservation,
        }
    }

    /// Decode a `ProgramError::Custom` code emitted by this program
    pub fn from_code(code: u32) -> Option<Self> {
        Self::from_u32(code)
    }
}

impl From<ConditionalVaultError> for ProgramError {
    fn from(e: ConditionalVaultError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for ConditionalVaultError {
    fn type_of() -> &'static str {
        "ConditionalVaultError"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(ConditionalVaultError::InvalidAmount.kind(), ErrorKind::Input);
        assert_eq!(ConditionalVaultError::AddressMismatch.kind(), ErrorKind::Derivation);
        assert_eq!(ConditionalVaultError::MarketNotResolved.kind(), ErrorKind::StatePrecondition);
        assert_eq!(ConditionalVaultError::OwnerMismatch.kind(), ErrorKind::Authorization);
        assert_eq!(ConditionalVaultError::InsufficientCollateral.kind(), ErrorKind::Conservation);
    }

    #[test]
    fn test_not_resolved_is_distinct_from_insufficient_balance() {
        let not_resolved = ConditionalVaultError::MarketNotResolved;
        let insufficient = ConditionalVaultError::InsufficientClaimBalance;
        assert_ne!(not_resolved.kind(), insufficient.kind());
        assert_ne!(
            ProgramError::from(not_resolved),
            ProgramError::from(insufficient)
        );
    }

    #[test]
    fn test_custom_code_roundtrip() {
        let err: ProgramError = ConditionalVaultError::OwnerMismatch.into();
        match err {
            ProgramError::Custom(code) => {
                assert_eq!(code, 300);
                assert_eq!(
                    ConditionalVaultError::from_code(code),
                    Some(ConditionalVaultError::OwnerMismatch)
                );
            }
            _ => panic!("Expected custom error"),
        }
        assert_eq!(ConditionalVaultError::from_code(9999), None);
    }
}
