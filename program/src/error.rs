use solana_program::program_error::ProgramError;

/// Errors raised by the escrow state machine.
///
/// Each variant maps to `ProgramError::Custom` with its discriminant as the
/// code, so clients can decode a failed transaction with [`EscrowError::try_from`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EscrowError {
    /// Offered or requested amount is zero.
    #[error("amount must be greater than zero")]
    InvalidAmount,

    /// Expiry is not strictly in the future.
    #[error("expiry must be in the future")]
    InvalidExpiry,

    /// The paying token account cannot cover the amount.
    #[error("insufficient funds")]
    InsufficientFunds,

    /// Settlement attempted at or after expiry.
    #[error("escrow has expired")]
    Expired,

    /// Refund attempted before expiry without the maker's signature.
    #[error("only the maker may refund before expiry")]
    NotMakerAndNotExpired,

    /// The escrow was already settled or refunded.
    #[error("escrow already resolved")]
    AlreadyResolved,

    /// Offered and requested mints are equal, or a token account holds the wrong mint.
    #[error("asset mismatch")]
    AssetMismatch,
}

impl From<EscrowError> for ProgramError {
    fn from(err: EscrowError) -> Self {
        ProgramError::Custom(err as u32)
    }
}

impl TryFrom<u32> for EscrowError {
    type Error = u32;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(EscrowError::InvalidAmount),
            1 => Ok(EscrowError::InvalidExpiry),
            2 => Ok(EscrowError::InsufficientFunds),
            3 => Ok(EscrowError::Expired),
            4 => Ok(EscrowError::NotMakerAndNotExpired),
            5 => Ok(EscrowError::AlreadyResolved),
            6 => Ok(EscrowError::AssetMismatch),
            other => Err(other),
        }
    }
}
