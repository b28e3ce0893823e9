use crate::error::EscrowError;
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::program_pack::IsInitialized;
use solana_program::pubkey::Pubkey;

/// Lifecycle of an escrow. `Settled` and `Refunded` are terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum EscrowStatus {
    #[default]
    Open,
    Settled,
    Refunded,
}

/// Escrow holds the terms of one time-locked exchange.
///
/// The record is laid out as a fixed-size borsh struct so indexers can parse
/// it without the program.
///
/// # Example
///
/// ```rust
/// # use timelock_escrow_program::state::Escrow;
/// #
/// let escrow = Escrow::default();
/// let serialized = borsh::to_vec(&escrow).unwrap();
/// let deserialized = borsh::from_slice::<Escrow>(&serialized).unwrap();
///
/// assert_eq!(serialized.len(), Escrow::LEN);
/// assert_eq!(escrow, deserialized);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Escrow {
    /// If true, state has been initialized
    pub is_initialized: bool,

    /// Current status
    pub status: EscrowStatus,

    /// Bump of the escrow address
    pub bump: u8,

    /// Seed chosen by the maker
    pub seed: u64,

    /// Maker's public key, also the refund beneficiary
    pub maker: Pubkey,

    /// Mint deposited into the vault
    pub mint_a: Pubkey,

    /// Mint requested in return
    pub mint_b: Pubkey,

    /// Amount of `mint_a` held in the vault
    pub amount_offered: u64,

    /// Amount of `mint_b` expected by the maker
    pub amount_requested: u64,

    /// Unix timestamp after which anyone may refund
    pub expiry: i64,
}

impl Escrow {
    pub const LEN: usize = 1 + 1 + 1 + 8 + 32 + 32 + 32 + 8 + 8 + 8;

    /// Little-endian seed bytes used in the escrow address.
    pub fn seed_bytes(&self) -> [u8; 8] {
        self.seed.to_le_bytes()
    }

    /// Whether the record is initialized and still open.
    pub fn is_open(&self) -> bool {
        self.is_initialized && self.status == EscrowStatus::Open
    }

    /// Whether a taker may settle at `now`.
    pub fn can_take(&self, now: i64) -> bool {
        now < self.expiry
    }

    /// Marks the escrow settled.
    pub fn settle(&mut self) -> Result<(), EscrowError> {
        self.transition(EscrowStatus::Settled)
    }

    /// Marks the escrow refunded.
    pub fn refund(&mut self) -> Result<(), EscrowError> {
        self.transition(EscrowStatus::Refunded)
    }

    fn transition(&mut self, to: EscrowStatus) -> Result<(), EscrowError> {
        match (self.is_initialized, self.status) {
            (true, EscrowStatus::Open) => {
                self.status = to;
                Ok(())
            }
            _ => Err(EscrowError::AlreadyResolved),
        }
    }
}

impl IsInitialized for Escrow {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

/// Whether `caller` may refund `escrow` at `now`.
///
/// The maker may cancel at any time. After expiry the refund is
/// permissionless, which is what lets an unattended scheduler run it.
/// `caller` is `None` when no signing identity was presented.
pub fn can_refund(caller: Option<&Pubkey>, escrow: &Escrow, now: i64) -> bool {
    caller == Some(&escrow.maker) || now >= escrow.expiry
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_escrow(expiry: i64) -> Escrow {
        Escrow {
            is_initialized: true,
            status: EscrowStatus::Open,
            bump: 255,
            seed: 7,
            maker: Pubkey::new_unique(),
            mint_a: Pubkey::new_unique(),
            mint_b: Pubkey::new_unique(),
            amount_offered: 100,
            amount_requested: 50,
            expiry,
        }
    }

    #[test]
    fn test_layout_is_fixed() {
        let escrow = open_escrow(1_700_000_000);
        let data = borsh::to_vec(&escrow).unwrap();
        assert_eq!(data.len(), Escrow::LEN);

        assert_eq!(data[0], 1);
        assert_eq!(data[1], 0);
        assert_eq!(data[2], 255);
        assert_eq!(&data[3..11], &7u64.to_le_bytes());
        assert_eq!(&data[11..43], escrow.maker.as_ref());
        assert_eq!(&data[43..75], escrow.mint_a.as_ref());
        assert_eq!(&data[75..107], escrow.mint_b.as_ref());
        assert_eq!(&data[107..115], &100u64.to_le_bytes());
        assert_eq!(&data[115..123], &50u64.to_le_bytes());
        assert_eq!(&data[123..131], &1_700_000_000i64.to_le_bytes());
    }

    #[test]
    fn test_zeroed_record_is_not_open() {
        let escrow = borsh::from_slice::<Escrow>(&[0u8; Escrow::LEN]).unwrap();
        assert!(!escrow.is_initialized());
        assert!(!escrow.is_open());
    }

    #[test]
    fn test_can_refund() {
        let escrow = open_escrow(100);
        let stranger = Pubkey::new_unique();

        assert!(can_refund(Some(&escrow.maker), &escrow, 0));
        assert!(can_refund(Some(&escrow.maker), &escrow, 500));
        assert!(!can_refund(Some(&stranger), &escrow, 99));
        assert!(!can_refund(None, &escrow, 99));
        assert!(can_refund(Some(&stranger), &escrow, 100));
        assert!(can_refund(None, &escrow, 101));
    }

    #[test]
    fn test_take_and_refund_windows_do_not_overlap() {
        let escrow = open_escrow(100);
        for now in [0, 99, 100, 101] {
            assert_ne!(escrow.can_take(now), can_refund(None, &escrow, now));
        }
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut settled = open_escrow(100);
        settled.settle().unwrap();
        assert_eq!(settled.status, EscrowStatus::Settled);
        assert_eq!(settled.refund(), Err(EscrowError::AlreadyResolved));
        assert_eq!(settled.settle(), Err(EscrowError::AlreadyResolved));
        assert_eq!(settled.status, EscrowStatus::Settled);

        let mut refunded = open_escrow(100);
        refunded.refund().unwrap();
        assert_eq!(refunded.status, EscrowStatus::Refunded);
        assert_eq!(refunded.settle(), Err(EscrowError::AlreadyResolved));
        assert_eq!(refunded.status, EscrowStatus::Refunded);
    }

    #[test]
    fn test_uninitialized_record_cannot_transition() {
        let mut escrow = Escrow::default();
        assert_eq!(escrow.refund(), Err(EscrowError::AlreadyResolved));
    }
}
