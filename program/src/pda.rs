//! Deterministic addresses of the escrow program.
//!
//! Every account the program owns or signs for is a pure function of public
//! inputs, so any caller can compute it before submitting a transaction.

use solana_program::pubkey::Pubkey;

/// Seed prefix of escrow records.
pub const ESCROW_SEED: &[u8] = b"escrow";

/// Seed of the authority that enqueues tasks with the scheduler.
pub const QUEUE_AUTHORITY_SEED: &[u8] = b"queue_authority";

/// Escrow record address for `(maker, seed)`.
pub fn find_escrow_address(program_id: &Pubkey, maker: &Pubkey, seed: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[ESCROW_SEED, maker.as_ref(), &seed.to_le_bytes()],
        program_id,
    )
}

/// Vault address: the escrow's associated token account for the offered mint.
pub fn find_vault_address(escrow: &Pubkey, mint_a: &Pubkey, token_program_id: &Pubkey) -> Pubkey {
    spl_associated_token_account::get_associated_token_address_with_program_id(
        escrow,
        mint_a,
        token_program_id,
    )
}

/// Queue authority of the program, the signer of scheduler enqueue requests.
pub fn find_queue_authority_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[QUEUE_AUTHORITY_SEED], program_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escrow_address_depends_on_maker_and_seed() {
        let program_id = crate::id();
        let maker = Pubkey::new_unique();
        let other = Pubkey::new_unique();

        let (a, _) = find_escrow_address(&program_id, &maker, 1);
        let (b, _) = find_escrow_address(&program_id, &maker, 1);
        let (c, _) = find_escrow_address(&program_id, &maker, 2);
        let (d, _) = find_escrow_address(&program_id, &other, 1);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_escrow_bump_recreates_address() {
        let program_id = crate::id();
        let maker = Pubkey::new_unique();
        let seed = 42u64;
        let (escrow, bump) = find_escrow_address(&program_id, &maker, seed);
        let recreated = Pubkey::create_program_address(
            &[ESCROW_SEED, maker.as_ref(), &seed.to_le_bytes(), &[bump]],
            &program_id,
        )
        .unwrap();
        assert_eq!(escrow, recreated);
    }
}
