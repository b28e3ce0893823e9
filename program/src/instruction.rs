use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::instruction::AccountMeta;
use solana_program::pubkey::Pubkey;

/// Instruction definition.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum Instruction {
    /// Open an escrow and deposit the offered tokens into its vault.
    ///
    ///
    /// Accounts expected:
    ///
    ///   0. `[signer, writable]` The maker, paying rent for the escrow and the vault
    ///   1. `[]` Mint of the offered token
    ///   2. `[]` Mint of the requested token
    ///   3. `[writable]` The maker's token account for the offered mint
    ///   4. `[writable]` The escrow account, derived from the maker and the seed
    ///   5. `[writable]` The vault, the escrow's associated token account for the offered mint
    ///   6. `[]` The associated token account program
    ///   7. `[]` The token program
    ///   8. `[]` The system program
    Make {
        seed: u64,
        amount_offered: u64,
        amount_requested: u64,
        expiry: i64,
    },
    /// Settle the escrow before it expires.
    ///
    ///
    /// Accounts expected:
    ///
    ///   0. `[signer, writable]` The taker
    ///   1. `[writable]` The maker, receiving the rent of the closed accounts
    ///   2. `[]` Mint of the offered token
    ///   3. `[]` Mint of the requested token
    ///   4. `[writable]` The taker's token account for the offered mint, created if missing
    ///   5. `[writable]` The taker's token account for the requested mint
    ///   6. `[writable]` The maker's token account for the requested mint, created if missing
    ///   7. `[writable]` The escrow account
    ///   8. `[writable]` The vault
    ///   9. `[]` The associated token account program
    ///   10. `[]` The token program
    ///   11. `[]` The system program
    Take,
    /// Return the deposit to the maker and close the escrow.
    ///
    /// The maker must sign before expiry; afterwards anyone may submit it.
    ///
    ///
    /// Accounts expected:
    ///
    ///   0. `[writable, signer?]` The maker
    ///   1. `[]` Mint of the offered token
    ///   2. `[writable]` The maker's token account for the offered mint, recreated if missing
    ///   3. `[writable]` The escrow account
    ///   4. `[writable]` The vault
    ///   5. `[]` The associated token account program
    ///   6. `[]` The token program
    ///   7. `[]` The system program
    Refund,
    /// Queue a refund of the escrow with the task queue, due at expiry.
    ///
    ///
    /// Accounts expected:
    ///
    ///   0. `[signer, writable]` The payer of the task
    ///   1. `[]` The escrow account
    ///   2. `[writable]` The task queue
    ///   3. `[]` The task queue authority record of this program's queue authority
    ///   4. `[writable]` The task account to create
    ///   5. `[writable]` The program's queue authority
    ///   6. `[]` The system program
    ///   7. `[]` The task queue program
    Schedule { task_id: u16, crank_reward: u64 },
}

/// Create make instructions for escrow.
#[allow(clippy::too_many_arguments)]
pub fn make(
    escrow_program_id: Pubkey,
    maker_pubkey: Pubkey,
    mint_a_pubkey: Pubkey,
    mint_b_pubkey: Pubkey,
    maker_token_account_a_pubkey: Pubkey,
    escrow_pubkey: Pubkey,
    vault_pubkey: Pubkey,
    token_program_pubkey: Pubkey,
    seed: u64,
    amount_offered: u64,
    amount_requested: u64,
    expiry: i64,
) -> solana_program::instruction::Instruction {
    solana_program::instruction::Instruction::new_with_borsh(
        escrow_program_id,
        &Instruction::Make {
            seed,
            amount_offered,
            amount_requested,
            expiry,
        },
        vec![
            AccountMeta::new(maker_pubkey, true),
            AccountMeta::new_readonly(mint_a_pubkey, false),
            AccountMeta::new_readonly(mint_b_pubkey, false),
            AccountMeta::new(maker_token_account_a_pubkey, false),
            AccountMeta::new(escrow_pubkey, false),
            AccountMeta::new(vault_pubkey, false),
            AccountMeta::new_readonly(spl_associated_token_account::id(), false),
            AccountMeta::new_readonly(token_program_pubkey, false),
            AccountMeta::new_readonly(solana_program::system_program::id(), false),
        ],
    )
}

/// Create take instructions for escrow.
#[allow(clippy::too_many_arguments)]
pub fn take(
    escrow_program_id: Pubkey,
    taker_pubkey: Pubkey,
    maker_pubkey: Pubkey,
    mint_a_pubkey: Pubkey,
    mint_b_pubkey: Pubkey,
    taker_token_account_a_pubkey: Pubkey,
    taker_token_account_b_pubkey: Pubkey,
    maker_token_account_b_pubkey: Pubkey,
    escrow_pubkey: Pubkey,
    vault_pubkey: Pubkey,
    token_program_pubkey: Pubkey,
) -> solana_program::instruction::Instruction {
    solana_program::instruction::Instruction::new_with_borsh(
        escrow_program_id,
        &Instruction::Take,
        vec![
            AccountMeta::new(taker_pubkey, true),
            AccountMeta::new(maker_pubkey, false),
            AccountMeta::new_readonly(mint_a_pubkey, false),
            AccountMeta::new_readonly(mint_b_pubkey, false),
            AccountMeta::new(taker_token_account_a_pubkey, false),
            AccountMeta::new(taker_token_account_b_pubkey, false),
            AccountMeta::new(maker_token_account_b_pubkey, false),
            AccountMeta::new(escrow_pubkey, false),
            AccountMeta::new(vault_pubkey, false),
            AccountMeta::new_readonly(spl_associated_token_account::id(), false),
            AccountMeta::new_readonly(token_program_pubkey, false),
            AccountMeta::new_readonly(solana_program::system_program::id(), false),
        ],
    )
}

/// Create refund instructions for escrow.
///
/// `maker_signs` marks the maker as a signer, which is only needed to cancel
/// before expiry.
#[allow(clippy::too_many_arguments)]
pub fn refund(
    escrow_program_id: Pubkey,
    maker_pubkey: Pubkey,
    maker_signs: bool,
    mint_a_pubkey: Pubkey,
    maker_token_account_a_pubkey: Pubkey,
    escrow_pubkey: Pubkey,
    vault_pubkey: Pubkey,
    token_program_pubkey: Pubkey,
) -> solana_program::instruction::Instruction {
    solana_program::instruction::Instruction::new_with_borsh(
        escrow_program_id,
        &Instruction::Refund,
        vec![
            AccountMeta::new(maker_pubkey, maker_signs),
            AccountMeta::new_readonly(mint_a_pubkey, false),
            AccountMeta::new(maker_token_account_a_pubkey, false),
            AccountMeta::new(escrow_pubkey, false),
            AccountMeta::new(vault_pubkey, false),
            AccountMeta::new_readonly(spl_associated_token_account::id(), false),
            AccountMeta::new_readonly(token_program_pubkey, false),
            AccountMeta::new_readonly(solana_program::system_program::id(), false),
        ],
    )
}

/// Create schedule instructions for escrow.
#[allow(clippy::too_many_arguments)]
pub fn schedule(
    escrow_program_id: Pubkey,
    payer_pubkey: Pubkey,
    escrow_pubkey: Pubkey,
    task_queue_pubkey: Pubkey,
    task_queue_authority_pubkey: Pubkey,
    task_pubkey: Pubkey,
    queue_authority_pubkey: Pubkey,
    scheduler_program_pubkey: Pubkey,
    task_id: u16,
    crank_reward: u64,
) -> solana_program::instruction::Instruction {
    solana_program::instruction::Instruction::new_with_borsh(
        escrow_program_id,
        &Instruction::Schedule {
            task_id,
            crank_reward,
        },
        vec![
            AccountMeta::new(payer_pubkey, true),
            AccountMeta::new_readonly(escrow_pubkey, false),
            AccountMeta::new(task_queue_pubkey, false),
            AccountMeta::new_readonly(task_queue_authority_pubkey, false),
            AccountMeta::new(task_pubkey, false),
            AccountMeta::new(queue_authority_pubkey, false),
            AccountMeta::new_readonly(solana_program::system_program::id(), false),
            AccountMeta::new_readonly(scheduler_program_pubkey, false),
        ],
    )
}
