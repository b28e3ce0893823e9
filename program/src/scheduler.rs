//! Outbound interface to the tuktuk task queue.
//!
//! The escrow only enqueues one kind of task: a `Refund` of an open escrow,
//! triggered at its expiry. Wire types, transaction compilation and the
//! `queue_task_v0` CPI come from `tuktuk-program`.

use solana_program::pubkey::Pubkey;

pub use tuktuk_program::tuktuk::types::TriggerV0;
pub use tuktuk_program::types::QueueTaskArgsV0;
pub use tuktuk_program::{compile_transaction, TransactionSourceV0};

/// Crank reward used when the caller does not choose one.
pub const DEFAULT_CRANK_REWARD: u64 = 1_000_000;

/// Description attached to refund tasks.
pub const REFUND_TASK_DESCRIPTION: &str = "refund escrow";

/// Program id of the task queue.
pub fn id() -> Pubkey {
    tuktuk_program::tuktuk::ID
}

/// Task queue authority record of `queue_authority` on `task_queue`.
pub fn task_queue_authority_address(task_queue: &Pubkey, queue_authority: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[
            b"task_queue_authority",
            task_queue.as_ref(),
            queue_authority.as_ref(),
        ],
        &id(),
    )
    .0
}

/// Task account for `task_id` on `task_queue`.
pub fn task_address(task_queue: &Pubkey, task_id: u16) -> Pubkey {
    Pubkey::find_program_address(
        &[b"task", task_queue.as_ref(), &task_id.to_le_bytes()],
        &id(),
    )
    .0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_addresses_follow_queue_and_id() {
        let task_queue = Pubkey::new_unique();
        let queue_authority = Pubkey::new_unique();

        assert_eq!(task_address(&task_queue, 1), task_address(&task_queue, 1));
        assert_ne!(task_address(&task_queue, 1), task_address(&task_queue, 2));
        assert_ne!(
            task_queue_authority_address(&task_queue, &queue_authority),
            task_queue_authority_address(&task_queue, &Pubkey::new_unique())
        );

        let expected = Pubkey::find_program_address(
            &[b"task", task_queue.as_ref(), &7u16.to_le_bytes()],
            &id(),
        )
        .0;
        assert_eq!(task_address(&task_queue, 7), expected);
    }

    #[test]
    fn test_task_queue_program_id() {
        assert_eq!(
            id().to_string(),
            "tuktukUrfhXT6ZT77QTU8RQtvgL967uRuVagWF57zVA"
        );
    }
}
