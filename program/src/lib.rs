use solana_program::declare_id;

pub use crate::error::EscrowError;
pub use crate::instruction::Instruction;

pub mod error;
pub mod instruction;
pub mod pda;
pub mod processor;
pub mod scheduler;
pub mod state;

#[cfg(not(feature = "no-entrypoint"))]
mod entrypoint;

declare_id!("GaDuBQ9poRLs8vDYQTQQqcyYfSSvYqXqGDB9JCtgNyA5");
