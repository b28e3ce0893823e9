use crate::error::EscrowError;
use crate::instruction::Instruction;
use crate::pda::{find_escrow_address, find_queue_authority_address, find_vault_address};
use crate::pda::{ESCROW_SEED, QUEUE_AUTHORITY_SEED};
use crate::scheduler::{compile_transaction, QueueTaskArgsV0, TransactionSourceV0, TriggerV0};
use crate::state::{can_refund, Escrow, EscrowStatus};
use anchor_lang::context::CpiContext;
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::account_info::{next_account_info, AccountInfo};
use solana_program::clock::Clock;
use solana_program::entrypoint::ProgramResult;
use solana_program::msg;
use solana_program::program::{invoke, invoke_signed};
use solana_program::program_error::ProgramError;
use solana_program::program_pack::Pack;
use solana_program::pubkey::Pubkey;
use solana_program::rent::Rent;
use solana_program::system_instruction;
use solana_program::sysvar::Sysvar;
use tuktuk_program::tuktuk::cpi::accounts::QueueTaskV0;
use tuktuk_program::tuktuk::cpi::queue_task_v0;

/// Processor is processing the instructions.
pub struct Processor;

impl Processor {
    fn process_make(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        seed: u64,
        amount_offered: u64,
        amount_requested: u64,
        expiry: i64,
    ) -> ProgramResult {
        // Retrieving an accounts
        let account_iter = &mut accounts.iter();
        let maker_account = next_account_info(account_iter)?;
        let mint_a_account = next_account_info(account_iter)?;
        let mint_b_account = next_account_info(account_iter)?;
        let maker_token_account_a = next_account_info(account_iter)?;
        let escrow_account = next_account_info(account_iter)?;
        let vault_account = next_account_info(account_iter)?;
        let associated_token_program = next_account_info(account_iter)?;
        let token_program = next_account_info(account_iter)?;
        let system_program = next_account_info(account_iter)?;

        // Validating the terms
        if !maker_account.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }
        if amount_offered == 0 || amount_requested == 0 {
            return Err(EscrowError::InvalidAmount.into());
        }
        if mint_a_account.key == mint_b_account.key {
            return Err(EscrowError::AssetMismatch.into());
        }
        let clock = Clock::get()?;
        if expiry <= clock.unix_timestamp {
            return Err(EscrowError::InvalidExpiry.into());
        }

        // Validating the accounts
        check_programs(associated_token_program, token_program, system_program)?;
        let (escrow_pubkey, bump) = find_escrow_address(program_id, maker_account.key, seed);
        if escrow_pubkey != *escrow_account.key {
            return Err(ProgramError::InvalidSeeds);
        }
        if find_vault_address(escrow_account.key, mint_a_account.key, token_program.key)
            != *vault_account.key
        {
            return Err(ProgramError::InvalidSeeds);
        }
        let maker_token_state = unpack_token_account(maker_token_account_a, token_program)?;
        if maker_token_state.mint != *mint_a_account.key {
            return Err(EscrowError::AssetMismatch.into());
        }
        if maker_token_state.owner != *maker_account.key {
            return Err(ProgramError::IllegalOwner);
        }
        if maker_token_state.amount < amount_offered {
            return Err(EscrowError::InsufficientFunds.into());
        }

        // Creating the escrow account
        // The record also holds the rent of a token account, spent if the
        // maker's account is gone at refund time and returned on close.
        let rent = Rent::get()?;
        let ix = system_instruction::create_account(
            maker_account.key,
            escrow_account.key,
            rent.minimum_balance(Escrow::LEN)
                + rent.minimum_balance(spl_token::state::Account::LEN),
            Escrow::LEN as u64,
            program_id,
        );
        invoke_signed(
            &ix,
            &[
                maker_account.clone(),
                escrow_account.clone(),
                system_program.clone(),
            ],
            &[&[
                ESCROW_SEED,
                maker_account.key.as_ref(),
                &seed.to_le_bytes(),
                &[bump],
            ]],
        )?;

        let state = Escrow {
            is_initialized: true,
            status: EscrowStatus::Open,
            bump,
            seed,
            maker: *maker_account.key,
            mint_a: *mint_a_account.key,
            mint_b: *mint_b_account.key,
            amount_offered,
            amount_requested,
            expiry,
        };
        store_escrow(escrow_account, &state)?;

        // Creating the vault owned by the escrow
        let ix = spl_associated_token_account::instruction::create_associated_token_account_idempotent(
            maker_account.key,
            escrow_account.key,
            mint_a_account.key,
            token_program.key,
        );
        invoke(
            &ix,
            &[
                maker_account.clone(),
                vault_account.clone(),
                escrow_account.clone(),
                mint_a_account.clone(),
                system_program.clone(),
                token_program.clone(),
                associated_token_program.clone(),
            ],
        )?;

        // Deposit the offered tokens into the vault
        let ix = spl_token::instruction::transfer(
            token_program.key,
            maker_token_account_a.key,
            vault_account.key,
            maker_account.key,
            &[],
            amount_offered,
        )?;
        invoke(
            &ix,
            &[
                maker_token_account_a.clone(),
                vault_account.clone(),
                maker_account.clone(),
                token_program.clone(),
            ],
        )?;

        msg!(
            "Escrow {} opened: {} of {} for {} of {}, expiry {}",
            escrow_account.key,
            amount_offered,
            mint_a_account.key,
            amount_requested,
            mint_b_account.key,
            expiry
        );

        Ok(())
    }

    fn process_take(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
        // Retrieving an accounts
        let account_iter = &mut accounts.iter();
        let taker_account = next_account_info(account_iter)?;
        let maker_account = next_account_info(account_iter)?;
        let mint_a_account = next_account_info(account_iter)?;
        let mint_b_account = next_account_info(account_iter)?;
        let taker_token_account_a = next_account_info(account_iter)?;
        let taker_token_account_b = next_account_info(account_iter)?;
        let maker_token_account_b = next_account_info(account_iter)?;
        let escrow_account = next_account_info(account_iter)?;
        let vault_account = next_account_info(account_iter)?;
        let associated_token_program = next_account_info(account_iter)?;
        let token_program = next_account_info(account_iter)?;
        let system_program = next_account_info(account_iter)?;

        if !taker_account.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }

        // Validating the escrow state
        let mut state = load_open_escrow(program_id, escrow_account)?;
        let clock = Clock::get()?;
        if !state.can_take(clock.unix_timestamp) {
            return Err(EscrowError::Expired.into());
        }

        // Validating the accounts
        check_programs(associated_token_program, token_program, system_program)?;
        if state.maker != *maker_account.key {
            return Err(ProgramError::InvalidAccountData);
        }
        if state.mint_a != *mint_a_account.key || state.mint_b != *mint_b_account.key {
            return Err(EscrowError::AssetMismatch.into());
        }
        if find_vault_address(escrow_account.key, mint_a_account.key, token_program.key)
            != *vault_account.key
        {
            return Err(ProgramError::InvalidSeeds);
        }
        let taker_token_state = unpack_token_account(taker_token_account_b, token_program)?;
        if taker_token_state.mint != state.mint_b {
            return Err(EscrowError::AssetMismatch.into());
        }
        if taker_token_state.amount < state.amount_requested {
            return Err(EscrowError::InsufficientFunds.into());
        }

        // Make sure both receiving token accounts exist
        for (wallet, mint, token_account) in [
            (taker_account, mint_a_account, taker_token_account_a),
            (maker_account, mint_b_account, maker_token_account_b),
        ] {
            let ix =
                spl_associated_token_account::instruction::create_associated_token_account_idempotent(
                    taker_account.key,
                    wallet.key,
                    mint.key,
                    token_program.key,
                );
            invoke(
                &ix,
                &[
                    taker_account.clone(),
                    token_account.clone(),
                    wallet.clone(),
                    mint.clone(),
                    system_program.clone(),
                    token_program.clone(),
                    associated_token_program.clone(),
                ],
            )?;
        }

        // Transfer the requested token from the taker to the maker
        let ix = spl_token::instruction::transfer(
            token_program.key,
            taker_token_account_b.key,
            maker_token_account_b.key,
            taker_account.key,
            &[],
            state.amount_requested,
        )?;
        invoke(
            &ix,
            &[
                taker_token_account_b.clone(),
                maker_token_account_b.clone(),
                taker_account.clone(),
                token_program.clone(),
            ],
        )?;

        // Release the vault to the taker and close it
        release_vault(
            &state,
            escrow_account,
            vault_account,
            taker_token_account_a,
            maker_account,
            token_program,
        )?;

        state.settle()?;
        msg!("Escrow {} settled by {}", escrow_account.key, taker_account.key);
        close_escrow_account(escrow_account, maker_account)
    }

    fn process_refund(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
        // Retrieving an accounts
        let account_iter = &mut accounts.iter();
        let maker_account = next_account_info(account_iter)?;
        let mint_a_account = next_account_info(account_iter)?;
        let maker_token_account_a = next_account_info(account_iter)?;
        let escrow_account = next_account_info(account_iter)?;
        let vault_account = next_account_info(account_iter)?;
        let associated_token_program = next_account_info(account_iter)?;
        let token_program = next_account_info(account_iter)?;
        let system_program = next_account_info(account_iter)?;

        // Validating the escrow state
        let mut state = load_open_escrow(program_id, escrow_account)?;
        if state.maker != *maker_account.key {
            return Err(ProgramError::InvalidAccountData);
        }
        if state.mint_a != *mint_a_account.key {
            return Err(EscrowError::AssetMismatch.into());
        }
        let clock = Clock::get()?;
        let caller = maker_account.is_signer.then_some(maker_account.key);
        if !can_refund(caller, &state, clock.unix_timestamp) {
            return Err(EscrowError::NotMakerAndNotExpired.into());
        }

        // Validating the accounts
        check_programs(associated_token_program, token_program, system_program)?;
        if find_vault_address(escrow_account.key, mint_a_account.key, token_program.key)
            != *vault_account.key
        {
            return Err(ProgramError::InvalidSeeds);
        }

        // Recreate the maker's token account if it was closed
        if maker_token_account_a.data_is_empty() {
            let rent = Rent::get()?;
            let required = rent
                .minimum_balance(spl_token::state::Account::LEN)
                .saturating_sub(maker_token_account_a.lamports());
            let reserve = escrow_account
                .lamports()
                .checked_sub(rent.minimum_balance(Escrow::LEN))
                .ok_or(ProgramError::InsufficientFunds)?;
            if reserve < required {
                return Err(ProgramError::InsufficientFunds);
            }
            **escrow_account.try_borrow_mut_lamports()? -= required;
            **maker_token_account_a.try_borrow_mut_lamports()? += required;

            let ix =
                spl_associated_token_account::instruction::create_associated_token_account_idempotent(
                    escrow_account.key,
                    maker_account.key,
                    mint_a_account.key,
                    token_program.key,
                );
            let seed_bytes = state.seed_bytes();
            let bump = [state.bump];
            invoke_signed(
                &ix,
                &[
                    escrow_account.clone(),
                    maker_token_account_a.clone(),
                    maker_account.clone(),
                    mint_a_account.clone(),
                    system_program.clone(),
                    token_program.clone(),
                    associated_token_program.clone(),
                ],
                &[&[ESCROW_SEED, state.maker.as_ref(), &seed_bytes, &bump]],
            )?;
        }
        let maker_token_state = unpack_token_account(maker_token_account_a, token_program)?;
        if maker_token_state.mint != state.mint_a {
            return Err(EscrowError::AssetMismatch.into());
        }
        if maker_token_state.owner != state.maker {
            return Err(ProgramError::IllegalOwner);
        }

        // Return the deposit to the maker and close the vault
        release_vault(
            &state,
            escrow_account,
            vault_account,
            maker_token_account_a,
            maker_account,
            token_program,
        )?;

        state.refund()?;
        match caller {
            Some(_) => msg!("Escrow {} cancelled by maker", escrow_account.key),
            None => msg!("Escrow {} refunded after expiry", escrow_account.key),
        }
        close_escrow_account(escrow_account, maker_account)
    }

    fn process_schedule(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        task_id: u16,
        crank_reward: u64,
    ) -> ProgramResult {
        // Retrieving an accounts
        let account_iter = &mut accounts.iter();
        let payer_account = next_account_info(account_iter)?;
        let escrow_account = next_account_info(account_iter)?;
        let task_queue_account = next_account_info(account_iter)?;
        let task_queue_authority_account = next_account_info(account_iter)?;
        let task_account = next_account_info(account_iter)?;
        let queue_authority_account = next_account_info(account_iter)?;
        let system_program = next_account_info(account_iter)?;
        let scheduler_program = next_account_info(account_iter)?;

        // Validating the accounts
        if !payer_account.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }
        let state = load_open_escrow(program_id, escrow_account)?;
        if *scheduler_program.key != crate::scheduler::id() {
            return Err(ProgramError::IncorrectProgramId);
        }
        if *system_program.key != solana_program::system_program::id() {
            return Err(ProgramError::IncorrectProgramId);
        }
        let (queue_authority, queue_authority_bump) = find_queue_authority_address(program_id);
        if queue_authority != *queue_authority_account.key {
            return Err(ProgramError::InvalidSeeds);
        }

        // The task replays a refund that needs no signature
        let ix = refund_task_instruction(program_id, escrow_account.key, &state);
        let (compiled, _) = compile_transaction(vec![ix], vec![])?;
        let args = QueueTaskArgsV0 {
            id: task_id,
            trigger: TriggerV0::Timestamp(state.expiry),
            transaction: TransactionSourceV0::CompiledV0(compiled),
            crank_reward: Some(crank_reward),
            free_tasks: 0,
            description: crate::scheduler::REFUND_TASK_DESCRIPTION.to_string(),
        };
        let bump = [queue_authority_bump];
        let signer_seeds: &[&[u8]] = &[QUEUE_AUTHORITY_SEED, &bump];
        queue_task_v0(
            CpiContext::new_with_signer(
                scheduler_program.clone(),
                QueueTaskV0 {
                    payer: payer_account.clone(),
                    queue_authority: queue_authority_account.clone(),
                    task_queue: task_queue_account.clone(),
                    task_queue_authority: task_queue_authority_account.clone(),
                    task: task_account.clone(),
                    system_program: system_program.clone(),
                },
                &[signer_seeds],
            ),
            args,
        )?;

        msg!(
            "Escrow {} refund queued as task {} at {}",
            escrow_account.key,
            task_id,
            state.expiry
        );

        Ok(())
    }

    /// Handle the instruction.
    pub fn process(program_id: &Pubkey, accounts: &[AccountInfo], input: &[u8]) -> ProgramResult {
        let instruction =
            Instruction::try_from_slice(input).map_err(|_| ProgramError::InvalidInstructionData)?;
        match instruction {
            Instruction::Make {
                seed,
                amount_offered,
                amount_requested,
                expiry,
            } => Self::process_make(
                program_id,
                accounts,
                seed,
                amount_offered,
                amount_requested,
                expiry,
            ),
            Instruction::Take => Self::process_take(program_id, accounts),
            Instruction::Refund => Self::process_refund(program_id, accounts),
            Instruction::Schedule {
                task_id,
                crank_reward,
            } => Self::process_schedule(program_id, accounts, task_id, crank_reward),
        }
    }
}

/// The unsigned refund instruction the scheduler replays at expiry.
pub fn refund_task_instruction(
    program_id: &Pubkey,
    escrow_pubkey: &Pubkey,
    state: &Escrow,
) -> solana_program::instruction::Instruction {
    let token_program_id = spl_token::id();
    let maker_token_account_a =
        spl_associated_token_account::get_associated_token_address_with_program_id(
            &state.maker,
            &state.mint_a,
            &token_program_id,
        );
    crate::instruction::refund(
        *program_id,
        state.maker,
        false,
        state.mint_a,
        maker_token_account_a,
        *escrow_pubkey,
        find_vault_address(escrow_pubkey, &state.mint_a, &token_program_id),
        token_program_id,
    )
}

fn check_programs(
    associated_token_program: &AccountInfo,
    token_program: &AccountInfo,
    system_program: &AccountInfo,
) -> ProgramResult {
    if *associated_token_program.key != spl_associated_token_account::id()
        || *token_program.key != spl_token::id()
        || *system_program.key != solana_program::system_program::id()
    {
        return Err(ProgramError::IncorrectProgramId);
    }
    Ok(())
}

fn unpack_token_account(
    token_account: &AccountInfo,
    token_program: &AccountInfo,
) -> Result<spl_token::state::Account, ProgramError> {
    if token_account.owner != token_program.key {
        return Err(ProgramError::IncorrectProgramId);
    }
    spl_token::state::Account::unpack(&token_account.try_borrow_data()?)
}

/// Reads the escrow record, failing with `AlreadyResolved` unless it is open.
fn load_open_escrow(program_id: &Pubkey, escrow_account: &AccountInfo) -> Result<Escrow, ProgramError> {
    // closed records are emptied and handed back to the system program
    if escrow_account.data_is_empty() {
        return Err(EscrowError::AlreadyResolved.into());
    }
    if escrow_account.owner != program_id {
        return Err(ProgramError::IncorrectProgramId);
    }
    let state = borsh::from_slice::<Escrow>(&escrow_account.try_borrow_data()?)
        .map_err(|_| ProgramError::InvalidAccountData)?;
    if !state.is_open() {
        return Err(EscrowError::AlreadyResolved.into());
    }

    let expected = Pubkey::create_program_address(
        &[
            ESCROW_SEED,
            state.maker.as_ref(),
            &state.seed_bytes(),
            &[state.bump],
        ],
        program_id,
    )?;
    if expected != *escrow_account.key {
        return Err(ProgramError::InvalidSeeds);
    }

    Ok(state)
}

fn store_escrow(escrow_account: &AccountInfo, state: &Escrow) -> ProgramResult {
    let mut data = escrow_account.try_borrow_mut_data()?;
    state
        .serialize(&mut &mut data[..])
        .map_err(|_| ProgramError::AccountDataTooSmall)
}

/// Moves the whole vault balance to `destination` and closes the vault, rent to the maker.
fn release_vault<'a>(
    state: &Escrow,
    escrow_account: &AccountInfo<'a>,
    vault_account: &AccountInfo<'a>,
    destination: &AccountInfo<'a>,
    maker_account: &AccountInfo<'a>,
    token_program: &AccountInfo<'a>,
) -> ProgramResult {
    let vault_state = unpack_token_account(vault_account, token_program)?;
    let seed_bytes = state.seed_bytes();
    let bump = [state.bump];
    let seeds: &[&[u8]] = &[ESCROW_SEED, state.maker.as_ref(), &seed_bytes, &bump];

    if vault_state.amount > 0 {
        let ix = spl_token::instruction::transfer(
            token_program.key,
            vault_account.key,
            destination.key,
            escrow_account.key,
            &[],
            vault_state.amount,
        )?;
        invoke_signed(
            &ix,
            &[
                vault_account.clone(),
                destination.clone(),
                escrow_account.clone(),
                token_program.clone(),
            ],
            &[seeds],
        )?;
    }

    let ix = spl_token::instruction::close_account(
        token_program.key,
        vault_account.key,
        maker_account.key,
        escrow_account.key,
        &[],
    )?;
    invoke_signed(
        &ix,
        &[
            vault_account.clone(),
            maker_account.clone(),
            escrow_account.clone(),
            token_program.clone(),
        ],
        &[seeds],
    )
}

/// Drains the escrow account into `destination` and wipes its data.
fn close_escrow_account(escrow_account: &AccountInfo, destination: &AccountInfo) -> ProgramResult {
    let mut destination_lamports = destination.try_borrow_mut_lamports()?;
    **destination_lamports = destination_lamports
        .checked_add(escrow_account.lamports())
        .ok_or(ProgramError::ArithmeticOverflow)?;
    **escrow_account.try_borrow_mut_lamports()? = 0;
    escrow_account.try_borrow_mut_data()?.fill(0);

    Ok(())
}
