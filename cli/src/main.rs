mod config;

use crate::config::Config;
use clap::{Parser, Subcommand};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signer;
use std::path::PathBuf;
use std::sync::Arc;
use timelock_escrow_client::{Client, RefundOutcome};
use timelock_escrow_program::pda::{find_escrow_address, find_queue_authority_address};
use timelock_escrow_program::scheduler::DEFAULT_CRANK_REWARD;

/// Cli is a struct that represents the command line arguments.
#[derive(Parser)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Escrow program ID.
    #[arg(long)]
    escrow_program_id: Option<Pubkey>,

    /// Token program ID.
    #[arg(long)]
    token_program_id: Option<Pubkey>,

    /// Subcommands for the CLI.
    #[command(subcommand)]
    command: Commands,
}

/// Commands is an enum that represents the subcommands for the CLI.
#[derive(Subcommand, PartialEq, Eq, Debug)]
enum Commands {
    #[clap(about = "Open an escrow and deposit the offered tokens")]
    #[clap(arg_required_else_help = true)]
    Make {
        #[clap(help = "Seed distinguishing this escrow among the maker's escrows")]
        seed: u64,
        #[clap(help = "Address of mint token to be sent")]
        send_mint: Pubkey,
        #[clap(help = "Amount of mint token to be sent")]
        send_amount: u64,
        #[clap(help = "Address of mint token to be received")]
        receive_mint: Pubkey,
        #[clap(help = "Amount of mint token to be received")]
        receive_amount: u64,
        #[clap(help = "Unix timestamp after which the escrow can be refunded")]
        expiry: i64,
        #[clap(long, help = "Task queue to schedule the refund on")]
        task_queue: Option<Pubkey>,
        #[clap(long, default_value_t = 0, help = "Task ID on the task queue")]
        task_id: u16,
        #[clap(long, default_value_t = DEFAULT_CRANK_REWARD, help = "Lamports paid to the crank")]
        crank_reward: u64,
    },
    #[clap(about = "Settle an open escrow before it expires")]
    #[clap(arg_required_else_help = true)]
    Take {
        #[clap(help = "Address of escrow account")]
        escrow_address: Pubkey,
    },
    #[clap(about = "Return the deposit to the maker")]
    #[clap(arg_required_else_help = true)]
    Refund {
        #[clap(help = "Address of escrow account")]
        escrow_address: Pubkey,
    },
    #[clap(about = "Schedule the refund of an escrow at its expiry")]
    #[clap(arg_required_else_help = true)]
    Schedule {
        #[clap(help = "Address of escrow account")]
        escrow_address: Pubkey,
        #[clap(help = "Task queue to schedule the refund on")]
        task_queue: Pubkey,
        #[clap(help = "Task ID on the task queue")]
        task_id: u16,
        #[clap(long, default_value_t = DEFAULT_CRANK_REWARD, help = "Lamports paid to the crank")]
        crank_reward: u64,
    },
    #[clap(about = "Get account details of escrow account")]
    #[clap(arg_required_else_help = true)]
    Account {
        #[clap(help = "Address of escrow account")]
        escrow_address: Pubkey,
    },
    #[clap(about = "Derive the escrow and queue authority addresses")]
    #[clap(arg_required_else_help = true)]
    Address {
        #[clap(help = "Seed of the escrow")]
        seed: u64,
        #[clap(long, help = "Maker of the escrow, the configured keypair by default")]
        maker: Option<Pubkey>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let config = Config::load_or_default(args.config)?;

    let keypair = config.load_keypair()?;
    let maker = keypair.pubkey();
    let rpc_client = Arc::new(RpcClient::new_with_commitment(
        config.json_rpc_url().to_string(),
        config.commitment()?,
    ));
    let mut builder = Client::builder(rpc_client.clone(), keypair);
    if let Some(token_program_id) = args.token_program_id {
        builder = builder.with_token_program_id(token_program_id);
    }
    if let Some(escrow_program_id) = args.escrow_program_id {
        builder = builder.with_escrow_program_id(escrow_program_id);
    }
    let escrow = builder.build();

    match args.command {
        Commands::Make {
            seed,
            send_mint,
            send_amount,
            receive_mint,
            receive_amount,
            expiry,
            task_queue,
            task_id,
            crank_reward,
        } => {
            let (signature, escrow_address) = escrow
                .make(
                    seed,
                    send_mint,
                    send_amount,
                    receive_mint,
                    receive_amount,
                    expiry,
                )
                .await?;

            println!("Create Account: {}\n", escrow_address);
            println!("Signature: {}", signature);

            // The escrow stays open without a scheduled refund; anyone can refund it after expiry.
            if let Some(task_queue) = task_queue {
                match escrow
                    .schedule(escrow_address, task_queue, task_id, crank_reward)
                    .await
                {
                    Ok(signature) => println!("Schedule Signature: {}", signature),
                    Err(err) => eprintln!("warning: refund not scheduled: {}", err),
                }
            }
        }
        Commands::Take { escrow_address } => {
            let signature = escrow.take(escrow_address).await?;
            println!("Signature: {}", signature);
        }
        Commands::Refund { escrow_address } => match escrow.refund(escrow_address).await? {
            RefundOutcome::Refunded(signature) => println!("Signature: {}", signature),
            RefundOutcome::AlreadyResolved => println!("Escrow already resolved"),
        },
        Commands::Schedule {
            escrow_address,
            task_queue,
            task_id,
            crank_reward,
        } => {
            let signature = escrow
                .schedule(escrow_address, task_queue, task_id, crank_reward)
                .await?;
            println!("Signature: {}", signature);
        }
        Commands::Account { escrow_address } => {
            let account = escrow.account(escrow_address).await?;
            println!("Status: {:?}", account.status);
            println!("Seed: {}", account.seed);
            println!("Maker: {}", config.display_address(&account.maker.to_string()));
            println!("Offered Mint: {}", config.display_address(&account.mint_a.to_string()));
            println!("Offered Amount: {}", account.amount_offered);
            println!("Requested Mint: {}", config.display_address(&account.mint_b.to_string()));
            println!("Requested Amount: {}", account.amount_requested);
            println!("Expiry: {}", account.expiry);
        }
        Commands::Address { seed, maker: other } => {
            let escrow_program_id = args
                .escrow_program_id
                .unwrap_or_else(timelock_escrow_program::id);
            let maker = other.unwrap_or(maker);
            let (escrow_address, _) = find_escrow_address(&escrow_program_id, &maker, seed);
            let (queue_authority, _) = find_queue_authority_address(&escrow_program_id);

            println!("Escrow: {}", escrow_address);
            println!("Queue Authority: {}", queue_authority);
        }
    }

    Ok(())
}
