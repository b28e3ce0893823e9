use solana_client::nonblocking::rpc_client::RpcClient;
use solana_rpc_client_api::config::RpcSendTransactionConfig;
use solana_sdk::instruction::{Instruction, InstructionError};
use solana_sdk::program_error::ProgramError;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::{Transaction, TransactionError};
use spl_associated_token_account::get_associated_token_address_with_program_id;
use std::sync::Arc;
use timelock_escrow_program::pda::{find_escrow_address, find_queue_authority_address, find_vault_address};
use timelock_escrow_program::scheduler;
use timelock_escrow_program::state::Escrow;
use timelock_escrow_program::EscrowError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("{0}")]
    RpcError(#[from] solana_rpc_client_api::client_error::Error),
    #[error("{0}")]
    ProgramError(#[from] ProgramError),
    #[error("{0}")]
    IoError(#[from] std::io::Error),
    #[error("{0}")]
    Escrow(#[from] EscrowError),
}

impl ClientError {
    /// The escrow program error behind this failure, if any.
    pub fn escrow_error(&self) -> Option<EscrowError> {
        let code = match self {
            ClientError::Escrow(err) => return Some(*err),
            ClientError::ProgramError(ProgramError::Custom(code)) => *code,
            ClientError::RpcError(err) => match err.get_transaction_error()? {
                TransactionError::InstructionError(_, InstructionError::Custom(code)) => code,
                _ => return None,
            },
            _ => return None,
        };
        EscrowError::try_from(code).ok()
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Outcome of a refund request.
///
/// A refund racing a settlement, or a scheduled refund firing after the
/// escrow was resolved, ends in `AlreadyResolved`. It is not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefundOutcome {
    Refunded(Signature),
    AlreadyResolved,
}

/// Client for interacting with the escrow program.
pub struct Client {
    /// RPC client.
    client: Arc<RpcClient>,

    /// Keypair of the payer, acting as maker or taker.
    payer: Keypair,

    /// Escrow program ID.
    escrow_program_id: Pubkey,

    /// Token program ID.
    token_program_id: Pubkey,

    /// Send configuration, preflight with the client's commitment when unset.
    send_config: Option<RpcSendTransactionConfig>,
}

impl Client {
    pub fn builder(client: Arc<RpcClient>, payer: Keypair) -> ClientBuilder {
        ClientBuilder::new(client, payer)
    }

    /// Address of the payer's escrow opened with `seed`.
    pub fn escrow_address(&self, seed: u64) -> Pubkey {
        find_escrow_address(&self.escrow_program_id, &self.payer.pubkey(), seed).0
    }

    /// Open an escrow offering `amount_offered` of `mint_a` for `amount_requested` of `mint_b`.
    pub async fn make(
        &self,
        seed: u64,
        mint_a: Pubkey,
        amount_offered: u64,
        mint_b: Pubkey,
        amount_requested: u64,
        expiry: i64,
    ) -> Result<(Signature, Pubkey)> {
        let maker = self.payer.pubkey();
        let maker_token_account_a =
            get_associated_token_address_with_program_id(&maker, &mint_a, &self.token_program_id);
        let escrow_pubkey = self.escrow_address(seed);
        let vault_pubkey = find_vault_address(&escrow_pubkey, &mint_a, &self.token_program_id);

        let ix = timelock_escrow_program::instruction::make(
            self.escrow_program_id,
            maker,
            mint_a,
            mint_b,
            maker_token_account_a,
            escrow_pubkey,
            vault_pubkey,
            self.token_program_id,
            seed,
            amount_offered,
            amount_requested,
            expiry,
        );
        let signature = self.send(&[ix]).await?;

        Ok((signature, escrow_pubkey))
    }

    /// Settle the escrow, paying the requested tokens and receiving the vault.
    pub async fn take(&self, escrow_pubkey: Pubkey) -> Result<Signature> {
        let state = self
            .open_escrow(escrow_pubkey)
            .await?
            .ok_or(EscrowError::AlreadyResolved)?;
        let taker = self.payer.pubkey();

        let ix = timelock_escrow_program::instruction::take(
            self.escrow_program_id,
            taker,
            state.maker,
            state.mint_a,
            state.mint_b,
            get_associated_token_address_with_program_id(
                &taker,
                &state.mint_a,
                &self.token_program_id,
            ),
            get_associated_token_address_with_program_id(
                &taker,
                &state.mint_b,
                &self.token_program_id,
            ),
            get_associated_token_address_with_program_id(
                &state.maker,
                &state.mint_b,
                &self.token_program_id,
            ),
            escrow_pubkey,
            find_vault_address(&escrow_pubkey, &state.mint_a, &self.token_program_id),
            self.token_program_id,
        );

        self.send(&[ix]).await
    }

    /// Return the deposit to the maker.
    ///
    /// Signs as maker when the payer is the maker; otherwise the refund only
    /// succeeds once the escrow has expired.
    pub async fn refund(&self, escrow_pubkey: Pubkey) -> Result<RefundOutcome> {
        let Some(state) = self.open_escrow(escrow_pubkey).await? else {
            return Ok(RefundOutcome::AlreadyResolved);
        };

        let ix = timelock_escrow_program::instruction::refund(
            self.escrow_program_id,
            state.maker,
            state.maker == self.payer.pubkey(),
            state.mint_a,
            get_associated_token_address_with_program_id(
                &state.maker,
                &state.mint_a,
                &self.token_program_id,
            ),
            escrow_pubkey,
            find_vault_address(&escrow_pubkey, &state.mint_a, &self.token_program_id),
            self.token_program_id,
        );

        match self.send(&[ix]).await {
            Ok(signature) => Ok(RefundOutcome::Refunded(signature)),
            Err(err) if err.escrow_error() == Some(EscrowError::AlreadyResolved) => {
                Ok(RefundOutcome::AlreadyResolved)
            }
            Err(err) => Err(err),
        }
    }

    /// Queue a refund of the escrow on `task_queue`, due at the escrow's expiry.
    pub async fn schedule(
        &self,
        escrow_pubkey: Pubkey,
        task_queue_pubkey: Pubkey,
        task_id: u16,
        crank_reward: u64,
    ) -> Result<Signature> {
        let (queue_authority, _) = find_queue_authority_address(&self.escrow_program_id);

        let ix = timelock_escrow_program::instruction::schedule(
            self.escrow_program_id,
            self.payer.pubkey(),
            escrow_pubkey,
            task_queue_pubkey,
            scheduler::task_queue_authority_address(&task_queue_pubkey, &queue_authority),
            scheduler::task_address(&task_queue_pubkey, task_id),
            queue_authority,
            scheduler::id(),
            task_id,
            crank_reward,
        );

        self.send(&[ix]).await
    }

    /// Get the escrow account state.
    pub async fn account(&self, escrow_pubkey: Pubkey) -> Result<Escrow> {
        let account = self.client.get_account(&escrow_pubkey).await?;
        let state = borsh::from_slice::<Escrow>(&account.data)?;

        Ok(state)
    }

    /// The escrow state, or `None` once the record has been closed.
    async fn open_escrow(&self, escrow_pubkey: Pubkey) -> Result<Option<Escrow>> {
        let account = self
            .client
            .get_account_with_commitment(&escrow_pubkey, self.client.commitment())
            .await?
            .value;
        let Some(account) = account.filter(|account| !account.data.is_empty()) else {
            return Ok(None);
        };
        let state = borsh::from_slice::<Escrow>(&account.data)?;

        Ok(state.is_open().then_some(state))
    }

    async fn send(&self, instructions: &[Instruction]) -> Result<Signature> {
        let blockhash = self.client.get_latest_blockhash().await?;
        let tx = Transaction::new_signed_with_payer(
            instructions,
            Some(&self.payer.pubkey()),
            &[&self.payer],
            blockhash,
        );

        let signature = match &self.send_config {
            Some(config) => {
                self.client
                    .send_and_confirm_transaction_with_spinner_and_config(
                        &tx,
                        self.client.commitment(),
                        config.clone(),
                    )
                    .await?
            }
            None => self.client.send_and_confirm_transaction(&tx).await?,
        };

        Ok(signature)
    }
}

/// Builder for the client for interacting with the escrow program.
pub struct ClientBuilder {
    /// RPC client.
    client: Arc<RpcClient>,

    /// Keypair of the payer.
    payer: Keypair,

    /// Escrow program ID.
    /// Default is the escrow program ID.
    escrow_program_id: Option<Pubkey>,

    /// Token program ID.
    /// Default is the token program ID.
    token_program_id: Option<Pubkey>,

    /// Send configuration.
    send_config: Option<RpcSendTransactionConfig>,
}

impl ClientBuilder {
    fn new(client: Arc<RpcClient>, payer: Keypair) -> Self {
        Self {
            client,
            payer,
            escrow_program_id: None,
            token_program_id: None,
            send_config: None,
        }
    }

    pub fn with_escrow_program_id(mut self, escrow_program_id: Pubkey) -> Self {
        self.escrow_program_id = Some(escrow_program_id);
        self
    }

    pub fn with_token_program_id(mut self, token_program_id: Pubkey) -> Self {
        self.token_program_id = Some(token_program_id);
        self
    }

    pub fn with_rpc_send_transaction_config(mut self, config: RpcSendTransactionConfig) -> Self {
        self.send_config = Some(config);
        self
    }

    /// Build the client for interacting with the escrow program.
    pub fn build(self) -> Client {
        Client {
            client: self.client,
            payer: self.payer,
            escrow_program_id: self
                .escrow_program_id
                .unwrap_or_else(timelock_escrow_program::id),
            token_program_id: self.token_program_id.unwrap_or_else(spl_token::id),
            send_config: self.send_config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escrow_error_from_failed_transaction() {
        let err = ClientError::from(solana_rpc_client_api::client_error::Error::from(
            TransactionError::InstructionError(0, InstructionError::Custom(5)),
        ));
        assert_eq!(err.escrow_error(), Some(EscrowError::AlreadyResolved));

        let err = ClientError::from(solana_rpc_client_api::client_error::Error::from(
            TransactionError::InstructionError(0, InstructionError::Custom(4)),
        ));
        assert_eq!(err.escrow_error(), Some(EscrowError::NotMakerAndNotExpired));
    }

    #[test]
    fn test_escrow_error_ignores_other_failures() {
        let err = ClientError::from(solana_rpc_client_api::client_error::Error::from(
            TransactionError::InstructionError(0, InstructionError::MissingRequiredSignature),
        ));
        assert_eq!(err.escrow_error(), None);

        let err = ClientError::from(ProgramError::Custom(99));
        assert_eq!(err.escrow_error(), None);

        let err = ClientError::from(ProgramError::from(EscrowError::Expired));
        assert_eq!(err.escrow_error(), Some(EscrowError::Expired));
    }

    #[test]
    fn test_escrow_address_uses_payer_as_maker() {
        let payer = Keypair::new();
        let maker = payer.pubkey();
        let client = Client::builder(
            Arc::new(RpcClient::new("http://127.0.0.1:8899".to_string())),
            payer,
        )
        .build();

        assert_eq!(
            client.escrow_address(7),
            find_escrow_address(&timelock_escrow_program::id(), &maker, 7).0
        );
    }
}
