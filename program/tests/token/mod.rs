use solana_sdk::account::Account;
use solana_sdk::program_option::COption;
use solana_sdk::program_pack::Pack;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::rent::Rent;
use spl_token::state::AccountState;

/// An initialized mint without a freeze authority.
pub fn mint_account(mint_authority: Option<Pubkey>, supply: u64, decimals: u8) -> Account {
    let mint = spl_token::state::Mint {
        mint_authority: COption::from(mint_authority),
        supply,
        decimals,
        is_initialized: true,
        freeze_authority: COption::None,
    };
    let mut data = vec![0; spl_token::state::Mint::LEN];
    mint.pack_into_slice(&mut data);

    Account {
        lamports: Rent::default().minimum_balance(spl_token::state::Mint::LEN),
        data,
        owner: spl_token::id(),
        executable: false,
        rent_epoch: 0,
    }
}

/// An initialized token account holding `amount` of `mint` for `owner`.
pub fn token_account(mint: Pubkey, owner: Pubkey, amount: u64) -> Account {
    let token_account = spl_token::state::Account {
        mint,
        owner,
        amount,
        delegate: COption::None,
        state: AccountState::Initialized,
        is_native: COption::None,
        delegated_amount: 0,
        close_authority: COption::None,
    };
    let mut data = vec![0; spl_token::state::Account::LEN];
    token_account.pack_into_slice(&mut data);

    Account {
        lamports: Rent::default().minimum_balance(spl_token::state::Account::LEN),
        data,
        owner: spl_token::id(),
        executable: false,
        rent_epoch: 0,
    }
}

/// Address of the associated token account of `owner` for `mint`.
pub fn associated_address(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    spl_associated_token_account::get_associated_token_address_with_program_id(
        owner,
        mint,
        &spl_token::id(),
    )
}
