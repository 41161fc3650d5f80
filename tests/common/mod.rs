#![allow(dead_code)]

use conditional_vault_program::{
    error::ConditionalVaultError,
    instruction::{self as vault_ix, VaultAddresses},
    processor::process_instruction,
    state::{MarketEntry, VaultLedger},
    utils::deserialize_account,
};
use solana_program_test::{processor, BanksClientError, ProgramTest, ProgramTestContext};
use solana_sdk::{
    instruction::{Instruction, InstructionError},
    native_token::LAMPORTS_PER_SOL,
    program_pack::Pack,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    system_instruction,
    transaction::{Transaction, TransactionError},
};
use spl_associated_token_account::get_associated_token_address;

pub const DECIMALS: u8 = 6;
pub const EXPIRATION: i64 = 1_900_000_000;

pub fn program_test() -> ProgramTest {
    ProgramTest::new(
        "conditional_vault_program",
        conditional_vault_program::id(),
        processor!(process_instruction),
    )
}

/// Sign with the context payer plus `signers` and submit on a fresh blockhash
pub async fn process(
    context: &mut ProgramTestContext,
    instructions: &[Instruction],
    signers: &[&Keypair],
) -> Result<(), BanksClientError> {
    let blockhash = context.get_new_latest_blockhash().await.unwrap();
    let mut all_signers: Vec<&Keypair> = vec![&context.payer];
    all_signers.extend_from_slice(signers);
    let tx = Transaction::new_signed_with_payer(
        instructions,
        Some(&context.payer.pubkey()),
        &all_signers,
        blockhash,
    );
    context.banks_client.process_transaction(tx).await
}

pub fn assert_vault_error(result: Result<(), BanksClientError>, expected: ConditionalVaultError) {
    match result.unwrap_err().unwrap() {
        TransactionError::InstructionError(_, InstructionError::Custom(code)) => {
            assert_eq!(ConditionalVaultError::from_code(code), Some(expected));
        }
        other => panic!("expected {:?}, got {:?}", expected, other),
    }
}

pub async fn create_mint(context: &mut ProgramTestContext, authority: &Pubkey) -> Pubkey {
    let mint = Keypair::new();
    let rent = context.banks_client.get_rent().await.unwrap();
    let payer = context.payer.pubkey();
    process(
        context,
        &[
            system_instruction::create_account(
                &payer,
                &mint.pubkey(),
                rent.minimum_balance(spl_token::state::Mint::LEN),
                spl_token::state::Mint::LEN as u64,
                &spl_token::id(),
            ),
            spl_token::instruction::initialize_mint(
                &spl_token::id(),
                &mint.pubkey(),
                authority,
                None,
                DECIMALS,
            )
            .unwrap(),
        ],
        &[&mint],
    )
    .await
    .unwrap();
    mint.pubkey()
}

/// Send lamports from the payer to any address
pub async fn fund(context: &mut ProgramTestContext, address: &Pubkey, lamports: u64) {
    let payer = context.payer.pubkey();
    process(context, &[system_instruction::transfer(&payer, address, lamports)], &[])
        .await
        .unwrap();
}

pub async fn register_market(context: &mut ProgramTestContext, index: u16) -> Result<(), BanksClientError> {
    let owner = context.payer.pubkey();
    let ix = vault_ix::register_market(
        &conditional_vault_program::id(),
        &owner,
        index,
        format!("Test Market {}", index),
        format!("Test Description {}", index),
        EXPIRATION,
    )
    .unwrap();
    process(context, &[ix], &[]).await
}

pub async fn fetch_market_entry(context: &mut ProgramTestContext, index: u16) -> MarketEntry {
    let (market, _) =
        conditional_vault_program::pda::find_market_address(index, &conditional_vault_program::id());
    let account = context.banks_client.get_account(market).await.unwrap().unwrap();
    deserialize_account::<MarketEntry>(&account.data).unwrap()
}

/// A registered market with an initialized vault over a fresh collateral mint.
/// The context payer is the market owner.
pub struct VaultFixture {
    pub context: ProgramTestContext,
    pub index: u16,
    pub collateral_mint: Pubkey,
    pub mint_authority: Keypair,
    pub addresses: VaultAddresses,
}

impl VaultFixture {
    pub async fn new(index: u16) -> Self {
        let mut context = program_test().start_with_context().await;
        let mint_authority = Keypair::new();
        let collateral_mint = create_mint(&mut context, &mint_authority.pubkey()).await;

        register_market(&mut context, index).await.unwrap();
        let owner = context.payer.pubkey();
        let ix = vault_ix::initialize_vault(
            &conditional_vault_program::id(),
            &owner,
            index,
            &collateral_mint,
        )
        .unwrap();
        process(&mut context, &[ix], &[]).await.unwrap();

        Self {
            context,
            index,
            collateral_mint,
            mint_authority,
            addresses: VaultAddresses::derive(index, &collateral_mint, &conditional_vault_program::id()),
        }
    }

    pub fn owner(&self) -> Pubkey {
        self.context.payer.pubkey()
    }

    /// Fund a new wallet with lamports and `collateral` base units
    pub async fn create_bettor(&mut self, collateral: u64) -> Keypair {
        let bettor = Keypair::new();
        let payer = self.context.payer.pubkey();
        let collateral_account = self.collateral_account(&bettor.pubkey());
        process(
            &mut self.context,
            &[
                system_instruction::transfer(&payer, &bettor.pubkey(), LAMPORTS_PER_SOL),
                spl_associated_token_account::instruction::create_associated_token_account(
                    &payer,
                    &bettor.pubkey(),
                    &self.collateral_mint,
                    &spl_token::id(),
                ),
                spl_token::instruction::mint_to(
                    &spl_token::id(),
                    &self.collateral_mint,
                    &collateral_account,
                    &self.mint_authority.pubkey(),
                    &[],
                    collateral,
                )
                .unwrap(),
            ],
            &[&self.mint_authority],
        )
        .await
        .unwrap();
        bettor
    }

    pub fn collateral_account(&self, wallet: &Pubkey) -> Pubkey {
        get_associated_token_address(wallet, &self.collateral_mint)
    }

    pub fn claim_a_account(&self, wallet: &Pubkey) -> Pubkey {
        get_associated_token_address(wallet, &self.addresses.claim_a_mint)
    }

    pub fn claim_b_account(&self, wallet: &Pubkey) -> Pubkey {
        get_associated_token_address(wallet, &self.addresses.claim_b_mint)
    }

    pub fn issue_ix(&self, bettor: &Pubkey, amount: u64) -> Instruction {
        vault_ix::issue(
            &conditional_vault_program::id(),
            bettor,
            self.index,
            &self.collateral_mint,
            &self.collateral_account(bettor),
            amount,
        )
        .unwrap()
    }

    pub async fn issue(&mut self, bettor: &Keypair, amount: u64) -> Result<(), BanksClientError> {
        let ix = self.issue_ix(&bettor.pubkey(), amount);
        process(&mut self.context, &[ix], &[bettor]).await
    }

    pub fn redeem_both_ix(&self, holder: &Pubkey, amount: u64) -> Instruction {
        vault_ix::redeem_both(
            &conditional_vault_program::id(),
            holder,
            self.index,
            &self.collateral_mint,
            &self.collateral_account(holder),
            amount,
        )
        .unwrap()
    }

    pub async fn redeem_both(&mut self, holder: &Keypair, amount: u64) -> Result<(), BanksClientError> {
        let ix = self.redeem_both_ix(&holder.pubkey(), amount);
        process(&mut self.context, &[ix], &[holder]).await
    }

    pub fn redeem_winner_ix(&self, holder: &Pubkey, claim_mint: &Pubkey, amount: u64) -> Instruction {
        vault_ix::redeem_winner(
            &conditional_vault_program::id(),
            holder,
            self.index,
            &self.collateral_mint,
            &self.collateral_account(holder),
            claim_mint,
            amount,
        )
        .unwrap()
    }

    pub async fn redeem_winner(
        &mut self,
        holder: &Keypair,
        claim_mint: &Pubkey,
        amount: u64,
    ) -> Result<(), BanksClientError> {
        let ix = self.redeem_winner_ix(&holder.pubkey(), claim_mint, amount);
        process(&mut self.context, &[ix], &[holder]).await
    }

    /// Record a verdict signed by the market owner
    pub async fn record_resolution(&mut self, winning_mint: &Pubkey) -> Result<(), BanksClientError> {
        let ix = vault_ix::record_resolution(
            &conditional_vault_program::id(),
            &self.owner(),
            self.index,
            &self.collateral_mint,
            winning_mint,
        )
        .unwrap();
        process(&mut self.context, &[ix], &[]).await
    }

    /// Token balance of `account`, zero if it does not exist
    pub async fn token_balance(&mut self, account: &Pubkey) -> u64 {
        match self.context.banks_client.get_account(*account).await.unwrap() {
            Some(account) => spl_token::state::Account::unpack(&account.data).unwrap().amount,
            None => 0,
        }
    }

    pub async fn account_exists(&mut self, account: &Pubkey) -> bool {
        self.context.banks_client.get_account(*account).await.unwrap().is_some()
    }

    pub async fn mint(&mut self, mint: &Pubkey) -> spl_token::state::Mint {
        let account = self.context.banks_client.get_account(*mint).await.unwrap().unwrap();
        spl_token::state::Mint::unpack(&account.data).unwrap()
    }

    pub async fn ledger(&mut self) -> VaultLedger {
        let account = self
            .context
            .banks_client
            .get_account(self.addresses.vault_ledger)
            .await
            .unwrap()
            .unwrap();
        deserialize_account::<VaultLedger>(&account.data).unwrap()
    }

    pub async fn market_entry(&mut self) -> MarketEntry {
        fetch_market_entry(&mut self.context, self.index).await
    }

    /// Vault balance, ledger balance and both claim supplies
    pub async fn totals(&mut self) -> (u64, u64, u64, u64) {
        let vault = self.addresses.vault;
        let (claim_a_mint, claim_b_mint) = (self.addresses.claim_a_mint, self.addresses.claim_b_mint);
        (
            self.token_balance(&vault).await,
            self.ledger().await.collateral_balance,
            self.mint(&claim_a_mint).await.supply,
            self.mint(&claim_b_mint).await.supply,
        )
    }
}
