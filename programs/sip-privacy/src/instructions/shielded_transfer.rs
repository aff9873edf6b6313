use anchor_lang::prelude::*;
use anchor_lang::system_program;
use anchor_spl::token::{self, Mint, Token, TokenAccount};

use crate::commitment::is_valid_commitment;
use crate::error::SipError;
use crate::events::ShieldedTransferEvent;
use crate::state::{Config, FeeSplit, TransferRecord};
use crate::zk::{active_verifier, ProofStatement};
use crate::{
    COMMITMENT_SIZE, EPHEMERAL_PUBKEY_SIZE, MAX_ENCRYPTED_AMOUNT_SIZE, MAX_PROOF_SIZE,
    VIEWING_KEY_HASH_SIZE,
};

/// Arguments shared by native and token shielded transfers
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct ShieldedTransferArgs {
    pub amount_commitment: [u8; COMMITMENT_SIZE],
    pub stealth_recipient: Pubkey,
    pub ephemeral_pubkey: [u8; EPHEMERAL_PUBKEY_SIZE],
    pub viewing_key_hash: [u8; VIEWING_KEY_HASH_SIZE],
    pub encrypted_amount: Vec<u8>,
    pub view_tag: u8,
    pub proof: Vec<u8>,
    /// Cleartext amount moved by the runtime; never logged or stored
    pub actual_amount: u64,
}

/// Accounts for a native shielded transfer
#[derive(Accounts)]
#[instruction(args: ShieldedTransferArgs)]
pub struct ShieldedTransfer<'info> {
    #[account(
        mut,
        seeds = [Config::SEED],
        bump = config.bump,
    )]
    pub config: Account<'info, Config>,

    /// Keyed by the running transfer count, so every transfer gets a fresh record
    #[account(
        init,
        payer = sender,
        space = TransferRecord::SIZE,
        seeds = [
            TransferRecord::SEED,
            sender.key().as_ref(),
            &config.total_transfers.to_le_bytes(),
        ],
        bump,
    )]
    pub transfer_record: Account<'info, TransferRecord>,

    #[account(mut)]
    pub sender: Signer<'info>,

    /// The one-time address derived off-chain
    /// CHECK: Must equal `args.stealth_recipient`
    #[account(
        mut,
        constraint = stealth_account.key() == args.stealth_recipient @ SipError::InvalidStealthProof,
    )]
    pub stealth_account: UncheckedAccount<'info>,

    /// CHECK: Must be the configured fee collector
    #[account(
        mut,
        constraint = fee_collector.key() == config.fee_collector @ SipError::Unauthorized,
    )]
    pub fee_collector: UncheckedAccount<'info>,

    pub system_program: Program<'info, System>,
}

/// Accounts for a token shielded transfer
#[derive(Accounts)]
#[instruction(args: ShieldedTransferArgs)]
pub struct ShieldedTokenTransfer<'info> {
    #[account(
        mut,
        seeds = [Config::SEED],
        bump = config.bump,
    )]
    pub config: Account<'info, Config>,

    #[account(
        init,
        payer = sender,
        space = TransferRecord::SIZE,
        seeds = [
            TransferRecord::SEED,
            sender.key().as_ref(),
            &config.total_transfers.to_le_bytes(),
        ],
        bump,
    )]
    pub transfer_record: Account<'info, TransferRecord>,

    #[account(mut)]
    pub sender: Signer<'info>,

    pub token_mint: Account<'info, Mint>,

    #[account(
        mut,
        constraint = sender_token_account.mint == token_mint.key() @ SipError::InvalidTokenMint,
        constraint = sender_token_account.owner == sender.key() @ SipError::Unauthorized,
    )]
    pub sender_token_account: Account<'info, TokenAccount>,

    /// Owned by the stealth key, which later signs the claim
    #[account(
        mut,
        constraint = stealth_token_account.mint == token_mint.key() @ SipError::InvalidTokenMint,
        constraint = stealth_token_account.owner == args.stealth_recipient @ SipError::InvalidStealthProof,
    )]
    pub stealth_token_account: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = fee_token_account.mint == token_mint.key() @ SipError::InvalidTokenMint,
        constraint = fee_token_account.owner == config.fee_collector @ SipError::Unauthorized,
    )]
    pub fee_token_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

/// Input checks that need no accounts, in the order callers see them fail
pub fn validate_transfer_args(args: &ShieldedTransferArgs) -> Result<()> {
    require!(args.proof.len() <= MAX_PROOF_SIZE, SipError::ProofTooLarge);
    require!(
        args.encrypted_amount.len() <= MAX_ENCRYPTED_AMOUNT_SIZE,
        SipError::EncryptedAmountTooLarge
    );
    require!(
        is_valid_commitment(&args.amount_commitment),
        SipError::InvalidCommitment
    );
    require!(args.actual_amount > 0, SipError::InvalidAmount);

    active_verifier().verify(
        &ProofStatement::Transfer {
            amount_commitment: &args.amount_commitment,
            stealth_recipient: &args.stealth_recipient,
        },
        &args.proof,
    )
}

/// Pause, argument and fee checks; nothing is written
fn prepare(config: &Config, args: &ShieldedTransferArgs) -> Result<FeeSplit> {
    config.require_active()?;
    validate_transfer_args(args)?;
    config.fee_split(args.actual_amount)
}

/// Persist the record, bump the counter and emit the event
fn record_transfer(
    config: &mut Account<Config>,
    record: &mut Account<TransferRecord>,
    sender: Pubkey,
    args: ShieldedTransferArgs,
    token_mint: Option<Pubkey>,
    bump: u8,
) -> Result<()> {
    config.next_transfer_index()?;
    let timestamp = Clock::get()?.unix_timestamp;

    emit!(ShieldedTransferEvent {
        sender,
        stealth_recipient: args.stealth_recipient,
        amount_commitment: args.amount_commitment,
        ephemeral_pubkey: args.ephemeral_pubkey,
        viewing_key_hash: args.viewing_key_hash,
        view_tag: args.view_tag,
        token_mint,
        timestamp,
        transfer_id: record.key(),
    });

    record.set_inner(TransferRecord {
        sender,
        stealth_recipient: args.stealth_recipient,
        amount_commitment: args.amount_commitment,
        ephemeral_pubkey: args.ephemeral_pubkey,
        viewing_key_hash: args.viewing_key_hash,
        encrypted_amount: args.encrypted_amount,
        view_tag: args.view_tag,
        timestamp,
        claimed: false,
        token_mint,
        bump,
    });
    Ok(())
}

/// Move lamports to a stealth address behind a commitment
///
/// The stealth account receives `actual_amount - fee` and the fee collector
/// `fee = floor(actual_amount * fee_bps / 10000)`.
pub fn handler(ctx: Context<ShieldedTransfer>, args: ShieldedTransferArgs) -> Result<()> {
    let split = prepare(&ctx.accounts.config, &args)?;
    require!(
        ctx.accounts.sender.lamports() >= args.actual_amount,
        SipError::InsufficientFunds
    );

    system_program::transfer(
        CpiContext::new(
            ctx.accounts.system_program.to_account_info(),
            system_program::Transfer {
                from: ctx.accounts.sender.to_account_info(),
                to: ctx.accounts.stealth_account.to_account_info(),
            },
        ),
        split.recipient_amount,
    )?;

    if split.fee > 0 {
        system_program::transfer(
            CpiContext::new(
                ctx.accounts.system_program.to_account_info(),
                system_program::Transfer {
                    from: ctx.accounts.sender.to_account_info(),
                    to: ctx.accounts.fee_collector.to_account_info(),
                },
            ),
            split.fee,
        )?;
    }

    let sender = ctx.accounts.sender.key();
    let bump = ctx.bumps.transfer_record;
    record_transfer(
        &mut ctx.accounts.config,
        &mut ctx.accounts.transfer_record,
        sender,
        args,
        None,
        bump,
    )?;

    // Minimal log: no amounts or addresses
    msg!("Shielded transfer complete");
    Ok(())
}

/// Same as [`handler`] for SPL tokens of `token_mint`
pub fn token_handler(ctx: Context<ShieldedTokenTransfer>, args: ShieldedTransferArgs) -> Result<()> {
    let split = prepare(&ctx.accounts.config, &args)?;
    require!(
        ctx.accounts.sender_token_account.amount >= args.actual_amount,
        SipError::InsufficientFunds
    );

    token::transfer(
        CpiContext::new(
            ctx.accounts.token_program.to_account_info(),
            token::Transfer {
                from: ctx.accounts.sender_token_account.to_account_info(),
                to: ctx.accounts.stealth_token_account.to_account_info(),
                authority: ctx.accounts.sender.to_account_info(),
            },
        ),
        split.recipient_amount,
    )?;

    if split.fee > 0 {
        token::transfer(
            CpiContext::new(
                ctx.accounts.token_program.to_account_info(),
                token::Transfer {
                    from: ctx.accounts.sender_token_account.to_account_info(),
                    to: ctx.accounts.fee_token_account.to_account_info(),
                    authority: ctx.accounts.sender.to_account_info(),
                },
            ),
            split.fee,
        )?;
    }

    let sender = ctx.accounts.sender.key();
    let token_mint = ctx.accounts.token_mint.key();
    let bump = ctx.bumps.transfer_record;
    record_transfer(
        &mut ctx.accounts.config,
        &mut ctx.accounts.transfer_record,
        sender,
        args,
        Some(token_mint),
        bump,
    )?;

    msg!("Shielded token transfer complete");
    Ok(())
}
