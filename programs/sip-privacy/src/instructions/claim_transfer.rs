use anchor_lang::prelude::*;
use anchor_lang::system_program;
use anchor_spl::token::{self, Mint, Token, TokenAccount};

use crate::error::SipError;
use crate::events::ClaimEvent;
use crate::state::{Config, NullifierRecord, TransferRecord};
use crate::zk::{active_verifier, ProofStatement};
use crate::MAX_PROOF_SIZE;

/// Accounts for claiming a native transfer
#[derive(Accounts)]
#[instruction(nullifier: [u8; 32])]
pub struct ClaimTransfer<'info> {
    #[account(seeds = [Config::SEED], bump = config.bump)]
    pub config: Account<'info, Config>,

    #[account(
        mut,
        constraint = !transfer_record.claimed @ SipError::AlreadyClaimed,
        constraint = transfer_record.token_mint.is_none() @ SipError::InvalidTokenMint,
    )]
    pub transfer_record: Account<'info, TransferRecord>,

    /// CHECK: Address is pinned by the seeds; created by the handler
    #[account(mut, seeds = [NullifierRecord::SEED, nullifier.as_ref()], bump)]
    pub nullifier_record: UncheckedAccount<'info>,

    /// Signing with the stealth key is the ownership proof
    #[account(
        mut,
        constraint = stealth_account.key() == transfer_record.stealth_recipient @ SipError::InvalidStealthProof,
    )]
    pub stealth_account: Signer<'info>,

    /// Receives the funds and pays for the nullifier record
    #[account(mut)]
    pub recipient: Signer<'info>,

    pub system_program: Program<'info, System>,
}

/// Accounts for claiming a token transfer
#[derive(Accounts)]
#[instruction(nullifier: [u8; 32])]
pub struct ClaimTokenTransfer<'info> {
    #[account(seeds = [Config::SEED], bump = config.bump)]
    pub config: Account<'info, Config>,

    #[account(
        mut,
        constraint = !transfer_record.claimed @ SipError::AlreadyClaimed,
        constraint = transfer_record.token_mint == Some(token_mint.key()) @ SipError::InvalidTokenMint,
    )]
    pub transfer_record: Account<'info, TransferRecord>,

    /// CHECK: Address is pinned by the seeds; created by the handler
    #[account(mut, seeds = [NullifierRecord::SEED, nullifier.as_ref()], bump)]
    pub nullifier_record: UncheckedAccount<'info>,

    #[account(
        constraint = stealth_account.key() == transfer_record.stealth_recipient @ SipError::InvalidStealthProof,
    )]
    pub stealth_account: Signer<'info>,

    pub token_mint: Account<'info, Mint>,

    #[account(
        mut,
        constraint = stealth_token_account.mint == token_mint.key() @ SipError::InvalidTokenMint,
        constraint = stealth_token_account.owner == stealth_account.key() @ SipError::InvalidStealthProof,
    )]
    pub stealth_token_account: Account<'info, TokenAccount>,

    #[account(
        mut,
        constraint = recipient_token_account.mint == token_mint.key() @ SipError::InvalidTokenMint,
        constraint = recipient_token_account.owner == recipient.key() @ SipError::Unauthorized,
    )]
    pub recipient_token_account: Account<'info, TokenAccount>,

    #[account(mut)]
    pub recipient: Signer<'info>,

    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
}

/// Pause, size and verifier checks shared by both claim paths
pub fn validate_claim(
    config: &Config,
    transfer_id: &Pubkey,
    nullifier: &[u8; 32],
    proof: &[u8],
) -> Result<()> {
    config.require_active()?;
    require!(proof.len() <= MAX_PROOF_SIZE, SipError::ProofTooLarge);
    active_verifier().verify(
        &ProofStatement::Claim {
            transfer_id,
            nullifier,
        },
        proof,
    )
}

/// Check-then-create the nullifier record
///
/// Any existing data at the address means the nullifier is spent. The
/// runtime locks the account for the whole transaction, so two claims for
/// the same nullifier in one batch still resolve to exactly one success.
fn spend_nullifier<'info>(
    nullifier_account: &UncheckedAccount<'info>,
    payer: &Signer<'info>,
    system: &Program<'info, System>,
    record: NullifierRecord,
) -> Result<()> {
    require!(nullifier_account.data_is_empty(), SipError::AlreadyClaimed);

    let space = NullifierRecord::SIZE;
    let required = Rent::get()?.minimum_balance(space);
    let bump = [record.bump];
    let seeds: &[&[u8]] = &[NullifierRecord::SEED, &record.nullifier, &bump];
    let signer = &[seeds];

    let current = nullifier_account.lamports();
    if current == 0 {
        system_program::create_account(
            CpiContext::new_with_signer(
                system.to_account_info(),
                system_program::CreateAccount {
                    from: payer.to_account_info(),
                    to: nullifier_account.to_account_info(),
                },
                signer,
            ),
            required,
            space as u64,
            &crate::ID,
        )?;
    } else {
        // Someone pre-funded the address; top up and take it over
        let top_up = required.saturating_sub(current);
        if top_up > 0 {
            system_program::transfer(
                CpiContext::new(
                    system.to_account_info(),
                    system_program::Transfer {
                        from: payer.to_account_info(),
                        to: nullifier_account.to_account_info(),
                    },
                ),
                top_up,
            )?;
        }
        system_program::allocate(
            CpiContext::new_with_signer(
                system.to_account_info(),
                system_program::Allocate {
                    account_to_allocate: nullifier_account.to_account_info(),
                },
                signer,
            ),
            space as u64,
        )?;
        system_program::assign(
            CpiContext::new_with_signer(
                system.to_account_info(),
                system_program::Assign {
                    account_to_assign: nullifier_account.to_account_info(),
                },
                signer,
            ),
            &crate::ID,
        )?;
    }

    let mut data = nullifier_account.try_borrow_mut_data()?;
    let mut writer: &mut [u8] = &mut data[..];
    record.try_serialize(&mut writer)
}

/// Mark the record claimed, spend the nullifier and emit the claim event
fn settle_claim<'info>(
    transfer_record: &mut Account<'info, TransferRecord>,
    nullifier_account: &UncheckedAccount<'info>,
    recipient: &Signer<'info>,
    system: &Program<'info, System>,
    nullifier: [u8; 32],
    bump: u8,
) -> Result<()> {
    let claimed_at = Clock::get()?.unix_timestamp;
    let transfer_id = transfer_record.key();

    spend_nullifier(
        nullifier_account,
        recipient,
        system,
        NullifierRecord {
            nullifier,
            transfer_record: transfer_id,
            claimed_at,
            bump,
        },
    )?;
    transfer_record.claimed = true;

    emit!(ClaimEvent {
        transfer_id,
        nullifier,
        recipient: recipient.key(),
        timestamp: claimed_at,
    });
    Ok(())
}

/// Release everything held by the stealth address to `recipient`
pub fn handler(ctx: Context<ClaimTransfer>, nullifier: [u8; 32], proof: Vec<u8>) -> Result<()> {
    let transfer_id = ctx.accounts.transfer_record.key();
    validate_claim(&ctx.accounts.config, &transfer_id, &nullifier, &proof)?;

    let bump = ctx.bumps.nullifier_record;
    settle_claim(
        &mut ctx.accounts.transfer_record,
        &ctx.accounts.nullifier_record,
        &ctx.accounts.recipient,
        &ctx.accounts.system_program,
        nullifier,
        bump,
    )?;

    let balance = ctx.accounts.stealth_account.lamports();
    if balance > 0 {
        system_program::transfer(
            CpiContext::new(
                ctx.accounts.system_program.to_account_info(),
                system_program::Transfer {
                    from: ctx.accounts.stealth_account.to_account_info(),
                    to: ctx.accounts.recipient.to_account_info(),
                },
            ),
            balance,
        )?;
    }

    msg!("Transfer claimed");
    Ok(())
}

/// Same as [`handler`] for the stealth token account's full balance
pub fn token_handler(
    ctx: Context<ClaimTokenTransfer>,
    nullifier: [u8; 32],
    proof: Vec<u8>,
) -> Result<()> {
    let transfer_id = ctx.accounts.transfer_record.key();
    validate_claim(&ctx.accounts.config, &transfer_id, &nullifier, &proof)?;

    let bump = ctx.bumps.nullifier_record;
    settle_claim(
        &mut ctx.accounts.transfer_record,
        &ctx.accounts.nullifier_record,
        &ctx.accounts.recipient,
        &ctx.accounts.system_program,
        nullifier,
        bump,
    )?;

    let amount = ctx.accounts.stealth_token_account.amount;
    if amount > 0 {
        token::transfer(
            CpiContext::new(
                ctx.accounts.token_program.to_account_info(),
                token::Transfer {
                    from: ctx.accounts.stealth_token_account.to_account_info(),
                    to: ctx.accounts.recipient_token_account.to_account_info(),
                    authority: ctx.accounts.stealth_account.to_account_info(),
                },
            ),
            amount,
        )?;
    }

    msg!("Token transfer claimed");
    Ok(())
}
