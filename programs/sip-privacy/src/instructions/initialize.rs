use anchor_lang::prelude::*;
use anchor_lang::solana_program::bpf_loader_upgradeable;

use crate::error::SipError;
use crate::state::{validate_fee_bps, Config};

/// Accounts for the one-time config creation
#[derive(Accounts)]
pub struct Initialize<'info> {
    /// Fails to `init` when the config already exists
    #[account(
        init,
        payer = authority,
        space = Config::SIZE,
        seeds = [Config::SEED],
        bump,
    )]
    pub config: Account<'info, Config>,

    /// Must be the program's upgrade authority
    #[account(mut)]
    pub authority: Signer<'info>,

    /// CHECK: Only stored; fee transfers are checked against it later
    pub fee_collector: UncheckedAccount<'info>,

    /// Upgradeable-loader metadata of this program
    #[account(
        seeds = [crate::ID.as_ref()],
        bump,
        seeds::program = bpf_loader_upgradeable::ID,
        constraint = program_data.upgrade_authority_address == Some(authority.key())
            @ SipError::Unauthorized,
    )]
    pub program_data: Account<'info, ProgramData>,

    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<Initialize>, fee_bps: u16) -> Result<()> {
    validate_fee_bps(fee_bps)?;

    ctx.accounts.config.set_inner(Config {
        authority: ctx.accounts.authority.key(),
        fee_collector: ctx.accounts.fee_collector.key(),
        fee_bps,
        paused: false,
        total_transfers: 0,
        bump: ctx.bumps.config,
    });

    msg!(
        "SIP Privacy initialized. Authority: {}, Fee: {} bps",
        ctx.accounts.authority.key(),
        fee_bps
    );
    Ok(())
}
