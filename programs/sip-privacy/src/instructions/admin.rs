use anchor_lang::prelude::*;

use crate::error::SipError;
use crate::state::{validate_fee_bps, Config};

#[derive(Accounts)]
pub struct AdminAction<'info> {
    #[account(
        mut,
        seeds = [Config::SEED],
        bump = config.bump,
        constraint = config.authority == authority.key() @ SipError::Unauthorized,
    )]
    pub config: Account<'info, Config>,

    pub authority: Signer<'info>,
}

/// Pause or resume transfers and claims
pub fn set_paused(ctx: Context<AdminAction>, paused: bool) -> Result<()> {
    ctx.accounts.config.paused = paused;
    msg!("Program paused: {}", paused);
    Ok(())
}

/// Max 10%
pub fn update_fee(ctx: Context<AdminAction>, new_fee_bps: u16) -> Result<()> {
    validate_fee_bps(new_fee_bps)?;
    ctx.accounts.config.fee_bps = new_fee_bps;
    msg!("Fee updated: {} bps", new_fee_bps);
    Ok(())
}
