use anchor_lang::prelude::*;

use crate::error::SipError;
use crate::{BPS_DENOMINATOR, CONFIG_SEED, MAX_FEE_BPS};

/// Program-wide settings, created once by `initialize`
#[account]
#[derive(Default)]
pub struct Config {
    /// Only key allowed to pause or change the fee
    pub authority: Pubkey,

    /// Receives every protocol fee
    pub fee_collector: Pubkey,

    pub fee_bps: u16,

    pub paused: bool,

    /// Also the index of the next transfer record
    pub total_transfers: u64,

    pub bump: u8,
}

impl Config {
    pub const SEED: &'static [u8] = CONFIG_SEED;

    /// discriminator (8) + authority (32) + fee_collector (32) + fee_bps (2)
    /// + paused (1) + total_transfers (8) + bump (1)
    pub const SIZE: usize = 8 + 32 + 32 + 2 + 1 + 8 + 1;

    pub fn require_active(&self) -> Result<()> {
        require!(!self.paused, SipError::ProgramPaused);
        Ok(())
    }

    pub fn fee_split(&self, amount: u64) -> Result<FeeSplit> {
        compute_fee(amount, self.fee_bps)
    }

    /// Index of the next transfer, bumping the counter
    pub fn next_transfer_index(&mut self) -> Result<u64> {
        let index = self.total_transfers;
        self.total_transfers = index.checked_add(1).ok_or(SipError::MathOverflow)?;
        Ok(index)
    }
}

/// How a transfer amount divides between recipient and fee collector
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeeSplit {
    pub fee: u64,
    pub recipient_amount: u64,
}

pub fn validate_fee_bps(fee_bps: u16) -> Result<()> {
    require!(fee_bps <= MAX_FEE_BPS, SipError::FeeTooHigh);
    Ok(())
}

/// `fee = floor(amount * bps / 10000)`; the recipient gets the remainder
pub fn compute_fee(amount: u64, fee_bps: u16) -> Result<FeeSplit> {
    validate_fee_bps(fee_bps)?;
    let fee = (amount as u128)
        .checked_mul(fee_bps as u128)
        .ok_or(SipError::MathOverflow)?
        / BPS_DENOMINATOR;
    let fee = u64::try_from(fee).map_err(|_| SipError::MathOverflow)?;
    let recipient_amount = amount.checked_sub(fee).ok_or(SipError::MathOverflow)?;
    Ok(FeeSplit {
        fee,
        recipient_amount,
    })
}
