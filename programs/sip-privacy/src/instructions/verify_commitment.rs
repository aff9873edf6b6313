use anchor_lang::prelude::*;

use crate::commitment::{is_valid_commitment, verify_opening};
use crate::error::SipError;
use crate::events::CommitmentVerifiedEvent;
use crate::COMMITMENT_SIZE;

#[derive(Accounts)]
pub struct VerifyCommitment<'info> {
    /// Anyone can verify; no state changes
    pub payer: Signer<'info>,
}

pub fn handler(
    _ctx: Context<VerifyCommitment>,
    commitment: [u8; COMMITMENT_SIZE],
    value: u64,
    blinding: [u8; 32],
) -> Result<()> {
    require!(is_valid_commitment(&commitment), SipError::InvalidCommitment);
    require!(
        verify_opening(&commitment, value, &blinding),
        SipError::InvalidCommitment
    );

    emit!(CommitmentVerifiedEvent {
        commitment,
        value,
        verified: true,
    });
    msg!("Commitment opening valid");
    Ok(())
}
