use anchor_lang::prelude::*;

use crate::NULLIFIER_SEED;

/// Proof that a transfer has been claimed
///
/// Lives at `["nullifier", nullifier]` and is only ever created, never
/// closed, so the nullifier set is append-only.
#[account]
#[derive(Default)]
pub struct NullifierRecord {
    pub nullifier: [u8; 32],

    /// Transfer this nullifier spent
    pub transfer_record: Pubkey,

    pub claimed_at: i64,

    pub bump: u8,
}

impl NullifierRecord {
    pub const SEED: &'static [u8] = NULLIFIER_SEED;

    /// discriminator (8) + nullifier (32) + transfer_record (32) + claimed_at (8) + bump (1)
    pub const SIZE: usize = 8 + 32 + 32 + 8 + 1;

    pub fn find_address(nullifier: &[u8; 32]) -> (Pubkey, u8) {
        Pubkey::find_program_address(&[Self::SEED, nullifier], &crate::ID)
    }
}
