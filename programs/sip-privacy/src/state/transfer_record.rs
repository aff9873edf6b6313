use anchor_lang::prelude::*;

use crate::{
    COMMITMENT_SIZE, EPHEMERAL_PUBKEY_SIZE, MAX_ENCRYPTED_AMOUNT_SIZE, TRANSFER_RECORD_SEED,
    VIEWING_KEY_HASH_SIZE,
};

/// One shielded transfer
///
/// Keyed by `(sender, index)` where `index` is `Config::total_transfers`
/// at the time of the transfer. The amount itself is never stored; only
/// the commitment and the ciphertext for the sender's compliance keys.
#[account]
pub struct TransferRecord {
    pub sender: Pubkey,

    /// One-time address holding the funds until claimed
    pub stealth_recipient: Pubkey,

    /// Pedersen commitment to the amount
    pub amount_commitment: [u8; COMMITMENT_SIZE],

    /// Ephemeral key R for the recipient's scan
    pub ephemeral_pubkey: [u8; EPHEMERAL_PUBKEY_SIZE],

    /// Hash of the viewing key that opens `encrypted_amount`
    pub viewing_key_hash: [u8; VIEWING_KEY_HASH_SIZE],

    /// At most 64 bytes
    pub encrypted_amount: Vec<u8>,

    /// First byte of the shared-secret hash, for O(1) scan rejection
    pub view_tag: u8,

    pub timestamp: i64,

    pub claimed: bool,

    /// `None` for native transfers
    pub token_mint: Option<Pubkey>,

    pub bump: u8,
}

impl TransferRecord {
    pub const SEED: &'static [u8] = TRANSFER_RECORD_SEED;

    /// Maximum serialized size including the discriminator
    pub const SIZE: usize = 8
        + 32 // sender
        + 32 // stealth_recipient
        + COMMITMENT_SIZE
        + EPHEMERAL_PUBKEY_SIZE
        + VIEWING_KEY_HASH_SIZE
        + 4 + MAX_ENCRYPTED_AMOUNT_SIZE
        + 1 // view_tag
        + 8 // timestamp
        + 1 // claimed
        + 1 + 32 // token_mint
        + 1; // bump

    /// Address of the `index`-th transfer from `sender`
    pub fn find_address(sender: &Pubkey, index: u64) -> (Pubkey, u8) {
        Pubkey::find_program_address(
            &[Self::SEED, sender.as_ref(), &index.to_le_bytes()],
            &crate::ID,
        )
    }
}
