//! Events emitted by successful instructions
//!
//! Scanners read `ShieldedTransferEvent` from the transaction logs; it
//! carries everything the view-tag filter and the full ECDH check need.

use anchor_lang::prelude::*;

use crate::{COMMITMENT_SIZE, EPHEMERAL_PUBKEY_SIZE, VIEWING_KEY_HASH_SIZE};

#[event]
pub struct ShieldedTransferEvent {
    pub sender: Pubkey,
    pub stealth_recipient: Pubkey,
    pub amount_commitment: [u8; COMMITMENT_SIZE],
    pub ephemeral_pubkey: [u8; EPHEMERAL_PUBKEY_SIZE],
    pub viewing_key_hash: [u8; VIEWING_KEY_HASH_SIZE],
    pub view_tag: u8,
    pub token_mint: Option<Pubkey>,
    pub timestamp: i64,
    pub transfer_id: Pubkey,
}

#[event]
pub struct ClaimEvent {
    pub transfer_id: Pubkey,
    pub nullifier: [u8; 32],
    pub recipient: Pubkey,
    pub timestamp: i64,
}

#[event]
pub struct CommitmentVerifiedEvent {
    pub commitment: [u8; COMMITMENT_SIZE],
    pub value: u64,
    pub verified: bool,
}

#[event]
pub struct ZkProofVerifiedEvent {
    pub proof_type: u8,
    pub public_input_count: u8,
    pub proof_size: u32,
    pub verified: bool,
}
