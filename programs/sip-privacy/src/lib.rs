//! SIP settlement program
//!
//! Shielded transfers to one-time stealth addresses with Pedersen-committed
//! amounts. State lives in three PDA families:
//! - `["config"]`: the single [`state::Config`]
//! - `["transfer_record", sender, index]`: one [`state::TransferRecord`] per transfer
//! - `["nullifier", nullifier]`: one [`state::NullifierRecord`] per claim
//!
//! A nullifier record is created with `init`, so a second claim for the same
//! nullifier fails at account creation and no application lock is needed.

use anchor_lang::prelude::*;

pub mod commitment;
pub mod error;
pub mod events;
pub mod instructions;
pub mod state;
pub mod zk;

use instructions::*;

pub use error::{ErrorCategory, SipError};

declare_id!("8sDpB5VLm5HgyUzPCU4AHQ1mvxPKzoyme7Renc6grKsp");

// ============================================================================
// Seeds and sizes
// ============================================================================

pub const CONFIG_SEED: &[u8] = b"config";
pub const TRANSFER_RECORD_SEED: &[u8] = b"transfer_record";
pub const NULLIFIER_SEED: &[u8] = b"nullifier";

pub const COMMITMENT_SIZE: usize = 33;
pub const EPHEMERAL_PUBKEY_SIZE: usize = 33;
pub const VIEWING_KEY_HASH_SIZE: usize = 32;

/// Upper bound on a proof payload attached to a transfer or claim
pub const MAX_PROOF_SIZE: usize = 2048;
pub const MAX_ENCRYPTED_AMOUNT_SIZE: usize = 64;

/// 10% fee cap
pub const MAX_FEE_BPS: u16 = 1000;
pub const BPS_DENOMINATOR: u128 = 10_000;

#[program]
pub mod sip_privacy {
    use super::*;

    /// Create the config. Runs once, signed by the program's upgrade authority.
    pub fn initialize(ctx: Context<Initialize>, fee_bps: u16) -> Result<()> {
        instructions::initialize::handler(ctx, fee_bps)
    }

    /// Move lamports to a stealth address behind a commitment
    pub fn shielded_transfer(ctx: Context<ShieldedTransfer>, args: ShieldedTransferArgs) -> Result<()> {
        instructions::shielded_transfer::handler(ctx, args)
    }

    pub fn shielded_token_transfer(
        ctx: Context<ShieldedTokenTransfer>,
        args: ShieldedTransferArgs,
    ) -> Result<()> {
        instructions::shielded_transfer::token_handler(ctx, args)
    }

    pub fn claim_transfer(ctx: Context<ClaimTransfer>, nullifier: [u8; 32], proof: Vec<u8>) -> Result<()> {
        instructions::claim_transfer::handler(ctx, nullifier, proof)
    }

    pub fn claim_token_transfer(
        ctx: Context<ClaimTokenTransfer>,
        nullifier: [u8; 32],
        proof: Vec<u8>,
    ) -> Result<()> {
        instructions::claim_transfer::token_handler(ctx, nullifier, proof)
    }

    pub fn set_paused(ctx: Context<AdminAction>, paused: bool) -> Result<()> {
        instructions::admin::set_paused(ctx, paused)
    }

    pub fn update_fee(ctx: Context<AdminAction>, new_fee_bps: u16) -> Result<()> {
        instructions::admin::update_fee(ctx, new_fee_bps)
    }

    /// Read-only: check that `(value, blinding)` opens `commitment`
    pub fn verify_commitment(
        ctx: Context<VerifyCommitment>,
        commitment: [u8; COMMITMENT_SIZE],
        value: u64,
        blinding: [u8; 32],
    ) -> Result<()> {
        instructions::verify_commitment::handler(ctx, commitment, value, blinding)
    }

    /// Read-only: run the proof verifier over a standalone payload
    pub fn verify_zk_proof(ctx: Context<VerifyZkProof>, proof_data: Vec<u8>) -> Result<()> {
        instructions::verify_zk_proof::handler(ctx, proof_data)
    }
}
