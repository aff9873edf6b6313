use anchor_lang::prelude::*;

use crate::error::SipError;
use crate::events::ZkProofVerifiedEvent;
use crate::zk::{active_verifier, ProofPayload, ProofStatement, MAX_PROOF_BYTES};

/// Largest payload `verify_zk_proof` accepts: a maximal proof body plus
/// room for the header and public inputs
pub const MAX_PROOF_DATA_SIZE: usize = MAX_PROOF_BYTES + 1024;

#[derive(Accounts)]
pub struct VerifyZkProof<'info> {
    /// Pays for compute; no state changes
    pub payer: Signer<'info>,
}

/// Decode and verify a standalone payload, returning what the event reports
pub fn check_standalone_proof(proof_data: &[u8]) -> Result<ProofPayload> {
    require!(!proof_data.is_empty(), SipError::InvalidProofFormat);
    require!(proof_data.len() <= MAX_PROOF_DATA_SIZE, SipError::ProofTooLarge);

    let payload = ProofPayload::from_bytes(proof_data)?;
    active_verifier().verify(&ProofStatement::Standalone, proof_data)?;
    Ok(payload)
}

pub fn handler(_ctx: Context<VerifyZkProof>, proof_data: Vec<u8>) -> Result<()> {
    let payload = check_standalone_proof(&proof_data)?;

    emit!(ZkProofVerifiedEvent {
        proof_type: payload.proof_type as u8,
        public_input_count: payload.public_inputs.len() as u8,
        proof_size: payload.proof_bytes.len() as u32,
        verified: true,
    });
    Ok(())
}
