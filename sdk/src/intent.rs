//! Boundary types for the cross-chain intent layer
//!
//! Matching and routing happen in an external solver network. This module
//! only defines what is handed over ([`IntentRequest`]), what comes back
//! ([`FulfillmentAttestation`]) and the checks a client runs on the reply.

use serde::{Deserialize, Serialize};

use crate::curve::sha256;
use crate::error::{Error, Result};
use crate::stealth::StealthAddress;

const INTENT_DOMAIN: &[u8] = b"SIP-INTENT-v1";

/// A swap request whose output lands on a one-time address
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntentRequest {
    pub input_asset: String,
    pub output_asset: String,
    pub min_output_amount: u64,
    pub recipient_stealth_address: StealthAddress,
    /// Unix seconds after which no fulfillment is accepted
    pub expiry: i64,
}

impl IntentRequest {
    /// Hash binding every field of the request
    pub fn intent_hash(&self) -> [u8; 32] {
        let recipient = self.recipient_stealth_address;
        sha256(&[
            INTENT_DOMAIN,
            &(self.input_asset.len() as u32).to_le_bytes(),
            self.input_asset.as_bytes(),
            &(self.output_asset.len() as u32).to_le_bytes(),
            self.output_asset.as_bytes(),
            &self.min_output_amount.to_le_bytes(),
            &recipient.address.to_wire_bytes(),
            &recipient.ephemeral_public_key.to_wire_bytes(),
            &[recipient.view_tag],
            &self.expiry.to_le_bytes(),
        ])
    }
}

/// A solver's claim that an intent was filled
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentAttestation {
    pub intent_hash: [u8; 32],
    pub solver_id: [u8; 32],
    pub output_amount: u64,
    pub fulfilled_at: i64,
    /// Serialized fulfillment proof, opaque to the client
    pub proof: Vec<u8>,
}

impl FulfillmentAttestation {
    /// Check the attestation answers `intent` within its terms
    pub fn check(&self, intent: &IntentRequest) -> Result<()> {
        if self.intent_hash != intent.intent_hash() {
            return Err(Error::AttestationRejected("intent hash mismatch"));
        }
        if self.output_amount < intent.min_output_amount {
            return Err(Error::AttestationRejected("output below minimum"));
        }
        if self.fulfilled_at > intent.expiry {
            return Err(Error::AttestationRejected("fulfilled after expiry"));
        }
        Ok(())
    }
}

/// An external solver network
pub trait SolverBoundary {
    fn submit(&self, intent: &IntentRequest) -> Result<FulfillmentAttestation>;
}

/// Submit `intent` and accept the reply only if it passes [`FulfillmentAttestation::check`]
pub fn request_fulfillment<S: SolverBoundary + ?Sized>(
    solver: &S,
    intent: &IntentRequest,
) -> Result<FulfillmentAttestation> {
    let attestation = solver.submit(intent)?;
    attestation.check(intent)?;
    Ok(attestation)
}
