//! Proof payloads and the verifier boundary
//!
//! Proofs travel as an opaque, self-describing payload:
//!
//! ```text
//! [proof_type: u8][num_inputs: u32 LE][inputs: num_inputs x 32B][proof_len: u32 LE][proof]
//! ```
//!
//! The proof type fixes how many public inputs follow:
//! - Funding: 3 (commitment hash, minimum required, asset id)
//! - Validity: 6 (intent hash, commitment x/y, nullifier, timestamp, expiry)
//! - Fulfillment: 8 (intent hash, commitment x/y, recipient, min output,
//!   solver id, fulfillment time, expiry)
//!
//! No proving system is wired in yet. [`StructuralVerifier`] checks shape
//! only and sits behind [`ProofVerifier`] so a real backend can replace it
//! without touching the instruction handlers.

pub mod types;
pub mod verifier;

pub use types::*;
pub use verifier::*;
