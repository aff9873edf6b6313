use anchor_lang::prelude::*;

use super::types::{ProofPayload, FIELD_SIZE};
use crate::error::SipError;
use crate::COMMITMENT_SIZE;

/// Shortest proof body accepted as plausibly real
pub const MIN_PROOF_BYTES: usize = 64;

/// Public inputs must be below the BN254 scalar modulus (0x30644e72...),
/// approximated by the leading byte
const FIELD_HIGH_BYTE_LIMIT: u8 = 0x31;

/// What a proof is being checked for
#[derive(Clone, Copy, Debug)]
pub enum ProofStatement<'a> {
    /// Proof attached to a shielded transfer
    Transfer {
        amount_commitment: &'a [u8; COMMITMENT_SIZE],
        stealth_recipient: &'a Pubkey,
    },
    /// Proof attached to a claim
    Claim {
        transfer_id: &'a Pubkey,
        nullifier: &'a [u8; 32],
    },
    /// `verify_zk_proof` with no surrounding transfer
    Standalone,
}

/// Accept/reject over opaque proof bytes
pub trait ProofVerifier {
    fn verify(&self, statement: &ProofStatement<'_>, proof: &[u8]) -> Result<()>;
}

/// Verifier every instruction handler runs
pub fn active_verifier() -> &'static dyn ProofVerifier {
    &StructuralVerifier
}

/// Shape-only verification
///
/// Transfer and standalone proofs must decode as a [`ProofPayload`] with the
/// right arity, a body of at least [`MIN_PROOF_BYTES`] and in-range public
/// inputs. Claim proofs are not inspected: claim ownership is established
/// by the stealth account's signature.
///
/// This is NOT a cryptographic check.
#[derive(Clone, Copy, Debug, Default)]
pub struct StructuralVerifier;

impl StructuralVerifier {
    pub fn check_payload(payload: &ProofPayload) -> Result<()> {
        require!(
            payload.proof_bytes.len() >= MIN_PROOF_BYTES,
            SipError::ProofVerificationFailed
        );
        require!(
            payload.public_inputs.iter().all(is_valid_field_element),
            SipError::InvalidPublicInputs
        );
        Ok(())
    }
}

impl ProofVerifier for StructuralVerifier {
    fn verify(&self, statement: &ProofStatement<'_>, proof: &[u8]) -> Result<()> {
        match statement {
            ProofStatement::Claim { .. } => Ok(()),
            ProofStatement::Transfer { .. } | ProofStatement::Standalone => {
                let payload = ProofPayload::from_bytes(proof)?;
                Self::check_payload(&payload)?;
                msg!(
                    "{} proof passed structural checks ({} inputs)",
                    payload.proof_type.name(),
                    payload.public_inputs.len()
                );
                Ok(())
            }
        }
    }
}

fn is_valid_field_element(bytes: &[u8; FIELD_SIZE]) -> bool {
    bytes[0] < FIELD_HIGH_BYTE_LIMIT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zk::types::ProofType;

    fn payload(inputs: usize, body: usize) -> ProofPayload {
        ProofPayload::new(ProofType::Validity, vec![[0x10; 32]; inputs], vec![1; body])
    }

    #[test]
    fn test_accepts_well_formed_proof() {
        let bytes = payload(6, 64).to_bytes();
        assert!(StructuralVerifier.verify(&ProofStatement::Standalone, &bytes).is_ok());
    }

    #[test]
    fn test_short_proof_fails_verification() {
        let bytes = payload(6, 63).to_bytes();
        assert_eq!(
            StructuralVerifier.verify(&ProofStatement::Standalone, &bytes).unwrap_err(),
            Error::from(SipError::ProofVerificationFailed)
        );
    }

    #[test]
    fn test_out_of_field_input_rejected() {
        let mut p = payload(6, 100);
        p.public_inputs[4][0] = 0x31;
        assert_eq!(
            StructuralVerifier.verify(&ProofStatement::Standalone, &p.to_bytes()).unwrap_err(),
            Error::from(SipError::InvalidPublicInputs)
        );
        p.public_inputs[4][0] = 0x30;
        assert!(StructuralVerifier.verify(&ProofStatement::Standalone, &p.to_bytes()).is_ok());
    }

    #[test]
    fn test_wrong_arity_rejected_before_body() {
        let bytes = payload(5, 10).to_bytes();
        assert_eq!(
            StructuralVerifier.verify(&ProofStatement::Standalone, &bytes).unwrap_err(),
            Error::from(SipError::InvalidPublicInputs)
        );
    }

    #[test]
    fn test_claim_proofs_are_opaque() {
        let statement = ProofStatement::Claim {
            transfer_id: &Pubkey::new_from_array([1; 32]),
            nullifier: &[2; 32],
        };
        assert!(StructuralVerifier.verify(&statement, &[]).is_ok());
        assert!(StructuralVerifier.verify(&statement, &[0xff; 10]).is_ok());
    }
}
