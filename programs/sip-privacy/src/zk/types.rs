use anchor_lang::prelude::*;

use crate::error::SipError;

/// Size of one public input (a BN254 field element)
pub const FIELD_SIZE: usize = 32;

pub const MAX_PUBLIC_INPUTS: usize = 32;

/// Largest proof body inside a payload
pub const MAX_PROOF_BYTES: usize = 4096;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProofType {
    /// Sender holds enough funds
    Funding = 0,
    /// Sender authorized the intent
    Validity = 1,
    /// Solver executed the intent
    Fulfillment = 2,
}

impl ProofType {
    pub fn expected_public_inputs(&self) -> usize {
        match self {
            ProofType::Funding => 3,
            ProofType::Validity => 6,
            ProofType::Fulfillment => 8,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProofType::Funding => "funding",
            ProofType::Validity => "validity",
            ProofType::Fulfillment => "fulfillment",
        }
    }
}

impl TryFrom<u8> for ProofType {
    type Error = SipError;

    fn try_from(value: u8) -> std::result::Result<Self, SipError> {
        match value {
            0 => Ok(ProofType::Funding),
            1 => Ok(ProofType::Validity),
            2 => Ok(ProofType::Fulfillment),
            _ => Err(SipError::UnsupportedProofType),
        }
    }
}

/// A decoded proof payload
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProofPayload {
    pub proof_type: ProofType,
    pub public_inputs: Vec<[u8; FIELD_SIZE]>,
    pub proof_bytes: Vec<u8>,
}

impl ProofPayload {
    pub fn new(proof_type: ProofType, public_inputs: Vec<[u8; FIELD_SIZE]>, proof_bytes: Vec<u8>) -> Self {
        Self {
            proof_type,
            public_inputs,
            proof_bytes,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            1 + 4 + self.public_inputs.len() * FIELD_SIZE + 4 + self.proof_bytes.len(),
        );
        out.push(self.proof_type as u8);
        out.extend_from_slice(&(self.public_inputs.len() as u32).to_le_bytes());
        for input in &self.public_inputs {
            out.extend_from_slice(input);
        }
        out.extend_from_slice(&(self.proof_bytes.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.proof_bytes);
        out
    }

    /// Decode and check the envelope; the proof body stays opaque
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut reader = Reader { data, offset: 0 };

        let proof_type = ProofType::try_from(reader.take(1)?[0])?;

        let num_inputs = reader.read_u32()? as usize;
        require!(num_inputs <= MAX_PUBLIC_INPUTS, SipError::InvalidPublicInputs);
        require!(
            num_inputs == proof_type.expected_public_inputs(),
            SipError::InvalidPublicInputs
        );

        let mut public_inputs = Vec::with_capacity(num_inputs);
        for _ in 0..num_inputs {
            let mut input = [0u8; FIELD_SIZE];
            input.copy_from_slice(reader.take(FIELD_SIZE)?);
            public_inputs.push(input);
        }

        let proof_len = reader.read_u32()? as usize;
        require!(proof_len <= MAX_PROOF_BYTES, SipError::ProofTooLarge);
        let proof_bytes = reader.take(proof_len)?.to_vec();

        require!(reader.is_empty(), SipError::InvalidProofFormat);

        Ok(Self {
            proof_type,
            public_inputs,
            proof_bytes,
        })
    }
}

struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .offset
            .checked_add(len)
            .ok_or(SipError::InvalidProofFormat)?;
        let slice = self
            .data
            .get(self.offset..end)
            .ok_or(SipError::InvalidProofFormat)?;
        self.offset = end;
        Ok(slice)
    }

    fn read_u32(&mut self) -> Result<u32> {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(bytes))
    }

    fn is_empty(&self) -> bool {
        self.offset == self.data.len()
    }
}
