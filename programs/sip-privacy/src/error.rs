use anchor_lang::prelude::*;

#[error_code]
pub enum SipError {
    #[msg("Program is currently paused")]
    ProgramPaused,

    #[msg("Invalid Pedersen commitment format")]
    InvalidCommitment,

    #[msg("ZK proof is too large")]
    ProofTooLarge,

    #[msg("Encrypted amount data is too large")]
    EncryptedAmountTooLarge,

    #[msg("ZK proof verification failed")]
    ProofVerificationFailed,

    #[msg("Unauthorized action")]
    Unauthorized,

    #[msg("Fee exceeds maximum allowed (10%)")]
    FeeTooHigh,

    #[msg("Math overflow")]
    MathOverflow,

    #[msg("Transfer already claimed")]
    AlreadyClaimed,

    #[msg("Invalid stealth address proof")]
    InvalidStealthProof,

    #[msg("Invalid proof format")]
    InvalidProofFormat,

    #[msg("Unsupported proof type")]
    UnsupportedProofType,

    #[msg("Invalid public inputs")]
    InvalidPublicInputs,

    #[msg("Decryption failed")]
    DecryptionFailed,

    #[msg("Transfer amount must be greater than zero")]
    InvalidAmount,

    #[msg("Insufficient funds")]
    InsufficientFunds,

    #[msg("Token mint does not match the transfer record")]
    InvalidTokenMint,
}

/// How a caller should react to a failure
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed input, rejected before any mutation
    Format,
    /// Caller lacks the key material
    Authorization,
    /// Race or repeat submission
    StateConflict,
    /// Transient administrative state
    Availability,
    Arithmetic,
    /// Well-formed but cryptographically false
    Cryptographic,
}

impl SipError {
    pub fn category(&self) -> ErrorCategory {
        use SipError::*;
        match self {
            InvalidCommitment
            | InvalidProofFormat
            | EncryptedAmountTooLarge
            | ProofTooLarge
            | InvalidPublicInputs
            | UnsupportedProofType
            | InvalidAmount
            | InvalidTokenMint => ErrorCategory::Format,
            Unauthorized | InvalidStealthProof => ErrorCategory::Authorization,
            AlreadyClaimed => ErrorCategory::StateConflict,
            ProgramPaused => ErrorCategory::Availability,
            MathOverflow | FeeTooHigh | InsufficientFunds => ErrorCategory::Arithmetic,
            ProofVerificationFailed | DecryptionFailed => ErrorCategory::Cryptographic,
        }
    }

    /// Only availability failures clear up on their own
    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Availability
    }

    /// The funds already moved; treat as done, do not retry
    pub fn is_success_equivalent(&self) -> bool {
        matches!(self, SipError::AlreadyClaimed)
    }
}
