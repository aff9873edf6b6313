pub mod admin;
pub mod claim_transfer;
pub mod initialize;
pub mod shielded_transfer;
pub mod verify_commitment;
pub mod verify_zk_proof;

pub use admin::*;
pub use claim_transfer::*;
pub use initialize::*;
pub use shielded_transfer::*;
pub use verify_commitment::*;
pub use verify_zk_proof::*;
