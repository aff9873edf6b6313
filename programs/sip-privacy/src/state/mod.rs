pub mod config;
pub mod nullifier_record;
pub mod transfer_record;

pub use config::*;
pub use nullifier_record::*;
pub use transfer_record::*;
