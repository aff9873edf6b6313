//! Cross-module unit tests for the SIP SDK

#[cfg(test)]
mod unit_tests {
    use crate::commitment::{commit, verify_opening};
    use crate::curve::{Curve, PublicKey, SecretScalar};
    use crate::error::Error;
    use crate::nullifier::derive_nullifier;
    use crate::stealth::{
        derive_stealth_address, generate_meta_address, ScanOutcome, StealthKeys, StealthMetaAddress,
    };
    use crate::test_utils::init_logging;
    use crate::viewing::{
        decrypt, encrypt_with_ephemeral, transfer_hash, ValidityWindow, ViewingKey, SEALED_AMOUNT_SIZE,
    };

    // ==================== Meta-Address Tests ====================

    #[test]
    fn test_meta_address_encoding_shape() {
        let keys = StealthKeys::generate("ethereum").unwrap();
        let encoded = keys.meta_address().encode();
        let parts: Vec<&str> = encoded.split(':').collect();

        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "sip");
        assert_eq!(parts[1], "ethereum");
        assert!(parts[2].starts_with("0x") && parts[2].len() == 2 + 66);
        assert!(parts[3].starts_with("0x") && parts[3].len() == 2 + 66);
    }

    #[test]
    fn test_meta_address_roundtrip_both_curves() {
        for chain in ["polygon", "near"] {
            let (meta, _, _) = generate_meta_address(chain).unwrap();
            let parsed: StealthMetaAddress = meta.encode().parse().unwrap();
            assert_eq!(parsed, meta);
        }
    }

    #[test]
    fn test_meta_address_rejects_wrong_curve_keys() {
        let evm = StealthKeys::generate("ethereum").unwrap();
        let encoded = evm.meta_address().encode().replacen("ethereum", "solana", 1);
        assert!(StealthMetaAddress::decode(&encoded).is_err());
    }

    #[test]
    fn test_meta_address_rejects_unknown_chain_and_prefix() {
        let keys = StealthKeys::generate("ethereum").unwrap();
        let encoded = keys.meta_address().encode();

        let unknown = encoded.replacen("ethereum", "cosmos", 1);
        assert_eq!(
            StealthMetaAddress::decode(&unknown),
            Err(Error::UnsupportedChain("cosmos".into()))
        );
        assert!(StealthMetaAddress::decode(&encoded.replacen("sip", "eth", 1)).is_err());
        assert!(StealthMetaAddress::decode("sip:ethereum:0x02").is_err());
    }

    // ==================== Key Validation Tests ====================

    #[test]
    fn test_public_key_rejects_off_curve_bytes() {
        let mut bytes = [0u8; 33];
        bytes[0] = 0x02;
        bytes[1..].copy_from_slice(&[0xff; 32]);
        assert!(PublicKey::parse(Curve::Secp256k1, &bytes).is_err());
        assert!(PublicKey::parse(Curve::Secp256k1, &[0x04; 33]).is_err());
        assert!(PublicKey::parse(Curve::Ed25519, &[0u8; 31]).is_err());
    }

    #[test]
    fn test_secret_scalar_debug_is_redacted() {
        let secret = SecretScalar::from_bytes(Curve::Secp256k1, &[0x11; 32]).unwrap();
        let rendered = format!("{:?}", secret);
        assert!(!rendered.contains("1111"));
    }

    // ==================== Stealth + Viewing Tests ====================

    #[test]
    fn test_sealed_amount_opens_for_compliance_keys_only() {
        init_logging();
        let alice = StealthKeys::generate("solana").unwrap();
        let compliance = ViewingKey::generate_master();
        let stranger = ViewingKey::generate_master();

        let address = derive_stealth_address(alice.meta_address())
            .unwrap()
            .stealth_address;
        let opening = commit(42_000, None).unwrap();
        let hash = transfer_hash(
            &opening.commitment.to_bytes(),
            address.address.as_bytes(),
            &address.ephemeral_public_key.to_wire_bytes(),
        );

        let sealed = compliance.seal_amount("payroll", &hash, 42_000).unwrap();
        assert_eq!(sealed.len(), SEALED_AMOUNT_SIZE);

        let window = ValidityWindow::new(0, 2_000).unwrap();
        let auditor = compliance.derive_auditor(Some("payroll"), window).unwrap();
        let amount = auditor.open_amount("payroll", &hash, &sealed, 1_000).unwrap();
        assert_eq!(amount, 42_000);
        assert!(verify_opening(&opening.commitment, amount, &opening.blinding));

        assert_eq!(
            stranger.open_amount("payroll", &hash, &sealed, 1_000),
            Err(Error::DecryptionFailed)
        );

        // Replaying the ciphertext onto another transfer fails the AAD check
        let mut other_hash = hash;
        other_hash[0] ^= 1;
        assert_eq!(
            compliance.open_amount("payroll", &other_hash, &sealed, 1_000),
            Err(Error::DecryptionFailed)
        );
    }

    #[test]
    fn test_memo_to_viewing_key_reuses_stealth_ephemeral() {
        let alice = StealthKeys::generate("ethereum").unwrap();
        let eve = StealthKeys::generate("ethereum").unwrap();
        let derivation = derive_stealth_address(alice.meta_address()).unwrap();
        let hash = [4u8; 32];

        let blob = encrypt_with_ephemeral(
            b"invoice 17",
            &alice.meta_address().viewing_public_key,
            &derivation.ephemeral_secret,
            &hash,
        )
        .unwrap();
        assert_eq!(blob.ephemeral_public_key, derivation.stealth_address.ephemeral_public_key);
        assert_eq!(decrypt(&blob, alice.viewing_secret(), &hash).unwrap(), b"invoice 17");
        assert_eq!(
            decrypt(&blob, eve.viewing_secret(), &hash),
            Err(Error::DecryptionFailed)
        );
    }

    #[test]
    fn test_viewing_master_tied_to_stealth_keys() {
        let keys = StealthKeys::generate("ethereum").unwrap();
        let a = ViewingKey::master_from_viewing_secret(keys.viewing_secret()).unwrap();
        let b = ViewingKey::master_from_viewing_secret(keys.viewing_secret()).unwrap();
        assert_eq!(a.key_hash(), b.key_hash());

        let window = ValidityWindow::new(0, i64::MAX).unwrap();
        let auditor = a.derive_auditor(Some("payroll"), window).unwrap();
        let envelope = a.encrypt("payroll", &[3; 32], b"memo").unwrap();
        assert_eq!(auditor.decrypt(&envelope, 1_000).unwrap(), b"memo");
    }

    #[test]
    fn test_nullifier_binds_transfer_and_secret() {
        let keys = StealthKeys::generate("solana").unwrap();
        let other = StealthKeys::generate("solana").unwrap();

        let n1 = derive_nullifier(&[1; 32], keys.spending_secret());
        assert_eq!(n1, derive_nullifier(&[1; 32], keys.spending_secret()));
        assert_ne!(n1, derive_nullifier(&[2; 32], keys.spending_secret()));
        assert_ne!(n1, derive_nullifier(&[1; 32], other.spending_secret()));
    }

    #[test]
    fn test_cross_curve_candidate_is_not_mine() {
        let evm = StealthKeys::generate("ethereum").unwrap();
        let sol = StealthKeys::generate("solana").unwrap();
        let candidate = derive_stealth_address(sol.meta_address())
            .unwrap()
            .stealth_address;
        assert_eq!(evm.scan(&candidate), ScanOutcome::NotMine);
    }

    #[test]
    fn test_chain_name_is_case_insensitive() {
        let keys = StealthKeys::generate("Ethereum").unwrap();
        assert_eq!(keys.meta_address().chain, "ethereum");
        assert!(keys.meta_address().encode().starts_with("sip:ethereum:"));
    }
}
