//! Known-answer vectors for the secp256k1 stealth and commitment paths
//!
//! Values were computed independently with textbook affine arithmetic over
//! secp256k1 and pin the exact byte encodings shared with other SIP clients.

#[cfg(test)]
#[allow(non_snake_case)] // P, Q, R, A follow the protocol notation
mod sip_test_vectors {
    use crate::commitment::{
        combine, commit_with_blinding, generators, verify_opening, BlindingFactor, Commitment,
    };
    use crate::curve::{Curve, PublicKey, SecretScalar};
    use crate::stealth::{derive_stealth_address_with, ScanOutcome, StealthKeys, StealthMetaAddress};

    const P_HEX: &str = "0x034f355bdcb7cc0af728ef3cceb9615d90684bb5b2ca5f859ab0f0b704075871aa";
    const Q_HEX: &str = "0x02466d7fcae563e5cb09a0d1870bb580344804617879a14949cf22285f1bae3f27";
    const R_HEX: &str = "0x023c72addb4fdf09af94f0c94d7fe92a386a7e70cf8a1d85916386bb2535c7b1b1";
    const A_HEX: &str = "0x02aa00975e90a2b49d3d40d59940feb39d80bf349c0c5fda44a3bcf1ace78e99c5";
    const A_SECRET_HEX: &str = "a21ee74781d2f5eb0fc66987f3e422b3b04ffa791392178075b7ba3dde9cf4a6";
    const VIEW_TAG: u8 = 0x91;

    fn blinding(n: u8) -> BlindingFactor {
        let mut bytes = [0u8; 32];
        bytes[31] = n;
        BlindingFactor::from_bytes(&bytes).unwrap()
    }

    fn vector_keys() -> StealthKeys {
        StealthKeys::from_secrets("ethereum", &[0x11; 32], &[0x22; 32]).unwrap()
    }

    /// Vector 1: public keys for fixed spending/viewing secrets
    #[test]
    fn test_vector_1_meta_address_keys() {
        let keys = vector_keys();
        let meta = keys.meta_address();

        assert_eq!(meta.spending_public_key.to_hex(), P_HEX);
        assert_eq!(meta.viewing_public_key.to_hex(), Q_HEX);
        assert_eq!(meta.encode(), format!("sip:ethereum:{}:{}", P_HEX, Q_HEX));

        let decoded = StealthMetaAddress::decode(&meta.encode()).unwrap();
        assert_eq!(&decoded, meta);
    }

    /// Vector 2: one-time address, view tag and spending key for `r = 0x33..33`
    #[test]
    fn test_vector_2_stealth_derivation() {
        let keys = vector_keys();
        let r = SecretScalar::from_bytes(Curve::Secp256k1, &[0x33; 32]).unwrap();

        let derivation = derive_stealth_address_with(keys.meta_address(), r).unwrap();
        let candidate = derivation.stealth_address;

        assert_eq!(candidate.ephemeral_public_key.to_hex(), R_HEX);
        assert_eq!(candidate.view_tag, VIEW_TAG);
        assert_eq!(candidate.address.to_hex(), A_HEX);

        assert_eq!(keys.scan(&candidate), ScanOutcome::Mine);
        let a = keys.derive_private_key(&candidate).unwrap();
        assert_eq!(hex::encode(a.as_bytes()), A_SECRET_HEX);
        assert_eq!(a.public_key().unwrap(), candidate.address);
    }

    /// Vector 3: a single flipped view tag bit is enough to reject
    #[test]
    fn test_vector_3_view_tag_mismatch() {
        let keys = vector_keys();
        let r = SecretScalar::from_bytes(Curve::Secp256k1, &[0x33; 32]).unwrap();
        let mut candidate = derive_stealth_address_with(keys.meta_address(), r)
            .unwrap()
            .stealth_address;

        candidate.view_tag ^= 0x01;
        assert_eq!(keys.scan(&candidate), ScanOutcome::NotMine);
    }

    /// Vector 4: the announcement decoded from hex scans identically
    #[test]
    fn test_vector_4_scan_from_wire() {
        let keys = vector_keys();
        let candidate = crate::stealth::StealthAddress {
            address: PublicKey::from_hex(Curve::Secp256k1, A_HEX).unwrap(),
            ephemeral_public_key: PublicKey::from_hex(Curve::Secp256k1, R_HEX).unwrap(),
            view_tag: VIEW_TAG,
        };
        assert!(keys.scan(&candidate).is_mine());
    }

    /// Vector 5: the NUMS generator H
    #[test]
    fn test_vector_5_generators() {
        let (G, H) = generators().unwrap();
        assert_eq!(
            hex::encode(G),
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );
        assert_eq!(
            hex::encode(H),
            "02a4d34f1618b24211ad9aa88d137b4103f30aa66599e018efd6d6d6add211a34a"
        );
    }

    /// Vector 6: `5·G + 1·H` and `0·G + 7·H`
    #[test]
    fn test_vector_6_commitments() {
        let c5 = commit_with_blinding(5, &blinding(1)).unwrap();
        assert_eq!(
            hex::encode(c5.to_bytes()),
            "02a8366dfd1ccb98c94833c0a30dc97d38c59300682f02462d30eed0df31d8d305"
        );
        assert!(verify_opening(&c5, 5, &blinding(1)));
        assert!(!verify_opening(&c5, 6, &blinding(1)));

        let c0 = commit_with_blinding(0, &blinding(7)).unwrap();
        assert_eq!(
            hex::encode(c0.to_bytes()),
            "0241c16c3bec0f1d0d5cd482a81f4023a8871046607b546857a04646961dc381a5"
        );
    }

    /// Vector 7: `C(3, 2) + C(4, 5) = C(7, 7)`
    #[test]
    fn test_vector_7_homomorphic_sum() {
        let a = commit_with_blinding(3, &blinding(2)).unwrap();
        let b = commit_with_blinding(4, &blinding(5)).unwrap();
        let sum = combine(&[a, b]).unwrap();

        let expected = Commitment::from_hex(
            "0x020306ac59ea6682db1b3de20dab14dead886aeaa40299a75ff0af0166aeded205",
        )
        .unwrap();
        assert_eq!(sum, expected);
        assert!(verify_opening(&sum, 7, &blinding(7)));
    }
}
