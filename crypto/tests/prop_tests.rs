use k256::ecdsa::SigningKey;
use proptest::prelude::*;

use microcred_crypto::{address_of, hash_signal, recover_personal_signer, sign_personal_message};

proptest! {
    /// Signal hashes always fit the field: leading zero byte, 32 bytes total.
    #[test]
    fn signal_hash_is_field_sized(signal in ".{0,64}") {
        let h = hash_signal(&signal);
        prop_assert_eq!(h.len(), 66);
        prop_assert!(h.starts_with("0x00"));
    }

    /// Any message signed by a key recovers to that key's address.
    #[test]
    fn recover_matches_signer(seed in 1u8..=254, msg in prop::collection::vec(any::<u8>(), 0..512)) {
        let sk = SigningKey::from_slice(&[seed; 32]).unwrap();
        let sig = sign_personal_message(&sk, &msg).unwrap();
        prop_assert_eq!(recover_personal_signer(&msg, &sig).unwrap(), address_of(sk.verifying_key()));
    }
}
