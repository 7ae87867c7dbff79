use core::fmt;

use ballot_util_array_type::{
    array_type_define, array_type_impl_base32_str, array_type_impl_bytes_conv,
    array_type_impl_debug_as_display, array_type_impl_serde,
};
use bincode::{Decode, Encode};

array_type_define! {
    /// Identity of a ledger participant
    ///
    /// An ed25519 public key. The ledger itself never verifies
    /// signatures: callers are authenticated by whatever invokes it.
    #[derive(Encode, Decode, Clone, Copy, Hash)]
    pub struct Identity[32];
}

impl Identity {
    pub fn to_short(self) -> IdentityShort {
        IdentityShort(self)
    }
}

/// Abbreviated [`Identity`] display, for logs
pub struct IdentityShort(Identity);

impl fmt::Display for IdentityShort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "{}...{}",
            data_encoding::BASE32_DNSCURVE.encode_display(&self.0.as_slice()[0..4]),
            data_encoding::BASE32_DNSCURVE.encode_display(&self.0.as_slice()[28..32])
        ))
    }
}

array_type_impl_base32_str!(Identity);
array_type_impl_serde!(Identity);
array_type_impl_debug_as_display!(Identity);

array_type_define! {
    /// Secret key behind an [`Identity`]
    #[derive(Clone, Copy)]
    pub struct IdentitySeckey[32];
}

impl fmt::Debug for IdentitySeckey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentitySeckey")
            .field("pubkey", &self.pubkey())
            .finish_non_exhaustive()
    }
}

impl IdentitySeckey {
    pub fn generate() -> Self {
        Self(ed25519_dalek::SigningKey::generate(&mut rand::thread_rng()).to_bytes())
    }

    pub fn pubkey(self) -> Identity {
        Identity(
            ed25519_dalek::SigningKey::from(self)
                .verifying_key()
                .to_bytes(),
        )
    }
}

impl From<IdentitySeckey> for ed25519_dalek::SigningKey {
    fn from(value: IdentitySeckey) -> Self {
        ed25519_dalek::SigningKey::from_bytes(&value.0)
    }
}

array_type_impl_bytes_conv!(IdentitySeckey);
array_type_impl_base32_str!(IdentitySeckey);

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use super::{Identity, IdentitySeckey};

    #[test]
    fn identity_roundtrips_through_display() {
        let identity = IdentitySeckey::generate().pubkey();

        let parsed = Identity::from_str(&identity.to_string()).expect("Can't fail");
        assert_eq!(parsed, identity);

        let json = serde_json::to_string(&identity).expect("Can't fail");
        assert_eq!(json, format!("\"{identity}\""));
    }

    #[test]
    fn identity_rejects_wrong_length() {
        let identity = IdentitySeckey::generate().pubkey().to_string();

        assert!(Identity::from_str(&identity[..identity.len() - 8]).is_err());
        assert!(Identity::from_str("").is_err());
    }

    #[test]
    fn seckey_derives_stable_identity() {
        let seckey = IdentitySeckey::from([7u8; 32]);

        assert_eq!(seckey.pubkey(), seckey.pubkey());
        assert_ne!(seckey.pubkey(), IdentitySeckey::from([8u8; 32]).pubkey());
        assert!(ed25519_dalek::VerifyingKey::try_from(seckey.pubkey()).is_ok());
        assert!(!format!("{seckey:?}").contains(&seckey.to_string()));
    }
}
