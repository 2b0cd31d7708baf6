use std::fmt;

use serde::{Deserialize, Serialize};

use crate::plutus::{decode_cbor, encode_cbor, PlutusData, PlutusError};

/// Declares a hex newtype for one kind of encoded payload, so an encoded
/// step can never be passed where an encoded datum is expected.
macro_rules! encoded_hex {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(cbor_hex: impl Into<String>) -> Self {
                Self(cbor_hex.into().trim().to_lowercase())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn to_plutus_data(&self) -> Result<PlutusData, PlutusError> {
                decode_cbor(&self.0)
            }

            pub fn from_plutus_data(data: &PlutusData) -> Result<Self, PlutusError> {
                Ok(Self(encode_cbor(data)?))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

encoded_hex!(
    /// CBOR hex of a single order step.
    EncodedStep
);

encoded_hex!(
    /// CBOR hex of a full order datum, as attached to the order output.
    EncodedDatum
);
