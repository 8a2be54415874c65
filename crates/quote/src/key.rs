//! RSA public key representation shared by EK, AK, and Quote verification.
//!
//! The canonical string form `"{N}:{E}"` (decimal modulus, decimal
//! exponent) is the key used throughout the verifier's prover registry.

use crate::error::{QuoteError, QuoteResult};
use rsa::BigUint;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// An RSA public key, as exchanged over the wire: decimal modulus and
/// exponent, matching the original `{N, E}` JSON shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    /// RSA modulus, arbitrary precision, serialized as a decimal string.
    #[serde(rename = "N", with = "decimal_biguint")]
    pub n: BigUint,
    /// RSA public exponent.
    #[serde(rename = "E")]
    pub e: u64,
}

impl PublicKey {
    /// Build a public key from raw modulus/exponent values.
    pub fn new(n: BigUint, e: u64) -> Self {
        Self { n, e }
    }

    /// The canonical registry key: decimal `N`, decimal `E`, joined by `:`.
    pub fn canonical_key(&self) -> String {
        format!("{}:{}", self.n, self.e)
    }

    /// Convert to the `rsa` crate's public key type for signature verification.
    pub fn to_rsa(&self) -> QuoteResult<rsa::RsaPublicKey> {
        rsa::RsaPublicKey::new(self.n.clone(), BigUint::from(self.e))
            .map_err(|e| QuoteError::KeyMaterialInvalid(e.to_string()))
    }
}

mod decimal_biguint {
    use rsa::BigUint;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        let s = String::deserialize(deserializer)?;
        BigUint::from_str(&s).map_err(D::Error::custom)
    }
}

impl FromStr for PublicKey {
    type Err = QuoteError;

    /// Parse the canonical `"{N}:{E}"` form back into a `PublicKey`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (n_str, e_str) = s
            .split_once(':')
            .ok_or_else(|| QuoteError::KeyMaterialInvalid(format!("malformed key string: {s}")))?;
        let n = BigUint::from_str(n_str)
            .map_err(|e| QuoteError::KeyMaterialInvalid(e.to_string()))?;
        let e: u64 = e_str
            .parse()
            .map_err(|_| QuoteError::KeyMaterialInvalid(format!("bad exponent: {e_str}")))?;
        Ok(PublicKey { n, e })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_key_matches_scenario_s5() {
        let key = PublicKey::new(BigUint::from(0xABu32), 65537);
        assert_eq!(key.canonical_key(), "171:65537");
    }

    #[test]
    fn round_trips_through_string_form() {
        let key = PublicKey::new(BigUint::from(171u32), 65537);
        let parsed: PublicKey = key.canonical_key().parse().unwrap();
        assert_eq!(key, parsed);
    }
}
