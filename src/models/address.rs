//! Shelley addresses as they appear in order datums.
//!
//! Only the parts an order needs are covered: base, pointer and enterprise
//! addresses, their bech32 form, and their Plutus data form.

use anyhow::{anyhow, Result};
use serde::{Serialize, Serializer};

use crate::plutus::primitives::{as_bytes_hex, as_constr, as_int, as_maybe, bytes_hex, int, maybe};
use crate::plutus::{PlutusData, PlutusError};

const HASH_LEN: usize = 28;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "hash", rename_all = "snake_case")]
pub enum Credential {
    Key(String),
    Script(String),
}

impl Credential {
    pub fn hash(&self) -> &str {
        match self {
            Credential::Key(h) | Credential::Script(h) => h,
        }
    }

    pub fn is_script(&self) -> bool {
        matches!(self, Credential::Script(_))
    }

    /// Key = `Constr 0 [hash]`, Script = `Constr 1 [hash]`.
    pub fn to_plutus_data(&self) -> Result<PlutusData, PlutusError> {
        let index = if self.is_script() { 1 } else { 0 };
        Ok(PlutusData::constr(index, vec![bytes_hex(self.hash())?]))
    }

    pub fn from_plutus_data(data: &PlutusData) -> Result<Credential, PlutusError> {
        match as_constr(data)? {
            (0, [hash]) => Ok(Credential::Key(as_bytes_hex(hash)?)),
            (1, [hash]) => Ok(Credential::Script(as_bytes_hex(hash)?)),
            _ => Err(PlutusError::UnexpectedShape {
                expected: "credential",
                found: data.to_string(),
            }),
        }
    }

    fn from_raw(bytes: &[u8], script: bool) -> Credential {
        let hash = hex::encode(bytes);
        if script {
            Credential::Script(hash)
        } else {
            Credential::Key(hash)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StakeCredential {
    Hash(Credential),
    Pointer { slot: u64, tx_index: u64, cert_index: u64 },
}

impl StakeCredential {
    fn to_plutus_data(&self) -> Result<PlutusData, PlutusError> {
        match self {
            StakeCredential::Hash(c) => Ok(PlutusData::constr(0, vec![c.to_plutus_data()?])),
            StakeCredential::Pointer {
                slot,
                tx_index,
                cert_index,
            } => Ok(PlutusData::constr(
                1,
                vec![
                    int(i128::from(*slot)),
                    int(i128::from(*tx_index)),
                    int(i128::from(*cert_index)),
                ],
            )),
        }
    }

    fn from_plutus_data(data: &PlutusData) -> Result<StakeCredential, PlutusError> {
        let nat = |d: &PlutusData| -> Result<u64, PlutusError> {
            let n = as_int(d)?;
            u64::try_from(n).map_err(|_| PlutusError::OutOfRange(format!("pointer field {}", n)))
        };
        match as_constr(data)? {
            (0, [credential]) => Ok(StakeCredential::Hash(Credential::from_plutus_data(
                credential,
            )?)),
            (1, [slot, tx_index, cert_index]) => Ok(StakeCredential::Pointer {
                slot: nat(slot)?,
                tx_index: nat(tx_index)?,
                cert_index: nat(cert_index)?,
            }),
            _ => Err(PlutusError::UnexpectedShape {
                expected: "staking credential",
                found: data.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub network_id: u8,
    pub payment: Credential,
    pub stake: Option<StakeCredential>,
}

impl Address {
    pub fn enterprise(network_id: u8, payment: Credential) -> Self {
        Self {
            network_id,
            payment,
            stake: None,
        }
    }

    pub fn payment_credential(&self) -> &Credential {
        &self.payment
    }

    pub fn from_bech32(address: &str) -> Result<Self> {
        let (hrp, bytes) =
            bech32::decode(address).map_err(|e| anyhow!("invalid bech32 address {}: {}", address, e))?;
        if !hrp.to_string().starts_with("addr") {
            return Err(anyhow!("not a payment address: {}", address));
        }
        Self::from_bytes(&bytes)
    }

    /// `addr` on mainnet (network id 1), `addr_test` otherwise.
    pub fn to_bech32(&self) -> Result<String> {
        let prefix = if self.network_id == 1 { "addr" } else { "addr_test" };
        let hrp = bech32::Hrp::parse(prefix).map_err(|e| anyhow!("bech32 HRP error: {}", e))?;
        bech32::encode::<bech32::Bech32>(hrp, &self.to_bytes()?)
            .map_err(|e| anyhow!("bech32 encode error: {}", e))
    }

    /// Header byte: upper nibble is the address type, lower nibble the network id.
    ///
    ///   0-3  base (bit 0: payment is script, bit 1: stake is script)
    ///   4-5  pointer
    ///   6-7  enterprise
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let header = *bytes.first().ok_or_else(|| anyhow!("empty address"))?;
        let kind = header >> 4;
        let network_id = header & 0x0f;
        let body = &bytes[1..];
        if body.len() < HASH_LEN {
            return Err(anyhow!("address too short: {} bytes", bytes.len()));
        }
        let payment = Credential::from_raw(&body[..HASH_LEN], kind & 1 == 1);
        let rest = &body[HASH_LEN..];

        let stake = match kind {
            0..=3 => {
                if rest.len() != HASH_LEN {
                    return Err(anyhow!("base address must be 57 bytes, got {}", bytes.len()));
                }
                Some(StakeCredential::Hash(Credential::from_raw(rest, kind & 2 == 2)))
            }
            4 | 5 => {
                let mut cursor = rest;
                let slot = read_varint(&mut cursor)?;
                let tx_index = read_varint(&mut cursor)?;
                let cert_index = read_varint(&mut cursor)?;
                if !cursor.is_empty() {
                    return Err(anyhow!("trailing bytes in pointer address"));
                }
                Some(StakeCredential::Pointer {
                    slot,
                    tx_index,
                    cert_index,
                })
            }
            6 | 7 => {
                if !rest.is_empty() {
                    return Err(anyhow!("enterprise address must be 29 bytes, got {}", bytes.len()));
                }
                None
            }
            other => return Err(anyhow!("unsupported address type {}", other)),
        };

        Ok(Self {
            network_id,
            payment,
            stake,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let payment_bit = u8::from(self.payment.is_script());
        let kind = match &self.stake {
            Some(StakeCredential::Hash(c)) => (u8::from(c.is_script()) << 1) | payment_bit,
            Some(StakeCredential::Pointer { .. }) => 4 | payment_bit,
            None => 6 | payment_bit,
        };

        let mut bytes = Vec::with_capacity(57);
        bytes.push((kind << 4) | (self.network_id & 0x0f));
        bytes.extend(hash_bytes(self.payment.hash())?);
        match &self.stake {
            Some(StakeCredential::Hash(c)) => bytes.extend(hash_bytes(c.hash())?),
            Some(StakeCredential::Pointer {
                slot,
                tx_index,
                cert_index,
            }) => {
                write_varint(&mut bytes, *slot);
                write_varint(&mut bytes, *tx_index);
                write_varint(&mut bytes, *cert_index);
            }
            None => {}
        }
        Ok(bytes)
    }

    /// `Constr 0 [payment credential, Maybe staking credential]`
    pub fn to_plutus_data(&self) -> Result<PlutusData, PlutusError> {
        let stake = match &self.stake {
            Some(s) => Some(s.to_plutus_data()?),
            None => None,
        };
        Ok(PlutusData::constr(
            0,
            vec![
                self.payment.to_plutus_data()?,
                maybe(stake.as_ref(), PlutusData::clone),
            ],
        ))
    }

    /// Plutus addresses carry no network id, so the caller supplies it.
    pub fn from_plutus_data(data: &PlutusData, network_id: u8) -> Result<Address, PlutusError> {
        match as_constr(data)? {
            (0, [payment, stake]) => Ok(Address {
                network_id,
                payment: Credential::from_plutus_data(payment)?,
                stake: as_maybe(stake, StakeCredential::from_plutus_data)?,
            }),
            _ => Err(PlutusError::UnexpectedShape {
                expected: "address Constr 0 [payment, stake]",
                found: data.to_string(),
            }),
        }
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let bech32 = self.to_bech32().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&bech32)
    }
}

fn hash_bytes(hash_hex: &str) -> Result<Vec<u8>> {
    let bytes = hex::decode(hash_hex).map_err(|e| anyhow!("invalid credential hex: {}", e))?;
    if bytes.len() != HASH_LEN {
        return Err(anyhow!(
            "credential hash must be {} bytes, got {}",
            HASH_LEN,
            bytes.len()
        ));
    }
    Ok(bytes)
}

fn read_varint(cursor: &mut &[u8]) -> Result<u64> {
    let mut value: u64 = 0;
    loop {
        let (byte, rest) = cursor
            .split_first()
            .ok_or_else(|| anyhow!("truncated pointer"))?;
        *cursor = rest;
        value = value
            .checked_mul(128)
            .ok_or_else(|| anyhow!("pointer overflow"))?
            | u64::from(byte & 0x7f);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
}

fn write_varint(out: &mut Vec<u8>, mut value: u64) {
    let mut groups = vec![(value & 0x7f) as u8];
    value >>= 7;
    while value > 0 {
        groups.push((value & 0x7f) as u8 | 0x80);
        value >>= 7;
    }
    out.extend(groups.iter().rev());
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_HASH: &str = "54bac6e3d76cbecc9fc041340ca7ec7eae9f6172e9ad0de432f9292a";
    const STAKE_HASH: &str = "5d32a3e4d3a1dfcf5386c1c18fb9fd6ab4f9dc4b4b1fe6e8a3b4f4f2";

    #[test]
    fn test_enterprise_script_addresses_known() {
        // ChadSwap order script hashes and their published mainnet addresses.
        let addr1 = Address::enterprise(
            1,
            Credential::Script("ea07914e72654ca5a5c5e26a95596e6fa0b5c4c317e43e2f92457ea1".to_string()),
        );
        assert_eq!(
            addr1.to_bech32().unwrap(),
            "addr1w84q0y2wwfj5efd9ch3x492edeh6pdwycvt7g030jfzhagg5ftr54"
        );

        let addr2 = Address::enterprise(
            1,
            Credential::Script("8c66f1ac8b57debcab9a07b3b9b0a5595a5ad76e3bcae756c82efe4f".to_string()),
        );
        assert_eq!(
            addr2.to_bech32().unwrap(),
            "addr1wxxxdudv3dtaa09tngrm8wds54v45kkhdcau4e6keqh0uncksc7pn"
        );
    }

    #[test]
    fn test_bech32_roundtrip_all_kinds() {
        let addresses = vec![
            Address {
                network_id: 1,
                payment: Credential::Key(KEY_HASH.to_string()),
                stake: Some(StakeCredential::Hash(Credential::Key(STAKE_HASH.to_string()))),
            },
            Address {
                network_id: 0,
                payment: Credential::Script(KEY_HASH.to_string()),
                stake: Some(StakeCredential::Hash(Credential::Script(STAKE_HASH.to_string()))),
            },
            Address {
                network_id: 1,
                payment: Credential::Key(KEY_HASH.to_string()),
                stake: Some(StakeCredential::Pointer {
                    slot: 2_498_243,
                    tx_index: 27,
                    cert_index: 3,
                }),
            },
            Address::enterprise(0, Credential::Key(KEY_HASH.to_string())),
        ];
        for address in addresses {
            let text = address.to_bech32().unwrap();
            assert_eq!(Address::from_bech32(&text).unwrap(), address, "{}", text);
        }
    }

    #[test]
    fn test_network_prefix() {
        let testnet = Address::enterprise(0, Credential::Key(KEY_HASH.to_string()));
        assert!(testnet.to_bech32().unwrap().starts_with("addr_test1"));
    }

    #[test]
    fn test_plutus_roundtrip() {
        let address = Address {
            network_id: 1,
            payment: Credential::Key(KEY_HASH.to_string()),
            stake: Some(StakeCredential::Hash(Credential::Key(STAKE_HASH.to_string()))),
        };
        let data = address.to_plutus_data().unwrap();
        assert_eq!(Address::from_plutus_data(&data, 1).unwrap(), address);

        let enterprise = Address::enterprise(1, Credential::Script(KEY_HASH.to_string()));
        let data = enterprise.to_plutus_data().unwrap();
        assert_eq!(
            crate::plutus::encode_cbor(&data).unwrap(),
            format!("d8799fd87a9f581c{}ffd87a80ff", KEY_HASH)
        );
        assert_eq!(Address::from_plutus_data(&data, 1).unwrap(), enterprise);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(Address::from_bech32("not-an-address").is_err());
        assert!(Address::from_bytes(&[0x61, 0x00]).is_err());
        // Reward address type is not a payment address.
        let mut reward = vec![0xe1];
        reward.extend(hex::decode(KEY_HASH).unwrap());
        assert!(Address::from_bytes(&reward).is_err());
        assert!(Address::enterprise(1, Credential::Key("abcd".to_string()))
            .to_bech32()
            .is_err());
    }

    #[test]
    fn test_varint() {
        for n in [0u64, 1, 127, 128, 16_383, 16_384, u32::MAX as u64] {
            let mut out = Vec::new();
            write_varint(&mut out, n);
            let mut cursor = out.as_slice();
            assert_eq!(read_varint(&mut cursor).unwrap(), n);
            assert!(cursor.is_empty());
        }
    }
}
