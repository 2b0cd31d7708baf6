use serde::Serialize;

use super::{check_arity, decode_constr, decode_constr_exact, EncodedDatum, Step};
use crate::config::NetworkConfig;
use crate::errors::{OrderError, OrderErrorCode};
use crate::models::{Address, Asset, Credential};
use crate::plutus::primitives::{as_bytes_hex, as_int, as_maybe, bytes_hex, int, maybe};
use crate::plutus::PlutusData;

const CANCELLER_HASH_LEN: usize = 28;
const DATUM_HASH_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorizationMethodType {
    Signature,
    SpendScript,
    WithdrawScript,
    MintScript,
}

impl AuthorizationMethodType {
    pub const ALL: [AuthorizationMethodType; 4] = [
        AuthorizationMethodType::Signature,
        AuthorizationMethodType::SpendScript,
        AuthorizationMethodType::WithdrawScript,
        AuthorizationMethodType::MintScript,
    ];

    pub fn index(&self) -> u64 {
        match self {
            AuthorizationMethodType::Signature => 0,
            AuthorizationMethodType::SpendScript => 1,
            AuthorizationMethodType::WithdrawScript => 2,
            AuthorizationMethodType::MintScript => 3,
        }
    }

    fn from_index(index: u64) -> Option<AuthorizationMethodType> {
        Self::ALL.iter().copied().find(|t| t.index() == index)
    }
}

/// Who may cancel the order, and through which on-chain mechanism.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationMethod {
    #[serde(rename = "type")]
    pub kind: AuthorizationMethodType,
    pub hash: String,
}

impl AuthorizationMethod {
    pub fn new(kind: AuthorizationMethodType, hash: &str) -> Self {
        Self {
            kind,
            hash: hash.to_lowercase(),
        }
    }

    pub fn to_plutus_data(&self) -> Result<PlutusData, OrderError> {
        Ok(PlutusData::constr(self.kind.index(), vec![bytes_hex(&self.hash)?]))
    }

    pub fn from_plutus_data(data: &PlutusData) -> Result<AuthorizationMethod, OrderError> {
        let (index, fields) = decode_constr_exact(data, "authorization method", 3, 1)?;
        let kind = AuthorizationMethodType::from_index(index).ok_or_else(|| {
            OrderError::new(
                OrderErrorCode::InvalidParameter,
                vec![format!("invalid authorization method index {}", index)],
            )
        })?;
        Ok(AuthorizationMethod {
            kind,
            hash: as_bytes_hex(&fields[0])?,
        })
    }

    /// Credential the canceller would sign or run as.
    pub fn credential(&self) -> Credential {
        match self.kind {
            AuthorizationMethodType::Signature => Credential::Key(self.hash.clone()),
            _ => Credential::Script(self.hash.clone()),
        }
    }
}

/// How a receiver output's own datum is supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "hash", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtraDatum {
    NoDatum,
    DatumHash(String),
    InlineDatum(String),
}

impl ExtraDatum {
    pub fn hash(&self) -> Option<&str> {
        match self {
            ExtraDatum::NoDatum => None,
            ExtraDatum::DatumHash(h) | ExtraDatum::InlineDatum(h) => Some(h),
        }
    }

    pub fn to_plutus_data(&self) -> Result<PlutusData, OrderError> {
        Ok(match self {
            ExtraDatum::NoDatum => PlutusData::constr(0, vec![]),
            ExtraDatum::DatumHash(h) => PlutusData::constr(1, vec![bytes_hex(h)?]),
            ExtraDatum::InlineDatum(h) => PlutusData::constr(2, vec![bytes_hex(h)?]),
        })
    }

    pub fn from_plutus_data(data: &PlutusData) -> Result<ExtraDatum, OrderError> {
        match decode_constr(data, "extra datum")? {
            (0, []) => Ok(ExtraDatum::NoDatum),
            (1, [hash]) => Ok(ExtraDatum::DatumHash(as_bytes_hex(hash)?)),
            (2, [hash]) => Ok(ExtraDatum::InlineDatum(as_bytes_hex(hash)?)),
            (index, _) => Err(OrderError::new(
                OrderErrorCode::InvalidParameter,
                vec![format!("invalid extra datum index {}", index), data.to_string()],
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExpirySetting {
    /// POSIX milliseconds.
    pub expired_time: i128,
    pub max_cancelling_tip: i128,
}

impl ExpirySetting {
    fn to_plutus_data(&self) -> PlutusData {
        PlutusData::List(vec![int(self.expired_time), int(self.max_cancelling_tip)])
    }

    fn from_plutus_data(data: &PlutusData) -> Result<ExpirySetting, OrderError> {
        match data {
            PlutusData::List(items) if items.len() == 2 => Ok(ExpirySetting {
                expired_time: as_int(&items[0])?,
                max_cancelling_tip: as_int(&items[1])?,
            }),
            other => Err(OrderError::new(
                OrderErrorCode::InvalidParameter,
                vec!["expiry setting must be [expiredTime, maxCancellingTip]".to_string(), other.to_string()],
            )),
        }
    }
}

/// The datum locked with every V2 order output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDatum {
    pub canceller: AuthorizationMethod,
    pub refund_receiver: Address,
    pub refund_receiver_datum: ExtraDatum,
    pub success_receiver: Address,
    pub success_receiver_datum: ExtraDatum,
    pub lp_asset: Asset,
    pub step: Step,
    pub max_batcher_fee: i128,
    pub expiry_setting: Option<ExpirySetting>,
}

impl OrderDatum {
    pub fn to_plutus_data(&self) -> Result<PlutusData, OrderError> {
        Ok(PlutusData::constr(
            0,
            vec![
                self.canceller.to_plutus_data()?,
                self.refund_receiver.to_plutus_data()?,
                self.refund_receiver_datum.to_plutus_data()?,
                self.success_receiver.to_plutus_data()?,
                self.success_receiver_datum.to_plutus_data()?,
                self.lp_asset.to_plutus_data()?,
                self.step.to_plutus_data()?,
                int(self.max_batcher_fee),
                maybe(self.expiry_setting.as_ref(), ExpirySetting::to_plutus_data),
            ],
        ))
    }

    /// Plutus addresses carry no network id; `network_id` fills it in.
    pub fn from_plutus_data(data: &PlutusData, network_id: u8) -> Result<OrderDatum, OrderError> {
        let (index, fields) = decode_constr(data, "order datum")?;
        order_ensure!(
            index == 0,
            OrderErrorCode::InvalidParameter,
            format!("invalid order datum index {}", index),
            data
        );
        check_arity("order datum", data, fields, 9)?;

        Ok(OrderDatum {
            canceller: AuthorizationMethod::from_plutus_data(&fields[0])?,
            refund_receiver: Address::from_plutus_data(&fields[1], network_id)?,
            refund_receiver_datum: ExtraDatum::from_plutus_data(&fields[2])?,
            success_receiver: Address::from_plutus_data(&fields[3], network_id)?,
            success_receiver_datum: ExtraDatum::from_plutus_data(&fields[4])?,
            lp_asset: Asset::from_plutus_data(&fields[5])?,
            step: Step::from_plutus_data(&fields[6])?,
            max_batcher_fee: as_int(&fields[7])?,
            expiry_setting: as_maybe(&fields[8], ExpirySetting::from_plutus_data)?,
        })
    }

    pub fn encode(&self) -> Result<EncodedDatum, OrderError> {
        Ok(EncodedDatum::from_plutus_data(&self.to_plutus_data()?)?)
    }

    pub fn decode(encoded: &EncodedDatum, network_id: u8) -> Result<OrderDatum, OrderError> {
        let data = encoded.to_plutus_data()?;
        let datum = OrderDatum::from_plutus_data(&data, network_id)?;
        tracing::debug!(step = ?datum.step.step_type(), "decoded order datum");
        Ok(datum)
    }

    pub fn validate_on_chain_constraint(&self, config: &NetworkConfig) -> Result<(), OrderError> {
        order_ensure!(
            self.max_batcher_fee > 0,
            OrderErrorCode::MissingBatcherFee,
            format!("max batcher fee must be positive: {}", self.max_batcher_fee)
        );
        let canceller_len = self.canceller.hash.len() / 2;
        order_ensure!(
            canceller_len == CANCELLER_HASH_LEN,
            OrderErrorCode::InvalidParameter,
            format!("canceller hash must be {} bytes, got {}", CANCELLER_HASH_LEN, canceller_len)
        );
        for (name, extra) in [
            ("refund receiver datum", &self.refund_receiver_datum),
            ("success receiver datum", &self.success_receiver_datum),
        ] {
            if let Some(hash) = extra.hash() {
                let len = hash.len() / 2;
                order_ensure!(
                    len == DATUM_HASH_LEN,
                    OrderErrorCode::InvalidParameter,
                    format!("{} hash must be {} bytes, got {}", name, DATUM_HASH_LEN, len)
                );
            }
        }
        order_ensure!(
            self.lp_asset.policy_id == config.lp_policy_id,
            OrderErrorCode::InvalidParameter,
            format!("LP asset policy {} is not the pool LP policy", self.lp_asset.policy_id)
        );
        if let Some(expiry) = &self.expiry_setting {
            order_ensure!(
                expiry.max_cancelling_tip >= 0,
                OrderErrorCode::InvalidParameter,
                format!("max cancelling tip must not be negative: {}", expiry.max_cancelling_tip)
            );
        }
        self.step.validate_on_chain_constraint(&config.lp_policy_id)
    }

    /// The party that can cancel this order: the refund receiver or success
    /// receiver when its payment credential is the canceller's hash, otherwise
    /// an enterprise address built from the canceller itself.
    pub fn canceller_address(&self, network_id: u8) -> Address {
        let hash = self.canceller.hash.as_str();
        if self.refund_receiver.payment_credential().hash() == hash {
            return self.refund_receiver.clone();
        }
        if self.success_receiver.payment_credential().hash() == hash {
            return self.success_receiver.clone();
        }
        Address::enterprise(network_id, self.canceller.credential())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::StakeCredential;
    use crate::order::step::tests::{sample_step, LP_POLICY};
    use crate::order::StepType;
    use rstest::rstest;

    pub(crate) const OWNER_KEY: &str = "54bac6e3d76cbecc9fc041340ca7ec7eae9f6172e9ad0de432f9292a";
    const OWNER_STAKE: &str = "b6c8794e9a7a26599440a4d0fd79cd07644d15917ff13694b78f1f06";
    const OTHER_KEY: &str = "1eae96baf29e27682ea3f815aba361a0c6059d45e4bfbe95bbd2f44a";
    const LP_NAME: &str = "82e2b1fd27a7712a1a9cf750dfbea1a5778611b20e06dd6a611df7a643f8cb75";

    pub(crate) fn owner_address() -> Address {
        Address {
            network_id: 1,
            payment: Credential::Key(OWNER_KEY.to_string()),
            stake: Some(StakeCredential::Hash(Credential::Key(OWNER_STAKE.to_string()))),
        }
    }

    pub(crate) fn sample_datum(step: Step, max_batcher_fee: i128) -> OrderDatum {
        OrderDatum {
            canceller: AuthorizationMethod::new(AuthorizationMethodType::Signature, OWNER_KEY),
            refund_receiver: owner_address(),
            refund_receiver_datum: ExtraDatum::NoDatum,
            success_receiver: owner_address(),
            success_receiver_datum: ExtraDatum::NoDatum,
            lp_asset: Asset::new(LP_POLICY, LP_NAME),
            step,
            max_batcher_fee,
            expiry_setting: None,
        }
    }

    fn captured_swap_exact_out_hex() -> String {
        let address = format!(
            "d8799fd8799f581c{}ffd8799fd8799fd8799f581c{}ffffffff",
            OWNER_KEY, OWNER_STAKE
        );
        format!(
            "d8799fd8799f581c{owner}ff{addr}d87980{addr}d87980d8799f581c{lp}5820{name}ff\
             d87c9fd87a80d8799f1a000f4240ff1a00989680d87980ff1a000aae60d87a80ff",
            owner = OWNER_KEY,
            addr = address,
            lp = LP_POLICY,
            name = LP_NAME,
        )
    }

    #[test]
    fn test_decode_captured_swap_exact_out() {
        let hex = captured_swap_exact_out_hex();
        assert!(hex.starts_with("d8799fd8799f581c54bac6e3d76cbecc9fc041340ca7ec7eae9f6172e9ad0de432f9292affd8799f"));
        assert!(hex.ends_with("1a000aae60d87a80ff"));

        let encoded = EncodedDatum::new(&hex);
        let datum = OrderDatum::decode(&encoded, 1).unwrap();
        assert_eq!(datum.step.step_type(), StepType::SwapExactOut);
        assert_eq!(
            datum.step,
            Step::SwapExactOut {
                direction: crate::order::Direction::AToB,
                maximum_swap_amount_option: crate::order::SwapAmountOption::SpecificAmount {
                    swap_amount: 1_000_000
                },
                expected_received: 10_000_000,
                killable: crate::order::Killable::PendingOnFailed,
            }
        );
        assert_eq!(datum.max_batcher_fee, 700_000);
        assert_eq!(datum.expiry_setting, None);
        assert_eq!(datum.refund_receiver, owner_address());
        assert_eq!(datum.encode().unwrap(), encoded);
    }

    #[test]
    fn test_roundtrip_every_step_and_option() {
        let expiries = [
            None,
            Some(ExpirySetting {
                expired_time: 0,
                max_cancelling_tip: 0,
            }),
            Some(ExpirySetting {
                expired_time: 1_718_000_000_000,
                max_cancelling_tip: u64::MAX as i128,
            }),
        ];
        let extras = [
            ExtraDatum::NoDatum,
            ExtraDatum::DatumHash("ab".repeat(32)),
            ExtraDatum::InlineDatum("cd".repeat(32)),
        ];
        for step_type in StepType::ALL {
            for expiry in expiries {
                for extra in &extras {
                    let mut datum = sample_datum(sample_step(step_type, 5, 7), 1);
                    datum.expiry_setting = expiry;
                    datum.success_receiver_datum = extra.clone();
                    datum.success_receiver =
                        Address::enterprise(1, Credential::Script(OTHER_KEY.to_string()));
                    let encoded = datum.encode().unwrap();
                    assert_eq!(OrderDatum::decode(&encoded, 1).unwrap(), datum);
                }
            }
        }
    }

    #[test]
    fn test_rejects_bad_shapes() {
        let datum = sample_datum(Step::Donation, 1).to_plutus_data().unwrap();
        let PlutusData::Constr { fields, .. } = datum else {
            panic!("datum must encode as constr");
        };

        let err = OrderDatum::from_plutus_data(&PlutusData::constr(1, fields.clone()), 1).unwrap_err();
        assert_eq!(err.code, OrderErrorCode::InvalidParameter);

        let err =
            OrderDatum::from_plutus_data(&PlutusData::constr(0, fields[..8].to_vec()), 1).unwrap_err();
        assert_eq!(err.code, OrderErrorCode::InvalidParameter);

        let mut bad_expiry = fields.clone();
        bad_expiry[8] = PlutusData::constr(0, vec![PlutusData::List(vec![int(1)])]);
        let err = OrderDatum::from_plutus_data(&PlutusData::constr(0, bad_expiry), 1).unwrap_err();
        assert_eq!(err.code, OrderErrorCode::InvalidParameter);

        let mut bad_fee = fields;
        bad_fee[7] = PlutusData::Bytes(vec![]);
        let err = OrderDatum::from_plutus_data(&PlutusData::constr(0, bad_fee), 1).unwrap_err();
        assert_eq!(err.code, OrderErrorCode::InvalidDatum);

        let err = OrderDatum::decode(&EncodedDatum::new("not hex"), 1).unwrap_err();
        assert_eq!(err.code, OrderErrorCode::InvalidDatum);
    }

    #[test]
    fn test_extra_datum_and_auth_tags() {
        let err = ExtraDatum::from_plutus_data(&PlutusData::constr(3, vec![])).unwrap_err();
        assert_eq!(err.code, OrderErrorCode::InvalidParameter);
        let err = ExtraDatum::from_plutus_data(&PlutusData::constr(0, vec![int(1)])).unwrap_err();
        assert_eq!(err.code, OrderErrorCode::InvalidParameter);

        let err = AuthorizationMethod::from_plutus_data(&PlutusData::constr(
            4,
            vec![PlutusData::Bytes(vec![0; 28])],
        ))
        .unwrap_err();
        assert_eq!(err.code, OrderErrorCode::InvalidParameter);
        for kind in AuthorizationMethodType::ALL {
            let auth = AuthorizationMethod::new(kind, OWNER_KEY);
            let data = auth.to_plutus_data().unwrap();
            assert_eq!(AuthorizationMethod::from_plutus_data(&data).unwrap(), auth);
        }
    }

    #[test]
    fn test_on_chain_constraints() {
        let config = NetworkConfig::mainnet();
        let valid = sample_datum(sample_step(StepType::SwapExactIn, 10, 10), 700_000);
        valid.validate_on_chain_constraint(&config).unwrap();

        let mut datum = valid.clone();
        datum.max_batcher_fee = 0;
        assert_eq!(
            datum.validate_on_chain_constraint(&config).unwrap_err().code,
            OrderErrorCode::MissingBatcherFee
        );

        let mut datum = valid.clone();
        datum.canceller.hash = "ab".repeat(27);
        assert_eq!(
            datum.validate_on_chain_constraint(&config).unwrap_err().code,
            OrderErrorCode::InvalidParameter
        );

        let mut datum = valid.clone();
        datum.refund_receiver_datum = ExtraDatum::DatumHash("ab".repeat(28));
        assert_eq!(
            datum.validate_on_chain_constraint(&config).unwrap_err().code,
            OrderErrorCode::InvalidParameter
        );

        let mut datum = valid.clone();
        datum.success_receiver_datum = ExtraDatum::InlineDatum("ab".repeat(32));
        datum.validate_on_chain_constraint(&config).unwrap();

        let mut datum = valid.clone();
        datum.lp_asset.policy_id = "00".repeat(28);
        assert_eq!(
            datum.validate_on_chain_constraint(&config).unwrap_err().code,
            OrderErrorCode::InvalidParameter
        );
        assert!(valid
            .validate_on_chain_constraint(&NetworkConfig::testnet())
            .is_err());

        let mut datum = valid.clone();
        datum.expiry_setting = Some(ExpirySetting {
            expired_time: 1,
            max_cancelling_tip: -1,
        });
        assert_eq!(
            datum.validate_on_chain_constraint(&config).unwrap_err().code,
            OrderErrorCode::InvalidParameter
        );

        let mut datum = valid;
        datum.step = sample_step(StepType::SwapExactIn, 10, 0);
        assert_eq!(
            datum.validate_on_chain_constraint(&config).unwrap_err().code,
            OrderErrorCode::InvalidParameter
        );
    }

    #[rstest]
    #[case(AuthorizationMethodType::Signature, false)]
    #[case(AuthorizationMethodType::SpendScript, true)]
    #[case(AuthorizationMethodType::WithdrawScript, true)]
    #[case(AuthorizationMethodType::MintScript, true)]
    fn test_canceller_address(#[case] kind: AuthorizationMethodType, #[case] script: bool) {
        let other = Address::enterprise(1, Credential::Script(OTHER_KEY.to_string()));

        let mut datum = sample_datum(Step::Donation, 1);
        datum.canceller = AuthorizationMethod::new(kind, OWNER_KEY);
        datum.success_receiver = other.clone();
        assert_eq!(datum.canceller_address(1), owner_address());

        datum.refund_receiver = other.clone();
        datum.success_receiver = owner_address();
        assert_eq!(datum.canceller_address(1), owner_address());

        datum.success_receiver = other;
        let synthesized = datum.canceller_address(0);
        assert_eq!(synthesized.network_id, 0);
        assert_eq!(synthesized.stake, None);
        assert_eq!(synthesized.payment.hash(), OWNER_KEY);
        assert_eq!(synthesized.payment.is_script(), script);
    }
}
