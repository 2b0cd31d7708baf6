//! The order step: what an order asks the batcher to do.
//!
//! Each step is a constructor whose index selects the variant and whose
//! field count is fixed per variant:
//!
//! | index | step               | fields |
//! |-------|--------------------|--------|
//! | 0     | SwapExactIn        | 4      |
//! | 1     | StopLoss           | 3      |
//! | 2     | Oco                | 4      |
//! | 3     | SwapExactOut       | 4      |
//! | 4     | Deposit            | 3      |
//! | 5     | Withdraw           | 4      |
//! | 6     | ZapOut             | 4      |
//! | 7     | PartialSwap        | 7      |
//! | 8     | WithdrawImbalance  | 5      |
//! | 9     | SwapMultiRouting   | 3      |
//! | 10    | Donation           | 0      |

use serde::{Deserialize, Serialize};

use super::{check_arity, decode_constr, decode_constr_exact, EncodedStep};
use crate::errors::{OrderError, OrderErrorCode};
use crate::models::Asset;
use crate::plutus::primitives::{as_int, as_list, int, list};
use crate::plutus::PlutusData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepType {
    SwapExactIn,
    StopLoss,
    Oco,
    SwapExactOut,
    Deposit,
    Withdraw,
    ZapOut,
    PartialSwap,
    WithdrawImbalance,
    SwapMultiRouting,
    Donation,
}

impl StepType {
    pub const ALL: [StepType; 11] = [
        StepType::SwapExactIn,
        StepType::StopLoss,
        StepType::Oco,
        StepType::SwapExactOut,
        StepType::Deposit,
        StepType::Withdraw,
        StepType::ZapOut,
        StepType::PartialSwap,
        StepType::WithdrawImbalance,
        StepType::SwapMultiRouting,
        StepType::Donation,
    ];

    pub fn index(&self) -> u64 {
        match self {
            StepType::SwapExactIn => 0,
            StepType::StopLoss => 1,
            StepType::Oco => 2,
            StepType::SwapExactOut => 3,
            StepType::Deposit => 4,
            StepType::Withdraw => 5,
            StepType::ZapOut => 6,
            StepType::PartialSwap => 7,
            StepType::WithdrawImbalance => 8,
            StepType::SwapMultiRouting => 9,
            StepType::Donation => 10,
        }
    }

    pub fn from_index(index: u64) -> Option<StepType> {
        StepType::ALL.iter().copied().find(|t| t.index() == index)
    }

    pub fn field_count(&self) -> usize {
        match self {
            StepType::SwapExactIn => 4,
            StepType::StopLoss => 3,
            StepType::Oco => 4,
            StepType::SwapExactOut => 4,
            StepType::Deposit => 3,
            StepType::Withdraw => 4,
            StepType::ZapOut => 4,
            StepType::PartialSwap => 7,
            StepType::WithdrawImbalance => 5,
            StepType::SwapMultiRouting => 3,
            StepType::Donation => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    BToA,
    AToB,
}

impl Direction {
    pub fn to_plutus_data(&self) -> PlutusData {
        let index = match self {
            Direction::BToA => 0,
            Direction::AToB => 1,
        };
        PlutusData::constr(index, vec![])
    }

    pub fn from_plutus_data(data: &PlutusData) -> Result<Direction, OrderError> {
        match decode_constr_exact(data, "direction", 1, 0)? {
            (0, _) => Ok(Direction::BToA),
            _ => Ok(Direction::AToB),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Killable {
    PendingOnFailed,
    KillOnFailed,
}

impl Killable {
    pub fn to_plutus_data(&self) -> PlutusData {
        let index = match self {
            Killable::PendingOnFailed => 0,
            Killable::KillOnFailed => 1,
        };
        PlutusData::constr(index, vec![])
    }

    pub fn from_plutus_data(data: &PlutusData) -> Result<Killable, OrderError> {
        match decode_constr_exact(data, "killable", 1, 0)? {
            (0, _) => Ok(Killable::PendingOnFailed),
            _ => Ok(Killable::KillOnFailed),
        }
    }
}

/// `available - deducted`, failing instead of wrapping when the deduction
/// is out of range for what the order holds.
fn deduct(available: i128, deducted: i128) -> Result<i128, OrderError> {
    available.checked_sub(deducted).ok_or_else(|| {
        OrderError::new(
            OrderErrorCode::InvalidValue,
            vec![format!("deducted amount {} from held {}", deducted, available)],
        )
    })
}

/// How much of the input asset a swap consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwapAmountOption {
    SpecificAmount { swap_amount: i128 },
    All { deducted_amount: i128 },
}

impl SwapAmountOption {
    /// Amount actually swapped given what the order holds of the input asset.
    pub fn realize(&self, available: i128) -> Result<i128, OrderError> {
        match self {
            SwapAmountOption::SpecificAmount { swap_amount } => Ok(*swap_amount),
            SwapAmountOption::All { deducted_amount } => deduct(available, *deducted_amount),
        }
    }

    pub fn validate(&self) -> Result<(), OrderError> {
        match self {
            SwapAmountOption::SpecificAmount { swap_amount } => {
                order_ensure!(
                    *swap_amount > 0,
                    OrderErrorCode::InvalidParameter,
                    format!("swap amount must be positive: {}", swap_amount)
                );
            }
            SwapAmountOption::All { deducted_amount } => {
                order_ensure!(
                    *deducted_amount >= 0,
                    OrderErrorCode::InvalidParameter,
                    format!("deducted amount must not be negative: {}", deducted_amount)
                );
            }
        }
        Ok(())
    }

    pub fn to_plutus_data(&self) -> PlutusData {
        match self {
            SwapAmountOption::SpecificAmount { swap_amount } => {
                PlutusData::constr(0, vec![int(*swap_amount)])
            }
            SwapAmountOption::All { deducted_amount } => {
                PlutusData::constr(1, vec![int(*deducted_amount)])
            }
        }
    }

    pub fn from_plutus_data(data: &PlutusData) -> Result<SwapAmountOption, OrderError> {
        let (index, fields) = decode_constr_exact(data, "swap amount option", 1, 1)?;
        let amount = as_int(&fields[0])?;
        Ok(match index {
            0 => SwapAmountOption::SpecificAmount {
                swap_amount: amount,
            },
            _ => SwapAmountOption::All {
                deducted_amount: amount,
            },
        })
    }
}

/// How much of each pool asset a deposit consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DepositAmountOption {
    SpecificAmount {
        deposit_amount_a: i128,
        deposit_amount_b: i128,
    },
    All {
        deducted_amount_a: i128,
        deducted_amount_b: i128,
    },
}

impl DepositAmountOption {
    pub fn realize(&self, available_a: i128, available_b: i128) -> Result<(i128, i128), OrderError> {
        match self {
            DepositAmountOption::SpecificAmount {
                deposit_amount_a,
                deposit_amount_b,
            } => Ok((*deposit_amount_a, *deposit_amount_b)),
            DepositAmountOption::All {
                deducted_amount_a,
                deducted_amount_b,
            } => Ok((
                deduct(available_a, *deducted_amount_a)?,
                deduct(available_b, *deducted_amount_b)?,
            )),
        }
    }

    pub fn validate(&self) -> Result<(), OrderError> {
        match self {
            DepositAmountOption::SpecificAmount {
                deposit_amount_a: a,
                deposit_amount_b: b,
            } => {
                order_ensure!(
                    *a >= 0 && *b >= 0 && (*a > 0 || *b > 0),
                    OrderErrorCode::InvalidParameter,
                    format!("invalid deposit amounts: {} / {}", a, b)
                );
            }
            DepositAmountOption::All {
                deducted_amount_a: a,
                deducted_amount_b: b,
            } => {
                order_ensure!(
                    *a >= 0 && *b >= 0,
                    OrderErrorCode::InvalidParameter,
                    format!("deducted amounts must not be negative: {} / {}", a, b)
                );
            }
        }
        Ok(())
    }

    pub fn to_plutus_data(&self) -> PlutusData {
        match self {
            DepositAmountOption::SpecificAmount {
                deposit_amount_a,
                deposit_amount_b,
            } => PlutusData::constr(0, vec![int(*deposit_amount_a), int(*deposit_amount_b)]),
            DepositAmountOption::All {
                deducted_amount_a,
                deducted_amount_b,
            } => PlutusData::constr(1, vec![int(*deducted_amount_a), int(*deducted_amount_b)]),
        }
    }

    pub fn from_plutus_data(data: &PlutusData) -> Result<DepositAmountOption, OrderError> {
        let (index, fields) = decode_constr_exact(data, "deposit amount option", 1, 2)?;
        let a = as_int(&fields[0])?;
        let b = as_int(&fields[1])?;
        Ok(match index {
            0 => DepositAmountOption::SpecificAmount {
                deposit_amount_a: a,
                deposit_amount_b: b,
            },
            _ => DepositAmountOption::All {
                deducted_amount_a: a,
                deducted_amount_b: b,
            },
        })
    }
}

/// How many LP tokens a withdrawal burns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WithdrawAmountOption {
    SpecificAmount { withdrawal_lp_amount: i128 },
    All { deducted_lp_amount: i128 },
}

impl WithdrawAmountOption {
    pub fn realize(&self, available_lp: i128) -> Result<i128, OrderError> {
        match self {
            WithdrawAmountOption::SpecificAmount {
                withdrawal_lp_amount,
            } => Ok(*withdrawal_lp_amount),
            WithdrawAmountOption::All { deducted_lp_amount } => {
                deduct(available_lp, *deducted_lp_amount)
            }
        }
    }

    pub fn validate(&self) -> Result<(), OrderError> {
        match self {
            WithdrawAmountOption::SpecificAmount {
                withdrawal_lp_amount,
            } => {
                order_ensure!(
                    *withdrawal_lp_amount > 0,
                    OrderErrorCode::InvalidParameter,
                    format!("withdrawal LP amount must be positive: {}", withdrawal_lp_amount)
                );
            }
            WithdrawAmountOption::All { deducted_lp_amount } => {
                order_ensure!(
                    *deducted_lp_amount >= 0,
                    OrderErrorCode::InvalidParameter,
                    format!("deducted LP amount must not be negative: {}", deducted_lp_amount)
                );
            }
        }
        Ok(())
    }

    pub fn to_plutus_data(&self) -> PlutusData {
        match self {
            WithdrawAmountOption::SpecificAmount {
                withdrawal_lp_amount,
            } => PlutusData::constr(0, vec![int(*withdrawal_lp_amount)]),
            WithdrawAmountOption::All { deducted_lp_amount } => {
                PlutusData::constr(1, vec![int(*deducted_lp_amount)])
            }
        }
    }

    pub fn from_plutus_data(data: &PlutusData) -> Result<WithdrawAmountOption, OrderError> {
        let (index, fields) = decode_constr_exact(data, "withdraw amount option", 1, 1)?;
        let amount = as_int(&fields[0])?;
        Ok(match index {
            0 => WithdrawAmountOption::SpecificAmount {
                withdrawal_lp_amount: amount,
            },
            _ => WithdrawAmountOption::All {
                deducted_lp_amount: amount,
            },
        })
    }
}

/// One hop of a multi-pool route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub lp_asset: Asset,
    pub direction: Direction,
}

impl Route {
    pub fn to_plutus_data(&self) -> Result<PlutusData, OrderError> {
        Ok(PlutusData::constr(
            0,
            vec![self.lp_asset.to_plutus_data()?, self.direction.to_plutus_data()],
        ))
    }

    pub fn from_plutus_data(data: &PlutusData) -> Result<Route, OrderError> {
        let (_, fields) = decode_constr_exact(data, "route", 0, 2)?;
        Ok(Route {
            lp_asset: Asset::from_plutus_data(&fields[0])?,
            direction: Direction::from_plutus_data(&fields[1])?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Step {
    SwapExactIn {
        direction: Direction,
        swap_amount_option: SwapAmountOption,
        minimum_received: i128,
        killable: Killable,
    },
    StopLoss {
        direction: Direction,
        swap_amount_option: SwapAmountOption,
        stop_loss_received: i128,
    },
    Oco {
        direction: Direction,
        swap_amount_option: SwapAmountOption,
        minimum_received: i128,
        stop_loss_received: i128,
    },
    SwapExactOut {
        direction: Direction,
        maximum_swap_amount_option: SwapAmountOption,
        expected_received: i128,
        killable: Killable,
    },
    Deposit {
        deposit_amount_option: DepositAmountOption,
        minimum_lp: i128,
        killable: Killable,
    },
    Withdraw {
        withdrawal_amount_option: WithdrawAmountOption,
        minimum_asset_a: i128,
        minimum_asset_b: i128,
        killable: Killable,
    },
    ZapOut {
        direction: Direction,
        withdrawal_amount_option: WithdrawAmountOption,
        minimum_received: i128,
        killable: Killable,
    },
    PartialSwap {
        direction: Direction,
        total_swap_amount: i128,
        io_ratio_numerator: i128,
        io_ratio_denominator: i128,
        hops: i128,
        minimum_swap_amount_required: i128,
        max_batcher_fee_each_time: i128,
    },
    WithdrawImbalance {
        withdrawal_amount_option: WithdrawAmountOption,
        ratio_asset_a: i128,
        ratio_asset_b: i128,
        minimum_asset_a: i128,
        killable: Killable,
    },
    SwapMultiRouting {
        routings: Vec<Route>,
        swap_amount_option: SwapAmountOption,
        minimum_received: i128,
    },
    Donation,
}

fn ensure_positive(name: &str, value: i128) -> Result<(), OrderError> {
    order_ensure!(
        value > 0,
        OrderErrorCode::InvalidParameter,
        format!("{} must be positive: {}", name, value)
    );
    Ok(())
}

impl Step {
    pub fn step_type(&self) -> StepType {
        match self {
            Step::SwapExactIn { .. } => StepType::SwapExactIn,
            Step::StopLoss { .. } => StepType::StopLoss,
            Step::Oco { .. } => StepType::Oco,
            Step::SwapExactOut { .. } => StepType::SwapExactOut,
            Step::Deposit { .. } => StepType::Deposit,
            Step::Withdraw { .. } => StepType::Withdraw,
            Step::ZapOut { .. } => StepType::ZapOut,
            Step::PartialSwap { .. } => StepType::PartialSwap,
            Step::WithdrawImbalance { .. } => StepType::WithdrawImbalance,
            Step::SwapMultiRouting { .. } => StepType::SwapMultiRouting,
            Step::Donation => StepType::Donation,
        }
    }

    /// Swap direction for the steps that have one. Routing orders report the
    /// direction of their first hop.
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Step::SwapExactIn { direction, .. }
            | Step::StopLoss { direction, .. }
            | Step::Oco { direction, .. }
            | Step::SwapExactOut { direction, .. }
            | Step::ZapOut { direction, .. }
            | Step::PartialSwap { direction, .. } => Some(*direction),
            Step::SwapMultiRouting { routings, .. } => routings.first().map(|r| r.direction),
            Step::Deposit { .. }
            | Step::Withdraw { .. }
            | Step::WithdrawImbalance { .. }
            | Step::Donation => None,
        }
    }

    pub fn to_plutus_data(&self) -> Result<PlutusData, OrderError> {
        let fields = match self {
            Step::SwapExactIn {
                direction,
                swap_amount_option,
                minimum_received,
                killable,
            } => vec![
                direction.to_plutus_data(),
                swap_amount_option.to_plutus_data(),
                int(*minimum_received),
                killable.to_plutus_data(),
            ],
            Step::StopLoss {
                direction,
                swap_amount_option,
                stop_loss_received,
            } => vec![
                direction.to_plutus_data(),
                swap_amount_option.to_plutus_data(),
                int(*stop_loss_received),
            ],
            Step::Oco {
                direction,
                swap_amount_option,
                minimum_received,
                stop_loss_received,
            } => vec![
                direction.to_plutus_data(),
                swap_amount_option.to_plutus_data(),
                int(*minimum_received),
                int(*stop_loss_received),
            ],
            Step::SwapExactOut {
                direction,
                maximum_swap_amount_option,
                expected_received,
                killable,
            } => vec![
                direction.to_plutus_data(),
                maximum_swap_amount_option.to_plutus_data(),
                int(*expected_received),
                killable.to_plutus_data(),
            ],
            Step::Deposit {
                deposit_amount_option,
                minimum_lp,
                killable,
            } => vec![
                deposit_amount_option.to_plutus_data(),
                int(*minimum_lp),
                killable.to_plutus_data(),
            ],
            Step::Withdraw {
                withdrawal_amount_option,
                minimum_asset_a,
                minimum_asset_b,
                killable,
            } => vec![
                withdrawal_amount_option.to_plutus_data(),
                int(*minimum_asset_a),
                int(*minimum_asset_b),
                killable.to_plutus_data(),
            ],
            Step::ZapOut {
                direction,
                withdrawal_amount_option,
                minimum_received,
                killable,
            } => vec![
                direction.to_plutus_data(),
                withdrawal_amount_option.to_plutus_data(),
                int(*minimum_received),
                killable.to_plutus_data(),
            ],
            Step::PartialSwap {
                direction,
                total_swap_amount,
                io_ratio_numerator,
                io_ratio_denominator,
                hops,
                minimum_swap_amount_required,
                max_batcher_fee_each_time,
            } => vec![
                direction.to_plutus_data(),
                int(*total_swap_amount),
                int(*io_ratio_numerator),
                int(*io_ratio_denominator),
                int(*hops),
                int(*minimum_swap_amount_required),
                int(*max_batcher_fee_each_time),
            ],
            Step::WithdrawImbalance {
                withdrawal_amount_option,
                ratio_asset_a,
                ratio_asset_b,
                minimum_asset_a,
                killable,
            } => vec![
                withdrawal_amount_option.to_plutus_data(),
                int(*ratio_asset_a),
                int(*ratio_asset_b),
                int(*minimum_asset_a),
                killable.to_plutus_data(),
            ],
            Step::SwapMultiRouting {
                routings,
                swap_amount_option,
                minimum_received,
            } => {
                let routes = routings
                    .iter()
                    .map(Route::to_plutus_data)
                    .collect::<Result<Vec<_>, _>>()?;
                vec![
                    list(&routes, PlutusData::clone),
                    swap_amount_option.to_plutus_data(),
                    int(*minimum_received),
                ]
            }
            Step::Donation => vec![],
        };
        Ok(PlutusData::constr(self.step_type().index(), fields))
    }

    pub fn from_plutus_data(data: &PlutusData) -> Result<Step, OrderError> {
        let (index, fields) = decode_constr(data, "step")?;
        let step_type = StepType::from_index(index).ok_or_else(|| {
            OrderError::new(
                OrderErrorCode::InvalidParameter,
                vec![format!("invalid step index {}", index), data.to_string()],
            )
        })?;
        check_arity("step", data, fields, step_type.field_count())?;

        let f = fields;
        let step = match step_type {
            StepType::SwapExactIn => Step::SwapExactIn {
                direction: Direction::from_plutus_data(&f[0])?,
                swap_amount_option: SwapAmountOption::from_plutus_data(&f[1])?,
                minimum_received: as_int(&f[2])?,
                killable: Killable::from_plutus_data(&f[3])?,
            },
            StepType::StopLoss => Step::StopLoss {
                direction: Direction::from_plutus_data(&f[0])?,
                swap_amount_option: SwapAmountOption::from_plutus_data(&f[1])?,
                stop_loss_received: as_int(&f[2])?,
            },
            StepType::Oco => Step::Oco {
                direction: Direction::from_plutus_data(&f[0])?,
                swap_amount_option: SwapAmountOption::from_plutus_data(&f[1])?,
                minimum_received: as_int(&f[2])?,
                stop_loss_received: as_int(&f[3])?,
            },
            StepType::SwapExactOut => Step::SwapExactOut {
                direction: Direction::from_plutus_data(&f[0])?,
                maximum_swap_amount_option: SwapAmountOption::from_plutus_data(&f[1])?,
                expected_received: as_int(&f[2])?,
                killable: Killable::from_plutus_data(&f[3])?,
            },
            StepType::Deposit => Step::Deposit {
                deposit_amount_option: DepositAmountOption::from_plutus_data(&f[0])?,
                minimum_lp: as_int(&f[1])?,
                killable: Killable::from_plutus_data(&f[2])?,
            },
            StepType::Withdraw => Step::Withdraw {
                withdrawal_amount_option: WithdrawAmountOption::from_plutus_data(&f[0])?,
                minimum_asset_a: as_int(&f[1])?,
                minimum_asset_b: as_int(&f[2])?,
                killable: Killable::from_plutus_data(&f[3])?,
            },
            StepType::ZapOut => Step::ZapOut {
                direction: Direction::from_plutus_data(&f[0])?,
                withdrawal_amount_option: WithdrawAmountOption::from_plutus_data(&f[1])?,
                minimum_received: as_int(&f[2])?,
                killable: Killable::from_plutus_data(&f[3])?,
            },
            StepType::PartialSwap => Step::PartialSwap {
                direction: Direction::from_plutus_data(&f[0])?,
                total_swap_amount: as_int(&f[1])?,
                io_ratio_numerator: as_int(&f[2])?,
                io_ratio_denominator: as_int(&f[3])?,
                hops: as_int(&f[4])?,
                minimum_swap_amount_required: as_int(&f[5])?,
                max_batcher_fee_each_time: as_int(&f[6])?,
            },
            StepType::WithdrawImbalance => Step::WithdrawImbalance {
                withdrawal_amount_option: WithdrawAmountOption::from_plutus_data(&f[0])?,
                ratio_asset_a: as_int(&f[1])?,
                ratio_asset_b: as_int(&f[2])?,
                minimum_asset_a: as_int(&f[3])?,
                killable: Killable::from_plutus_data(&f[4])?,
            },
            StepType::SwapMultiRouting => Step::SwapMultiRouting {
                routings: as_list(&f[0], Route::from_plutus_data)?,
                swap_amount_option: SwapAmountOption::from_plutus_data(&f[1])?,
                minimum_received: as_int(&f[2])?,
            },
            StepType::Donation => Step::Donation,
        };
        Ok(step)
    }

    pub fn encode(&self) -> Result<EncodedStep, OrderError> {
        Ok(EncodedStep::from_plutus_data(&self.to_plutus_data()?)?)
    }

    pub fn decode(encoded: &EncodedStep) -> Result<Step, OrderError> {
        Step::from_plutus_data(&encoded.to_plutus_data()?)
    }

    /// Per-step rules the order validator enforces on chain.
    pub fn validate_on_chain_constraint(&self, lp_policy_id: &str) -> Result<(), OrderError> {
        match self {
            Step::SwapExactIn {
                swap_amount_option,
                minimum_received,
                ..
            } => {
                swap_amount_option.validate()?;
                ensure_positive("minimum received", *minimum_received)?;
            }
            Step::StopLoss {
                swap_amount_option,
                stop_loss_received,
                ..
            } => {
                swap_amount_option.validate()?;
                ensure_positive("stop loss received", *stop_loss_received)?;
            }
            Step::Oco {
                swap_amount_option,
                minimum_received,
                stop_loss_received,
                ..
            } => {
                swap_amount_option.validate()?;
                ensure_positive("minimum received", *minimum_received)?;
                ensure_positive("stop loss received", *stop_loss_received)?;
            }
            Step::SwapExactOut {
                maximum_swap_amount_option,
                expected_received,
                ..
            } => {
                maximum_swap_amount_option.validate()?;
                ensure_positive("expected received", *expected_received)?;
            }
            Step::Deposit {
                deposit_amount_option,
                minimum_lp,
                ..
            } => {
                deposit_amount_option.validate()?;
                ensure_positive("minimum LP", *minimum_lp)?;
            }
            Step::Withdraw {
                withdrawal_amount_option,
                minimum_asset_a,
                minimum_asset_b,
                ..
            } => {
                withdrawal_amount_option.validate()?;
                ensure_positive("minimum asset A", *minimum_asset_a)?;
                ensure_positive("minimum asset B", *minimum_asset_b)?;
            }
            Step::ZapOut {
                withdrawal_amount_option,
                minimum_received,
                ..
            } => {
                withdrawal_amount_option.validate()?;
                ensure_positive("minimum received", *minimum_received)?;
            }
            Step::PartialSwap {
                total_swap_amount,
                io_ratio_numerator,
                io_ratio_denominator,
                hops,
                minimum_swap_amount_required,
                max_batcher_fee_each_time,
                ..
            } => {
                ensure_positive("total swap amount", *total_swap_amount)?;
                ensure_positive("io ratio numerator", *io_ratio_numerator)?;
                ensure_positive("io ratio denominator", *io_ratio_denominator)?;
                ensure_positive("hops", *hops)?;
                ensure_positive("minimum swap amount required", *minimum_swap_amount_required)?;
                ensure_positive("max batcher fee each time", *max_batcher_fee_each_time)?;
                order_ensure!(
                    total_swap_amount >= minimum_swap_amount_required,
                    OrderErrorCode::InvalidParameter,
                    format!(
                        "total swap amount {} is below minimum swap amount required {}",
                        total_swap_amount, minimum_swap_amount_required
                    )
                );
            }
            Step::WithdrawImbalance {
                withdrawal_amount_option,
                ratio_asset_a,
                ratio_asset_b,
                minimum_asset_a,
                ..
            } => {
                withdrawal_amount_option.validate()?;
                ensure_positive("ratio asset A", *ratio_asset_a)?;
                ensure_positive("ratio asset B", *ratio_asset_b)?;
                ensure_positive("minimum asset A", *minimum_asset_a)?;
            }
            Step::SwapMultiRouting {
                routings,
                swap_amount_option,
                minimum_received,
            } => {
                swap_amount_option.validate()?;
                ensure_positive("minimum received", *minimum_received)?;
                order_ensure!(
                    routings.len() > 1,
                    OrderErrorCode::InvalidParameter,
                    format!("routing needs more than one hop, got {}", routings.len())
                );
                for route in routings {
                    order_ensure!(
                        route.lp_asset.policy_id == lp_policy_id,
                        OrderErrorCode::InvalidParameter,
                        format!("route LP asset has foreign policy {}", route.lp_asset.policy_id)
                    );
                }
            }
            Step::Donation => {}
        }
        Ok(())
    }
}
