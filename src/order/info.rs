//! What a batcher needs to know to settle one order against a pool.
//!
//! An [`OrderInfo`] is recomputed on every call: it depends on the trading
//! pair orientation the caller passes in, so it is never stored on the order.

use serde::Serialize;

use super::{Direction, Route, Step, StepType};
use crate::errors::{OrderError, OrderErrorCode};
use crate::models::{Asset, Token, TradingPair, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderInfo {
    Swap {
        step_type: StepType,
        direction: Direction,
        asset_in: Token,
        asset_out: Token,
        swap_amount: i128,
        unrelated_value: Value,
        deposit_ada: i128,
    },
    Routing {
        routings: Vec<Route>,
        asset_in: Token,
        swap_amount: i128,
        unrelated_value: Value,
        deposit_ada: i128,
    },
    Deposit {
        deposit_a: i128,
        deposit_b: i128,
        unrelated_value: Value,
        deposit_ada: i128,
    },
    Withdraw {
        step_type: StepType,
        lp_asset: Asset,
        withdrawal_lp_amount: i128,
        unrelated_value: Value,
        deposit_ada: i128,
    },
    ZapOut {
        lp_asset: Asset,
        withdrawal_lp_amount: i128,
        asset_out: Token,
        unrelated_value: Value,
        deposit_ada: i128,
    },
    Donate {
        donate_a: i128,
        donate_b: i128,
        unrelated_value: Value,
        deposit_ada: i128,
    },
}

impl OrderInfo {
    /// ADA left in the order after the trade, available to reseed the
    /// output that pays the receiver.
    pub fn deposit_ada(&self) -> i128 {
        match self {
            OrderInfo::Swap { deposit_ada, .. }
            | OrderInfo::Routing { deposit_ada, .. }
            | OrderInfo::Deposit { deposit_ada, .. }
            | OrderInfo::Withdraw { deposit_ada, .. }
            | OrderInfo::ZapOut { deposit_ada, .. }
            | OrderInfo::Donate { deposit_ada, .. } => *deposit_ada,
        }
    }

    /// Native tokens the order carries that the trade does not touch.
    pub fn unrelated_value(&self) -> &Value {
        match self {
            OrderInfo::Swap { unrelated_value, .. }
            | OrderInfo::Routing { unrelated_value, .. }
            | OrderInfo::Deposit { unrelated_value, .. }
            | OrderInfo::Withdraw { unrelated_value, .. }
            | OrderInfo::ZapOut { unrelated_value, .. }
            | OrderInfo::Donate { unrelated_value, .. } => unrelated_value,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            OrderInfo::Swap { .. } => "SWAP",
            OrderInfo::Routing { .. } => "ROUTING",
            OrderInfo::Deposit { .. } => "DEPOSIT",
            OrderInfo::Withdraw { .. } => "WITHDRAW",
            OrderInfo::ZapOut { .. } => "ZAP_OUT",
            OrderInfo::Donate { .. } => "DONATE",
        }
    }

    /// Realize `step` against the order's `value` after reserving
    /// `batcher_fee` lovelace.
    pub fn derive(
        step: &Step,
        lp_asset: &Asset,
        value: &Value,
        pair: &TradingPair,
        batcher_fee: i128,
    ) -> Result<OrderInfo, OrderError> {
        let mut remaining = value.clone();
        remaining.subtract(&Token::Lovelace, batcher_fee);
        let fee_note = format!("batcher fee: {}", batcher_fee);

        let info = match step {
            Step::SwapExactIn {
                direction,
                swap_amount_option,
                ..
            }
            | Step::StopLoss {
                direction,
                swap_amount_option,
                ..
            }
            | Step::Oco {
                direction,
                swap_amount_option,
                ..
            }
            | Step::SwapExactOut {
                direction,
                maximum_swap_amount_option: swap_amount_option,
                ..
            } => {
                let (asset_in, asset_out) = sides(pair, *direction);
                let swap_amount = swap_amount_option.realize(remaining.get(&asset_in))?;
                let (unrelated_value, deposit_ada) =
                    take_swap(remaining, &asset_in, swap_amount, &fee_note)?;
                OrderInfo::Swap {
                    step_type: step.step_type(),
                    direction: *direction,
                    asset_in,
                    asset_out,
                    swap_amount,
                    unrelated_value,
                    deposit_ada,
                }
            }
            Step::PartialSwap {
                direction,
                total_swap_amount,
                ..
            } => {
                let (asset_in, asset_out) = sides(pair, *direction);
                let (unrelated_value, deposit_ada) =
                    take_swap(remaining, &asset_in, *total_swap_amount, &fee_note)?;
                OrderInfo::Swap {
                    step_type: StepType::PartialSwap,
                    direction: *direction,
                    asset_in,
                    asset_out,
                    swap_amount: *total_swap_amount,
                    unrelated_value,
                    deposit_ada,
                }
            }
            Step::SwapMultiRouting {
                routings,
                swap_amount_option,
                ..
            } => {
                let first = routings.first().ok_or_else(|| {
                    OrderError::new(
                        OrderErrorCode::InvalidParameter,
                        vec!["routing order has no hops".to_string()],
                    )
                })?;
                let (asset_in, _) = sides(pair, first.direction);
                let swap_amount = swap_amount_option.realize(remaining.get(&asset_in))?;
                let (unrelated_value, deposit_ada) =
                    take_swap(remaining, &asset_in, swap_amount, &fee_note)?;
                OrderInfo::Routing {
                    routings: routings.clone(),
                    asset_in,
                    swap_amount,
                    unrelated_value,
                    deposit_ada,
                }
            }
            Step::Deposit {
                deposit_amount_option,
                ..
            } => {
                let (deposit_a, deposit_b) = deposit_amount_option.realize(
                    remaining.get(&pair.asset_a),
                    remaining.get(&pair.asset_b),
                )?;
                order_ensure!(
                    deposit_a >= 0 && deposit_b >= 0 && (deposit_a > 0 || deposit_b > 0),
                    OrderErrorCode::InvalidValue,
                    format!("deposit amounts: {} / {}", deposit_a, deposit_b),
                    fee_note
                );
                remaining
                    .subtract(&pair.asset_a, deposit_a)
                    .subtract(&pair.asset_b, deposit_b);
                let (unrelated_value, deposit_ada) = settle(
                    remaining,
                    &[format!("deposit amounts: {} / {}", deposit_a, deposit_b), fee_note],
                )?;
                OrderInfo::Deposit {
                    deposit_a,
                    deposit_b,
                    unrelated_value,
                    deposit_ada,
                }
            }
            Step::Withdraw {
                withdrawal_amount_option,
                ..
            }
            | Step::WithdrawImbalance {
                withdrawal_amount_option,
                ..
            } => {
                let lp = Token::Asset(lp_asset.clone());
                let withdrawal_lp_amount = withdrawal_amount_option.realize(remaining.get(&lp))?;
                let (unrelated_value, deposit_ada) =
                    take_lp(remaining, &lp, withdrawal_lp_amount, &fee_note)?;
                OrderInfo::Withdraw {
                    step_type: step.step_type(),
                    lp_asset: lp_asset.clone(),
                    withdrawal_lp_amount,
                    unrelated_value,
                    deposit_ada,
                }
            }
            Step::ZapOut {
                direction,
                withdrawal_amount_option,
                ..
            } => {
                let lp = Token::Asset(lp_asset.clone());
                let (_, asset_out) = sides(pair, *direction);
                let withdrawal_lp_amount = withdrawal_amount_option.realize(remaining.get(&lp))?;
                let (unrelated_value, deposit_ada) =
                    take_lp(remaining, &lp, withdrawal_lp_amount, &fee_note)?;
                OrderInfo::ZapOut {
                    lp_asset: lp_asset.clone(),
                    withdrawal_lp_amount,
                    asset_out,
                    unrelated_value,
                    deposit_ada,
                }
            }
            Step::Donation => {
                // Reads what is left after the maximum batcher fee, not the fee
                // the batcher actually charges.
                let donate_a = remaining.get(&pair.asset_a);
                let donate_b = remaining.get(&pair.asset_b);
                let note = format!("donation amounts: {} / {}", donate_a, donate_b);
                order_ensure!(
                    donate_a >= 0 && donate_b >= 0 && (donate_a > 0 || donate_b > 0),
                    OrderErrorCode::InvalidValue,
                    note,
                    fee_note
                );
                remaining
                    .subtract(&pair.asset_a, donate_a)
                    .subtract(&pair.asset_b, donate_b);
                let (unrelated_value, deposit_ada) = settle(remaining, &[note, fee_note])?;
                OrderInfo::Donate {
                    donate_a,
                    donate_b,
                    unrelated_value,
                    deposit_ada,
                }
            }
        };
        Ok(info)
    }
}

/// `(asset in, asset out)` for a direction over a normalized pair.
fn sides(pair: &TradingPair, direction: Direction) -> (Token, Token) {
    match direction {
        Direction::AToB => (pair.asset_a.clone(), pair.asset_b.clone()),
        Direction::BToA => (pair.asset_b.clone(), pair.asset_a.clone()),
    }
}

fn take_swap(
    mut remaining: Value,
    asset_in: &Token,
    swap_amount: i128,
    fee_note: &str,
) -> Result<(Value, i128), OrderError> {
    let notes = [format!("swap amount: {}", swap_amount), fee_note.to_string()];
    order_ensure!(
        swap_amount > 0,
        OrderErrorCode::InvalidValue,
        notes[0],
        notes[1]
    );
    remaining.subtract(asset_in, swap_amount);
    settle(remaining, &notes)
}

fn take_lp(
    mut remaining: Value,
    lp: &Token,
    amount: i128,
    fee_note: &str,
) -> Result<(Value, i128), OrderError> {
    let notes = [format!("withdrawal LP amount: {}", amount), fee_note.to_string()];
    order_ensure!(amount > 0, OrderErrorCode::InvalidValue, notes[0], notes[1]);
    remaining.subtract(lp, amount);
    settle(remaining, &notes)
}

/// Split a remainder into `(unrelated tokens, leftover lovelace)`, failing
/// when anything went negative.
fn settle(mut remaining: Value, notes: &[String]) -> Result<(Value, i128), OrderError> {
    remaining.trim();
    if !remaining.is_non_negative() {
        return Err(OrderError::new(OrderErrorCode::InvalidValue, notes.to_vec()));
    }
    let deposit_ada = remaining.remove(&Token::Lovelace);
    Ok((remaining, deposit_ada))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::step::tests::{lp, sample_step};
    use crate::order::{DepositAmountOption, Killable, SwapAmountOption, WithdrawAmountOption};
    use rstest::rstest;

    const FEE: i128 = 700_000;

    fn min() -> Token {
        Token::Asset(Asset::new(
            "29d222ce763455e3d7a09a665ce554f00ac89d2e99a1a83d267170c6",
            "4d494e",
        ))
    }

    fn ada_min() -> TradingPair {
        TradingPair::new(min(), Token::Lovelace)
    }

    fn value(ada: i128, min_amount: i128) -> Value {
        [(Token::Lovelace, ada), (min(), min_amount)].into_iter().collect()
    }

    fn swap_in(direction: Direction, option: SwapAmountOption) -> Step {
        Step::SwapExactIn {
            direction,
            swap_amount_option: option,
            minimum_received: 1,
            killable: Killable::PendingOnFailed,
        }
    }

    #[test]
    fn test_swap_a_to_b() {
        let step = swap_in(
            Direction::AToB,
            SwapAmountOption::SpecificAmount {
                swap_amount: 3_000_000,
            },
        );
        let info = OrderInfo::derive(&step, &lp("aa"), &value(5_000_000, 9), &ada_min(), FEE).unwrap();
        match info {
            OrderInfo::Swap {
                asset_in,
                asset_out,
                swap_amount,
                unrelated_value,
                deposit_ada,
                ..
            } => {
                assert_eq!(asset_in, Token::Lovelace);
                assert_eq!(asset_out, min());
                assert_eq!(swap_amount, 3_000_000);
                assert_eq!(deposit_ada, 1_300_000);
                assert_eq!(unrelated_value.get(&min()), 9);
            }
            other => panic!("unexpected info {:?}", other),
        }
    }

    #[test]
    fn test_swap_all_b_to_a() {
        let step = swap_in(
            Direction::BToA,
            SwapAmountOption::All { deducted_amount: 4 },
        );
        let info = OrderInfo::derive(&step, &lp("aa"), &value(2_000_000, 10), &ada_min(), FEE).unwrap();
        assert_eq!(info.kind(), "SWAP");
        assert_eq!(info.deposit_ada(), 1_300_000);
        assert_eq!(info.unrelated_value().get(&min()), 4);
        if let OrderInfo::Swap { swap_amount, asset_in, .. } = info {
            assert_eq!(swap_amount, 6);
            assert_eq!(asset_in, min());
        }
    }

    #[test]
    fn test_fee_sufficiency_grid() {
        let amounts = [0i128, 1, 999_999, 1_000_000, 5_000_000];
        for held in amounts {
            for fee in [1i128, FEE, 2_000_000] {
                for swap_amount in [1i128, 1_000_000, 3_000_000] {
                    let step = swap_in(
                        Direction::AToB,
                        SwapAmountOption::SpecificAmount { swap_amount },
                    );
                    let result = OrderInfo::derive(
                        &step,
                        &lp("aa"),
                        &Value::from_lovelace(held),
                        &ada_min(),
                        fee,
                    );
                    let shortfall = swap_amount + fee - held;
                    if shortfall > 0 {
                        let err = result.unwrap_err();
                        assert_eq!(err.code, OrderErrorCode::InvalidValue);
                        assert_eq!(err.extra[0], format!("swap amount: {}", swap_amount));
                        assert_eq!(err.extra[1], format!("batcher fee: {}", fee));
                    } else {
                        assert_eq!(result.unwrap().deposit_ada(), -shortfall);
                    }
                }
            }
        }
    }

    #[test]
    fn test_missing_token_is_invalid_value() {
        let step = swap_in(
            Direction::BToA,
            SwapAmountOption::SpecificAmount { swap_amount: 1 },
        );
        let err = OrderInfo::derive(&step, &lp("aa"), &Value::from_lovelace(FEE), &ada_min(), FEE)
            .unwrap_err();
        assert_eq!(err.code, OrderErrorCode::InvalidValue);
    }

    #[test]
    fn test_all_option_that_realizes_to_zero() {
        let step = swap_in(
            Direction::BToA,
            SwapAmountOption::All { deducted_amount: 10 },
        );
        let err = OrderInfo::derive(&step, &lp("aa"), &value(FEE, 10), &ada_min(), FEE).unwrap_err();
        assert_eq!(err.code, OrderErrorCode::InvalidValue);
        assert_eq!(err.extra[0], "swap amount: 0");
    }

    #[test]
    fn test_routing_uses_first_leg() {
        let step = sample_step(StepType::SwapMultiRouting, 0, 1);
        let info = OrderInfo::derive(&step, &lp("aa"), &value(3_000_000, 0), &ada_min(), FEE).unwrap();
        match info {
            OrderInfo::Routing {
                asset_in,
                swap_amount,
                deposit_ada,
                routings,
                ..
            } => {
                assert_eq!(asset_in, Token::Lovelace);
                assert_eq!(swap_amount, 2_300_000);
                assert_eq!(deposit_ada, 0);
                assert_eq!(routings.len(), 2);
            }
            other => panic!("unexpected info {:?}", other),
        }
    }

    #[test]
    fn test_deposit() {
        let step = Step::Deposit {
            deposit_amount_option: DepositAmountOption::All {
                deducted_amount_a: 2_000_000,
                deducted_amount_b: 0,
            },
            minimum_lp: 1,
            killable: Killable::PendingOnFailed,
        };
        let info = OrderInfo::derive(&step, &lp("aa"), &value(10_000_000, 50), &ada_min(), FEE).unwrap();
        assert_eq!(
            info,
            OrderInfo::Deposit {
                deposit_a: 7_300_000,
                deposit_b: 50,
                unrelated_value: Value::new(),
                deposit_ada: 2_000_000,
            }
        );

        let step = Step::Deposit {
            deposit_amount_option: DepositAmountOption::SpecificAmount {
                deposit_amount_a: 1_000_000,
                deposit_amount_b: 51,
            },
            minimum_lp: 1,
            killable: Killable::PendingOnFailed,
        };
        let err = OrderInfo::derive(&step, &lp("aa"), &value(10_000_000, 50), &ada_min(), FEE)
            .unwrap_err();
        assert_eq!(err.code, OrderErrorCode::InvalidValue);
    }

    #[test]
    fn test_withdraw_and_zap_out() {
        let lp_token = Token::Asset(lp("aa"));
        let held: Value = [(Token::Lovelace, 3_000_000), (lp_token, 1_000)].into_iter().collect();

        let step = Step::Withdraw {
            withdrawal_amount_option: WithdrawAmountOption::All {
                deducted_lp_amount: 100,
            },
            minimum_asset_a: 1,
            minimum_asset_b: 1,
            killable: Killable::KillOnFailed,
        };
        let info = OrderInfo::derive(&step, &lp("aa"), &held, &ada_min(), FEE).unwrap();
        match &info {
            OrderInfo::Withdraw {
                withdrawal_lp_amount,
                unrelated_value,
                ..
            } => {
                assert_eq!(*withdrawal_lp_amount, 900);
                assert_eq!(unrelated_value.get(&Token::Asset(lp("aa"))), 100);
            }
            other => panic!("unexpected info {:?}", other),
        }
        assert_eq!(info.deposit_ada(), 2_300_000);

        let step = Step::ZapOut {
            direction: Direction::BToA,
            withdrawal_amount_option: WithdrawAmountOption::SpecificAmount {
                withdrawal_lp_amount: 1_000,
            },
            minimum_received: 1,
            killable: Killable::KillOnFailed,
        };
        let info = OrderInfo::derive(&step, &lp("aa"), &held, &ada_min(), FEE).unwrap();
        match info {
            OrderInfo::ZapOut {
                asset_out,
                unrelated_value,
                ..
            } => {
                assert_eq!(asset_out, Token::Lovelace);
                assert!(unrelated_value.is_empty());
            }
            other => panic!("unexpected info {:?}", other),
        }

        let step = Step::ZapOut {
            direction: Direction::AToB,
            withdrawal_amount_option: WithdrawAmountOption::SpecificAmount {
                withdrawal_lp_amount: 1_001,
            },
            minimum_received: 1,
            killable: Killable::KillOnFailed,
        };
        let err = OrderInfo::derive(&step, &lp("aa"), &held, &ada_min(), FEE).unwrap_err();
        assert_eq!(err.code, OrderErrorCode::InvalidValue);
        assert_eq!(err.extra[0], "withdrawal LP amount: 1001");
    }

    #[test]
    fn test_donation_with_zero_side() {
        let asset_b = Token::Asset(Asset::new(
            "f13ac4d66b3ee19a6aa0f2a22298737bd907cc95121662fc971b5275",
            "535452494b45",
        ));
        let held: Value = [
            (Token::Lovelace, 12_000_000),
            (min(), 5_000_000),
            (asset_b.clone(), 0),
        ]
        .into_iter()
        .collect();

        let info = OrderInfo::derive(&Step::Donation, &lp("aa"), &held, &ada_min(), 2_000_000).unwrap();
        assert_eq!(
            info,
            OrderInfo::Donate {
                donate_a: 10_000_000,
                donate_b: 5_000_000,
                unrelated_value: Value::new(),
                deposit_ada: 0,
            }
        );

        let pair = TradingPair::new(Token::Lovelace, asset_b);
        let info = OrderInfo::derive(&Step::Donation, &lp("aa"), &held, &pair, 2_000_000).unwrap();
        match info {
            OrderInfo::Donate {
                donate_a,
                donate_b,
                unrelated_value,
                deposit_ada,
            } => {
                assert_eq!(donate_a, 10_000_000);
                assert_eq!(donate_b, 0);
                assert_eq!(deposit_ada, 0);
                assert_eq!(unrelated_value.get(&min()), 5_000_000);
            }
            other => panic!("unexpected info {:?}", other),
        }

        let err = OrderInfo::derive(
            &Step::Donation,
            &lp("aa"),
            &Value::from_lovelace(2_000_000),
            &pair,
            2_000_000,
        )
        .unwrap_err();
        assert_eq!(err.code, OrderErrorCode::InvalidValue);
    }

    fn deposit(option: DepositAmountOption) -> Step {
        Step::Deposit {
            deposit_amount_option: option,
            minimum_lp: 1,
            killable: Killable::PendingOnFailed,
        }
    }

    #[rstest]
    #[case::donation_sum_past_i128(Step::Donation, Ok("DONATE"))]
    #[case::deposit_all_sum_past_i128(
        deposit(DepositAmountOption::All { deducted_amount_a: 0, deducted_amount_b: 0 }),
        Ok("DEPOSIT")
    )]
    #[case::deposit_specific_at_i128_max(
        deposit(DepositAmountOption::SpecificAmount { deposit_amount_a: i128::MAX, deposit_amount_b: i128::MAX }),
        Err(OrderErrorCode::InvalidValue)
    )]
    #[case::swap_above_u64(
        swap_in(Direction::AToB, SwapAmountOption::SpecificAmount { swap_amount: 1 << 100 }),
        Ok("SWAP")
    )]
    #[case::swap_deduction_out_of_range(
        swap_in(Direction::AToB, SwapAmountOption::All { deducted_amount: i128::MIN }),
        Err(OrderErrorCode::InvalidValue)
    )]
    #[case::withdraw_deduction_out_of_range(
        Step::Withdraw {
            withdrawal_amount_option: WithdrawAmountOption::All { deducted_lp_amount: i128::MIN },
            minimum_asset_a: 1,
            minimum_asset_b: 1,
            killable: Killable::PendingOnFailed,
        },
        Err(OrderErrorCode::InvalidValue)
    )]
    fn test_amounts_at_i128_bounds(
        #[case] step: Step,
        #[case] expected: Result<&'static str, OrderErrorCode>,
    ) {
        let held = value(i128::MAX, i128::MAX);
        let info = OrderInfo::derive(&step, &lp("aa"), &held, &ada_min(), FEE);
        assert_eq!(info.as_ref().map(|i| i.kind()).map_err(|e| e.code), expected);
        if let Ok(OrderInfo::Donate {
            donate_a, donate_b, ..
        }) = info
        {
            assert_eq!(donate_a, i128::MAX - FEE);
            assert_eq!(donate_b, i128::MAX);
        }
    }
}
