//! # Save Flow
//!
//! The confirmation steps between pressing save and the submit call.
//!
//! ## State Machine
//! ```text
//! Purchase:
//!   Editing ──begin──► (drift?) ──none──► Submitting
//!                          │
//!                          └─found──► AwaitingPriceDecision
//!                                        ├─ UpdatePrices ─► Submitting (update_prices)
//!                                        └─ StoreOnly ────► Submitting
//!
//! Sale:
//!   Editing ──begin──► (overshoot?) ──none──► Submitting
//!                          │
//!                          └─found──► AwaitingOverrideConfirmation
//!                                        ├─ confirm ─► Submitting (allow_negative_stock)
//!                                        └─ cancel ──► Editing
//!
//! Return:
//!   Editing ──begin──► Submitting
//!
//! Submitting ──finish(ok | err)──► Editing
//! ```
//!
//! Drift and stock are evaluated inside `begin`, so the transient
//! "computing" states never outlive a call. An event the current state does
//! not accept returns [`CoreError::InvalidTransition`] and changes nothing.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::Catalog;
use crate::checks::{price_update_candidates, stock_shortfalls, PriceUpdateCandidate, StockShortfall};
use crate::error::{CoreError, CoreResult};
use crate::form::FormState;
use crate::types::TransactionKind;
use crate::validation::validate_submission;

/// Flags the submit call carries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SubmitDirective {
    /// The user accepted selling more than is in stock.
    pub allow_negative_stock: bool,
    /// The user asked to store the new trade prices.
    pub update_prices: bool,
    /// Present only when `update_prices` is set.
    pub price_updates: Vec<PriceUpdateCandidate>,
}

/// The user's answer to a trade-price drift prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PriceDecision {
    /// Store the bill only.
    StoreOnly,
    /// Store the bill and the new trade prices.
    UpdatePrices,
}

/// Where the save flow currently is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SaveState {
    #[default]
    Editing,
    AwaitingPriceDecision {
        candidates: Vec<PriceUpdateCandidate>,
    },
    AwaitingOverrideConfirmation {
        shortfalls: Vec<StockShortfall>,
    },
    Submitting {
        directive: SubmitDirective,
    },
}

impl SaveState {
    fn name(&self) -> &'static str {
        match self {
            SaveState::Editing => "editing",
            SaveState::AwaitingPriceDecision { .. } => "awaiting_price_decision",
            SaveState::AwaitingOverrideConfirmation { .. } => "awaiting_override_confirmation",
            SaveState::Submitting { .. } => "submitting",
        }
    }
}

/// What the caller must do after `begin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStep {
    /// Call the backend with this directive.
    Submit(SubmitDirective),
    /// Ask whether to update trade prices.
    ConfirmPrices(Vec<PriceUpdateCandidate>),
    /// Ask whether to sell past stock.
    ConfirmOverride(Vec<StockShortfall>),
}

/// Save-flow state machine for one form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveFlow {
    state: SaveState,
}

impl SaveFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SaveState {
        &self.state
    }

    /// Returns true while a submit is in flight.
    pub fn is_submitting(&self) -> bool {
        matches!(self.state, SaveState::Submitting { .. })
    }

    fn reject(&self, event: &'static str) -> CoreError {
        CoreError::InvalidTransition {
            state: self.state.name(),
            event,
        }
    }

    /// Starts a save: validates the form, then runs the per-kind checks.
    pub fn begin(&mut self, form: &FormState, catalog: &Catalog) -> CoreResult<SaveStep> {
        if self.state != SaveState::Editing {
            return Err(self.reject("save"));
        }
        validate_submission(form, catalog)?;

        let index = catalog.index();
        let step = match form.kind {
            TransactionKind::Purchase => {
                let candidates =
                    price_update_candidates(&form.rows, &index, form.markup(catalog));
                if candidates.is_empty() {
                    SaveStep::Submit(SubmitDirective::default())
                } else {
                    SaveStep::ConfirmPrices(candidates)
                }
            }
            TransactionKind::Sale => {
                let shortfalls = stock_shortfalls(form.kind, &form.rows, &index);
                if shortfalls.is_empty() {
                    SaveStep::Submit(SubmitDirective::default())
                } else {
                    SaveStep::ConfirmOverride(shortfalls)
                }
            }
            TransactionKind::Return => SaveStep::Submit(SubmitDirective::default()),
        };

        self.state = match &step {
            SaveStep::Submit(directive) => SaveState::Submitting {
                directive: directive.clone(),
            },
            SaveStep::ConfirmPrices(candidates) => SaveState::AwaitingPriceDecision {
                candidates: candidates.clone(),
            },
            SaveStep::ConfirmOverride(shortfalls) => SaveState::AwaitingOverrideConfirmation {
                shortfalls: shortfalls.clone(),
            },
        };
        Ok(step)
    }

    /// Answers a price drift prompt. Both answers proceed to submit.
    pub fn resolve_prices(&mut self, decision: PriceDecision) -> CoreResult<SubmitDirective> {
        let SaveState::AwaitingPriceDecision { candidates } = &self.state else {
            return Err(self.reject("resolve_prices"));
        };

        let directive = match decision {
            PriceDecision::UpdatePrices => SubmitDirective {
                update_prices: true,
                price_updates: candidates.clone(),
                ..SubmitDirective::default()
            },
            PriceDecision::StoreOnly => SubmitDirective::default(),
        };
        self.state = SaveState::Submitting {
            directive: directive.clone(),
        };
        Ok(directive)
    }

    /// Accepts the stock overshoot and proceeds with the override flag.
    pub fn confirm_override(&mut self) -> CoreResult<SubmitDirective> {
        if !matches!(self.state, SaveState::AwaitingOverrideConfirmation { .. }) {
            return Err(self.reject("confirm_override"));
        }
        let directive = SubmitDirective {
            allow_negative_stock: true,
            ..SubmitDirective::default()
        };
        self.state = SaveState::Submitting {
            directive: directive.clone(),
        };
        Ok(directive)
    }

    /// Backs out of the stock overshoot prompt.
    pub fn cancel_override(&mut self) -> CoreResult<()> {
        if !matches!(self.state, SaveState::AwaitingOverrideConfirmation { .. }) {
            return Err(self.reject("cancel_override"));
        }
        self.state = SaveState::Editing;
        Ok(())
    }

    /// Records the submit outcome. The form itself is reset by the caller on
    /// success and left untouched on failure.
    pub fn finish(&mut self) -> CoreResult<()> {
        if !self.is_submitting() {
            return Err(self.reject("finish"));
        }
        self.state = SaveState::Editing;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{reduce, FormAction};
    use crate::money::Money;
    use crate::types::{Account, FormMode, Item, ItemId, Percent, RowField, RowId};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn catalog(trade: Money, stock: i64) -> Catalog {
        Catalog {
            items: vec![Item {
                id: ItemId::new("A"),
                title: "A".to_string(),
                packing: Decimal::ONE,
                trade_price: trade,
                retail_price: Money::from_whole(150),
                price_tiers: vec![],
                discount_percent: Percent::zero(),
                tax_percent: Percent::zero(),
                stock: Decimal::from(stock),
                company: None,
            }],
            accounts: vec![Account {
                id: "S1".to_string(),
                name: "Supplier".to_string(),
                credit_limit: Money::ZERO,
                credit_days: 0,
                markup_percent: Percent::from_whole(20),
                price_category: None,
            }],
            next_invoice_number: "1".to_string(),
            ..Catalog::default()
        }
    }

    fn form(kind: TransactionKind, cat: &Catalog, pcs: &str, rate: &str) -> FormState {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let actions = vec![
            FormAction::SelectAccount {
                account_id: Some("S1".to_string()),
            },
            FormAction::AssignItem {
                row: RowId(1),
                item_id: ItemId::new("A"),
            },
            FormAction::EditField {
                row: RowId(1),
                field: RowField::Pcs,
                raw: pcs.to_string(),
            },
            FormAction::EditField {
                row: RowId(1),
                field: RowField::Rate,
                raw: rate.to_string(),
            },
        ];
        actions.into_iter().fold(
            FormState::new(kind, FormMode::Create, date, cat),
            |s, a| reduce(&s, a, cat),
        )
    }

    #[test]
    fn test_purchase_without_drift_submits() {
        let cat = catalog(Money::from_whole(120), 0);
        let mut flow = SaveFlow::new();
        let step = flow.begin(&form(TransactionKind::Purchase, &cat, "5", "100"), &cat).unwrap();
        assert_eq!(step, SaveStep::Submit(SubmitDirective::default()));
        assert!(flow.is_submitting());
    }

    #[test]
    fn test_purchase_drift_then_update() {
        let cat = catalog(Money::from_whole(110), 0);
        let mut flow = SaveFlow::new();
        let step = flow.begin(&form(TransactionKind::Purchase, &cat, "5", "100"), &cat).unwrap();
        assert!(matches!(step, SaveStep::ConfirmPrices(ref c) if c.len() == 1));

        let directive = flow.resolve_prices(PriceDecision::UpdatePrices).unwrap();
        assert!(directive.update_prices);
        assert_eq!(directive.price_updates[0].new_price, Money::from_whole(120));
        assert!(flow.is_submitting());
    }

    #[test]
    fn test_purchase_drift_store_only() {
        let cat = catalog(Money::from_whole(110), 0);
        let mut flow = SaveFlow::new();
        flow.begin(&form(TransactionKind::Purchase, &cat, "5", "100"), &cat).unwrap();
        let directive = flow.resolve_prices(PriceDecision::StoreOnly).unwrap();
        assert!(!directive.update_prices);
        assert!(directive.price_updates.is_empty());
    }

    #[test]
    fn test_sale_overshoot_confirm_and_cancel() {
        let cat = catalog(Money::from_whole(100), 3);
        let sale = form(TransactionKind::Sale, &cat, "5", "150");

        let mut flow = SaveFlow::new();
        assert!(matches!(flow.begin(&sale, &cat).unwrap(), SaveStep::ConfirmOverride(_)));
        flow.cancel_override().unwrap();
        assert_eq!(flow.state(), &SaveState::Editing);

        assert!(matches!(flow.begin(&sale, &cat).unwrap(), SaveStep::ConfirmOverride(_)));
        let directive = flow.confirm_override().unwrap();
        assert!(directive.allow_negative_stock);
    }

    #[test]
    fn test_return_goes_straight_to_submit() {
        let cat = catalog(Money::from_whole(100), 0);
        let mut flow = SaveFlow::new();
        let step = flow.begin(&form(TransactionKind::Return, &cat, "5", "150"), &cat).unwrap();
        assert!(matches!(step, SaveStep::Submit(_)));
    }

    #[test]
    fn test_invalid_events_leave_state_unchanged() {
        let cat = catalog(Money::from_whole(100), 0);
        let ret = form(TransactionKind::Return, &cat, "5", "150");
        let mut flow = SaveFlow::new();

        assert!(flow.finish().is_err());
        assert!(flow.confirm_override().is_err());
        assert!(flow.resolve_prices(PriceDecision::StoreOnly).is_err());
        assert_eq!(flow.state(), &SaveState::Editing);

        flow.begin(&ret, &cat).unwrap();
        let err = flow.begin(&ret, &cat).unwrap_err();
        assert_eq!(err.to_string(), "Save flow is submitting, cannot handle save");

        flow.finish().unwrap();
        assert_eq!(flow.state(), &SaveState::Editing);
    }

    #[test]
    fn test_invalid_form_does_not_start() {
        let cat = catalog(Money::from_whole(100), 0);
        let empty = form(TransactionKind::Sale, &cat, "0", "150");
        let mut flow = SaveFlow::new();
        assert!(matches!(flow.begin(&empty, &cat), Err(CoreError::Validation(_))));
        assert_eq!(flow.state(), &SaveState::Editing);
    }
}
