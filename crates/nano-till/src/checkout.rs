//! # Checkout
//!
//! Turns a cart into a recorded sale and adds its total to the open shift.
//!
//! ## Sequence
//! ```text
//! cart ──► validate ──► find OPEN shift ──► record sale ──► accrue total
//!   │                        │                   │               │
//!   │                  none: NoActiveShift   failed: cart    failed: sale kept,
//!   │                  (cart kept)           kept, nothing   AccrualDrift
//!   │                                        recorded        (cart cleared)
//!   └──────────────────────────────── cleared on success ◄───────┘
//! ```
//!
//! The sale and the accrual are two writes. When the second fails the error
//! names the sale so the drift can be settled by hand; it is never swallowed.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use nano_core::validation::validate_sale_total;
use nano_core::{Cart, CoreError, NewSale, PaymentMethod, Sale, SessionContext, Shift, ValidationError};

use crate::engine::TillEngine;
use crate::error::{TillError, TillResult};
use crate::store::{SaleRecorder, TillStore};

/// A completed checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutReceipt {
    pub sale: Sale,
    /// The shift after the accrual.
    pub shift: Shift,
}

impl<S: TillStore + SaleRecorder> TillEngine<S> {
    /// Checks out `cart` at the session's active location.
    ///
    /// ## Errors
    /// - `Validation` for an empty cart or a non-positive total
    /// - `NoActiveShift` when the till is not open; the cart is left intact
    /// - `AccrualDrift` when the sale was saved but the till was not updated
    pub async fn checkout(&self, session: &SessionContext, cart: &mut Cart) -> TillResult<CheckoutReceipt> {
        if cart.is_empty() {
            return Err(ValidationError::Required {
                field: "cart".to_string(),
            }
            .into());
        }
        let total = validate_sale_total(cart.total())?;

        let location_id = session.active_location;
        session.authorize(location_id)?;

        let shift = self
            .store()
            .fetch_open_shift(location_id)
            .await?
            .ok_or_else(|| CoreError::no_active_shift("cannot sell without opening the till"))?;

        let sale = self
            .store()
            .record_sale(&NewSale {
                location_id,
                seller_id: session.user_id.clone(),
                shift_id: shift.id.clone(),
                total_cents: total.cents(),
                payment_method: PaymentMethod::Cash,
            })
            .await?;

        // From here on the sale exists; the cart must not be charged twice
        cart.clear();

        match self.accrue_sale(session, &shift.id, total).await {
            Ok(shift) => {
                info!(
                    sale_id = %sale.id,
                    shift_id = %shift.id,
                    total = %total,
                    accrual = %shift.accrual(),
                    "Checkout complete"
                );
                Ok(CheckoutReceipt { sale, shift })
            }
            Err(source) => {
                error!(
                    sale_id = %sale.id,
                    shift_id = %shift.id,
                    total = %total,
                    error = %source,
                    "Sale recorded but till accrual failed"
                );
                Err(TillError::AccrualDrift {
                    sale_id: sale.id,
                    total,
                    source: Box::new(source),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{harness, FaultyStore};
    use nano_core::{CartItem, Money};

    fn cart_of(lines: &[(&str, i64, i64)]) -> Cart {
        let mut cart = Cart::new();
        for (id, price, qty) in lines {
            cart.add_item(CartItem::new(*id, *id, Money::from_major(*price)), *qty)
                .unwrap();
        }
        cart
    }

    #[tokio::test]
    async fn test_checkout_accrues_total() {
        let h = harness().await;
        let seller = h.sign_in("seller-1").await;
        let shift = h
            .engine
            .open_or_resume(&seller, 1, Some(Money::from_major(5000)))
            .await
            .unwrap()
            .into_shift();

        let mut cart = cart_of(&[("boots", 500, 2), ("laces", 100, 2)]);
        let receipt = h.engine.checkout(&seller, &mut cart).await.unwrap();

        assert!(cart.is_empty());
        assert_eq!(receipt.sale.total(), Money::from_major(1200));
        assert_eq!(receipt.sale.shift_id, shift.id);
        assert_eq!(receipt.shift.accrual(), Money::from_major(1200));

        let sales = h.store.database().sales().list_for_shift(&shift.id).await.unwrap();
        assert_eq!(sales.len(), 1);
    }

    #[tokio::test]
    async fn test_checkout_without_open_till_keeps_cart() {
        let h = harness().await;
        let seller = h.sign_in("seller-1").await;

        let mut cart = cart_of(&[("boots", 500, 1)]);
        let err = h.engine.checkout(&seller, &mut cart).await.unwrap_err();

        assert!(matches!(err, TillError::Core(CoreError::NoActiveShift { .. })));
        assert_eq!(cart.item_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let h = harness().await;
        let seller = h.sign_in("seller-1").await;
        h.engine
            .open_or_resume(&seller, 1, Some(Money::zero()))
            .await
            .unwrap();

        let err = h.engine.checkout(&seller, &mut Cart::new()).await.unwrap_err();
        assert!(matches!(err, TillError::Core(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_failed_accrual_reports_drift() {
        let h = harness().await;
        let seller = h.sign_in("seller-1").await;
        let shift = h
            .engine
            .open_or_resume(&seller, 1, Some(Money::from_major(100)))
            .await
            .unwrap()
            .into_shift();

        let store = FaultyStore::new(h.store.clone());
        store.fail_accruals();
        let engine = TillEngine::new(store);

        let mut cart = cart_of(&[("scarf", 80, 1)]);
        let err = engine.checkout(&seller, &mut cart).await.unwrap_err();

        match err {
            TillError::AccrualDrift { sale_id, total, .. } => {
                assert_eq!(total, Money::from_major(80));
                let sale = h.store.database().sales().get_by_id(&sale_id).await.unwrap();
                assert!(sale.is_some());
            }
            other => panic!("expected drift, got {other:?}"),
        }
        assert!(cart.is_empty());

        let untouched = h.store.fetch_shift(&shift.id).await.unwrap().unwrap();
        assert_eq!(untouched.accrual(), Money::zero());
    }
}
