//! Order pricing.
//!
//! Pure arithmetic over order lines. The stored `subtotal_cents` and
//! `total_amount_cents` on an order are caches of these functions and are
//! recomputed whenever items or the delivery fee change.
//!
//! Inputs are assumed valid: negative prices or zero quantities are
//! rejected before they reach this module. Arithmetic is checked; `None`
//! means the amount does not fit in an `i64` of centavos.

use crate::models::order::{OrderItem, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pricing {
    pub upsize_surcharge_cents: i64,
}

impl Pricing {
    pub fn new(upsize_surcharge_cents: i64) -> Self {
        Self {
            upsize_surcharge_cents,
        }
    }

    pub fn size_surcharge(&self, size: Size) -> i64 {
        match size {
            Size::Regular => 0,
            Size::Large => self.upsize_surcharge_cents,
        }
    }

    /// `(unit price + size surcharge + add-ons) * quantity`
    pub fn line_total(&self, item: &OrderItem) -> Option<i64> {
        let unit = item
            .addons
            .iter()
            .try_fold(item.unit_price_cents, |sum, addon| {
                sum.checked_add(addon.price_cents)
            })?
            .checked_add(self.size_surcharge(item.size))?;
        unit.checked_mul(i64::from(item.quantity))
    }

    pub fn subtotal(&self, items: &[OrderItem]) -> Option<i64> {
        items
            .iter()
            .try_fold(0i64, |sum, item| sum.checked_add(self.line_total(item)?))
    }

    pub fn total(&self, items: &[OrderItem], delivery_fee_cents: i64) -> Option<i64> {
        self.subtotal(items)?.checked_add(delivery_fee_cents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::order::AddonSnapshot;

    fn latte(quantity: u32, size: Size) -> OrderItem {
        OrderItem {
            product_id: "latte".to_string(),
            product_name: "Latte".to_string(),
            quantity,
            unit_price_cents: 12000,
            size,
            addons: vec![AddonSnapshot {
                name: "Extra Shot".to_string(),
                price_cents: 2000,
            }],
            drink_name: None,
        }
    }

    #[test]
    fn large_latte_with_extra_shot() {
        let pricing = Pricing::new(1000);
        let items = vec![latte(2, Size::Large)];

        assert_eq!(pricing.line_total(&items[0]), Some(30000));
        assert_eq!(pricing.subtotal(&items), Some(30000));
        assert_eq!(pricing.total(&items, 5000), Some(35000));
    }

    #[test]
    fn empty_order_costs_nothing() {
        let pricing = Pricing::new(1000);

        assert_eq!(pricing.subtotal(&[]), Some(0));
        assert_eq!(pricing.total(&[], 5000), Some(5000));
    }

    #[test]
    fn line_total_is_linear_in_quantity() {
        let pricing = Pricing::new(1500);
        for size in [Size::Regular, Size::Large] {
            let single = pricing.line_total(&latte(1, size)).unwrap();
            for quantity in 1..=12 {
                assert_eq!(
                    pricing.line_total(&latte(quantity, size)),
                    Some(i64::from(quantity) * single)
                );
            }
        }
    }

    #[test]
    fn subtotal_sums_lines() {
        let pricing = Pricing::new(1000);
        let mut plain = latte(3, Size::Regular);
        plain.addons.clear();
        let items = vec![latte(1, Size::Large), plain.clone()];

        assert_eq!(
            pricing.subtotal(&items).unwrap(),
            pricing.line_total(&items[0]).unwrap() + pricing.line_total(&plain).unwrap()
        );
        assert_eq!(pricing.line_total(&plain), Some(36000));
    }

    #[test]
    fn amounts_past_i64_are_none() {
        let pricing = Pricing::new(1000);
        let mut pricey = latte(2, Size::Regular);
        pricey.unit_price_cents = i64::MAX / 2 + 1;
        pricey.addons.clear();
        assert_eq!(pricing.line_total(&pricey), None);
        assert_eq!(pricing.subtotal(&[pricey]), None);

        let mut single = latte(1, Size::Large);
        single.unit_price_cents = i64::MAX - 2000;
        assert_eq!(pricing.line_total(&single), None);

        let items = vec![latte(2, Size::Large)];
        assert_eq!(pricing.total(&items, i64::MAX), None);
    }
}
