//! Baskets and wishlists.
//!
//! Both are client-keyed documents: the client picks the id, and every write
//! replaces the stored document as a whole. Item-level edits run as a locked
//! read-modify-write so concurrent edits of one cart serialize. Line arithmetic lives in the pure
//! functions at the bottom so it can be tested without a database.

use bigdecimal::BigDecimal;
use jiff::Timestamp;
use jiff_diesel::ToDiesel;

use crate::error::{AppError, AppResult};
use crate::models::{CartItemRecord, CartKind, CartRecord, NewCartRecord};
use crate::repositories::CartRepository;

#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub product_id: i32,
    pub product_name: String,
    pub price: BigDecimal,
    pub quantity: i32,
    pub picture_url: Option<String>,
    pub brand: Option<String>,
    pub product_type: Option<String>,
}

/// A basket or wishlist. Wishlists leave the checkout fields empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Cart {
    pub kind: CartKind,
    pub id: String,
    pub items: Vec<CartLine>,
    pub delivery_method_id: Option<i32>,
    pub client_secret: Option<String>,
    pub payment_intent_id: Option<String>,
    pub shipping_price: BigDecimal,
}

impl Cart {
    pub fn empty(kind: CartKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            items: Vec::new(),
            delivery_method_id: None,
            client_secret: None,
            payment_intent_id: None,
            shipping_price: BigDecimal::from(0),
        }
    }

    fn from_records(header: CartRecord, items: Vec<CartItemRecord>) -> Self {
        Self {
            kind: header.kind,
            id: header.id,
            items: items
                .into_iter()
                .map(|item| CartLine {
                    product_id: item.product_id,
                    product_name: item.product_name,
                    price: item.price,
                    quantity: item.quantity,
                    picture_url: item.picture_url,
                    brand: item.brand,
                    product_type: item.product_type,
                })
                .collect(),
            delivery_method_id: header.delivery_method_id,
            client_secret: header.client_secret,
            payment_intent_id: header.payment_intent_id,
            shipping_price: header.shipping_price,
        }
    }

    fn into_records(self) -> (NewCartRecord, Vec<CartItemRecord>) {
        let items = self
            .items
            .into_iter()
            .enumerate()
            .map(|(position, line)| CartItemRecord {
                kind: self.kind,
                cart_id: self.id.clone(),
                product_id: line.product_id,
                position: position as i32,
                product_name: line.product_name,
                price: line.price,
                quantity: line.quantity,
                picture_url: line.picture_url,
                brand: line.brand,
                product_type: line.product_type,
            })
            .collect();

        let header = NewCartRecord {
            kind: self.kind,
            id: self.id,
            delivery_method_id: self.delivery_method_id,
            client_secret: self.client_secret,
            payment_intent_id: self.payment_intent_id,
            shipping_price: self.shipping_price,
            updated_at: Timestamp::now().to_diesel(),
        };
        (header, items)
    }
}

#[derive(Clone)]
pub struct CartService {
    carts: CartRepository,
}

impl CartService {
    pub fn new(carts: CartRepository) -> Self {
        Self { carts }
    }

    pub async fn find(&self, kind: CartKind, cart_id: &str) -> AppResult<Option<Cart>> {
        Ok(self
            .carts
            .find(kind, cart_id)
            .await?
            .map(|(header, items)| Cart::from_records(header, items)))
    }

    pub async fn get(&self, kind: CartKind, cart_id: &str) -> AppResult<Cart> {
        self.find(kind, cart_id)
            .await?
            .ok_or_else(|| AppError::not_found(kind.label(), "ID", cart_id))
    }

    /// Stores the whole document, replacing any previous items.
    pub async fn upsert(&self, mut cart: Cart) -> AppResult<Cart> {
        if cart.kind == CartKind::Wishlist {
            cart = Cart {
                items: cart.items,
                ..Cart::empty(CartKind::Wishlist, cart.id)
            };
        }
        cart.items = normalize_lines(cart.items);
        self.save(cart).await
    }

    /// Adds a product line, creating the document when it does not exist.
    pub async fn add_item(&self, kind: CartKind, cart_id: &str, line: CartLine) -> AppResult<Cart> {
        let (empty, _) = Cart::empty(kind, cart_id).into_records();
        self.modify(kind, cart_id, Some(empty), move |cart| {
            add_line(&mut cart.items, line);
            Ok(())
        })
        .await
    }

    pub async fn increment_item(
        &self,
        kind: CartKind,
        cart_id: &str,
        product_id: i32,
    ) -> AppResult<Cart> {
        self.modify(kind, cart_id, None, move |cart| {
            increment_line(&mut cart.items, product_id)
        })
        .await
    }

    pub async fn decrement_item(
        &self,
        kind: CartKind,
        cart_id: &str,
        product_id: i32,
    ) -> AppResult<Cart> {
        self.modify(kind, cart_id, None, move |cart| {
            decrement_line(&mut cart.items, product_id)
        })
        .await
    }

    pub async fn delete(&self, kind: CartKind, cart_id: &str) -> AppResult<()> {
        if self.carts.delete(kind, cart_id).await? == 0 {
            return Err(AppError::not_found(kind.label(), "ID", cart_id));
        }
        tracing::info!(kind = %kind, cart_id, "Cart deleted");
        Ok(())
    }

    /// Removes carts untouched since `cutoff`; returns how many were removed.
    pub async fn purge_untouched_since(&self, cutoff: Timestamp) -> AppResult<usize> {
        self.carts.purge_untouched_since(cutoff).await
    }

    /// Applies `change` to the stored cart while its row is locked.
    async fn modify<F>(
        &self,
        kind: CartKind,
        cart_id: &str,
        create_missing: Option<NewCartRecord>,
        change: F,
    ) -> AppResult<Cart>
    where
        F: FnOnce(&mut Cart) -> AppResult<()> + Send,
    {
        let cart = self
            .carts
            .modify(kind, cart_id, create_missing, move |(header, items)| {
                let mut cart = Cart::from_records(header, items);
                change(&mut cart)?;
                let (header, items) = cart.clone().into_records();
                Ok((header, items, cart))
            })
            .await?
            .ok_or_else(|| AppError::not_found(kind.label(), "ID", cart_id))?;
        tracing::debug!(kind = %kind, cart_id, lines = cart.items.len(), "Cart updated");
        Ok(cart)
    }

    async fn save(&self, cart: Cart) -> AppResult<Cart> {
        let snapshot = cart.clone();
        let (header, items) = cart.into_records();
        self.carts.save(header, items).await?;
        tracing::debug!(
            kind = %snapshot.kind,
            cart_id = %snapshot.id,
            lines = snapshot.items.len(),
            "Cart saved"
        );
        Ok(snapshot)
    }
}

/// Adds `line` to `items`. Quantities below one count as one; an existing
/// line for the product gains the quantity and takes the new snapshot fields.
pub(crate) fn add_line(items: &mut Vec<CartLine>, mut line: CartLine) {
    line.quantity = line.quantity.max(1);
    match items.iter_mut().find(|l| l.product_id == line.product_id) {
        Some(existing) => {
            let quantity = existing.quantity.saturating_add(line.quantity);
            *existing = CartLine { quantity, ..line };
        }
        None => items.push(line),
    }
}

pub(crate) fn increment_line(items: &mut [CartLine], product_id: i32) -> AppResult<()> {
    let line = items
        .iter_mut()
        .find(|l| l.product_id == product_id)
        .ok_or_else(|| AppError::not_found("Item", "ID", product_id))?;
    line.quantity = line.quantity.saturating_add(1);
    Ok(())
}

/// Lowers the quantity by one, dropping the line when it reaches zero.
pub(crate) fn decrement_line(items: &mut Vec<CartLine>, product_id: i32) -> AppResult<()> {
    let index = items
        .iter()
        .position(|l| l.product_id == product_id)
        .ok_or_else(|| AppError::not_found("Item", "ID", product_id))?;
    items[index].quantity -= 1;
    if items[index].quantity <= 0 {
        items.remove(index);
    }
    Ok(())
}

/// Folds repeated products of a client-supplied document into one line each.
pub(crate) fn normalize_lines(lines: Vec<CartLine>) -> Vec<CartLine> {
    let mut merged = Vec::with_capacity(lines.len());
    for line in lines {
        add_line(&mut merged, line);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn line(product_id: i32, quantity: i32) -> CartLine {
        CartLine {
            product_id,
            product_name: format!("Product {product_id}"),
            price: BigDecimal::from(10),
            quantity,
            picture_url: None,
            brand: Some("Angular".into()),
            product_type: Some("Boards".into()),
        }
    }

    #[test]
    fn test_add_new_line_appends() {
        let mut items = vec![line(1, 2)];
        add_line(&mut items, line(2, 3));
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].product_id, 2);
        assert_eq!(items[1].quantity, 3);
    }

    #[test]
    fn test_add_existing_line_sums_and_refreshes_snapshot() {
        let mut items = vec![line(1, 2)];
        let mut updated = line(1, 3);
        updated.price = BigDecimal::from(12);
        updated.product_name = "Renamed".into();
        add_line(&mut items, updated);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 5);
        assert_eq!(items[0].price, BigDecimal::from(12));
        assert_eq!(items[0].product_name, "Renamed");
    }

    #[test]
    fn test_non_positive_quantity_counts_as_one() {
        let mut items = Vec::new();
        add_line(&mut items, line(1, 0));
        add_line(&mut items, line(2, -4));
        assert_eq!(items[0].quantity, 1);
        assert_eq!(items[1].quantity, 1);
    }

    #[test]
    fn test_decrement_removes_line_at_zero() {
        let mut items = vec![line(1, 1), line(2, 2)];
        decrement_line(&mut items, 2).unwrap();
        assert_eq!(items[1].quantity, 1);
        decrement_line(&mut items, 1).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, 2);
    }

    #[test]
    fn test_missing_line_is_not_found() {
        let mut items = vec![line(1, 1)];
        let error = increment_line(&mut items, 9).unwrap_err();
        assert_eq!(error.to_string(), "Item with ID '9' not found.");
        assert!(matches!(
            decrement_line(&mut items, 9),
            Err(AppError::NotFound { .. })
        ));
    }

    #[test]
    fn test_normalize_merges_duplicates_in_order() {
        let merged = normalize_lines(vec![line(3, 1), line(1, 2), line(3, 4)]);
        let summary: Vec<(i32, i32)> = merged.iter().map(|l| (l.product_id, l.quantity)).collect();
        assert_eq!(summary, vec![(3, 5), (1, 2)]);
    }

    #[test]
    fn test_records_round_trip_keeps_positions() {
        let mut cart = Cart::empty(CartKind::Basket, "basket-1");
        cart.items = vec![line(5, 1), line(2, 3)];
        let (header, items) = cart.clone().into_records();

        assert_eq!(header.id, "basket-1");
        assert_eq!(items[0].position, 0);
        assert_eq!(items[1].position, 1);
        assert!(items.iter().all(|i| i.cart_id == "basket-1"));
    }

    proptest! {
        #[test]
        fn test_adds_conserve_total_quantity(adds in prop::collection::vec((1i32..6, 1i32..10), 0..40)) {
            let mut items = Vec::new();
            for (product_id, quantity) in &adds {
                add_line(&mut items, line(*product_id, *quantity));
            }

            let expected: i32 = adds.iter().map(|(_, q)| q).sum();
            let actual: i32 = items.iter().map(|l| l.quantity).sum();
            prop_assert_eq!(actual, expected);

            let mut ids: Vec<i32> = items.iter().map(|l| l.product_id).collect();
            ids.sort_unstable();
            ids.dedup();
            prop_assert_eq!(ids.len(), items.len());
        }

        #[test]
        fn test_decrement_never_leaves_empty_lines(start in 1i32..5, steps in 0usize..8) {
            let mut items = vec![line(1, start)];
            for _ in 0..steps {
                let _ = decrement_line(&mut items, 1);
            }
            prop_assert!(items.iter().all(|l| l.quantity > 0));
        }
    }
}
