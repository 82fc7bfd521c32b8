use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use diesel::prelude::*;
use diesel::{AsExpression, FromSqlRow, sql_types::Text};

use super::text_enum_sql;

/// Baskets and wishlists share the `carts` tables and differ only by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub enum CartKind {
    Basket,
    Wishlist,
}

impl CartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CartKind::Basket => "basket",
            CartKind::Wishlist => "wishlist",
        }
    }

    /// Capitalized name used in client-facing messages.
    pub fn label(&self) -> &'static str {
        match self {
            CartKind::Basket => "Basket",
            CartKind::Wishlist => "Wishlist",
        }
    }
}

impl fmt::Display for CartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CartKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basket" => Ok(CartKind::Basket),
            "wishlist" => Ok(CartKind::Wishlist),
            _ => Err(format!("Unrecognized cart kind: {s}")),
        }
    }
}

text_enum_sql!(CartKind);

#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::carts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartRecord {
    pub kind: CartKind,
    pub id: String,
    pub delivery_method_id: Option<i32>,
    pub client_secret: Option<String>,
    pub payment_intent_id: Option<String>,
    pub shipping_price: BigDecimal,
    pub updated_at: jiff_diesel::Timestamp,
}

/// Insert-or-replace shape for the cart header row.
#[derive(Debug, Insertable, AsChangeset, Clone)]
#[diesel(table_name = crate::schema::carts)]
#[diesel(treat_none_as_null = true)]
pub struct NewCartRecord {
    pub kind: CartKind,
    pub id: String,
    pub delivery_method_id: Option<i32>,
    pub client_secret: Option<String>,
    pub payment_intent_id: Option<String>,
    pub shipping_price: BigDecimal,
    pub updated_at: jiff_diesel::Timestamp,
}

#[derive(Debug, Queryable, Selectable, Insertable, Clone, PartialEq)]
#[diesel(table_name = crate::schema::cart_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartItemRecord {
    pub kind: CartKind,
    pub cart_id: String,
    pub product_id: i32,
    pub position: i32,
    pub product_name: String,
    pub price: BigDecimal,
    pub quantity: i32,
    pub picture_url: Option<String>,
    pub brand: Option<String>,
    pub product_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_text() {
        assert_eq!(CartKind::Basket.as_str(), "basket");
        assert_eq!("wishlist".parse::<CartKind>(), Ok(CartKind::Wishlist));
        assert!("Basket".parse::<CartKind>().is_err());
        assert_eq!(CartKind::Wishlist.label(), "Wishlist");
    }
}
