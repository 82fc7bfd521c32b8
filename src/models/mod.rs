//! Diesel row types and the text-backed enums stored alongside them.

/// Stores an enum as its `as_str()` text and reads it back through `FromStr`.
macro_rules! text_enum_sql {
    ($ty:ty) => {
        impl diesel::query_builder::QueryId for $ty {
            type QueryId = $ty;
            const HAS_STATIC_QUERY_ID: bool = false;
        }

        impl diesel::serialize::ToSql<diesel::sql_types::Text, diesel::pg::Pg> for $ty {
            fn to_sql<'b>(
                &'b self,
                out: &mut diesel::serialize::Output<'b, '_, diesel::pg::Pg>,
            ) -> diesel::serialize::Result {
                use std::io::Write;
                out.write_all(self.as_str().as_bytes())?;
                Ok(diesel::serialize::IsNull::No)
            }
        }

        impl diesel::deserialize::FromSql<diesel::sql_types::Text, diesel::pg::Pg> for $ty {
            fn from_sql(
                bytes: <diesel::pg::Pg as diesel::backend::Backend>::RawValue<'_>,
            ) -> diesel::deserialize::Result<Self> {
                let s = <String as diesel::deserialize::FromSql<
                    diesel::sql_types::Text,
                    diesel::pg::Pg,
                >>::from_sql(bytes)?;
                s.parse::<$ty>().map_err(Into::into)
            }
        }
    };
}

pub(crate) use text_enum_sql;

mod cart;
mod catalog;
mod notification;
mod order;
mod role;
mod token;
mod user;

pub use cart::{CartItemRecord, CartKind, CartRecord, NewCartRecord};
pub use catalog::{
    NewProduct, NewProductBrand, NewProductReview, NewProductType, Product, ProductBrand,
    ProductReview, ProductType, UpdateProduct,
};
pub use notification::{
    NewOrderNotification, NotificationKind, NotificationStatus, OrderNotification,
};
pub use order::{
    DeliveryMethod, NewDeliveryMethod, NewOrder, NewOrderItem, Order, OrderItem, OrderStatus,
};
pub use role::{
    BuiltInRole, NewRole, Permission, PermissionAction, PermissionModule, Role, RolePermission,
    UserRole,
};
pub use token::{NewPasswordResetToken, NewRefreshToken, PasswordResetToken, RefreshToken};
pub use user::{Address, FailedLogin, NewUser, UpdateUser, User};
