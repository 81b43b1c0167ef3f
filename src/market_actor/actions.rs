//! Messages understood by the Market actor.

use crate::checkout::CheckoutRequest;
use crate::market_actor::MarketError;
use crate::model::{
    AccountStatus, Cart, ConfirmSide, Dispute, DisputeId, EntityRecord, EntityRef, Order,
    OrderDetails, OrderId, OrderRole, OrderStatus, ProductCreate, ProductId, ProductUpdate,
    ProductView, User, UserCreate, UserId,
};

/// One request to the market. `actor` is always the user on whose behalf the
/// request is made.
#[derive(Debug, Clone)]
pub enum MarketAction {
    // Catalog
    RegisterUser(UserCreate),
    SetUserStatus {
        actor: UserId,
        user: UserId,
        status: AccountStatus,
    },
    GetUser(UserId),
    CreateProduct {
        seller: UserId,
        params: ProductCreate,
    },
    UpdateProduct {
        actor: UserId,
        product: ProductId,
        update: ProductUpdate,
    },
    GetProduct(ProductId),
    AvailableQuantity(ProductId),

    // Cart
    AddToCart {
        user: UserId,
        product: ProductId,
        quantity: u32,
    },
    UpdateCartItem {
        user: UserId,
        product: ProductId,
        quantity: u32,
    },
    RemoveFromCart {
        user: UserId,
        product: ProductId,
    },
    GetCart(UserId),

    // Orders
    CreateOrder {
        buyer: UserId,
        request: CheckoutRequest,
    },
    Confirm {
        order: OrderId,
        side: ConfirmSide,
        actor: UserId,
    },
    Cancel {
        order: OrderId,
        actor: UserId,
    },
    SetOrderStatus {
        order: OrderId,
        status: OrderStatus,
        actor: UserId,
    },
    OrderDetails {
        order: OrderId,
        actor: UserId,
    },
    OrdersFor {
        actor: UserId,
        role: OrderRole,
    },

    // Disputes
    OpenDispute {
        order: OrderId,
        reason: String,
        actor: UserId,
    },
    AddDisputeMessage {
        dispute: DisputeId,
        text: String,
        actor: UserId,
    },
    ResolveDispute {
        dispute: DisputeId,
        resolution: String,
        actor: UserId,
    },
    CloseDispute {
        dispute: DisputeId,
        actor: UserId,
    },
    GetDispute {
        dispute: DisputeId,
        actor: UserId,
    },

    // Administration
    SoftDelete {
        target: EntityRef,
        actor: UserId,
    },
    Restore {
        target: EntityRef,
        actor: UserId,
    },
}

/// Results returned by the Market actor.
#[derive(Debug, Clone, PartialEq)]
pub enum MarketActionResult {
    User(User),
    Product(ProductView),
    Quantity(u32),
    Cart(Cart),
    Order(Order),
    Orders(Vec<Order>),
    OrderDetails(OrderDetails),
    Dispute(Dispute),
    Record(EntityRecord),
}

/// Generates `into_<variant>` accessors that unwrap one variant or report the
/// mismatch as [`MarketError::UnexpectedResult`].
macro_rules! result_accessors {
    ($($variant:ident => $ty:ty),+ $(,)?) => {
        paste::paste! {
            impl MarketActionResult {
                $(
                    pub fn [<into_ $variant:snake>](self) -> Result<$ty, MarketError> {
                        match self {
                            MarketActionResult::$variant(value) => Ok(value),
                            other => Err(MarketError::UnexpectedResult(format!(
                                "expected {}, got {:?}",
                                stringify!($variant),
                                other
                            ))),
                        }
                    }
                )+
            }
        }
    };
}

result_accessors! {
    User => User,
    Product => ProductView,
    Quantity => u32,
    Cart => Cart,
    Order => Order,
    Orders => Vec<Order>,
    OrderDetails => OrderDetails,
    Dispute => Dispute,
    Record => EntityRecord,
}
