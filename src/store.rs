//! In-memory tables owned by the market actor, and the unit of work that writes
//! to them.
//!
//! Every mutating operation opens a [`Transaction`], stages its writes through
//! it, and calls [`Transaction::commit`] once it has fully succeeded. A
//! transaction that is dropped without being committed replays its undo journal
//! in reverse, so an operation that bails out with `?` half-way through leaves
//! no trace.

use crate::market_actor::MarketError;
use crate::model::{
    normalize_email, Cart, DeletionBatch, Dispute, DisputeId, Order, OrderId, Payment, PaymentId,
    Product, ProductId, SoftDeletable, User, UserId,
};
use std::collections::BTreeMap;
use std::ops::Deref;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
struct Sequences {
    user: u64,
    product: u64,
    order: u64,
    dispute: u64,
    payment: u64,
    batch: u64,
}

/// Every aggregate of the market, keyed by id.
#[derive(Debug, Default)]
pub struct MarketStore {
    pub(crate) users: BTreeMap<UserId, User>,
    pub(crate) products: BTreeMap<ProductId, Product>,
    pub(crate) orders: BTreeMap<OrderId, Order>,
    pub(crate) disputes: BTreeMap<DisputeId, Dispute>,
    pub(crate) payments: BTreeMap<PaymentId, Payment>,
    pub(crate) carts: BTreeMap<UserId, Cart>,
    sequences: Sequences,
}

impl MarketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a unit of work over the store.
    pub fn begin(&mut self) -> Transaction<'_> {
        let sequences = self.sequences;
        Transaction {
            store: self,
            journal: Vec::new(),
            sequences,
            committed: false,
        }
    }

    /// Total number of records across all tables.
    pub fn len(&self) -> usize {
        self.users.len()
            + self.products.len()
            + self.orders.len()
            + self.disputes.len()
            + self.payments.len()
            + self.carts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // -------------------------------------------------------------------------
    // Lookups. Soft-deleted records are still returned; callers decide.
    // -------------------------------------------------------------------------

    pub fn user(&self, id: UserId) -> Result<&User, MarketError> {
        self.users
            .get(&id)
            .ok_or_else(|| MarketError::not_found("User", id))
    }

    pub fn product(&self, id: ProductId) -> Result<&Product, MarketError> {
        self.products
            .get(&id)
            .ok_or_else(|| MarketError::not_found("Product", id))
    }

    pub fn order(&self, id: OrderId) -> Result<&Order, MarketError> {
        self.orders
            .get(&id)
            .ok_or_else(|| MarketError::not_found("Order", id))
    }

    pub fn dispute(&self, id: DisputeId) -> Result<&Dispute, MarketError> {
        self.disputes
            .get(&id)
            .ok_or_else(|| MarketError::not_found("Dispute", id))
    }

    pub fn cart(&self, user: UserId) -> Option<&Cart> {
        self.carts.get(&user)
    }

    pub fn payment_for(&self, order: OrderId) -> Option<&Payment> {
        self.payments.values().find(|p| p.order_id == order)
    }

    /// The non-deleted dispute attached to `order`, if any.
    pub fn live_dispute_for(&self, order: OrderId) -> Option<&Dispute> {
        self.disputes
            .values()
            .find(|d| d.order_id == order && !d.is_deleted())
    }

    /// The non-deleted account holding `email`, if any.
    pub fn active_user_by_email(&self, email: &str) -> Option<&User> {
        let email = normalize_email(email);
        self.users
            .values()
            .find(|u| !u.is_deleted() && u.email == email)
    }

    /// Orders that are neither deleted nor cancelled.
    pub fn active_orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values().filter(|o| o.is_active())
    }

    // -------------------------------------------------------------------------
    // Actor checks
    // -------------------------------------------------------------------------

    /// The acting user, which must exist, be non-deleted and not banned.
    pub fn active_actor(&self, id: UserId) -> Result<&User, MarketError> {
        let user = self
            .users
            .get(&id)
            .ok_or_else(|| MarketError::Forbidden(format!("unknown actor {id}")))?;
        if user.is_deleted() {
            return Err(MarketError::Forbidden(format!("actor {id} is deleted")));
        }
        if !user.is_active() {
            return Err(MarketError::Forbidden(format!("actor {id} is banned")));
        }
        Ok(user)
    }

    pub fn require_admin(&self, id: UserId) -> Result<&User, MarketError> {
        let user = self.active_actor(id)?;
        if !user.is_admin() {
            return Err(MarketError::Forbidden(format!("{id} is not an admin")));
        }
        Ok(user)
    }
}

/// Prior value of one row, restored on rollback.
#[derive(Debug)]
enum Undo {
    User(UserId, Option<User>),
    Product(ProductId, Option<Product>),
    Order(OrderId, Option<Order>),
    Dispute(DisputeId, Option<Dispute>),
    Payment(PaymentId, Option<Payment>),
    Cart(UserId, Option<Cart>),
}

/// A unit of work over a [`MarketStore`].
///
/// Reads go through `Deref` and see staged writes. Writes are whole-record
/// `put_*` calls; the record replaced by each one is journaled.
pub struct Transaction<'a> {
    store: &'a mut MarketStore,
    journal: Vec<Undo>,
    sequences: Sequences,
    committed: bool,
}

macro_rules! journaled_put {
    ($name:ident, $table:ident, $variant:ident, $ty:ty) => {
        pub fn $name(&mut self, record: $ty) {
            let id = record.id;
            let previous = self.store.$table.insert(id, record);
            self.journal.push(Undo::$variant(id, previous));
        }
    };
}

macro_rules! next_id {
    ($name:ident, $field:ident, $ty:ty) => {
        pub fn $name(&mut self) -> $ty {
            self.store.sequences.$field += 1;
            <$ty>::from(self.store.sequences.$field)
        }
    };
}

impl Transaction<'_> {
    journaled_put!(put_user, users, User, User);
    journaled_put!(put_product, products, Product, Product);
    journaled_put!(put_order, orders, Order, Order);
    journaled_put!(put_dispute, disputes, Dispute, Dispute);
    journaled_put!(put_payment, payments, Payment, Payment);

    next_id!(next_user_id, user, UserId);
    next_id!(next_product_id, product, ProductId);
    next_id!(next_order_id, order, OrderId);
    next_id!(next_dispute_id, dispute, DisputeId);
    next_id!(next_payment_id, payment, PaymentId);
    next_id!(next_batch, batch, DeletionBatch);

    pub fn put_cart(&mut self, cart: Cart) {
        let user = cart.user_id;
        let previous = self.store.carts.insert(user, cart);
        self.journal.push(Undo::Cart(user, previous));
    }

    pub fn remove_cart(&mut self, user: UserId) -> Option<Cart> {
        let previous = self.store.carts.remove(&user);
        if previous.is_some() {
            self.journal.push(Undo::Cart(user, previous.clone()));
        }
        previous
    }

    /// Number of writes staged so far.
    pub fn staged(&self) -> usize {
        self.journal.len()
    }

    /// Makes every staged write permanent.
    pub fn commit(mut self) {
        debug!(writes = self.journal.len(), "Transaction committed");
        self.journal.clear();
        self.committed = true;
    }

    fn rollback(&mut self) {
        debug!(writes = self.journal.len(), "Transaction rolled back");
        while let Some(undo) = self.journal.pop() {
            match undo {
                Undo::User(id, prev) => restore(&mut self.store.users, id, prev),
                Undo::Product(id, prev) => restore(&mut self.store.products, id, prev),
                Undo::Order(id, prev) => restore(&mut self.store.orders, id, prev),
                Undo::Dispute(id, prev) => restore(&mut self.store.disputes, id, prev),
                Undo::Payment(id, prev) => restore(&mut self.store.payments, id, prev),
                Undo::Cart(id, prev) => restore(&mut self.store.carts, id, prev),
            }
        }
        self.store.sequences = self.sequences;
    }
}

fn restore<K: Ord, V>(table: &mut BTreeMap<K, V>, key: K, previous: Option<V>) {
    match previous {
        Some(value) => {
            table.insert(key, value);
        }
        None => {
            table.remove(&key);
        }
    }
}

impl Deref for Transaction<'_> {
    type Target = MarketStore;

    fn deref(&self) -> &MarketStore {
        &*self.store
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.rollback();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AccountStatus, Role};
    use chrono::Utc;

    fn user(id: UserId, email: &str) -> User {
        User {
            id,
            name: "Test".into(),
            email: email.into(),
            role: Role::Member,
            status: AccountStatus::Active,
            created_at: Utc::now(),
            deletion: None,
        }
    }

    #[test]
    fn test_commit_keeps_writes() {
        let mut store = MarketStore::new();
        let mut tx = store.begin();
        let id = tx.next_user_id();
        tx.put_user(user(id, "a@campus.edu"));
        assert_eq!(tx.staged(), 1);
        tx.commit();

        assert_eq!(store.user(id).unwrap().email, "a@campus.edu");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_drop_without_commit_rolls_back() {
        let mut store = MarketStore::new();
        let mut tx = store.begin();
        let existing = tx.next_user_id();
        tx.put_user(user(existing, "a@campus.edu"));
        tx.commit();

        {
            let mut tx = store.begin();
            let mut changed = tx.user(existing).unwrap().clone();
            changed.name = "Changed".into();
            tx.put_user(changed);
            let fresh = tx.next_user_id();
            tx.put_user(user(fresh, "b@campus.edu"));
            assert_eq!(tx.user(existing).unwrap().name, "Changed");
        }

        assert_eq!(store.user(existing).unwrap().name, "Test");
        assert_eq!(store.users.len(), 1);

        // The sequence is rewound as well.
        let mut tx = store.begin();
        assert_eq!(tx.next_user_id(), UserId(2));
    }

    #[test]
    fn test_active_actor_rejects_banned_users() {
        let mut store = MarketStore::new();
        let mut banned = user(UserId(1), "x@campus.edu");
        banned.status = AccountStatus::Banned;
        store.users.insert(banned.id, banned);

        assert!(matches!(
            store.active_actor(UserId(1)),
            Err(MarketError::Forbidden(_))
        ));
        assert!(matches!(
            store.active_actor(UserId(9)),
            Err(MarketError::Forbidden(_))
        ));
    }
}
