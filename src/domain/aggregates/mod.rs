//! Aggregates module
pub mod product;
pub mod order;
pub mod cart;

pub use product::{Colors, Product, TaxFamily};
pub use order::{Address, NewAddress, NewOrder, Order, OrderItem, OrderReceipt, OrderStatus, PaymentMethod, PaymentStatus};
pub use cart::{Cart, CartEntry, CartLine, MAX_QUANTITY_PER_LINE};
