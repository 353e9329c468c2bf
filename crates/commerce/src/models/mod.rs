//! Domain models for the transaction core.
//!
//! These types represent validated domain objects separate from database
//! row types; each storage backend maps its own rows into them.

pub mod address;
pub mod cart;
pub mod order;
pub mod product;

pub use address::{Address, AddressPatch, NewAddress};
pub use cart::CartItem;
pub use order::{Order, OrderDetails, OrderItem, OrderLine};
pub use product::{NewProduct, Product};
