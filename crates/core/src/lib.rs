pub mod cart;
pub mod config;
pub mod conversation;
pub mod errors;
pub mod menu;

pub use cart::{Cart, CartLine};
pub use conversation::{Conversation, Role, ToolCallRequest, Turn};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use menu::{format_price, MenuItem};
