//! Order Tracking Value Objects
//!
//! Immutable types describing orders and the updates applied to them.

mod order_state;
mod order_type;
mod order_update;
mod trade_fee;
mod trade_type;
mod trade_update;
mod update_outcome;

pub use order_state::OrderState;
pub use order_type::OrderType;
pub use order_update::OrderUpdate;
pub use trade_fee::TradeFee;
pub use trade_type::TradeType;
pub use trade_update::TradeUpdate;
pub use update_outcome::{UpdateChannel, UpdateOutcome, UpdateRejection};
