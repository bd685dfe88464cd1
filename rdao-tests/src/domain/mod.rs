mod base;
mod order;
mod user;

pub use base::Base;
pub use order::Order;
pub use user::User;
