pub mod band;
pub mod cart;
pub mod contact;
pub mod order;
pub mod watch;
