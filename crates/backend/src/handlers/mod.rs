pub mod admin;
pub mod bands;
pub mod cart;
pub mod contact;
pub mod health;
pub mod orders;
pub mod watches;
