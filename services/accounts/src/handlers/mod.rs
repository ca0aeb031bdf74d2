pub mod health;
pub mod login;
pub mod user;
pub mod verify;
