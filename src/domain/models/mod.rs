pub mod ai;
pub mod auth;
pub mod guide;
pub mod history;
pub mod user;
