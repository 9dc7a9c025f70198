pub mod account;
pub mod assistant;
pub mod auth;
pub mod feedback;
pub mod generation;
pub mod guides;
pub mod health;
pub mod history;
pub mod moderation;
