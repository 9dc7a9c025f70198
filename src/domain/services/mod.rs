pub mod assistant_service;
pub mod auth_service;
pub mod generation;
pub mod guide_service;
pub mod moderation;
pub mod notification_service;
pub mod plans;
pub mod validation;
