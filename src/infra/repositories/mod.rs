pub mod sqlite_user_repo;
pub mod sqlite_guide_repo;
pub mod sqlite_history_repo;
pub mod sqlite_auth_repo;

pub mod postgres_user_repo;
pub mod postgres_guide_repo;
pub mod postgres_history_repo;
pub mod postgres_auth_repo;
