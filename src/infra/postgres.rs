pub mod audit_repo;
pub mod delivery_repo;
pub mod order_repo;
pub mod return_repo;
