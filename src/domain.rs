pub mod audit;
pub mod delivery;
pub mod error;
pub mod gateway;
pub mod id;
pub mod money;
pub mod order;
pub mod returns;
