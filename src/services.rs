pub mod checkout;
pub mod delivery;
pub mod returns;
