pub mod reports;
pub mod tax;
