pub mod customers;
pub mod meals;
pub mod orders;
pub mod reports;
pub mod staff;
