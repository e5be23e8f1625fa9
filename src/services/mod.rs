pub mod email;
pub mod employee;
