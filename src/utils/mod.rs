pub mod money;
pub mod token;
