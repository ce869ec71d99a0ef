pub mod paymentdtos;
pub mod uploaddtos;
pub mod workdtos;
