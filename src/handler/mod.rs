pub mod admin;
pub mod freelancer;
pub mod payment;
pub mod upload;
