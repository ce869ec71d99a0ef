pub mod freelancermodel;
pub mod paymentmodel;
pub mod usermodel;
pub mod workmodel;
