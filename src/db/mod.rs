pub mod db;
pub mod freelancerdb;
pub mod paymentdb;
pub mod userdb;
pub mod workdb;
#[cfg(test)]
pub mod testutils;
