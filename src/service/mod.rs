pub mod card_gateway;
pub mod error;
pub mod payment_service;
pub mod upload_service;
pub mod work_service;
