pub mod admin_service;
pub mod content_service;
pub mod payment_service;
pub mod paypal;
pub mod points_service;
pub mod product_service;
pub mod promotion_service;
pub mod purchase_service;
pub mod upload_service;
pub mod wallet_service;
