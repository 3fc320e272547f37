pub mod auth_service;
pub mod category_service;
pub mod customer_service;
pub mod order_service;
pub mod product_service;
pub mod report_service;
pub mod settings_service;
