pub mod auth_cmd;
pub mod cart_cmd;
pub mod notification_cmd;
pub mod product_cmd;
pub mod report_cmd;
pub mod settings_cmd;
pub mod transaction_cmd;
