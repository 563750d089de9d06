pub mod notification;
pub mod product;
pub mod report;
pub mod settings;
pub mod transaction;
pub mod user;
