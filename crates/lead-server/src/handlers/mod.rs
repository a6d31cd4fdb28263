pub mod chat;
pub mod content;
pub mod health;
pub mod models;
pub mod sessions;
pub mod studio;
