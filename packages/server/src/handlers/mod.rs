pub mod assets;
pub mod auth;
pub mod groups;
pub mod reviews;
