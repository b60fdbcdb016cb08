pub mod asset;
pub mod auth;
pub mod group;
pub mod review;
