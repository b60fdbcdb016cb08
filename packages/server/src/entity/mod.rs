pub mod asset;
pub mod group;
pub mod group_member;
pub mod review;
pub mod user_preference;
pub mod video;
