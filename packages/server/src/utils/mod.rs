pub mod jwt;
pub mod language;
