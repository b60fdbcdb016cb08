mod assets;
mod common;
mod groups;
