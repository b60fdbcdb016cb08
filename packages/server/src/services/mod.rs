//! Request-level operations. Handlers stay thin: they parse input, call one of these
//! and shape the response.

pub mod groups;
pub mod lifecycle;
pub mod reviews;
pub mod users;

pub use groups::GroupService;
pub use lifecycle::AssetService;
pub use reviews::ReviewService;
pub use users::UserService;
