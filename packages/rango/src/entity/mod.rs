pub mod category;
pub mod page;
pub mod session;
pub mod user;
pub mod user_profile;
