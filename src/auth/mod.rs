pub mod sessions;
pub mod token;

pub use sessions::AuthedUser;
