mod user;

pub use user::{UserPage, UserQuery, UserVo};
