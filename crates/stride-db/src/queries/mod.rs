pub mod completions;
pub mod measurements;
pub mod sessions;
pub mod users;
