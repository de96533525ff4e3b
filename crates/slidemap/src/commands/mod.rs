pub mod completion;
pub mod config;
pub mod locate;
pub mod route;
pub mod version;
