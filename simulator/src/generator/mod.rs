pub mod feed;
pub mod profile;
