pub mod clean_links;
pub mod launch;
pub mod restore;
pub mod validate;
