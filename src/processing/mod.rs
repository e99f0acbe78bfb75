pub mod artwork;
pub mod blend;
pub mod layout;
pub mod window;
