pub mod hash;
pub mod media;
pub mod slug;
pub mod url;
