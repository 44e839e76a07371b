pub mod auth;
pub mod rango;
