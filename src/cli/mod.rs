pub mod recipes;
pub mod server;
