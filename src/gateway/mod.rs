pub mod pages;
pub mod routes;
pub mod server;
