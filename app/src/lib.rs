pub mod config;
pub mod core;
mod database;
mod handlers;
mod middlewares;
mod models;
mod repos;
mod routes;
mod services;
mod utils;

#[cfg(test)]
mod tests;
