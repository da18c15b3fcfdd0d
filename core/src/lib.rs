pub mod db;
pub mod engine;
pub mod error;
pub mod merge;
pub mod models;
pub mod service;
pub mod spoonacular;
pub mod state;
