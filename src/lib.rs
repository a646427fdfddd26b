pub mod config;
pub mod data;
pub mod db;
pub mod error;
pub mod gateway;
pub mod map;
pub mod page;
pub mod query;
pub mod render;
pub mod review;
