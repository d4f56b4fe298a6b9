pub mod db;
pub mod models;
mod projects;
mod tables;

pub use db::{Database, DatabaseError};
pub use tables::*;
