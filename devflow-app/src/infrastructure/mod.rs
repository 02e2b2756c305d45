pub mod cache;
pub mod db;
pub mod security;
