pub mod common;
mod user_tests;
