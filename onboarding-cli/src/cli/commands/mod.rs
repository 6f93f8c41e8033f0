pub mod apply;
pub mod config;
pub mod course;
pub mod health;
pub mod run;
pub mod session;
