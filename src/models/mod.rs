pub mod auth;
pub mod class;
pub mod link;
pub mod message;
pub mod mood;
pub mod schedule;
pub mod task;
pub mod user;
