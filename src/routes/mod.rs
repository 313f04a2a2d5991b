pub mod admin;
pub mod auth;
pub mod classes;
pub mod health;
pub mod links;
pub mod messages;
pub mod moods;
pub mod schedules;
pub mod tasks;
pub mod users;
