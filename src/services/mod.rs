pub mod audit;
pub mod auth;
pub mod classes;
pub mod links;
pub mod messages;
pub mod moods;
pub mod roles;
pub mod schedules;
pub mod tasks;
pub mod users;
