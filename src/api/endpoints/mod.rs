pub mod appointments;
pub mod auth;
pub mod feedback;
pub mod health;
