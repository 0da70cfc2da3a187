pub mod appointment;
pub mod feedback;
pub mod user;

pub use appointment::*;
pub use feedback::*;
pub use user::*;
