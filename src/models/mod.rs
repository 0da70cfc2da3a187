pub mod appointment;
pub mod enums;
pub mod feedback;
pub mod user;

pub use appointment::*;
pub use enums::*;
pub use feedback::*;
pub use user::*;
