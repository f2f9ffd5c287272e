pub mod codec;
pub mod communication;
pub mod history;
pub mod import;
pub mod macros;
pub mod session;
