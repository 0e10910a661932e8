pub mod auth;
pub mod bookings;
pub mod resource;
pub mod server;
pub mod slots;
