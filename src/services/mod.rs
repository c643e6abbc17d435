pub mod datetime;
pub mod events;
pub mod form;
pub mod session;
pub mod stats;
pub mod table;
