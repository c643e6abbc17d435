pub mod event;

pub use event::{Event, Listing, ListingPayload, ScheduleInfo, SubmitRequest};
