pub mod event;

pub use event::{CreateEventRequest, Event, EventChanges, EventPatch};
