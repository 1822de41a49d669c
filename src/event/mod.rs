pub mod builder;
pub mod types;

pub use builder::{BuildError, EventBuilder};
pub use types::{
    AttributeValue, EntityMention, Event, EventBody, InstrumentationScope, ResourceInfo,
};
