pub mod event;
pub mod invite;
pub mod order;
pub mod partner;
pub mod profile;
