pub mod canonicalize;
pub mod envelope;
pub mod events;
pub mod hash;
pub mod smoke;
