pub mod assignment;
pub mod fleet;
pub mod lifecycle;
pub mod matching;
pub mod profiles;
pub mod provisioning;
pub mod verification;
