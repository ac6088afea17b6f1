//! The wall page. There is a single screen, so no router.

pub mod home;
