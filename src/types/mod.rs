mod action;
mod platform;

pub use action::{BuildAction, ResolvedFile};
pub use platform::{ApkType, Architecture, Platform, PlatformTarget};
