#[cfg(feature = "env")]
pub mod env;

#[cfg(feature = "logger")]
pub mod logger;

#[cfg(feature = "net")]
pub mod net;

#[cfg(feature = "process")]
pub mod process;
