//! Stage timers for the dispatch hot path, compiled in with the `timing`
//! feature.

#[macro_use]
mod macros;

#[cfg(feature = "timing")]
mod timer;
#[cfg(feature = "timing")]
pub(crate) use timer::Timers;
