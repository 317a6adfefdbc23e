pub use common::{Error, Result};

pub static STATE_FILE: &str = ".unit-state.json";
pub static DEFAULT_PEBBLE_BIN: &str = "pebble";

/// Event loop harness: wiring, deferred re-emission, current event
pub mod dispatch;
pub use dispatch::{Host, dispatch};

/// Queue of events waiting for re-delivery
pub mod deferred;
pub use deferred::{DeferredEvent, DeferredStore};

/// Juju hook tool client
pub mod hooktools;
pub use hooktools::HookTools;

/// Pebble CLI client
pub mod pebble;
pub use pebble::PebbleClient;

/// Log integrations
pub mod telemetry;
