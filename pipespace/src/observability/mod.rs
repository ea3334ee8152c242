//! Observability utilities.

mod tracing;

pub use self::tracing::{
    init_tracing, traced_case_selector, traced_handler, traced_selector, traced_transform,
    TracingConfig,
};
