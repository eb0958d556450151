//! Test helper functions for integration tests
//!
//! Shared across the test files using the tests/common/ pattern.

#![allow(dead_code)]

use library_core::library::{PackDescriptor, PackEntry};
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize logging for tests (only once per test run)
pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_level(true),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

pub fn pack(id: &str, version: &str, bundle_ref: &str) -> PackDescriptor {
    PackDescriptor {
        id: id.to_string(),
        name: id.to_string(),
        description: format!("{id} terms"),
        version: version.to_string(),
        entry_count: None,
        category: None,
        icon: None,
        bundle_ref: bundle_ref.to_string(),
    }
}

pub fn entry(title: &str, trigger: &str) -> PackEntry {
    PackEntry {
        title: title.to_string(),
        trigger: Some(trigger.to_string()),
        definition: format!("What {title} means"),
        ..Default::default()
    }
}
