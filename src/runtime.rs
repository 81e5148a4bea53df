//! Runtime - the document, task queue and configuration views are built against.
//!
//! Everything that would be process-wide state lives here instead, so two
//! runtimes are fully independent view trees.

use std::rc::Rc;

use serde_json::Value;

use crate::config::Config;
use crate::dom::Document;
use crate::error::Result;
use crate::reactive::{Model, Scheduler};

struct RuntimeInner {
    document: Document,
    scheduler: Scheduler,
    config: Config,
}

/// Cloneable handle; clones share one document and one scheduler.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    /// A runtime with the default configuration.
    pub fn new() -> Self {
        Self::build(Config::default())
    }

    /// A runtime with a validated configuration.
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: Config) -> Self {
        tracing::debug!(default_tag = %config.default_tag, "runtime created");
        Self {
            inner: Rc::new(RuntimeInner {
                document: Document::new(),
                scheduler: Scheduler::new(),
                config,
            }),
        }
    }

    pub fn document(&self) -> &Document {
        &self.inner.document
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.inner.scheduler
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// A model notifying through this runtime's scheduler.
    pub fn create_model(&self, value: Value) -> Model {
        Model::with_value(&self.inner.scheduler, value)
    }

    /// Deliver pending model notifications.
    pub fn flush(&self) -> usize {
        self.inner.scheduler.flush()
    }

    /// Run one frame of paint work.
    pub fn paint(&self) -> usize {
        self.inner.scheduler.paint()
    }

    /// Run until no notifications or paint work remain.
    pub fn settle(&self) {
        self.inner.scheduler.settle();
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("document", &self.inner.document)
            .field("scheduler", &self.inner.scheduler)
            .field("config", &self.inner.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = Config {
            default_tag: "1nope".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            Runtime::with_config(config).unwrap_err(),
            Error::InvalidConfig(_)
        ));
    }

    #[test]
    fn test_runtimes_are_independent() {
        let a = Runtime::new();
        let b = Runtime::new();
        a.document().create_element("div", Default::default());
        assert_eq!(a.document().node_count(), 2);
        assert_eq!(b.document().node_count(), 1);
    }
}
