//! A source composed of several sources.
//!
//! Inner sources are merged in the order given (later wins), so a group of
//! related sources can be registered under a single id and priority.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::error::SourceError;
use crate::partial::Partial;
use crate::source::{ObservableSource, Source};

#[derive(Debug)]
pub struct AggregateSource {
    sources: Vec<Arc<dyn Source>>,
    merged: ArcSwap<Partial>,
}

impl AggregateSource {
    pub fn new(sources: Vec<Arc<dyn Source>>) -> Self {
        let merged = merge_all(&sources);
        Self {
            sources,
            merged: ArcSwap::from_pointee(merged),
        }
    }
}

fn merge_all(sources: &[Arc<dyn Source>]) -> Partial {
    let mut merged = Partial::new();
    for source in sources {
        merged.merge_from(&source.partial());
    }
    merged
}

impl Source for AggregateSource {
    fn partial(&self) -> Arc<Partial> {
        self.merged.load_full()
    }

    /// Closes every inner source, returning the first error.
    fn close(&self) -> Result<(), SourceError> {
        let mut first_error = None;
        for source in &self.sources {
            if let Err(e) = source.close() {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn as_observable(&self) -> Option<&dyn ObservableSource> {
        Some(self)
    }
}

impl ObservableSource for AggregateSource {
    /// Reloads every observable inner source. The merged content is rebuilt
    /// when any of them changed, even if another one failed.
    fn reload(&self) -> Result<bool, SourceError> {
        let mut changed = false;
        let mut first_error = None;

        for source in &self.sources {
            let Some(observable) = source.as_observable() else {
                continue;
            };
            match observable.reload() {
                Ok(c) => changed |= c,
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        if changed {
            self.merged.store(Arc::new(merge_all(&self.sources)));
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(changed),
        }
    }
}
