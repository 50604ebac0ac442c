use std::collections::HashMap;

use tracing::{debug, warn};

use crate::fx::{create_effect, EffectKind, EffectProcessor};
use crate::synth::{create_source, SourceKind, SourceProcessor};

/// Catalog entry for an editor or the CLI
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub effect: bool,
}

/// Every identifier the registry resolves, sources first
pub fn catalog() -> Vec<CatalogEntry> {
    let sources = SourceKind::ALL.iter().map(|k| CatalogEntry {
        id: k.id(),
        name: k.display_name(),
        effect: false,
    });
    let effects = EffectKind::ALL.iter().map(|k| CatalogEntry {
        id: k.id(),
        name: k.display_name(),
        effect: true,
    });
    sources.chain(effects).collect()
}

/// Resolves engine identifiers to processor instances.
///
/// One instance per identifier is created on first use and kept, so the
/// memoizing engines keep their caches across notes. Unknown identifiers
/// resolve to nothing.
pub struct Registry {
    sample_rate: f32,
    sources: HashMap<SourceKind, Box<dyn SourceProcessor>>,
    effects: HashMap<EffectKind, Box<dyn EffectProcessor>>,
}

impl Registry {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            sources: HashMap::new(),
            effects: HashMap::new(),
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn source(&mut self, id: &str) -> Option<&mut Box<dyn SourceProcessor>> {
        let Some(kind) = SourceKind::from_id(id) else {
            debug!(id, "unknown source engine");
            return None;
        };
        Some(self.source_for(kind))
    }

    pub fn source_for(&mut self, kind: SourceKind) -> &mut Box<dyn SourceProcessor> {
        let sample_rate = self.sample_rate;
        self.sources.entry(kind).or_insert_with(|| {
            debug!(id = kind.id(), "instantiating source");
            create_source(kind, sample_rate)
        })
    }

    /// Install a specific instance, e.g. a seeded noise engine
    pub fn install_source(&mut self, processor: Box<dyn SourceProcessor>) {
        let kind = processor.kind();
        if self.sources.insert(kind, processor).is_some() {
            warn!(id = kind.id(), "replaced cached source instance");
        }
    }

    pub fn effect(&mut self, kind: EffectKind) -> &dyn EffectProcessor {
        let sample_rate = self.sample_rate;
        &**self
            .effects
            .entry(kind)
            .or_insert_with(|| create_effect(kind, sample_rate))
    }

    /// Number of instantiated processors
    pub fn loaded(&self) -> usize {
        self.sources.len() + self.effects.len()
    }
}
