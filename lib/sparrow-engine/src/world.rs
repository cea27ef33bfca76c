use crate::error::EvaluationError;
use crate::source::{
    DataGraph, SourceFlags, TriplesSource, TriplesSourceFactory, TRIPLES_SOURCE_API_MAX,
    TRIPLES_SOURCE_API_MIN,
};
use sparrow_results::FormatRegistry;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::warn;

/// The per-process (or per-test) owner of every registry the engine uses:
/// results formats and triples-source factories.
///
/// There are no hidden singletons; hosts create a world and pass it into
/// the constructors that need one.
pub struct World {
    formats: FormatRegistry,
    factories: RefCell<Vec<TriplesSourceFactory>>,
}

impl World {
    /// A world with the built-in results formats and no source factories.
    pub fn new() -> Self {
        Self {
            formats: FormatRegistry::default(),
            factories: RefCell::new(Vec::new()),
        }
    }

    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    pub fn formats_mut(&mut self) -> &mut FormatRegistry {
        &mut self.formats
    }

    /// Registers a triples-source factory, negotiating its API version.
    ///
    /// Factories outside the supported range are refused with a log record.
    pub fn register_triples_source_factory(
        &self,
        factory: TriplesSourceFactory,
    ) -> Result<(), EvaluationError> {
        if !(TRIPLES_SOURCE_API_MIN..=TRIPLES_SOURCE_API_MAX).contains(&factory.version) {
            warn!(
                "refusing the triples-source factory {} with version {} outside {}..={}",
                factory.name, factory.version, TRIPLES_SOURCE_API_MIN, TRIPLES_SOURCE_API_MAX
            );
            return Err(EvaluationError::UnsupportedFactoryVersion {
                actual: factory.version,
                min: TRIPLES_SOURCE_API_MIN,
                max: TRIPLES_SOURCE_API_MAX,
            });
        }
        self.factories.borrow_mut().push(factory);
        Ok(())
    }

    /// Creates a triples source through a registered factory; the
    /// first-registered factory is the default.
    pub fn new_triples_source(
        &self,
        factory_name: Option<&str>,
        graphs: &[DataGraph],
        flags: SourceFlags,
    ) -> Result<Rc<dyn TriplesSource>, EvaluationError> {
        let factories = self.factories.borrow();
        let factory = match factory_name {
            Some(name) => factories.iter().find(|f| f.name == name),
            None => factories.first(),
        }
        .ok_or(EvaluationError::NoTriplesSourceFactory)?;
        (factory.make)(graphs, flags).map_err(EvaluationError::Source)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryTriplesSource;
    use sparrow_model::Dataset;

    fn factory(version: u32) -> TriplesSourceFactory {
        TriplesSourceFactory {
            name: "memory".to_owned(),
            version,
            make: Rc::new(|_, _| Ok(Rc::new(MemoryTriplesSource::new(Dataset::new())))),
        }
    }

    #[test]
    fn factory_version_negotiation() {
        let world = World::new();
        assert!(matches!(
            world.register_triples_source_factory(factory(99)),
            Err(EvaluationError::UnsupportedFactoryVersion { actual: 99, .. })
        ));
        assert!(world.new_triples_source(None, &[], SourceFlags::default()).is_err());
        world.register_triples_source_factory(factory(1)).unwrap();
        assert!(world
            .new_triples_source(None, &[], SourceFlags::default())
            .is_ok());
        assert!(world
            .new_triples_source(Some("other"), &[], SourceFlags::default())
            .is_err());
    }
}
