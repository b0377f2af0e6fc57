use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::catalog::ModelCatalog;
use crate::detector::Detector;
use crate::{Device, InferError};

/// Loads detectors by catalog name on first use and caches them.
pub struct DetectorRegistry {
    catalog: ModelCatalog,
    device: Device,
    detectors: Mutex<HashMap<String, Arc<Detector>>>,
}

impl DetectorRegistry {
    pub fn new(catalog: ModelCatalog, device: Device) -> Self {
        Self {
            catalog,
            device,
            detectors: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch a detector, loading it if this is the first request for it.
    /// The cache lock is held across the load so a model is never loaded
    /// twice.
    pub fn get(&self, name: &str) -> Result<Arc<Detector>, InferError> {
        let mut detectors = self.detectors.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(detector) = detectors.get(name) {
            return Ok(Arc::clone(detector));
        }
        let spec = self
            .catalog
            .get(name)
            .ok_or_else(|| InferError::UnknownModel(name.to_string()))?;
        log::info!(
            "loading model {} ({}) from {:?}",
            spec.name,
            spec.kind.name(),
            spec.path
        );
        let detector = Arc::new(Detector::new(spec, self.device.clone())?);
        detectors.insert(name.to_string(), Arc::clone(&detector));
        Ok(detector)
    }

    /// Load every catalog model up front instead of on first request.
    pub fn prewarm(&self) -> Result<(), InferError> {
        for name in self.catalog.names() {
            self.get(name)?;
        }
        Ok(())
    }

    pub fn names(&self) -> Vec<&str> {
        self.catalog.names()
    }
}
