// ABOUTME: Generic launch struct parameterized by state marker.
// ABOUTME: One Launch drives one service from Initialized to Ready or Finished.

use crate::config::{Descriptor, ServiceSpec};
use crate::types::{ContainerId, ImageRef, ServiceName};
use std::marker::PhantomData;
use std::time::Duration;

use super::state::Initialized;

/// A single service's start sequence, parameterized by its current state.
///
/// Transition methods consume `self` and return the next state, so a
/// readiness wait can't be issued before the container exists, and a
/// dependent batch can't observe a launch that hasn't finished.
#[derive(Debug)]
pub struct Launch<S> {
    pub(crate) project: ServiceName,
    pub(crate) service: ServiceName,
    pub(crate) spec: ServiceSpec,
    pub(crate) network: String,
    pub(crate) ready_timeout: Duration,
    pub(crate) container: Option<ContainerId>,
    pub(crate) _state: PhantomData<S>,
}

impl Launch<Initialized> {
    /// Create a launch for one service of the descriptor.
    ///
    /// Returns None if the service is not declared.
    pub fn new(descriptor: &Descriptor, service: &ServiceName) -> Option<Self> {
        let spec = descriptor.spec(service)?.clone();
        Some(Launch {
            project: descriptor.project.clone(),
            service: service.clone(),
            spec,
            network: descriptor.network_name(),
            ready_timeout: descriptor.ready_timeout,
            container: None,
            _state: PhantomData,
        })
    }
}

impl<S> Launch<S> {
    /// The service this launch drives.
    pub fn service(&self) -> &ServiceName {
        &self.service
    }

    /// The image reference from the spec.
    pub fn image(&self) -> &ImageRef {
        &self.spec.image
    }

    /// The spec this launch was built from.
    pub fn spec(&self) -> &ServiceSpec {
        &self.spec
    }
}
