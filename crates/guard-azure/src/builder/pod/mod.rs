use k8s_openapi::api::core::v1::{PodSpec, Volume};

pub mod container;
pub mod volume;

/// Append-only helpers on an existing [`PodSpec`].
pub trait PodSpecExt {
    /// Appends `volume` to the pod volumes. Existing volumes, even ones with
    /// the same name, are kept untouched.
    fn add_volume(&mut self, volume: Volume) -> &mut Self;
}

impl PodSpecExt for PodSpec {
    fn add_volume(&mut self, volume: Volume) -> &mut Self {
        self.volumes.get_or_insert_with(Vec::new).push(volume);
        self
    }
}
