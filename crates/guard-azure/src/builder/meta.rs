use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// A builder to build [`ObjectMeta`] objects.
#[derive(Clone, Debug, Default)]
pub struct ObjectMetaBuilder {
    name: Option<String>,
    namespace: Option<String>,
    labels: Option<BTreeMap<String, String>>,
}

impl ObjectMetaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    /// Copies namespace and labels from `metadata`, the name is left alone.
    pub fn namespace_and_labels_from(&mut self, metadata: &ObjectMeta) -> &mut Self {
        self.namespace.clone_from(&metadata.namespace);
        self.labels.clone_from(&metadata.labels);
        self
    }

    pub fn build(&self) -> ObjectMeta {
        ObjectMeta {
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            labels: self.labels.clone(),
            ..ObjectMeta::default()
        }
    }
}
