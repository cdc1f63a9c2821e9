use std::collections::BTreeMap;

use k8s_openapi::{
    ByteString, api::core::v1::Secret, apimachinery::pkg::apis::meta::v1::ObjectMeta,
};
use snafu::{OptionExt, Snafu};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Eq, PartialEq, Snafu)]
pub enum Error {
    #[snafu(display("object is missing key {key:?}"))]
    MissingObjectKey { key: &'static str },
}

/// A builder to build [`Secret`] objects.
#[derive(Clone, Default)]
pub struct SecretBuilder {
    metadata: Option<ObjectMeta>,
    data: Option<BTreeMap<String, ByteString>>,
}

impl SecretBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metadata(&mut self, metadata: impl Into<ObjectMeta>) -> &mut Self {
        self.metadata = Some(metadata.into());
        self
    }

    /// Adds a data entry. Empty values are kept, the key is always present.
    pub fn add_data(&mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> &mut Self {
        self.data
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), ByteString(value.into()));
        self
    }

    pub fn build(&self) -> Result<Secret> {
        let metadata = self
            .metadata
            .clone()
            .context(MissingObjectKeySnafu { key: "metadata" })?;

        Ok(Secret {
            metadata,
            data: self.data.clone(),
            ..Secret::default()
        })
    }
}
