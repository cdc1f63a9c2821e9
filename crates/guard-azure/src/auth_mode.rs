use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

/// The protocol Guard uses to obtain the token for resolving group
/// memberships against the Microsoft Graph API.
///
/// Parsing is case-sensitive, [`Options::validate`][crate::Options::validate]
/// lowercases the raw flag value before it gets here.
#[derive(
    AsRefStr,
    Clone,
    Copy,
    Debug,
    Default,
    Display,
    EnumIter,
    EnumString,
    Eq,
    Hash,
    IntoStaticStr,
    PartialEq,
)]
#[strum(serialize_all = "kebab-case")]
pub enum AuthMode {
    /// Token exchange through the AKS managed token endpoint.
    Aks,

    /// Group lookup through the Azure Arc on-behalf-of service.
    Arc,

    /// Delegated on-behalf-of flow using the caller's token.
    Obo,

    /// Static application client credential (secret or assertion).
    #[default]
    ClientCredential,

    /// The caller's identity is passed through, groups come from the token.
    Passthrough,
}

impl AuthMode {
    /// Whether the mode runs without a client secret or assertion.
    pub fn is_credential_free(self) -> bool {
        matches!(self, Self::Aks | Self::Arc | Self::Passthrough)
    }

    /// The mode the running webhook is started with.
    ///
    /// The webhook binary only understands `aks`, `obo` and
    /// `client-credential` as flag values, every other mode is emitted as
    /// `client-credential`.
    pub fn emitted(self) -> Self {
        match self {
            Self::Aks | Self::Obo | Self::ClientCredential => self,
            Self::Arc | Self::Passthrough => Self::ClientCredential,
        }
    }
}
