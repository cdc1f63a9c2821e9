//! Validation of the Azure provider [`Options`].
//!
//! Every invariant is an independent rule in a fixed table. All rules are run
//! unconditionally and every violation is reported.
use std::fmt::Display;

use snafu::Snafu;
use tracing::warn;

use crate::{
    auth_mode::AuthMode,
    options::{Options, non_empty},
};

type Result<T = (), E = Errors> = std::result::Result<T, E>;

/// A collection of errors discovered during validation.
///
/// Never empty, a valid configuration is reported as [`Ok`].
#[derive(Debug, PartialEq, Eq)]
pub struct Errors(Vec<Error>);

impl Errors {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Error> {
        self.0.iter()
    }
}

impl Display for Errors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            let prefix = match i {
                0 => "",
                _ => ", ",
            };
            write!(f, "{prefix}{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Errors {}

impl IntoIterator for Errors {
    type IntoIter = std::vec::IntoIter<Error>;
    type Item = Error;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Errors {
    type IntoIter = std::slice::Iter<'a, Error>;
    type Item = &'a Error;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A single violated invariant of the [`Options`].
///
/// The messages use the flag names, as they are shown to whoever passed the
/// flags.
#[derive(Clone, Debug, Eq, PartialEq, Snafu)]
pub enum Error {
    #[snafu(display(
        "invalid azure.auth-mode. valid value is either aks, obo, client-credential or passthrough"
    ))]
    InvalidAuthMode,

    #[snafu(display("azure.client-secret or azure.client-assertion must be non-empty"))]
    MissingClientCredential,

    #[snafu(display("azure.aks-token-url must be non-empty"))]
    MissingAksTokenUrl,

    #[snafu(display(
        "azure.graph-call-on-overage-claim cannot be false when passthrough azure.auth-mode is used"
    ))]
    PassthroughRequiresOverageClaim,

    #[snafu(display(
        "azure.skip-group-membership-resolution cannot be false when passthrough azure.auth-mode is used"
    ))]
    PassthroughRequiresSkipResolution,

    #[snafu(display("azure.resource-id must be non-empty for authentication using arc mode"))]
    MissingArcResourceId,

    #[snafu(display("azure.region must be non-empty for authentication using arc mode"))]
    MissingArcRegion,

    #[snafu(display(
        "azure.skip-group-membership-resolution cannot be true when arc azure.auth-mode is used"
    ))]
    ArcForbidsSkipResolution,

    #[snafu(display(
        "azure.graph-call-on-overage-claim cannot be false when arc azure.auth-mode is used"
    ))]
    ArcRequiresOverageClaim,

    #[snafu(display("azure.tenant-id must be non-empty"))]
    MissingTenantId,

    #[snafu(display("azure.client-id must be non-empty when azure.verify-clientID is set"))]
    MissingClientIdForVerification,

    #[snafu(display("azure.pop-hostname must be non-empty when pop token is enabled"))]
    MissingPopHostname,
}

/// A rule returns the error it detects, or [`None`] if the invariant holds.
type Rule = fn(&Options) -> Option<Error>;

/// The rules in reporting order.
const RULES: &[Rule] = &[
    auth_mode_is_known,
    client_credential_is_set,
    aks_token_url_is_set,
    passthrough_resolves_only_on_overage_claim,
    passthrough_skips_group_resolution,
    arc_resource_id_is_set,
    arc_region_is_set,
    arc_resolves_groups,
    arc_resolves_only_on_overage_claim,
    tenant_id_is_set,
    client_id_is_set_for_verification,
    pop_hostname_is_set,
];

fn auth_mode_is_known(o: &Options) -> Option<Error> {
    o.auth_mode().is_none().then_some(Error::InvalidAuthMode)
}

fn client_credential_is_set(o: &Options) -> Option<Error> {
    // Unknown modes count as modes which need a credential.
    let credential_free = o.auth_mode().is_some_and(AuthMode::is_credential_free);
    let has_credential = non_empty(o.client_secret.as_deref()).is_some()
        || non_empty(o.client_assertion.as_deref()).is_some();

    (!credential_free && !has_credential).then_some(Error::MissingClientCredential)
}

fn aks_token_url_is_set(o: &Options) -> Option<Error> {
    (o.auth_mode() == Some(AuthMode::Aks) && non_empty(o.aks_token_url.as_deref()).is_none())
        .then_some(Error::MissingAksTokenUrl)
}

fn passthrough_resolves_only_on_overage_claim(o: &Options) -> Option<Error> {
    (o.auth_mode() == Some(AuthMode::Passthrough)
        && !o.resolve_group_membership_only_on_overage_claim)
        .then_some(Error::PassthroughRequiresOverageClaim)
}

fn passthrough_skips_group_resolution(o: &Options) -> Option<Error> {
    (o.auth_mode() == Some(AuthMode::Passthrough) && !o.skip_group_membership_resolution)
        .then_some(Error::PassthroughRequiresSkipResolution)
}

fn arc_resource_id_is_set(o: &Options) -> Option<Error> {
    (o.auth_mode() == Some(AuthMode::Arc) && non_empty(o.resource_id.as_deref()).is_none())
        .then_some(Error::MissingArcResourceId)
}

fn arc_region_is_set(o: &Options) -> Option<Error> {
    (o.auth_mode() == Some(AuthMode::Arc) && non_empty(o.azure_region.as_deref()).is_none())
        .then_some(Error::MissingArcRegion)
}

fn arc_resolves_groups(o: &Options) -> Option<Error> {
    (o.auth_mode() == Some(AuthMode::Arc) && o.skip_group_membership_resolution)
        .then_some(Error::ArcForbidsSkipResolution)
}

fn arc_resolves_only_on_overage_claim(o: &Options) -> Option<Error> {
    (o.auth_mode() == Some(AuthMode::Arc) && !o.resolve_group_membership_only_on_overage_claim)
        .then_some(Error::ArcRequiresOverageClaim)
}

fn tenant_id_is_set(o: &Options) -> Option<Error> {
    o.tenant_id.is_empty().then_some(Error::MissingTenantId)
}

fn client_id_is_set_for_verification(o: &Options) -> Option<Error> {
    (o.verify_client_id && non_empty(o.client_id.as_deref()).is_none())
        .then_some(Error::MissingClientIdForVerification)
}

fn pop_hostname_is_set(o: &Options) -> Option<Error> {
    (o.enable_pop && non_empty(o.pop_token_hostname.as_deref()).is_none())
        .then_some(Error::MissingPopHostname)
}

impl Options {
    /// Checks every invariant of the options and reports all violations.
    ///
    /// The raw `auth_mode` is lowercased first, so `AKS` and `aks` are the
    /// same mode. This is the only field that gets modified and doing it
    /// twice changes nothing.
    ///
    /// An unknown mode is reported once and otherwise treated like a mode
    /// which needs client credentials, so it can come with a second error
    /// about missing credentials.
    pub fn validate(&mut self) -> Result {
        self.auth_mode = self.auth_mode.to_lowercase();

        let errors: Vec<Error> = RULES.iter().filter_map(|rule| rule(self)).collect();
        if errors.is_empty() {
            return Ok(());
        }

        for error in &errors {
            warn!(auth_mode = %self.auth_mode, %error, "invalid azure provider option");
        }
        Err(Errors(errors))
    }
}
