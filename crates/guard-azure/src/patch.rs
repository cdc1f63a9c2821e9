//! Projection of validated [`Options`] onto the Guard [`Deployment`].
//!
//! The credentials never end up in the pod spec itself. They are stored in the
//! [`AUTH_SECRET_NAME`] Secret, which is mounted into the first container and
//! referenced by its environment variables. Everything else is passed to the
//! webhook as `--azure.*` arguments.
use k8s_openapi::api::{apps::v1::Deployment, core::v1::Secret};
use serde::Serialize;
use snafu::{OptionExt, ResultExt, Snafu};
use tracing::{debug, info};

use crate::{
    auth_mode::AuthMode,
    builder::{
        meta::ObjectMetaBuilder,
        pod::{
            PodSpecExt,
            container::{ContainerExt, env_var_from_secret},
            volume::{SecretVolumeBuilder, volume_mount},
        },
        secret::{self, SecretBuilder},
    },
    options::{CLIENT_ASSERTION_ENV, CLIENT_SECRET_ENV, Options, non_empty},
};

pub const AUTH_SECRET_NAME: &str = "guard-azure-auth";
pub const AUTH_SECRET_MOUNT_PATH: &str = "/etc/guard/auth/azure";
/// `r-xr-xr-x`, the mounted credentials are never writable.
pub const AUTH_SECRET_DEFAULT_MODE: i32 = 0o555;

pub const CLIENT_SECRET_SECRET_KEY: &str = "client-secret";
pub const CLIENT_ASSERTION_SECRET_KEY: &str = "client-assertion";

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Eq, PartialEq, Snafu)]
pub enum Error {
    #[snafu(display("deployment {deployment:?} has no pod template spec"))]
    MissingPodSpec { deployment: String },

    #[snafu(display("deployment {deployment:?} has no container to configure"))]
    MissingContainer { deployment: String },

    #[snafu(display("failed to build the azure auth Secret"))]
    BuildSecret { source: secret::Error },
}

/// An object which has to be created alongside the patched [`Deployment`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExtraObject {
    Secret(Secret),
}

/// The result of [`Options::apply`].
#[derive(Clone, Debug, PartialEq)]
pub struct Patched {
    pub deployment: Deployment,

    /// Objects the caller has to persist next to the deployment.
    pub extra_objects: Vec<ExtraObject>,
}

impl Options {
    /// Returns a copy of `deployment` that runs Guard with these options,
    /// together with the [`ExtraObject`]s it depends on.
    ///
    /// The options are expected to have passed [`Options::validate`]. Nothing
    /// already present in the deployment is removed or reordered, the
    /// Secret volume, its mount, the two credential environment variables
    /// and the [`Options::args`] are appended.
    ///
    /// The first container is the Guard container. A deployment without one
    /// is a caller error and reported as [`Error::MissingContainer`].
    pub fn apply(&self, deployment: &Deployment) -> Result<Patched> {
        let deployment_name = deployment.metadata.name.clone().unwrap_or_default();
        let mut deployment = deployment.clone();

        let auth_secret = SecretBuilder::new()
            .metadata(
                ObjectMetaBuilder::new()
                    .name(AUTH_SECRET_NAME)
                    .namespace_and_labels_from(&deployment.metadata)
                    .build(),
            )
            .add_data(
                CLIENT_SECRET_SECRET_KEY,
                self.client_secret.clone().unwrap_or_default(),
            )
            .add_data(
                CLIENT_ASSERTION_SECRET_KEY,
                self.client_assertion.clone().unwrap_or_default(),
            )
            .build()
            .context(BuildSecretSnafu)?;

        let pod_spec = deployment
            .spec
            .as_mut()
            .and_then(|spec| spec.template.spec.as_mut())
            .with_context(|| MissingPodSpecSnafu {
                deployment: deployment_name.clone(),
            })?;
        pod_spec.add_volume(
            SecretVolumeBuilder::new(AUTH_SECRET_NAME, AUTH_SECRET_NAME)
                .default_mode(AUTH_SECRET_DEFAULT_MODE)
                .build(),
        );

        let container = pod_spec
            .containers
            .first_mut()
            .with_context(|| MissingContainerSnafu {
                deployment: deployment_name.clone(),
            })?;
        container
            .add_volume_mount(volume_mount(AUTH_SECRET_NAME, AUTH_SECRET_MOUNT_PATH))
            .add_env_var(env_var_from_secret(
                CLIENT_SECRET_ENV,
                AUTH_SECRET_NAME,
                CLIENT_SECRET_SECRET_KEY,
            ))
            .add_env_var(env_var_from_secret(
                CLIENT_ASSERTION_ENV,
                AUTH_SECRET_NAME,
                CLIENT_ASSERTION_SECRET_KEY,
            ));

        let args = self.args();
        debug!(container = %container.name, ?args, "appending azure arguments");
        container.add_args(args);

        info!(
            deployment = %deployment_name,
            secret = AUTH_SECRET_NAME,
            "configured azure authentication provider"
        );

        Ok(Patched {
            deployment,
            extra_objects: vec![ExtraObject::Secret(auth_secret)],
        })
    }

    /// The `--azure.*` arguments the Guard container is started with.
    ///
    /// Unset optional values are left out, the booleans and the retry count
    /// are always present. Only `aks`, `obo` and `client-credential` are
    /// passed on as the auth mode, see [`AuthMode::emitted`].
    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(environment) = non_empty(self.environment.as_deref()) {
            args.push(format!("--azure.environment={environment}"));
        }
        if let Some(client_id) = non_empty(self.client_id.as_deref()) {
            args.push(format!("--azure.client-id={client_id}"));
        }
        if !self.tenant_id.is_empty() {
            args.push(format!("--azure.tenant-id={}", self.tenant_id));
        }

        let auth_mode = self
            .auth_mode()
            .map_or(AuthMode::ClientCredential, AuthMode::emitted);
        args.push(format!("--azure.auth-mode={auth_mode}"));

        if let Some(aks_token_url) = non_empty(self.aks_token_url.as_deref()) {
            args.push(format!("--azure.aks-token-url={aks_token_url}"));
        }

        args.push(format!("--azure.use-group-uid={}", self.use_group_uid));
        args.push(format!(
            "--azure.graph-call-on-overage-claim={}",
            self.resolve_group_membership_only_on_overage_claim
        ));
        args.push(format!("--azure.verify-clientID={}", self.verify_client_id));
        args.push(format!(
            "--azure.http-client-retry-count={}",
            self.http_client_retry_count
        ));

        args
    }
}
