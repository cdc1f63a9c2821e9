use k8s_openapi::api::core::v1::{Container, EnvVar, EnvVarSource, SecretKeySelector, VolumeMount};

/// Creates an [`EnvVar`] whose value is read from `secret_key` of the Secret
/// `secret_name` when the container starts.
pub fn env_var_from_secret(
    env_var_name: impl Into<String>,
    secret_name: impl Into<String>,
    secret_key: impl Into<String>,
) -> EnvVar {
    EnvVar {
        name: env_var_name.into(),
        value_from: Some(EnvVarSource {
            secret_key_ref: Some(SecretKeySelector {
                name: secret_name.into(),
                key: secret_key.into(),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Append-only helpers on an existing [`Container`].
///
/// None of these remove or reorder entries which are already present.
pub trait ContainerExt {
    fn add_volume_mount(&mut self, volume_mount: VolumeMount) -> &mut Self;

    fn add_env_var(&mut self, env_var: EnvVar) -> &mut Self;

    fn add_args(&mut self, args: impl IntoIterator<Item = String>) -> &mut Self;
}

impl ContainerExt for Container {
    fn add_volume_mount(&mut self, volume_mount: VolumeMount) -> &mut Self {
        self.volume_mounts
            .get_or_insert_with(Vec::new)
            .push(volume_mount);
        self
    }

    fn add_env_var(&mut self, env_var: EnvVar) -> &mut Self {
        self.env.get_or_insert_with(Vec::new).push(env_var);
        self
    }

    fn add_args(&mut self, args: impl IntoIterator<Item = String>) -> &mut Self {
        self.args.get_or_insert_with(Vec::new).extend(args);
        self
    }
}
