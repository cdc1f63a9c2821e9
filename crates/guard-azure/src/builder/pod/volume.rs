use k8s_openapi::api::core::v1::{SecretVolumeSource, Volume, VolumeMount};

/// Builds a [`Volume`] which projects every key of a Secret as a file.
#[derive(Clone, Debug, Default)]
pub struct SecretVolumeBuilder {
    name: String,
    secret_name: String,
    default_mode: Option<i32>,
}

impl SecretVolumeBuilder {
    pub fn new(name: impl Into<String>, secret_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            secret_name: secret_name.into(),
            default_mode: None,
        }
    }

    /// Permissions of the projected files, e.g. `0o555`. Kubernetes uses
    /// `0o644` if unset.
    pub fn default_mode(&mut self, default_mode: i32) -> &mut Self {
        self.default_mode = Some(default_mode);
        self
    }

    pub fn build(&self) -> Volume {
        Volume {
            name: self.name.clone(),
            secret: Some(SecretVolumeSource {
                secret_name: Some(self.secret_name.clone()),
                default_mode: self.default_mode,
                ..SecretVolumeSource::default()
            }),
            ..Volume::default()
        }
    }
}

/// Mounts the volume `name` at `mount_path`.
pub fn volume_mount(name: impl Into<String>, mount_path: impl Into<String>) -> VolumeMount {
    VolumeMount {
        name: name.into(),
        mount_path: mount_path.into(),
        ..VolumeMount::default()
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn secret_volume() {
        let volume = SecretVolumeBuilder::new("auth", "guard-azure-auth")
            .default_mode(0o555)
            .build();

        let serialized = serde_yaml::to_string(&volume).expect("volume serializes");
        assert_eq!(serialized, indoc! {"
            name: auth
            secret:
              defaultMode: 365
              secretName: guard-azure-auth
        "});
    }

    #[test]
    fn secret_volume_without_mode() {
        let volume = SecretVolumeBuilder::new("auth", "guard-azure-auth").build();

        assert_eq!(volume.secret.and_then(|secret| secret.default_mode), None);
        assert_eq!(volume.empty_dir, None);
    }

    #[test]
    fn mount() {
        let mount = volume_mount("auth", "/etc/guard/auth/azure");

        assert_eq!(mount.name, "auth");
        assert_eq!(mount.mount_path, "/etc/guard/auth/azure");
        assert_eq!(mount.read_only, None);
        assert_eq!(mount.sub_path, None);
    }
}
