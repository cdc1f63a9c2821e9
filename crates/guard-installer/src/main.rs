//! Patches a Guard webhook Deployment so that it authenticates against Azure.
//!
//! The Deployment manifest is read from `--deployment` (or stdin), the
//! patched Deployment is written to stdout together with the objects it
//! depends on, as one multi-document YAML stream.
use std::{
    fs,
    io::{self, Read, Write},
    path::{Path, PathBuf},
};

use clap::Parser;
use guard_azure::{
    Options, Patched, k8s_openapi::api::apps::v1::Deployment, patch, validation,
};
use guard_telemetry::{Tracing, tracing::TelemetryOptions};
use snafu::{ResultExt, Snafu};
use tracing::{debug, info};

const APP_NAME: &str = "guard-installer";

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to initialize tracing"))]
    InitTracing {
        source: guard_telemetry::tracing::Error,
    },

    #[snafu(display("failed to read the deployment from {input}"))]
    ReadDeployment { source: io::Error, input: String },

    #[snafu(display("failed to parse the deployment"))]
    ParseDeployment { source: serde_yaml::Error },

    #[snafu(display("the azure options are invalid"))]
    InvalidOptions { source: validation::Errors },

    #[snafu(display("failed to patch the deployment"))]
    Patch { source: patch::Error },

    #[snafu(display("failed to serialize the patched objects"))]
    SerializeOutput { source: serde_yaml::Error },

    #[snafu(display("failed to write the patched objects"))]
    WriteOutput { source: io::Error },
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Path to the Guard Deployment manifest. Read from stdin if omitted.
    #[arg(long, value_name = "FILE")]
    deployment: Option<PathBuf>,

    #[command(flatten)]
    azure: Options,

    #[command(flatten)]
    telemetry: TelemetryOptions,
}

#[snafu::report]
fn main() -> Result<()> {
    let Cli {
        deployment,
        azure,
        telemetry,
    } = Cli::parse();

    let _tracing_guard = Tracing::from_options(APP_NAME, telemetry)
        .init()
        .context(InitTracingSnafu)?;

    let deployment = read_deployment(deployment.as_deref(), io::stdin().lock())?;
    let patched = patch_deployment(azure, &deployment)?;

    io::stdout()
        .lock()
        .write_all(render(&patched)?.as_bytes())
        .context(WriteOutputSnafu)
}

fn read_deployment(path: Option<&Path>, mut stdin: impl Read) -> Result<Deployment> {
    let manifest = match path {
        Some(path) => {
            debug!(path = %path.display(), "reading deployment");
            fs::read_to_string(path).with_context(|_| ReadDeploymentSnafu {
                input: path.display().to_string(),
            })?
        }
        None => {
            debug!("reading deployment from stdin");
            let mut manifest = String::new();
            stdin
                .read_to_string(&mut manifest)
                .context(ReadDeploymentSnafu { input: "stdin" })?;
            manifest
        }
    };

    serde_yaml::from_str(&manifest).context(ParseDeploymentSnafu)
}

fn patch_deployment(mut options: Options, deployment: &Deployment) -> Result<Patched> {
    options.validate().context(InvalidOptionsSnafu)?;
    options.apply(deployment).context(PatchSnafu)
}

/// Renders the extra objects followed by the Deployment, each document
/// starting with `---`.
fn render(patched: &Patched) -> Result<String> {
    let mut output = String::new();

    for extra_object in &patched.extra_objects {
        output.push_str("---\n");
        output.push_str(&serde_yaml::to_string(extra_object).context(SerializeOutputSnafu)?);
    }
    output.push_str("---\n");
    output.push_str(&serde_yaml::to_string(&patched.deployment).context(SerializeOutputSnafu)?);

    info!(
        documents = patched.extra_objects.len() + 1,
        "rendered patched objects"
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use guard_azure::k8s_openapi::api::core::v1::Secret;
    use indoc::indoc;
    use rstest::rstest;
    use serde::Deserialize;

    use super::*;

    const DEPLOYMENT: &str = indoc! {"
        apiVersion: apps/v1
        kind: Deployment
        metadata:
          name: guard
          namespace: kube-system
        spec:
          selector:
            matchLabels:
              app: guard
          template:
            metadata:
              labels:
                app: guard
            spec:
              containers:
                - name: guard
                  image: ghcr.io/kubeguard/guard:v0.17.0
                  args:
                    - run
    "};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once(APP_NAME).chain(args.iter().copied()))
            .expect("arguments are valid")
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_cli() {
        let cli = parse(&[
            "--deployment=guard.yaml",
            "--azure.tenant-id=t1",
            "--azure.use-group-uid=false",
            "--console-log-disabled",
        ]);

        assert_eq!(cli.deployment, Some(PathBuf::from("guard.yaml")));
        assert_eq!(cli.azure.tenant_id, "t1");
        assert!(!cli.azure.use_group_uid);
        assert!(cli.telemetry.console_log_disabled);
    }

    #[test]
    fn round_trip() {
        let cli = parse(&["--azure.tenant-id=t1", "--azure.client-secret=s1"]);

        let deployment =
            read_deployment(None, DEPLOYMENT.as_bytes()).expect("deployment is valid");
        let patched = patch_deployment(cli.azure, &deployment).expect("options are valid");
        let output = render(&patched).expect("objects serialize");

        assert!(output.starts_with("---\n"));
        let mut documents = serde_yaml::Deserializer::from_str(&output);

        let secret = Secret::deserialize(documents.next().expect("secret document"))
            .expect("first document is a secret");
        assert_eq!(secret.metadata.name.as_deref(), Some("guard-azure-auth"));
        assert_eq!(secret.metadata.namespace.as_deref(), Some("kube-system"));

        let deployment = Deployment::deserialize(documents.next().expect("deployment document"))
            .expect("second document is a deployment");
        assert_eq!(deployment, patched.deployment);
        let args = deployment
            .spec
            .and_then(|spec| spec.template.spec)
            .and_then(|pod_spec| pod_spec.containers.into_iter().next())
            .and_then(|container| container.args)
            .expect("container has arguments");
        assert_eq!(args, vec![
            "run",
            "--azure.tenant-id=t1",
            "--azure.auth-mode=client-credential",
            "--azure.use-group-uid=true",
            "--azure.graph-call-on-overage-claim=false",
            "--azure.verify-clientID=false",
            "--azure.http-client-retry-count=2",
        ]);

        assert!(documents.next().is_none());
    }

    #[rstest]
    #[case::missing_tenant(&["--azure.client-secret=s1"], 1)]
    #[case::aks_without_token_url(&["--azure.auth-mode=aks", "--azure.tenant-id=t1"], 1)]
    #[case::aks_without_tenant(&["--azure.auth-mode=AKS"], 2)]
    fn invalid_options(#[case] args: &[&str], #[case] expected_errors: usize) {
        let cli = parse(args);
        let deployment =
            read_deployment(None, DEPLOYMENT.as_bytes()).expect("deployment is valid");

        match patch_deployment(cli.azure, &deployment) {
            Err(Error::InvalidOptions { source }) => assert_eq!(source.len(), expected_errors),
            other => panic!("expected invalid options, got {other:?}"),
        }
    }

    #[test]
    fn read_deployment_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temporary file can be created");
        file.write_all(DEPLOYMENT.as_bytes())
            .expect("temporary file is writable");

        let deployment =
            read_deployment(Some(file.path()), io::empty()).expect("deployment is valid");
        assert_eq!(deployment.metadata.name.as_deref(), Some("guard"));
    }

    #[test]
    fn read_deployment_errors() {
        assert!(matches!(
            read_deployment(Some(Path::new("/nonexistent/guard.yaml")), io::empty()),
            Err(Error::ReadDeployment { .. })
        ));
        assert!(matches!(
            read_deployment(None, "kind: [".as_bytes()),
            Err(Error::ParseDeployment { .. })
        ));
    }
}
