//! The configuration record of the Azure authentication provider.
//!
//! [`Options`] can be built in two ways:
//!
//! - From code, using [`Options::new`] with explicitly passed
//!   [`EnvironmentDefaults`]. Nothing in this path reads the process
//!   environment.
//! - From the command line (feature `clap`), by flattening [`Options`] into a
//!   [`clap::Parser`]. The flag names are the `--azure.*` names understood by
//!   the Guard webhook itself, and the two credentials fall back to the
//!   `AZURE_CLIENT_SECRET` and `AZURE_CLIENT_ASSERTION` environment variables.
//!
//! ```
//! use guard_azure::{AuthMode, EnvironmentDefaults, Options};
//!
//! let options = Options::new(EnvironmentDefaults::default());
//!
//! assert_eq!(options.auth_mode(), Some(AuthMode::ClientCredential));
//! assert!(options.use_group_uid);
//! assert_eq!(options.http_client_retry_count, 2);
//! ```
use std::{fmt, time::Duration};

use educe::Educe;

use crate::auth_mode::AuthMode;

/// Environment variable holding the default client secret.
pub const CLIENT_SECRET_ENV: &str = "AZURE_CLIENT_SECRET";
/// Environment variable holding the default client assertion.
pub const CLIENT_ASSERTION_ENV: &str = "AZURE_CLIENT_ASSERTION";

pub const DEFAULT_POP_TOKEN_VALIDITY_DURATION: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_HTTP_CLIENT_RETRY_COUNT: i32 = 2;

/// The externally sourced defaults of [`Options`].
///
/// These are the only values which come from the process environment, see
/// [`EnvironmentDefaults::from_env`].
#[derive(Clone, Default, Educe, Eq, PartialEq)]
#[educe(Debug)]
pub struct EnvironmentDefaults {
    #[educe(Debug(method(redact)))]
    pub client_secret: Option<String>,

    #[educe(Debug(method(redact)))]
    pub client_assertion: Option<String>,
}

impl EnvironmentDefaults {
    /// Reads [`CLIENT_SECRET_ENV`] and [`CLIENT_ASSERTION_ENV`] from the
    /// process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`], but resolves variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            client_secret: lookup(CLIENT_SECRET_ENV),
            client_assertion: lookup(CLIENT_ASSERTION_ENV),
        }
    }
}

/// Options of the Azure authentication provider.
///
/// Optional string fields which are set to the empty string are treated
/// exactly like unset ones.
///
/// Boolean flags accept both the bare form (`--azure.enable-pop`) and an
/// explicit value (`--azure.use-group-uid=false`). Explicit values may be
/// spelled `1`/`0`, `t`/`f` or `true`/`false` in any case.
#[cfg_attr(feature = "clap", derive(clap::Args))]
#[cfg_attr(feature = "clap", command(next_help_heading = "Azure Options"))]
#[derive(Clone, Educe, Eq, PartialEq)]
#[educe(Debug)]
pub struct Options {
    /// Azure cloud environment
    #[cfg_attr(feature = "clap", arg(long = "azure.environment"))]
    pub environment: Option<String>,

    /// MS Graph application client ID to use
    #[cfg_attr(feature = "clap", arg(long = "azure.client-id"))]
    pub client_id: Option<String>,

    /// MS Graph application client secret to use
    #[cfg_attr(
        feature = "clap",
        arg(long = "azure.client-secret", env = CLIENT_SECRET_ENV, hide_env_values = true)
    )]
    #[educe(Debug(method(redact)))]
    pub client_secret: Option<String>,

    /// MS Graph application client assertion (JWT) to use
    #[cfg_attr(
        feature = "clap",
        arg(long = "azure.client-assertion", env = CLIENT_ASSERTION_ENV, hide_env_values = true)
    )]
    #[educe(Debug(method(redact)))]
    pub client_assertion: Option<String>,

    /// MS Graph application tenant id to use
    #[cfg_attr(feature = "clap", arg(long = "azure.tenant-id", default_value = ""))]
    pub tenant_id: String,

    /// Use group UID for authentication instead of group display name
    #[cfg_attr(
        feature = "clap",
        arg(
            long = "azure.use-group-uid",
            default_value_t = true,
            action = clap::ArgAction::Set,
            value_parser = clap::builder::BoolishValueParser::new(),
            num_args = 0..=1,
            require_equals = true,
            default_missing_value = "true",
        )
    )]
    pub use_group_uid: bool,

    /// auth mode to call graph api, valid value is either aks, arc, obo, client-credential or passthrough
    #[cfg_attr(
        feature = "clap",
        arg(long = "azure.auth-mode", default_value_t = AuthMode::default().to_string())
    )]
    pub auth_mode: String,

    /// url to call for AKS OBO flow
    #[cfg_attr(feature = "clap", arg(long = "azure.aks-token-url"))]
    pub aks_token_url: Option<String>,

    /// Enabling pop token verification
    #[cfg_attr(
        feature = "clap",
        arg(
            long = "azure.enable-pop",
            default_value_t = false,
            action = clap::ArgAction::Set,
            value_parser = clap::builder::BoolishValueParser::new(),
            num_args = 0..=1,
            require_equals = true,
            default_missing_value = "true",
        )
    )]
    pub enable_pop: bool,

    /// hostname used to run the pop hostname verification; 'u' claim
    #[cfg_attr(feature = "clap", arg(long = "azure.pop-hostname"))]
    pub pop_token_hostname: Option<String>,

    /// time duration for PoP token to be considered valid from creation time, default 15 min
    #[cfg_attr(
        feature = "clap",
        arg(
            long = "azure.pop-token-validity-duration",
            default_value = "15m",
            value_parser = humantime::parse_duration,
        )
    )]
    pub pop_token_validity_duration: Duration,

    /// set to true to resolve group membership only when overage claim is present. setting to false will always call graph api to resolve group membership
    #[cfg_attr(
        feature = "clap",
        arg(
            long = "azure.graph-call-on-overage-claim",
            default_value_t = false,
            action = clap::ArgAction::Set,
            value_parser = clap::builder::BoolishValueParser::new(),
            num_args = 0..=1,
            require_equals = true,
            default_missing_value = "true",
        )
    )]
    pub resolve_group_membership_only_on_overage_claim: bool,

    /// when set to true, this will bypass getting group membership from graph api
    #[cfg_attr(
        feature = "clap",
        arg(
            long = "azure.skip-group-membership-resolution",
            default_value_t = false,
            action = clap::ArgAction::Set,
            value_parser = clap::builder::BoolishValueParser::new(),
            num_args = 0..=1,
            require_equals = true,
            default_missing_value = "true",
        )
    )]
    pub skip_group_membership_resolution: bool,

    /// set to true to validate token's audience claim matches clientID
    #[cfg_attr(
        feature = "clap",
        arg(
            long = "azure.verify-clientID",
            default_value_t = false,
            action = clap::ArgAction::Set,
            value_parser = clap::builder::BoolishValueParser::new(),
            num_args = 0..=1,
            require_equals = true,
            default_missing_value = "true",
        )
    )]
    pub verify_client_id: bool,

    // Resource id and region are needed to look up the user's security groups
    // through the Arc OBO service.
    /// azure cluster resource id (//subscription/<subName>/resourcegroups/<RGname>/providers/Microsoft.Kubernetes/connectedClusters/<clustername> for connectedk8s) used for making getMemberGroups to ARC OBO service
    #[cfg_attr(feature = "clap", arg(long = "azure.auth-resource-id"))]
    pub resource_id: Option<String>,

    /// region where cluster is deployed
    #[cfg_attr(feature = "clap", arg(long = "azure.region"))]
    pub azure_region: Option<String>,

    /// number of retries for retryablehttp client
    #[cfg_attr(
        feature = "clap",
        arg(
            long = "azure.http-client-retry-count",
            default_value_t = DEFAULT_HTTP_CLIENT_RETRY_COUNT,
            allow_negative_numbers = true,
        )
    )]
    pub http_client_retry_count: i32,
}

impl Options {
    /// Returns [`Options`] with every documented default applied.
    pub fn new(defaults: EnvironmentDefaults) -> Self {
        let EnvironmentDefaults {
            client_secret,
            client_assertion,
        } = defaults;

        Self {
            environment: None,
            client_id: None,
            client_secret,
            client_assertion,
            tenant_id: String::new(),
            use_group_uid: true,
            auth_mode: AuthMode::default().to_string(),
            aks_token_url: None,
            enable_pop: false,
            pop_token_hostname: None,
            pop_token_validity_duration: DEFAULT_POP_TOKEN_VALIDITY_DURATION,
            resolve_group_membership_only_on_overage_claim: false,
            skip_group_membership_resolution: false,
            verify_client_id: false,
            resource_id: None,
            azure_region: None,
            http_client_retry_count: DEFAULT_HTTP_CLIENT_RETRY_COUNT,
        }
    }

    /// Parses the raw `auth_mode`.
    ///
    /// Returns [`None`] for anything that is not one of the [`AuthMode`]
    /// literals. The raw value is only lowercased by [`Self::validate`].
    pub fn auth_mode(&self) -> Option<AuthMode> {
        self.auth_mode.parse().ok()
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::new(EnvironmentDefaults::default())
    }
}

/// Returns the value if it is set and not empty.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

#[allow(clippy::ref_option)]
fn redact(value: &Option<String>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value {
        Some(_) => f.write_str("Some(<redacted>)"),
        None => f.write_str("None"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn new_applies_defaults() {
        let options = Options::new(EnvironmentDefaults {
            client_secret: Some("s1".to_owned()),
            client_assertion: None,
        });

        assert_eq!(options.client_secret.as_deref(), Some("s1"));
        assert_eq!(options.client_assertion, None);
        assert_eq!(options.auth_mode, "client-credential");
        assert!(options.use_group_uid);
        assert_eq!(options.pop_token_validity_duration, Duration::from_secs(900));
        assert_eq!(options.http_client_retry_count, 2);
        assert!(options.tenant_id.is_empty());
    }

    #[test]
    fn environment_defaults_from_lookup() {
        let env = HashMap::from([
            (CLIENT_SECRET_ENV, "secret"),
            (CLIENT_ASSERTION_ENV, "assertion"),
            ("UNRELATED", "value"),
        ]);

        let defaults = EnvironmentDefaults::from_lookup(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(defaults, EnvironmentDefaults {
            client_secret: Some("secret".to_owned()),
            client_assertion: Some("assertion".to_owned()),
        });
    }

    #[test]
    fn debug_redacts_credentials() {
        let options = Options::new(EnvironmentDefaults {
            client_secret: Some("super-secret".to_owned()),
            client_assertion: Some("jwt-assertion".to_owned()),
        });

        let debug = format!("{options:?} {:?}", EnvironmentDefaults {
            client_secret: Some("super-secret".to_owned()),
            client_assertion: None,
        });

        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("jwt-assertion"));
        assert!(debug.contains("Some(<redacted>)"));
    }

    #[test]
    fn non_empty_treats_empty_as_unset() {
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some("")), None);
        assert_eq!(non_empty(Some("x")), Some("x"));
    }

    #[cfg(feature = "clap")]
    mod cli {
        use clap::Parser;
        use rstest::rstest;

        use super::*;

        #[derive(Debug, Parser)]
        struct Cli {
            #[command(flatten)]
            azure: Options,
        }

        fn parse(args: &[&str]) -> Options {
            Cli::try_parse_from(std::iter::once("guard").chain(args.iter().copied()))
                .expect("arguments must parse")
                .azure
        }

        #[test]
        fn verify_cli() {
            use clap::CommandFactory;

            Cli::command().debug_assert()
        }

        #[test]
        fn parse_all_flags() {
            let options = parse(&[
                "--azure.environment=AzurePublicCloud",
                "--azure.client-id=cid",
                "--azure.client-secret=s1",
                "--azure.client-assertion=a1",
                "--azure.tenant-id=t1",
                "--azure.use-group-uid=false",
                "--azure.auth-mode=AKS",
                "--azure.aks-token-url=https://aks.example/token",
                "--azure.enable-pop",
                "--azure.pop-hostname=cluster.example",
                "--azure.pop-token-validity-duration=1h30m",
                "--azure.graph-call-on-overage-claim=true",
                "--azure.skip-group-membership-resolution",
                "--azure.verify-clientID=true",
                "--azure.auth-resource-id=/subscriptions/sub/resourceGroups/rg",
                "--azure.region=westeurope",
                "--azure.http-client-retry-count=5",
            ]);

            assert_eq!(options, Options {
                environment: Some("AzurePublicCloud".to_owned()),
                client_id: Some("cid".to_owned()),
                client_secret: Some("s1".to_owned()),
                client_assertion: Some("a1".to_owned()),
                tenant_id: "t1".to_owned(),
                use_group_uid: false,
                auth_mode: "AKS".to_owned(),
                aks_token_url: Some("https://aks.example/token".to_owned()),
                enable_pop: true,
                pop_token_hostname: Some("cluster.example".to_owned()),
                pop_token_validity_duration: Duration::from_secs(90 * 60),
                resolve_group_membership_only_on_overage_claim: true,
                skip_group_membership_resolution: true,
                verify_client_id: true,
                resource_id: Some("/subscriptions/sub/resourceGroups/rg".to_owned()),
                azure_region: Some("westeurope".to_owned()),
                http_client_retry_count: 5,
            });
        }

        #[rstest]
        #[case::bare(&["--azure.enable-pop"], true)]
        #[case::explicit_true(&["--azure.enable-pop=true"], true)]
        #[case::explicit_false(&["--azure.enable-pop=false"], false)]
        #[case::absent(&[], false)]
        #[case::one(&["--azure.enable-pop=1"], true)]
        #[case::zero(&["--azure.enable-pop=0"], false)]
        #[case::short_true(&["--azure.enable-pop=t"], true)]
        #[case::short_false(&["--azure.enable-pop=F"], false)]
        #[case::upper_case(&["--azure.enable-pop=TRUE"], true)]
        #[case::mixed_case(&["--azure.enable-pop=False"], false)]
        fn parse_bool_flag(#[case] args: &[&str], #[case] expected: bool) {
            assert_eq!(parse(args).enable_pop, expected);
        }

        #[rstest]
        #[case::attached(&["--azure.http-client-retry-count=-1"], -1)]
        #[case::separate(&["--azure.http-client-retry-count", "-3"], -3)]
        #[case::default(&[], 2)]
        fn parse_retry_count(#[case] args: &[&str], #[case] expected: i32) {
            assert_eq!(parse(args).http_client_retry_count, expected);
        }

        #[test]
        fn parse_rejects_bad_duration() {
            let result = Cli::try_parse_from([
                "guard",
                "--azure.pop-token-validity-duration=soon",
            ]);

            assert!(result.is_err());
        }
    }
}
