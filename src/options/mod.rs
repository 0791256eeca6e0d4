//! Server options.
//!
//! # Data Flow
//! ```text
//! Options::add_flags → clap parse → Options::read_flags (clap derive)
//!     → Options::validate (ordered, stops at first failing group)
//!     → Options::apply_to(&mut ServerConfig)
//!         1. discovery manager
//!         2. extra options
//!         3. listener: real (dev mode) or in-memory fake
//!         4. secure serving + loopback
//!         5. authentication (dev mode)
//!         6. fake teardown, secure serving dropped (production)
//! ```
//!
//! # Design Decisions
//! - Groups report all of their own problems, the pipeline reports one group
//! - Authentication is only validated and applied in dev mode
//! - etcd is only validated when it is the storage backend
//! - Apply is fail fast with no rollback; a failed apply aborts startup

pub mod aggregator;
pub mod authentication;
pub mod error;
pub mod etcd;
pub mod extra;
pub mod recommended;
pub mod secure_serving;
pub mod storage;

use std::sync::Arc;

use clap::{ArgMatches, Args, Command, FromArgMatches};
use serde::{Deserialize, Serialize};

use crate::config::ServerConfig;
use crate::discovery::{ResourceManager, DISCOVERY_ROOT};
use crate::net::FakeListener;

pub use aggregator::AggregatorOptions;
pub use authentication::AuthenticationOptions;
pub use error::{ApplyError, ValidationError};
pub use etcd::EtcdOptions;
pub use extra::ExtraOptions;
pub use recommended::RecommendedOptions;
pub use secure_serving::SecureServingOptions;
pub use storage::{StorageOptions, StorageType};

/// Contract shared by every option group. Flags come from each group's
/// `clap::Args` derive.
pub trait OptionGroup {
    /// Report every problem with the group's current values.
    fn validate(&self) -> Vec<ValidationError>;
}

/// One step of the validation pipeline.
#[derive(Clone, Copy)]
pub struct ValidationStep<'a> {
    pub name: &'static str,
    /// Disabled steps are skipped without calling the group.
    pub enabled: bool,
    pub group: &'a dyn OptionGroup,
}

/// Run `steps` in order, returning the errors of the first step that has any.
pub fn run_validation(steps: &[ValidationStep<'_>]) -> Vec<ValidationError> {
    for step in steps {
        if !step.enabled {
            tracing::trace!(group = step.name, "Skipping validation");
            continue;
        }

        let errors = step.group.validate();
        if !errors.is_empty() {
            tracing::debug!(group = step.name, errors = errors.len(), "Option validation failed");
            return errors;
        }
    }
    Vec::new()
}

/// All options of the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Args)]
#[serde(default)]
pub struct Options {
    #[command(flatten)]
    pub recommended: RecommendedOptions,
    #[command(flatten)]
    pub aggregator: AggregatorOptions,
    #[command(flatten)]
    pub storage: StorageOptions,
    #[command(flatten)]
    pub extra: ExtraOptions,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the flags of every group on `cmd`.
    pub fn add_flags(cmd: Command) -> Command {
        <Self as Args>::augment_args(cmd)
    }

    /// Copy the flags present in `matches` onto the groups. Flags that were
    /// not given keep their current value, so flags override an options file.
    pub fn read_flags(&mut self, matches: &ArgMatches) -> Result<(), clap::Error> {
        self.update_from_arg_matches(matches)
    }

    /// Validation pipeline, in evaluation order.
    pub fn validation_steps(&self) -> [ValidationStep<'_>; 6] {
        let dev_mode = self.extra.dev_mode;
        let etcd = self.storage.storage_type == StorageType::Etcd;
        [
            ValidationStep { name: "extra", enabled: true, group: &self.extra },
            ValidationStep { name: "storage", enabled: true, group: &self.storage },
            ValidationStep { name: "aggregator", enabled: true, group: &self.aggregator },
            ValidationStep {
                name: "secure-serving",
                enabled: true,
                group: &self.recommended.secure_serving,
            },
            ValidationStep {
                name: "authentication",
                enabled: dev_mode,
                group: &self.recommended.authentication,
            },
            ValidationStep { name: "etcd", enabled: etcd, group: &self.recommended.etcd },
        ]
    }

    /// Errors of the first failing group, or an empty list.
    pub fn validate(&self) -> Vec<ValidationError> {
        run_validation(&self.validation_steps())
    }

    /// Apply the options onto `config`.
    ///
    /// Outside dev mode secure serving is wired against an in-memory listener
    /// that is closed again before returning, leaving `config.secure_serving`
    /// empty and authentication untouched.
    pub async fn apply_to(&mut self, config: &mut ServerConfig) -> Result<(), ApplyError> {
        self.apply_to_with(config, FakeListener::new).await
    }

    async fn apply_to_with(
        &mut self,
        config: &mut ServerConfig,
        make_fake: impl FnOnce() -> FakeListener,
    ) -> Result<(), ApplyError> {
        let dev_mode = self.extra.dev_mode;
        tracing::info!(dev_mode, storage_type = %self.storage.storage_type, "Applying server options");

        config.aggregated_discovery_group_manager = Some(ResourceManager::new(DISCOVERY_ROOT));

        self.extra.apply_to(config)?;

        if !dev_mode {
            let fake = make_fake();
            tracing::debug!(address = %crate::net::FAKE_LISTENER_ADDR, "Using in-memory listener for secure serving");
            self.recommended.secure_serving.listener = Some(Arc::new(fake));
        }

        self.recommended
            .secure_serving
            .apply_to(&mut config.secure_serving, &mut config.loopback_client_config)
            .await?;

        if dev_mode {
            self.recommended.authentication.apply_to(
                &mut config.authentication,
                config.secure_serving.as_ref(),
                config.open_api_config.as_mut(),
            )?;
        }

        if !dev_mode {
            if let Some(serving) = &config.secure_serving {
                serving.listener.close().map_err(ApplyError::Listener)?;
            }
            config.secure_serving = None;
            // Pointed at the in-memory listener's address.
            config.loopback_client_config = None;
            tracing::info!("Secure serving disabled outside dev mode");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Records its name into a shared log when validated.
    struct Recorder<'a> {
        name: &'static str,
        fail: bool,
        log: &'a RefCell<Vec<&'static str>>,
    }

    impl OptionGroup for Recorder<'_> {
        fn validate(&self) -> Vec<ValidationError> {
            self.log.borrow_mut().push(self.name);
            if self.fail {
                vec![ValidationError::Missing { flag: self.name }]
            } else {
                Vec::new()
            }
        }
    }

    const NAMES: [&str; 6] = ["extra", "storage", "aggregator", "secure-serving", "authentication", "etcd"];

    fn run_with(failing: Option<usize>, enabled: [bool; 6]) -> (Vec<ValidationError>, Vec<&'static str>) {
        let log = RefCell::new(Vec::new());
        let groups: Vec<Recorder<'_>> = NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| Recorder { name: *name, fail: failing == Some(i), log: &log })
            .collect();
        let steps: Vec<ValidationStep<'_>> = groups
            .iter()
            .zip(enabled)
            .map(|(group, enabled)| ValidationStep { name: group.name, enabled, group })
            .collect();
        let errors = run_validation(&steps);
        drop(steps);
        drop(groups);
        (errors, log.into_inner())
    }

    #[test]
    fn failure_stops_later_groups() {
        for k in 0..NAMES.len() {
            let (errors, log) = run_with(Some(k), [true; 6]);
            assert_eq!(log, &NAMES[..=k]);
            assert_eq!(errors, [ValidationError::Missing { flag: NAMES[k] }]);
        }
    }

    #[test]
    fn disabled_steps_are_not_called() {
        let (errors, log) = run_with(Some(4), [true, true, true, true, false, false]);
        assert!(errors.is_empty());
        assert_eq!(log, &NAMES[..4]);
    }

    fn step_flags(options: &Options) -> Vec<(&'static str, bool)> {
        options
            .validation_steps()
            .iter()
            .map(|s| (s.name, s.enabled))
            .collect()
    }

    #[test]
    fn production_non_etcd_skips_auth_and_etcd() {
        let options = Options::new();
        assert_eq!(
            step_flags(&options),
            [
                ("extra", true),
                ("storage", true),
                ("aggregator", true),
                ("secure-serving", true),
                ("authentication", false),
                ("etcd", false),
            ]
        );
    }

    #[test]
    fn dev_mode_enables_auth_regardless_of_storage() {
        for storage_type in [StorageType::File, StorageType::Etcd, StorageType::Unified] {
            let mut options = Options::new();
            options.extra.dev_mode = true;
            options.storage.storage_type = storage_type;
            let steps = step_flags(&options);
            assert_eq!(steps[4], ("authentication", true));
            assert_eq!(steps[5], ("etcd", storage_type == StorageType::Etcd));
        }
    }

    #[test]
    fn first_failing_group_wins() {
        let mut options = Options::new();
        options.storage.address = "no-port".into();
        options.aggregator.proxy_client_cert_file = Some("client.crt".into());

        let errors = options.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].flag(), "apiserver-storage-address");
    }

    #[test]
    fn unused_sections_are_not_validated() {
        let mut options = Options::new();
        // Would fail if checked.
        options.recommended.authentication.token_auth_file = Some("/nonexistent".into());
        options.recommended.etcd.servers.clear();
        assert!(options.validate().is_empty());
    }

    #[tokio::test]
    async fn production_apply_tears_down_fake() {
        let mut options = Options::new();
        let mut config = ServerConfig::new();
        let installed = RefCell::new(None);

        options
            .apply_to_with(&mut config, || {
                let fake = FakeListener::new();
                *installed.borrow_mut() = Some(fake.clone());
                fake
            })
            .await
            .unwrap();

        let fake = installed.into_inner().expect("fake listener installed");
        assert!(fake.is_closed());
        assert!(fake.client_end().is_closed());
        assert!(fake.server_end().is_closed());
        assert!(crate::net::Listener::accept(&fake).await.is_err());

        assert!(config.secure_serving.is_none());
        assert!(config.loopback_client_config.is_none());
        assert!(!config.authentication.is_configured());
        assert_eq!(
            config.aggregated_discovery_group_manager.unwrap().root(),
            DISCOVERY_ROOT
        );
    }

    #[tokio::test]
    async fn teardown_error_is_returned_unchanged() {
        let mut options = Options::new();
        let mut config = ServerConfig::new();

        let err = options
            .apply_to_with(&mut config, || {
                let fake = FakeListener::new();
                fake.client_end().close().unwrap();
                fake
            })
            .await
            .unwrap_err();

        let ApplyError::Listener(io_err) = &err else {
            panic!("unexpected error: {:?}", err);
        };
        assert_eq!(io_err.kind(), std::io::ErrorKind::NotConnected);
        assert_eq!(err.to_string(), io_err.to_string());
    }

    #[tokio::test]
    async fn dev_mode_without_secure_serving_still_authenticates() {
        let mut options = Options::new();
        options.extra.dev_mode = true;
        options.recommended.secure_serving.required = false;
        options.recommended.secure_serving.bind_port = 0;
        assert!(options.validate().is_empty());

        let mut config = ServerConfig::new();
        options.apply_to(&mut config).await.unwrap();

        assert!(config.secure_serving.is_none());
        assert!(config.loopback_client_config.is_none());
        assert!(config.authentication.is_configured());
        assert!(config
            .open_api_config
            .unwrap()
            .security_definitions
            .contains_key(authentication::BEARER_SECURITY_DEFINITION));
    }

    #[test]
    fn flags_override_file_values() {
        let mut options: Options = toml::from_str(
            "[extra]\ndev_mode = true\n[storage]\naddress = \"db:5432\"\n",
        )
        .unwrap();
        let matches = Options::add_flags(Command::new("test"))
            .try_get_matches_from(["test", "--apiserver-dev-mode=false", "--secure-port", "9443"])
            .unwrap();
        options.read_flags(&matches).unwrap();

        assert!(!options.extra.dev_mode);
        assert_eq!(options.storage.address, "db:5432");
        assert_eq!(options.recommended.secure_serving.bind_port, 9443);
        assert_eq!(options.recommended.etcd.prefix, etcd::DEFAULT_ETCD_PATH_PREFIX);
    }

    #[tokio::test]
    async fn production_apply_ignores_configured_listener() {
        let real = crate::net::TcpListener::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let real: Arc<dyn crate::net::Listener> = Arc::new(real);

        let mut options = Options::new();
        options.recommended.secure_serving.listener = Some(real.clone());

        let mut config = ServerConfig::new();
        options.apply_to(&mut config).await.unwrap();

        assert!(config.secure_serving.is_none());
        // The real listener was replaced, not closed.
        real.close().unwrap();
    }

    #[tokio::test]
    async fn failed_apply_keeps_earlier_mutations() {
        let mut options = Options::new();
        options.extra.dev_mode = true;
        options.recommended.authentication.token_auth_file = Some("/nonexistent/tokens".into());
        let real = crate::net::TcpListener::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        options.recommended.secure_serving.listener = Some(Arc::new(real));

        let mut config = ServerConfig::new();
        let err = options.apply_to(&mut config).await.unwrap_err();

        assert!(matches!(err, ApplyError::TokenFile { .. }));
        assert!(config.aggregated_discovery_group_manager.is_some());
        assert!(config.secure_serving.is_some());
        assert!(!config.authentication.is_configured());
    }
}
