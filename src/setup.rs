// MIT License - Copyright (c) 2026 Peter Wright
// Setup and re-authentication wizards

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use dialoguer::{Input, Password};
use tracing::info;

use crate::client::{ClientError, PanelClient};
use crate::config::{BridgeConfig, ConfigError, MqttConfig, OptionsConfig, ServiceConfig};

/// Constructs a client from (username, password, usercodes, auto-bypass).
/// The wizard is the only place a client is built from scratch.
pub trait ClientFactory {
    fn connect(
        &self,
        username: &str,
        password: &str,
        usercodes: &HashMap<u32, String>,
        auto_bypass_low_battery: bool,
    ) -> Result<Box<dyn PanelClient>, ClientError>;
}

impl<F> ClientFactory for F
where
    F: Fn(
        &str,
        &str,
        &HashMap<u32, String>,
        bool,
    ) -> Result<Box<dyn PanelClient>, ClientError>,
{
    fn connect(
        &self,
        username: &str,
        password: &str,
        usercodes: &HashMap<u32, String>,
        auto_bypass_low_battery: bool,
    ) -> Result<Box<dyn PanelClient>, ClientError> {
        self(username, password, usercodes, auto_bypass_low_battery)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationSummary {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// An account with this username is already configured.
    AlreadyConfigured,
    /// The account has no locations to monitor.
    NoLocations,
    /// The user walked away mid-flow.
    Abandoned,
}

/// The finished credential set, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedSetup {
    pub username: String,
    pub password: String,
    pub usercodes: HashMap<u32, String>,
}

/// Data carried across the code-collection steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupContext {
    username: String,
    password: String,
    locations: Vec<LocationSummary>,
    codes: BTreeMap<u32, String>,
}

/// Setup flow states. Each transition is a pure function of
/// (state, input); all I/O happens in the effects the runner executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupState {
    AwaitingCredentials,
    Authenticating { username: String, password: String },
    AwaitingCode { ctx: SetupContext, current: usize },
    ValidatingCode { ctx: SetupContext, current: usize },
    Complete(CompletedSetup),
    Aborted(AbortReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupInput {
    Credentials { username: String, password: String },
    AuthSucceeded { locations: Vec<LocationSummary> },
    AuthFailed,
    Code(String),
    CodeAccepted(String),
    CodeRejected,
    Abandon,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupEffect {
    PromptCredentials { retry: bool },
    Authenticate { username: String, password: String },
    PromptCode { location: LocationSummary, retry: bool },
    ValidateCode { location_id: u32, code: String },
    Persist(CompletedSetup),
}

/// The setup flow's transition table.
pub struct SetupWizard {
    /// Username of the already-persisted record, for the uniqueness check.
    existing_username: Option<String>,
}

impl SetupWizard {
    pub fn new(existing_username: Option<String>) -> Self {
        Self { existing_username }
    }

    pub fn start(&self) -> (SetupState, Vec<SetupEffect>) {
        (
            SetupState::AwaitingCredentials,
            vec![SetupEffect::PromptCredentials { retry: false }],
        )
    }

    pub fn advance(&self, state: SetupState, input: SetupInput) -> (SetupState, Vec<SetupEffect>) {
        match (state, input) {
            (SetupState::AwaitingCredentials, SetupInput::Credentials { username, password }) => {
                if self.existing_username.as_deref() == Some(username.as_str()) {
                    return (SetupState::Aborted(AbortReason::AlreadyConfigured), vec![]);
                }
                let effect = SetupEffect::Authenticate {
                    username: username.clone(),
                    password: password.clone(),
                };
                (SetupState::Authenticating { username, password }, vec![effect])
            }

            (SetupState::Authenticating { .. }, SetupInput::AuthFailed) => (
                SetupState::AwaitingCredentials,
                vec![SetupEffect::PromptCredentials { retry: true }],
            ),

            (
                SetupState::Authenticating { username, password },
                SetupInput::AuthSucceeded { locations },
            ) => {
                if locations.is_empty() {
                    return (SetupState::Aborted(AbortReason::NoLocations), vec![]);
                }
                let ctx = SetupContext {
                    username,
                    password,
                    locations,
                    codes: BTreeMap::new(),
                };
                Self::collect_code(ctx, 0, false)
            }

            (SetupState::AwaitingCode { ctx, current }, SetupInput::Code(code)) => {
                let location_id = ctx.locations[current].id;
                (
                    SetupState::ValidatingCode { ctx, current },
                    vec![SetupEffect::ValidateCode { location_id, code }],
                )
            }

            (
                SetupState::ValidatingCode { mut ctx, current },
                SetupInput::CodeAccepted(code),
            ) => {
                ctx.codes.insert(ctx.locations[current].id, code);
                Self::collect_code(ctx, current + 1, false)
            }

            (SetupState::ValidatingCode { ctx, current }, SetupInput::CodeRejected) => {
                // Same location again until it validates or the user quits.
                Self::collect_code(ctx, current, true)
            }

            (
                SetupState::AwaitingCode { .. } | SetupState::ValidatingCode { .. },
                SetupInput::Abandon,
            ) => (SetupState::Aborted(AbortReason::Abandoned), vec![]),

            // Inputs that don't apply to the current state are ignored.
            (state, _) => (state, vec![]),
        }
    }

    fn collect_code(
        ctx: SetupContext,
        from: usize,
        retry: bool,
    ) -> (SetupState, Vec<SetupEffect>) {
        if let Some(location) = ctx.locations.get(from).cloned() {
            (
                SetupState::AwaitingCode { ctx, current: from },
                vec![SetupEffect::PromptCode { location, retry }],
            )
        } else {
            let done = CompletedSetup {
                username: ctx.username,
                password: ctx.password,
                usercodes: ctx.codes.into_iter().collect(),
            };
            (
                SetupState::Complete(done.clone()),
                vec![SetupEffect::Persist(done)],
            )
        }
    }
}

/// Re-authentication flow: password only, against the known username and
/// stored usercodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReauthState {
    AwaitingPassword,
    Validating { password: String },
    Complete { password: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReauthInput {
    Password(String),
    AuthSucceeded,
    AuthFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReauthEffect {
    PromptPassword { retry: bool },
    Validate { password: String },
    UpdateRecord { password: String },
}

pub fn reauth_start() -> (ReauthState, Vec<ReauthEffect>) {
    (
        ReauthState::AwaitingPassword,
        vec![ReauthEffect::PromptPassword { retry: false }],
    )
}

pub fn reauth_advance(state: ReauthState, input: ReauthInput) -> (ReauthState, Vec<ReauthEffect>) {
    match (state, input) {
        (ReauthState::AwaitingPassword, ReauthInput::Password(password)) => (
            ReauthState::Validating {
                password: password.clone(),
            },
            vec![ReauthEffect::Validate { password }],
        ),
        (ReauthState::Validating { password }, ReauthInput::AuthSucceeded) => (
            ReauthState::Complete {
                password: password.clone(),
            },
            vec![ReauthEffect::UpdateRecord { password }],
        ),
        (ReauthState::Validating { .. }, ReauthInput::AuthFailed) => (
            ReauthState::AwaitingPassword,
            vec![ReauthEffect::PromptPassword { retry: true }],
        ),
        (state, _) => (state, vec![]),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("no configuration record at {0}; run setup first")]
    NotConfigured(String),
}

#[derive(Debug)]
pub enum SetupOutcome {
    Completed(BridgeConfig),
    Aborted(AbortReason),
}

/// Drive the setup machine with terminal prompts, executing effects against
/// the client factory, and persist the result.
pub fn run_setup(
    config_path: &Path,
    factory: &dyn ClientFactory,
) -> Result<SetupOutcome, SetupError> {
    let existing_username = BridgeConfig::load(config_path)
        .ok()
        .map(|config| config.service.username);

    let wizard = SetupWizard::new(existing_username);
    let (mut state, mut effects) = wizard.start();
    let mut client: Option<Box<dyn PanelClient>> = None;

    loop {
        let mut inputs = Vec::new();
        for effect in effects.drain(..) {
            match effect {
                SetupEffect::PromptCredentials { retry } => {
                    if retry {
                        eprintln!("Authentication failed, try again.");
                    }
                    let username: String = Input::new()
                        .with_prompt("Total Connect username")
                        .interact_text()?;
                    let password = Password::new().with_prompt("Password").interact()?;
                    inputs.push(SetupInput::Credentials { username, password });
                }

                SetupEffect::Authenticate { username, password } => {
                    match factory.connect(&username, &password, &HashMap::new(), false) {
                        Ok(connected) => {
                            let locations = connected
                                .locations()
                                .values()
                                .map(|location| LocationSummary {
                                    id: location.id,
                                    name: location.name.clone(),
                                })
                                .collect();
                            client = Some(connected);
                            inputs.push(SetupInput::AuthSucceeded { locations });
                        }
                        Err(ClientError::Authentication) => inputs.push(SetupInput::AuthFailed),
                        Err(err) => return Err(err.into()),
                    }
                }

                SetupEffect::PromptCode { location, retry } => {
                    if retry {
                        eprintln!("That code was rejected for {}.", location.name);
                    }
                    let code: String = Input::new()
                        .with_prompt(format!(
                            "Usercode for {} (empty to abort)",
                            location.name
                        ))
                        .allow_empty(true)
                        .interact_text()?;
                    if code.is_empty() {
                        inputs.push(SetupInput::Abandon);
                    } else {
                        inputs.push(SetupInput::Code(code));
                    }
                }

                SetupEffect::ValidateCode { location_id, code } => {
                    let connected = client
                        .as_mut()
                        .ok_or_else(|| ClientError::Other("client not connected".into()))?;
                    if connected.validate_usercode(location_id, &code)? {
                        inputs.push(SetupInput::CodeAccepted(code));
                    } else {
                        inputs.push(SetupInput::CodeRejected);
                    }
                }

                SetupEffect::Persist(done) => {
                    let config = BridgeConfig {
                        service: ServiceConfig {
                            username: done.username,
                            password: done.password,
                            usercodes: done.usercodes,
                        },
                        options: OptionsConfig::default(),
                        mqtt: MqttConfig::default(),
                    };
                    config.save(config_path)?;
                    info!("Configuration written to {}", config_path.display());
                    return Ok(SetupOutcome::Completed(config));
                }
            }
        }

        if let SetupState::Aborted(reason) = state {
            return Ok(SetupOutcome::Aborted(reason));
        }

        for input in inputs {
            let (next, mut new_effects) = wizard.advance(state, input);
            state = next;
            effects.append(&mut new_effects);
        }
    }
}

/// Re-collect the password, validate it against the stored username and
/// usercodes, and update the record in place. The running bridge picks the
/// change up on its next reload.
pub fn run_reauth(
    config_path: &Path,
    factory: &dyn ClientFactory,
) -> Result<BridgeConfig, SetupError> {
    let mut config = BridgeConfig::load(config_path)
        .map_err(|_| SetupError::NotConfigured(config_path.display().to_string()))?;

    let (mut state, mut effects) = reauth_start();

    loop {
        let mut inputs = Vec::new();
        for effect in effects.drain(..) {
            match effect {
                ReauthEffect::PromptPassword { retry } => {
                    if retry {
                        eprintln!("Authentication failed, try again.");
                    }
                    let password = Password::new()
                        .with_prompt(format!("Password for {}", config.service.username))
                        .interact()?;
                    inputs.push(ReauthInput::Password(password));
                }

                ReauthEffect::Validate { password } => {
                    match factory.connect(
                        &config.service.username,
                        &password,
                        &config.service.usercodes,
                        config.options.auto_bypass_low_battery,
                    ) {
                        Ok(_) => inputs.push(ReauthInput::AuthSucceeded),
                        Err(ClientError::Authentication) => inputs.push(ReauthInput::AuthFailed),
                        Err(err) => return Err(err.into()),
                    }
                }

                ReauthEffect::UpdateRecord { password } => {
                    config.service.password = password;
                    config.save(config_path)?;
                    info!("Credentials updated; reload the bridge to pick them up");
                    return Ok(config);
                }
            }
        }

        for input in inputs {
            let (next, mut new_effects) = reauth_advance(state, input);
            state = next;
            effects.append(&mut new_effects);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> SetupInput {
        SetupInput::Credentials {
            username: "user@example.com".into(),
            password: "hunter2".into(),
        }
    }

    fn two_locations() -> Vec<LocationSummary> {
        vec![
            LocationSummary {
                id: 10,
                name: "Home".into(),
            },
            LocationSummary {
                id: 20,
                name: "Cabin".into(),
            },
        ]
    }

    #[test]
    fn test_duplicate_username_aborts() {
        let wizard = SetupWizard::new(Some("user@example.com".into()));
        let (state, _) = wizard.start();
        let (state, effects) = wizard.advance(state, credentials());
        assert_eq!(state, SetupState::Aborted(AbortReason::AlreadyConfigured));
        assert!(effects.is_empty());
    }

    #[test]
    fn test_no_locations_aborts() {
        let wizard = SetupWizard::new(None);
        let (state, _) = wizard.start();
        let (state, _) = wizard.advance(state, credentials());
        let (state, effects) =
            wizard.advance(state, SetupInput::AuthSucceeded { locations: vec![] });
        assert_eq!(state, SetupState::Aborted(AbortReason::NoLocations));
        assert!(effects.is_empty());
    }

    #[test]
    fn test_auth_failure_reprompts() {
        let wizard = SetupWizard::new(None);
        let (state, _) = wizard.start();
        let (state, effects) = wizard.advance(state, credentials());
        assert_eq!(
            effects,
            vec![SetupEffect::Authenticate {
                username: "user@example.com".into(),
                password: "hunter2".into(),
            }]
        );
        let (state, effects) = wizard.advance(state, SetupInput::AuthFailed);
        assert_eq!(state, SetupState::AwaitingCredentials);
        assert_eq!(effects, vec![SetupEffect::PromptCredentials { retry: true }]);
    }

    #[test]
    fn test_happy_path_collects_every_code() {
        let wizard = SetupWizard::new(None);
        let (state, _) = wizard.start();
        let (state, _) = wizard.advance(state, credentials());
        let (state, effects) = wizard.advance(
            state,
            SetupInput::AuthSucceeded {
                locations: two_locations(),
            },
        );
        assert!(matches!(
            effects.as_slice(),
            [SetupEffect::PromptCode { location, retry: false }] if location.id == 10
        ));

        let (state, effects) = wizard.advance(state, SetupInput::Code("1234".into()));
        assert_eq!(
            effects,
            vec![SetupEffect::ValidateCode {
                location_id: 10,
                code: "1234".into(),
            }]
        );

        let (state, effects) = wizard.advance(state, SetupInput::CodeAccepted("1234".into()));
        assert!(matches!(
            effects.as_slice(),
            [SetupEffect::PromptCode { location, retry: false }] if location.id == 20
        ));

        let (state, _) = wizard.advance(state, SetupInput::Code("4321".into()));
        let (state, effects) = wizard.advance(state, SetupInput::CodeAccepted("4321".into()));

        let SetupState::Complete(done) = state else {
            panic!("expected completion, got {state:?}");
        };
        assert_eq!(done.usercodes.get(&10).map(String::as_str), Some("1234"));
        assert_eq!(done.usercodes.get(&20).map(String::as_str), Some("4321"));
        assert!(matches!(effects.as_slice(), [SetupEffect::Persist(_)]));
    }

    #[test]
    fn test_rejected_code_reprompts_same_location() {
        let wizard = SetupWizard::new(None);
        let (state, _) = wizard.start();
        let (state, _) = wizard.advance(state, credentials());
        let (state, _) = wizard.advance(
            state,
            SetupInput::AuthSucceeded {
                locations: two_locations(),
            },
        );
        let (state, _) = wizard.advance(state, SetupInput::Code("0000".into()));
        let (state, effects) = wizard.advance(state, SetupInput::CodeRejected);
        assert!(matches!(
            effects.as_slice(),
            [SetupEffect::PromptCode { location, retry: true }] if location.id == 10
        ));
        assert!(matches!(state, SetupState::AwaitingCode { current: 0, .. }));
    }

    #[test]
    fn test_abandon_mid_flow() {
        let wizard = SetupWizard::new(None);
        let (state, _) = wizard.start();
        let (state, _) = wizard.advance(state, credentials());
        let (state, _) = wizard.advance(
            state,
            SetupInput::AuthSucceeded {
                locations: two_locations(),
            },
        );
        let (state, effects) = wizard.advance(state, SetupInput::Abandon);
        assert_eq!(state, SetupState::Aborted(AbortReason::Abandoned));
        assert!(effects.is_empty());
    }

    #[test]
    fn test_reauth_flow() {
        let (state, effects) = reauth_start();
        assert_eq!(effects, vec![ReauthEffect::PromptPassword { retry: false }]);

        let (state, effects) = reauth_advance(state, ReauthInput::Password("new-pass".into()));
        assert_eq!(
            effects,
            vec![ReauthEffect::Validate {
                password: "new-pass".into(),
            }]
        );

        // Wrong password loops back with a retry prompt.
        let (state, effects) = reauth_advance(state, ReauthInput::AuthFailed);
        assert_eq!(state, ReauthState::AwaitingPassword);
        assert_eq!(effects, vec![ReauthEffect::PromptPassword { retry: true }]);

        let (state, _) = reauth_advance(state, ReauthInput::Password("right-pass".into()));
        let (state, effects) = reauth_advance(state, ReauthInput::AuthSucceeded);
        assert_eq!(
            state,
            ReauthState::Complete {
                password: "right-pass".into(),
            }
        );
        assert_eq!(
            effects,
            vec![ReauthEffect::UpdateRecord {
                password: "right-pass".into(),
            }]
        );
    }
}
