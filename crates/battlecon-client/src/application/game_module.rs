//! The seam between the generic connection engine and game-specific code.
//!
//! # What is a game module? (for beginners)
//!
//! The engine knows how to keep a socket alive and pair replies with
//! commands, but nothing about any particular game: not how to log in, not
//! which events the server pushes.  A *game module* supplies that knowledge.
//!
//! A module is any type implementing [`GameModule`].  It is attached once,
//! when the client is built, and the engine calls into it at two points:
//!
//! 1. [`GameModule::login`] runs right after every successful TCP connect.
//!    Its result completes the caller's `connect()`.
//! 2. [`GameModule::translate_event`] sees every server-originated message
//!    and may turn it into a named [`GameEvent`].
//!
//! The module talks back to the engine only through [`RconSession`], a
//! narrow capability interface: run a command, publish an event.

use std::sync::Arc;

use async_trait::async_trait;
use battlecon_core::{Command, Message};
use thiserror::Error;

use crate::application::frostbite::FrostbiteModule;
use crate::domain::{ClientConfig, ConnectionEvent, GameEvent, RconError};

/// What a game module may do with the connection it is attached to.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RconSession: Send + Sync {
    /// Runs a command and waits for its reply.
    async fn exec(&self, command: Command) -> Result<Vec<String>, RconError>;

    /// Publishes an event to every subscriber.
    fn emit(&self, event: ConnectionEvent);
}

/// Game-specific behaviour layered on top of the connection engine.
#[async_trait]
pub trait GameModule: Send + Sync + 'static {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Post-connect handshake.  The default does nothing and succeeds.
    async fn login(&self, session: &dyn RconSession) -> Result<(), RconError> {
        let _ = session;
        Ok(())
    }

    /// Maps a server-originated message onto a named event.  The default
    /// translates nothing.
    fn translate_event(&self, message: &Message) -> Option<GameEvent> {
        let _ = message;
        None
    }
}

/// The option bag handed to a module when it is created by name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModuleOptions {
    pub password: String,
    pub events_enabled: bool,
}

impl ModuleOptions {
    /// Extracts the module-relevant settings from a connection config.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            password: config.password.clone(),
            events_enabled: config.events_enabled,
        }
    }
}

/// Returned by [`load`] for a name no module answers to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown game module '{0}' (expected one of: frostbite, bf3, bf4, bfh, none)")]
pub struct UnknownModule(pub String);

/// Creates a module by name.
///
/// `none` (or an empty name) selects a bare connection and returns
/// `Ok(None)`.  Names are matched case-insensitively.
///
/// # Errors
///
/// Returns [`UnknownModule`] for any other name.
pub fn load(name: &str, options: ModuleOptions) -> Result<Option<Arc<dyn GameModule>>, UnknownModule> {
    let key = name.trim().to_ascii_lowercase();
    match key.as_str() {
        "" | "none" => Ok(None),
        "frostbite" | "bf3" | "bf4" | "bfh" => {
            Ok(Some(Arc::new(FrostbiteModule::named(key, options))))
        }
        _ => Err(UnknownModule(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare;

    #[async_trait]
    impl GameModule for Bare {
        fn name(&self) -> &str {
            "bare"
        }
    }

    #[tokio::test]
    async fn test_default_login_succeeds_without_commands() {
        // Arrange – a session that fails the test if anything is executed
        let mut session = MockRconSession::new();
        session.expect_exec().never();
        session.expect_emit().never();

        // Act
        let result = Bare.login(&session).await;

        // Assert
        tokio_test::assert_ok!(result);
    }

    #[test]
    fn test_default_translation_is_none() {
        let msg = Message::request(battlecon_core::SequenceId::new(0), vec!["x".into()]);
        assert_eq!(Bare.translate_event(&msg), None);
    }

    #[test]
    fn test_load_known_names_case_insensitively() {
        for name in ["frostbite", "BF4", "bf3", "Bfh"] {
            let module = load(name, ModuleOptions::default()).unwrap();
            assert!(module.is_some(), "{name} must load a module");
        }
    }

    #[test]
    fn test_load_none_is_bare_connection() {
        assert!(load("none", ModuleOptions::default()).unwrap().is_none());
        assert!(load("", ModuleOptions::default()).unwrap().is_none());
    }

    #[test]
    fn test_load_unknown_name_fails() {
        let err = load("quake", ModuleOptions::default()).err().unwrap();
        assert_eq!(err, UnknownModule("quake".into()));
    }

    #[test]
    fn test_options_from_config() {
        let mut cfg = ClientConfig::new("h", 1, "pw");
        cfg.events_enabled = false;

        let opts = ModuleOptions::from_config(&cfg);

        assert_eq!(opts.password, "pw");
        assert!(!opts.events_enabled);
    }
}
