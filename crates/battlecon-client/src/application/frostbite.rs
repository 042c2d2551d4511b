//! Built-in game module for Frostbite servers (Battlefield 3, 4, Hardline).
//!
//! Login is the plain-text variant (`login.plainText <password>`); the
//! password is passed through untouched.  After a successful login the
//! module optionally asks the server to push events, then announces
//! `Ready`.
//!
//! Server events arrive as `<scope>.on<Name> args...`.  The module
//! republishes them as [`GameEvent`]s named `<scope>.<name>`:
//!
//! | Raw word              | Game event           |
//! |-----------------------|----------------------|
//! | `player.onJoin`       | `player.join`        |
//! | `player.onChat`       | `player.chat`        |
//! | `server.onRoundOver`  | `server.roundOver`   |
//! | `punkBuster.onMessage`| `punkBuster.message` |

use async_trait::async_trait;
use battlecon_core::{Command, Message};
use tracing::{debug, info};

use crate::application::game_module::{GameModule, ModuleOptions, RconSession};
use crate::domain::{ConnectionEvent, GameEvent, RconError};

/// The Frostbite login handshake and event vocabulary.
#[derive(Debug, Clone)]
pub struct FrostbiteModule {
    name: String,
    options: ModuleOptions,
}

impl FrostbiteModule {
    /// Creates the module with the given options.
    pub fn new(options: ModuleOptions) -> Self {
        Self::named("frostbite".to_string(), options)
    }

    /// Creates the module under a specific name (`bf3`, `bf4`, …), which
    /// only affects log output.
    pub fn named(name: String, options: ModuleOptions) -> Self {
        Self { name, options }
    }
}

#[async_trait]
impl GameModule for FrostbiteModule {
    fn name(&self) -> &str {
        &self.name
    }

    async fn login(&self, session: &dyn RconSession) -> Result<(), RconError> {
        if self.options.password.is_empty() {
            debug!("{}: no password configured; skipping login", self.name);
        } else {
            session
                .exec(Command::new("login.plainText").arg(self.options.password.clone()))
                .await?;
            info!("{}: login successful", self.name);
            session.emit(ConnectionEvent::LoggedIn);
        }

        if self.options.events_enabled {
            session
                .exec(Command::new("admin.eventsEnabled").arg("true"))
                .await?;
        }

        session.emit(ConnectionEvent::Ready);
        Ok(())
    }

    fn translate_event(&self, message: &Message) -> Option<GameEvent> {
        let (head, args) = message.words.split_first()?;
        Some(GameEvent {
            name: event_name(head)?,
            args: args.to_vec(),
        })
    }
}

/// `player.onChat` → `player.chat`.  Returns `None` for words that do not
/// follow the `<scope>.on<Name>` pattern.
fn event_name(raw: &str) -> Option<String> {
    let (scope, action) = raw.split_once('.')?;
    let rest = action.strip_prefix("on")?;
    let mut chars = rest.chars();
    let first = chars.next()?;
    if scope.is_empty() || !first.is_ascii_uppercase() {
        return None;
    }
    Some(format!("{scope}.{}{}", first.to_ascii_lowercase(), chars.as_str()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
