//! Slack app webhook dispatcher.
//!
//! Classifies inbound Slack requests (OAuth callbacks, Events API envelopes,
//! slash commands, outgoing webhooks and interactive messages), loads the
//! stored installation for the originating workspace and fans each payload
//! out to named listeners plus the `*` wildcard.
pub mod auth;
pub mod bot;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod listener;
pub mod payload;
pub mod store;

pub use auth::AuthRecord;
pub use bot::BotHandle;
pub use client::{OutboundClient, SharedOutboundClient, SlackClient};
pub use config::{DispatcherConfig, SlackAppConfig};
pub use dispatcher::{Dispatcher, DispatcherBuilder, Handled, Reply};
pub use error::{ClientError, ConfigError, InstallError, ListenerError, PayloadError, StoreError};
pub use event::{InboundEvent, Method, OAuthQuery};
pub use listener::{Emission, FnListener, Listener, ListenerRegistry, listener_fn};
pub use payload::{Payload, PayloadKind, WILDCARD};
pub use store::{CredentialStore, MemoryCredentialStore, SharedCredentialStore};
