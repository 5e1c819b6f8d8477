//! Domain layer: lifecycle states, member specs, genesis and configuration.

mod config;
mod errors;
mod genesis;
mod member;
mod state;

pub use config::TopologyConfig;
pub use errors::TopologyError;
pub use genesis::{GenesisSpec, BFT_MIX_HASH};
pub use member::{MemberLaunch, MemberSpec, RunningMember};
pub use state::{transition, LifecycleOp, TopologyState};
