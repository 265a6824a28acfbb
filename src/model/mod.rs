//! Compartmental SIR simulation for single populations and region networks.

mod init;
mod network;
mod sir;

pub use init::{InitialDistribution, InitialShares, StatePopulations, init_state_sir};
pub use network::{
    NetworkSeries, StateMap, dynamic_state_sir, exchange, network_series, propagate, seed_states,
    static_state_sir,
};
pub use sir::{SirParams, SirSeries, SirState, closed_sir};
