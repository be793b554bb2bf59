//! Rudder - dynamic load-balancer steering daemon
//!
//! Rudder continuously probes every worker in a set of worker groups, ranks
//! each group's workers by a scalar fitness score, and converges an external
//! load balancer's registered-target set so that exactly the best worker per
//! group receives traffic.

pub mod cli;
pub mod config;
pub mod control;
pub mod converge;
pub mod fleet;
pub mod logging;
pub mod metrics;
pub mod ops;
pub mod probe;
pub mod providers;
pub mod select;
