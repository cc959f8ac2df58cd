//! Decision engines.
//!
//! `funnel` narrows the market universe to one best trade, `recommend`
//! scores a batch of markets for edge, `session` wraps the funnel in a
//! retrying, persisting trade session.

pub mod funnel;
pub mod recommend;
pub mod session;
