//! Stateless session credentials for ConciergeSync.
//!
//! Provides the signed `cs_session` token codec and the cookie builders
//! that carry it. Validity is entirely signature + embedded expiry; no
//! server-side session state exists anywhere.

pub mod cookie;
pub mod token;
