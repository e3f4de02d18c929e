//! # knxhub-domain
//!
//! Pure domain model for the knxhub bus bridge.
//!
//! ## Responsibilities
//! - Foundational types: error conventions, timestamps
//! - **Group addresses** and the **roles** a device assigns to them
//! - **Datapoint** codecs (switch, scaling, 2-byte float) and the role-keyed
//!   payload decoder
//! - **Devices** and the immutable **catalog** they are loaded into
//! - **Device state**, single-field **state changes** and **history entries**
//! - **Webhooks** and external **sensor endpoints**
//! - The bus **connection state** machine
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod time;

pub mod address;
pub mod catalog;
pub mod connection;
pub mod datapoint;
pub mod decoder;
pub mod device;
pub mod history;
pub mod role;
pub mod sensor;
pub mod state;
pub mod telegram;
pub mod webhook;
