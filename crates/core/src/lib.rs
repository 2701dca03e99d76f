#![warn(missing_docs)]
//! # Jmmlink-Core
//!
//! Jmmlink-Core is a rust library for triggering maintenance actions on a
//! JMM media server over its binary SOAP endpoint.
//!
//! The high level interface is the [`jmm_protocol::JmmServer`] struct. A
//! server connection can be initialised with
//!
//! ```no_run
//! use jmmlink_core::{Credentials, JmmServer};
//! let server = JmmServer::connect("localhost", 8111, Credentials::Anonymous).unwrap();
//! ```
//!
//! After that any operation the server advertises can be invoked by name
//!
//! ```no_run
//! # use jmmlink_core::{Credentials, JmmServer};
//! # let server = JmmServer::connect("localhost", 8111, Credentials::Anonymous).unwrap();
//! server.scan_drop_folders().unwrap();
//! ```
//!
//! The server only speaks the compact binary XML rendition of SOAP, so the
//! [`nbfx`] module carries the wire format and the [`soap`] module the
//! envelope and transport layers built on top of it.

/// Contains low level binary XML record structures and formats
pub mod nbfx;
/// Contains the SOAP envelope, transport and introspection layers
pub mod soap;
/// Contains the high level interface for the server
pub mod jmm_protocol;

/// This is the top level error structure of the library
///
/// Most commands will either return their `Ok(result)` or this `Err(Error)`
pub use jmm_protocol::Error;

pub use jmm_protocol::JmmServer;
pub use soap::credentials::Credentials;

pub(crate) type NomErrorType<'a> = nom::error::VerboseError<&'a [u8]>;
