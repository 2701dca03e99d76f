//! The SOAP layer: envelope construction with WS-Addressing headers, the
//! HTTP transport bound to the binary protocol variant, the hooks that adapt
//! envelopes for the binary endpoint, and WSDL introspection.

pub mod credentials;
pub mod envelope;
pub mod plugin;
pub mod transport;
pub mod wsdl;
