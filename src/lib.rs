//! # ldapprobe — LDAP/BER protocol-conformance tester
//!
//! Builds LDAPv3 requests that are either canonical or break exactly one rule of
//! BER or of the LDAP message grammar, sends them to a target server, and
//! classifies what the server does: answers, rejects, hangs, or drops the
//! connection.
//!
//! ## Layers
//!
//! - **Codec**: tags, lengths and elements ([`codec`]), plus deliberately
//!   broken encodings ([`malform`]).
//! - **Messages**: bind, search, unbind, abandon, extended requests, controls
//!   and the `LDAPMessage` envelope ([`message`], [`filter`]).
//! - **Payloads**: the static test catalog ([`catalog`]) and the random or
//!   targeted mutation engine ([`mutate`]) built on a structural walker
//!   ([`walk`]).
//! - **Execution**: the transport contract ([`transport`]), the engine with
//!   crash detection and run modes ([`engine`]), the lenient response analyzer
//!   ([`analyze`]) and result export ([`report`]).
//!
//! ## Canonical bind
//!
//! ```
//! use ldapprobe::{BindRequest, Envelope};
//!
//! let bytes = Envelope::new(1, BindRequest::anonymous()).encode();
//! assert_eq!(
//!     bytes,
//!     [0x30, 0x0c, 0x02, 0x01, 0x01, 0x60, 0x07, 0x02, 0x01, 0x03, 0x04, 0x00, 0x80, 0x00]
//! );
//! ```
//!
//! ## Usage
//!
//! The `ldapprobe` binary wires a [`config::RunConfig`] to an [`Engine`] over
//! [`TcpTransport`]. See `tests/engine.rs` for driving the engine with a
//! scripted transport.

pub mod analyze;
pub mod catalog;
pub mod codec;
pub mod config;
pub mod engine;
pub mod filter;
pub mod malform;
pub mod message;
pub mod mutate;
pub mod report;
pub mod transport;
pub mod walk;

pub use analyze::{analyze_response, extract_result_code, Analysis, AnalysisKind};
pub use catalog::{Catalog, Section, Suite, TestCase};
pub use codec::{CodecError, Element, Length, Tag, TagClass};
pub use config::{ConfigError, Mode, RunConfig, TransportKind};
pub use engine::{Engine, EngineConfig, FuzzResult, Health, PreflightCheck, RunStatus, ServerStatus, StopHandle};
pub use filter::{Filter, FilterError};
pub use malform::{IntegerFault, LengthFault, TagFault};
pub use message::{BindRequest, Control, Envelope, ExtendedRequest, ProtocolOp, SearchRequest};
pub use mutate::{MutationEngine, MutationKind};
pub use transport::{Received, TcpTransport, Transport, TransportError};
pub use walk::{message_extent, scan, BinaryWalker, ElementSpan};
