//! Insumer tool catalog.
//!
//! Each tool is a row in a table: a name, an argument schema and an HTTP
//! route. A call runs one linear pass:
//!
//! 1. [`validate`] the arguments against the tool's fields, rejecting the call
//!    before any network I/O if a constraint fails;
//! 2. [`build_request`] fills path placeholders and puts the rest in the query
//!    (GET) or JSON body (POST/PUT);
//! 3. the client issues one round trip;
//! 4. [`relay`] wraps the upstream body, flagging failures.

pub mod catalog;
pub mod chain;
pub mod dispatch;
pub mod handler;
pub mod relay;
pub mod schema;

pub use catalog::{ToolSpec, catalog};
pub use chain::{ChainId, ChainSet, EvmChains, ONBOARDING_CHAINS, SETTLEMENT_CHAINS, VERIFICATION_CHAINS};
pub use dispatch::{DispatchError, Route, build_request};
pub use handler::{ApiTool, tool_handlers};
pub use relay::relay;
pub use schema::{Field, FieldKind, StringRule, ValidationError, Violation, input_schema, validate};
