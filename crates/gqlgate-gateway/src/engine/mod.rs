//! Execution engine.
//!
//! A small engine sitting behind the transports: resolves the query text
//! (plain or persisted), parses it through the document cache, validates root
//! fields against the resolver registry and executes.

pub mod executor;
pub mod introspection;
pub mod resolver;

pub use executor::{ExecutionEngine, PreparedOperation};
pub use resolver::{FieldResolver, ResolveCtx, ResolverRegistry, SubscriptionSource, ValueStream};
