//! Structural State Matching
//!
//! A library for deciding whether an observed resource document satisfies a
//! partial specification ("pattern"). The caller describes only the fields it
//! cares about; everything else in the observed document is ignored.
//!
//! # Example
//!
//! ```
//! use statematch::{from_yaml_str, matches};
//!
//! # fn example() -> Result<(), statematch::ParseError> {
//! let pattern = from_yaml_str("status:\n  availableReplicas: 4\n")?;
//! let observed = from_yaml_str(
//!     "status:\n  availableReplicas: 4\n  readyReplicas: 4\nspec:\n  replicas: 4\n",
//! )?;
//!
//! assert!(matches(&pattern, &observed));
//! # Ok(())
//! # }
//! ```
//!
//! # Matching rules
//!
//! - Scalars compare type-aware: numbers numerically, strings exactly.
//! - A pattern map is a subset: extra observed keys never break a match.
//! - A pattern list matches existentially and injectively: every pattern
//!   element must be satisfied by a *distinct* observed element, in any order.
//! - A mismatch is always a clean `false`, never an error.

pub mod error;
pub mod matcher;
pub mod value;

pub use error::ParseError;
pub use matcher::matches;
pub use value::{Number, TreeValue, from_yaml_slice, from_yaml_str};
