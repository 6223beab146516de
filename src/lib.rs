// urit: URI templates for matching paths and building them back

pub mod config;
pub mod domain;
pub mod error;

pub use domain::template::{BuildOptions, MatchOptions, ParseOptions, Template};
pub use domain::{Headers, Host, PathValue, PathVars, PathVarsType, QueryParams};
pub use error::{BuildError, ParseError, PathVarsError};
