// Domain model: templates, path vars and the values that flow through them

pub mod path_vars;
pub mod query;
pub mod request;
pub mod template;
pub mod value;

pub use path_vars::{PathVar, PathVars, PathVarsType, VarIdent};
pub use query::QueryParams;
pub use request::{Headers, Host};
pub use value::PathValue;
