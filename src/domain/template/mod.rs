// Path templates: parsing, matching, building and composition
//
// A template is a `/`-delimited list of fixed, variable and composite parts.
// Matching extracts path vars from a live path; building fills them back in.

mod algebra;
mod ast;
mod matcher;
mod options;
mod parser;
mod resolver;
mod splitter;

pub use ast::{CompositePart, PathPart, PathVariable, SubPart, Template, TemplateVar};
pub use matcher::CompositeMatcher;
pub use options::{
    check_var, CaseInsensitiveFixed, EncodeVar, FixedMatchOption, MatchOptions, PathRegexCheck,
    VarCheck, VarContext, VarFn, VarMatchOption,
};
pub use parser::{ParseOptions, SegmentCheck, TemplateParser};
pub use resolver::BuildOptions;
pub use splitter::{split_path, Piece, Segment, SegmentSplitter};
