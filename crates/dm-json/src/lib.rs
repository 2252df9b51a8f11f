//! JSON templates for deepmatch patterns
//!
//! A template is JSON extended with operators and placeholders:
//!
//! ```ignore
//! use dm_core::ops;
//! use dm_json::{super_json_of, Params};
//!
//! let expected = super_json_of(
//!     r#"{
//!       "id":       NotZero,            // any non-zero id
//!       "age":      $^Between(40, 45),
//!       "children": Bag($1, $1),
//!     }"#,
//!     &Params::new().with(ops::ignore()),
//! )?;
//! ```
//!
//! Every object in a template gets the record mode of the entry point used:
//! [`json`] (strict), [`super_json_of`] (partial) or [`sub_json_of`]
//! (subset). Errors carry the line and column of the offending token.

mod error;
mod operators;
mod params;
mod parser;

pub use error::{TemplateError, TemplateErrorKind, TemplateResult};
pub use params::Params;

use dm_core::{Pattern, RecordMode};
use tracing::{debug, trace};

/// Parse `template` with strict objects
pub fn parse(template: &str, params: &Params) -> TemplateResult<Pattern> {
    parse_with_mode(template, params, RecordMode::Strict)
}

/// Parse `template`, giving every object the record `mode`
pub fn parse_with_mode(
    template: &str,
    params: &Params,
    mode: RecordMode,
) -> TemplateResult<Pattern> {
    trace!(%mode, params = params.len(), "parsing template");
    match parser::parse(template, params, mode) {
        Ok(pattern) => Ok(pattern),
        Err(err) => {
            debug!(line = err.line, column = err.column, error = %err.kind, "invalid template");
            Err(err)
        }
    }
}

/// Objects must have exactly the listed keys
pub fn json(template: &str, params: &Params) -> TemplateResult<Pattern> {
    parse_with_mode(template, params, RecordMode::Strict)
}

/// Objects may have keys the template does not list
pub fn super_json_of(template: &str, params: &Params) -> TemplateResult<Pattern> {
    parse_with_mode(template, params, RecordMode::Partial)
}

/// Objects may only have listed keys, and may lack some of them
pub fn sub_json_of(template: &str, params: &Params) -> TemplateResult<Pattern> {
    parse_with_mode(template, params, RecordMode::Subset)
}
