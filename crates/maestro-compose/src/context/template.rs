//! `{{.key}}` templates over context variables.
//!
//! The only supported action is a variable reference, optionally padded with
//! whitespace: `{{.region}}` or `{{ .region }}`. Text outside actions is
//! copied verbatim.

use nom::{
    IResult, Parser,
    bytes::complete::{tag, take_while1},
    character::complete::{char, multispace0},
    sequence::{delimited, preceded},
};

/// A piece of a parsed template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Literal text.
    Text(&'a str),
    /// A reference to a context variable.
    Var(&'a str),
}

/// Why a template could not be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// An action is unterminated or not a plain variable reference.
    Malformed {
        /// Byte offset of the offending `{{`.
        offset: usize,
    },
    /// A referenced variable is not defined.
    MissingVar(String),
}

const fn is_var_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Parses a `{{ .name }}` action.
fn var_action(input: &str) -> IResult<&str, &str> {
    delimited(
        tag("{{"),
        delimited(
            multispace0,
            preceded(char('.'), take_while1(is_var_char)),
            multispace0,
        ),
        tag("}}"),
    )
    .parse(input)
}

/// Splits a template into text and variable segments.
///
/// # Errors
///
/// Returns [`TemplateError::Malformed`] if an action cannot be parsed.
pub fn parse(input: &str) -> Result<Vec<Segment<'_>>, TemplateError> {
    let mut segments = Vec::new();
    let mut rest = input;

    while !rest.is_empty() {
        if rest.starts_with("{{") {
            let offset = input.len() - rest.len();
            let (next, name) = var_action(rest).map_err(|_| TemplateError::Malformed { offset })?;
            segments.push(Segment::Var(name));
            rest = next;
        } else {
            let end = rest.find("{{").unwrap_or(rest.len());
            segments.push(Segment::Text(&rest[..end]));
            rest = &rest[end..];
        }
    }

    Ok(segments)
}

/// Renders a template, resolving variables through `lookup`.
///
/// # Errors
///
/// Returns an error if the template is malformed or references a variable
/// `lookup` does not know.
pub fn render<'v, F>(input: &str, lookup: F) -> Result<String, TemplateError>
where
    F: Fn(&str) -> Option<&'v str>,
{
    let mut out = String::with_capacity(input.len());
    for segment in parse(input)? {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Var(name) => {
                let value = lookup(name).ok_or_else(|| TemplateError::MissingVar(name.to_owned()))?;
                out.push_str(value);
            }
        }
    }
    Ok(out)
}
