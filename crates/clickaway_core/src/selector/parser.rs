//! nom grammar for selector lists
//!
//! ```text
//! list      := ws complex (ws ',' ws complex)* ws
//! complex   := compound (combinator compound)*
//! combinator:= ws '>' ws | ws+
//! compound  := (type | '*')? (id | class | attribute)*     -- never empty
//! attribute := '[' ws ident ws ('=' ws value ws)? ']'
//! value     := ident | "..." | '...'
//! ```

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::{all_consuming, cut, map, opt, value},
    error::{
        context, ContextError, ErrorKind, ParseError as NomParseError, VerboseError,
        VerboseErrorKind,
    },
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded, tuple},
    Finish, IResult,
};

use super::{
    Combinator, ComplexSelector, CompoundSelector, SelectorError, SelectorList, SimpleSelector,
};

type ParseResult<'a, O> = IResult<&'a str, O, VerboseError<&'a str>>;

/// Parse a complete selector list, rejecting trailing input
pub(super) fn parse_selector_list(input: &str) -> Result<SelectorList, SelectorError> {
    all_consuming(delimited(
        multispace0,
        separated_list1(delimited(multispace0, char(','), multispace0), complex),
        multispace0,
    ))(input)
    .finish()
    .map(|(_, selectors)| SelectorList { selectors })
    .map_err(|err| from_verbose(input, err))
}

/// Identifier: alphanumeric, hyphen, underscore
fn identifier<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    take_while1(|c: char| c.is_alphanumeric() || c == '-' || c == '_')(input)
}

fn type_selector(input: &str) -> ParseResult<'_, SimpleSelector> {
    alt((
        value(SimpleSelector::Universal, char('*')),
        map(identifier, |tag: &str| SimpleSelector::Type(tag.to_ascii_lowercase())),
    ))(input)
}

fn id_selector(input: &str) -> ParseResult<'_, SimpleSelector> {
    context(
        "id selector",
        map(preceded(char('#'), cut(identifier)), |id: &str| {
            SimpleSelector::Id(id.to_string())
        }),
    )(input)
}

fn class_selector(input: &str) -> ParseResult<'_, SimpleSelector> {
    context(
        "class selector",
        map(preceded(char('.'), cut(identifier)), |class: &str| {
            SimpleSelector::Class(class.to_string())
        }),
    )(input)
}

fn quoted(quote: char, input: &str) -> ParseResult<'_, &str> {
    delimited(
        char(quote),
        take_while(move |c: char| c != quote),
        cut(char(quote)),
    )(input)
}

fn attribute_value(input: &str) -> ParseResult<'_, &str> {
    context(
        "attribute value",
        alt((|i| quoted('"', i), |i| quoted('\'', i), identifier)),
    )(input)
}

fn attribute_selector(input: &str) -> ParseResult<'_, SimpleSelector> {
    context(
        "attribute selector",
        preceded(
            char('['),
            cut(map(
                tuple((
                    delimited(multispace0, identifier, multispace0),
                    opt(delimited(
                        pair(char('='), multispace0),
                        attribute_value,
                        multispace0,
                    )),
                    char(']'),
                )),
                |(name, expected, _)| SimpleSelector::Attribute {
                    name: name.to_string(),
                    value: expected.map(str::to_string),
                },
            )),
        ),
    )(input)
}

fn compound(input: &str) -> ParseResult<'_, CompoundSelector> {
    let (input, head) = opt(type_selector)(input)?;
    let (input, tail) = many0(alt((id_selector, class_selector, attribute_selector)))(input)?;

    if head.is_none() && tail.is_empty() {
        return Err(nom::Err::Error(VerboseError::add_context(
            input,
            "compound selector",
            VerboseError::from_error_kind(input, ErrorKind::Verify),
        )));
    }

    let mut parts = smallvec::SmallVec::new();
    parts.extend(head);
    parts.extend(tail);
    Ok((input, CompoundSelector { parts }))
}

fn combinator(input: &str) -> ParseResult<'_, Combinator> {
    alt((
        value(
            Combinator::Child,
            delimited(multispace0, char('>'), multispace0),
        ),
        value(Combinator::Descendant, multispace1),
    ))(input)
}

fn complex(input: &str) -> ParseResult<'_, ComplexSelector> {
    let (input, first) = compound(input)?;
    let (input, rest) = many0(pair(combinator, compound))(input)?;

    let mut compounds = Vec::with_capacity(rest.len() + 1);
    let mut combinators = Vec::with_capacity(rest.len());
    compounds.push(first);
    for (comb, next) in rest {
        combinators.push(comb);
        compounds.push(next);
    }
    Ok((
        input,
        ComplexSelector {
            compounds,
            combinators,
        },
    ))
}

/// Convert nom's error stack into a positioned [`SelectorError`]
fn from_verbose(input: &str, err: VerboseError<&str>) -> SelectorError {
    let offset = err
        .errors
        .first()
        .map(|(rest, _)| input.len().saturating_sub(rest.len()))
        .unwrap_or(0);

    let mut parts = Vec::new();
    for (rest, kind) in &err.errors {
        match kind {
            VerboseErrorKind::Context(ctx) => parts.push(format!("in {}", ctx)),
            VerboseErrorKind::Char(c) => {
                let preview: String = rest.chars().take(20).collect();
                parts.push(format!("expected '{}' near \"{}\"", c, preview));
            }
            VerboseErrorKind::Nom(ErrorKind::Eof) => {
                let preview: String = rest.chars().take(20).collect();
                parts.push(format!("unexpected \"{}\"", preview));
            }
            VerboseErrorKind::Nom(ek) => parts.push(format!("{:?}", ek)),
        }
    }

    let message = if parts.is_empty() {
        "unknown parse error".to_string()
    } else {
        parts.join(", ")
    };

    SelectorError {
        selector: input.to_string(),
        offset,
        message,
    }
}
