// Field-level grammars: booleans, clock readings, edge lists, numbers

use super::lexer::{decimal, integer, ws};
use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::char,
    combinator::{all_consuming, value},
    multi::separated_list1,
    IResult,
};

fn boolean(input: &str) -> IResult<&str, bool> {
    alt((
        value(true, tag_no_case("true")),
        value(false, tag_no_case("false")),
    ))(input)
}

/// Parse `true` / `false` in any letter case
pub fn parse_bool(token: &str) -> Option<bool> {
    all_consuming(ws(boolean))(token).ok().map(|(_, b)| b)
}

/// Parse a whole number that fits in 32 bits
pub fn parse_int(token: &str) -> Option<i32> {
    all_consuming(ws(integer))(token)
        .ok()
        .and_then(|(_, n)| i32::try_from(n).ok())
}

/// Parse a finite decimal number
pub fn parse_float(token: &str) -> Option<f64> {
    all_consuming(ws(decimal))(token)
        .ok()
        .map(|(_, f)| f)
        .filter(|f| f.is_finite())
}

/// Parse a clock reading such as `12\30` or `08:15:59` into its numeric parts.
///
/// Only two- and three-part readings are accepted.
pub fn parse_clock(token: &str, separator: char) -> Option<Vec<f64>> {
    let parts = all_consuming(separated_list1(char(separator), ws(decimal)))(token)
        .ok()
        .map(|(_, parts)| parts)?;

    match parts.len() {
        2 | 3 => Some(parts),
        _ => None,
    }
}

/// Parse a `|`-separated list of edge targets. Empty segments are skipped, as
/// are segments that are not whole numbers.
pub fn parse_edge_list(token: &str) -> Vec<i64> {
    token
        .split('|')
        .filter(|segment| !segment.is_empty())
        .filter_map(|segment| all_consuming(ws(integer))(segment).ok().map(|(_, n)| n))
        .collect()
}
