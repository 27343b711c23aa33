// Lexical primitives shared by the token grammars

use nom::{
    character::complete::{digit1, multispace0, one_of},
    combinator::{map_res, opt, recognize},
    number::complete::recognize_float,
    sequence::{delimited, pair},
    IResult,
};

/// Wrap a parser so that it tolerates surrounding whitespace
pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Parse a signed whole number: 42, -7, +3
pub fn integer(input: &str) -> IResult<&str, i64> {
    map_res(recognize(pair(opt(one_of("+-")), digit1)), str::parse::<i64>)(input)
}

/// Parse a decimal literal: 3.14, -.5, 1e-3, 7
pub fn decimal(input: &str) -> IResult<&str, f64> {
    map_res(recognize_float, str::parse::<f64>)(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer() {
        assert_eq!(integer("42"), Ok(("", 42)));
        assert_eq!(integer("-7 rest"), Ok((" rest", -7)));
        assert_eq!(integer("+3"), Ok(("", 3)));
        assert!(integer("abc").is_err());
    }

    #[test]
    fn test_decimal() {
        assert_eq!(decimal("3.5"), Ok(("", 3.5)));
        assert_eq!(decimal("1e-3"), Ok(("", 0.001)));
        assert_eq!(decimal(".5"), Ok(("", 0.5)));
        assert!(decimal("x1").is_err());
    }

    #[test]
    fn test_ws() {
        assert_eq!(ws(integer)("  12  "), Ok(("", 12)));
    }
}
