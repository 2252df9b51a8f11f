//! Operator calls appearing inside templates (`NotZero`, `Between(40, 45)`...)

use dm_core::{ops, Bound, Bounds, Kind, Operator, PatternError, PatternResult, Pattern, RecordMode, Value};

/// Build the operator `name` applied to already-parsed `args`
pub(crate) fn build(name: &str, args: Vec<Pattern>) -> PatternResult<Pattern> {
    match name {
        "Ignore" | "Zero" | "NotZero" | "Empty" | "NotEmpty" | "Nil" | "NotNil" => {
            arity(name, &args, 0)?;
            Ok(match name {
                "Ignore" => ops::ignore(),
                "Zero" => ops::zero(),
                "NotZero" => ops::not_zero(),
                "Empty" => ops::empty(),
                "NotEmpty" => ops::not_empty(),
                "Nil" => ops::nil(),
                _ => ops::not_nil(),
            })
        }

        "Between" => {
            if args.len() != 2 && args.len() != 3 {
                return Err(arity_error(name, "2 or 3", args.len()));
            }
            let low = bound(name, &args[0])?;
            let high = bound(name, &args[1])?;
            let bounds = match args.get(2) {
                Some(arg) => bounds_kind(name, string(name, arg)?)?,
                None => Bounds::InIn,
            };
            Operator::between(low, high, bounds).map(Pattern::Op)
        }
        "Gt" | "Gte" | "Lt" | "Lte" => {
            arity(name, &args, 1)?;
            let b = bound(name, &args[0])?;
            Ok(match name {
                "Gt" => ops::gt(b),
                "Gte" => ops::gte(b),
                "Lt" => ops::lt(b),
                _ => ops::lte(b),
            })
        }

        "Len" | "Contains" | "Keys" | "ArrayEach" | "Not" => {
            let inner = single(name, args)?;
            Ok(match name {
                "Len" => ops::len(inner),
                "Contains" => ops::contains(inner),
                "Keys" => ops::keys(inner),
                "ArrayEach" => ops::array_each(inner),
                _ => ops::not(inner),
            })
        }
        "HasPrefix" | "HasSuffix" | "ContainsKey" | "Re" => {
            arity(name, &args, 1)?;
            let text = string(name, &args[0])?;
            match name {
                "HasPrefix" => Ok(ops::has_prefix(text)),
                "HasSuffix" => Ok(ops::has_suffix(text)),
                "ContainsKey" => Ok(ops::contains_key(text)),
                _ => ops::re(text),
            }
        }
        "Isa" => {
            arity(name, &args, 1)?;
            let kind_name = string(name, &args[0])?;
            let kind = Kind::from_name(kind_name)
                .ok_or_else(|| invalid(name, format!("unknown kind '{}'", kind_name)))?;
            Ok(ops::isa(kind))
        }

        "Bag" => Ok(ops::bag(args)),
        "SuperBagOf" => Ok(ops::super_bag_of(args)),
        "SubBagOf" => Ok(ops::sub_bag_of(args)),
        "All" => Ok(ops::all(args)),
        "Any" => Ok(ops::any(args)),
        "None" => Ok(ops::none(args)),

        "Catch" => {
            arity(name, &args, 2)?;
            let slot = string(name, &args[0])?.to_string();
            let inner = args.into_iter().nth(1).unwrap_or_else(ops::ignore);
            Ok(ops::catch(slot, inner))
        }
        "SuperMapOf" | "SubMapOf" => {
            let mode = if name == "SuperMapOf" {
                RecordMode::Partial
            } else {
                RecordMode::Subset
            };
            single(name, args)?
                .into_record(mode)
                .ok_or_else(|| invalid(name, "an object is expected"))
        }

        _ => Err(PatternError::UnknownOperator {
            name: name.to_string(),
        }),
    }
}

fn arity(name: &str, args: &[Pattern], expected: usize) -> PatternResult<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(arity_error(name, &expected.to_string(), args.len()))
    }
}

fn arity_error(name: &str, expected: &str, got: usize) -> PatternError {
    PatternError::Arity {
        operator: name.to_string(),
        expected: expected.to_string(),
        got,
    }
}

fn invalid(name: &str, message: impl Into<String>) -> PatternError {
    PatternError::InvalidArgument {
        operator: name.to_string(),
        message: message.into(),
    }
}

fn single(name: &str, args: Vec<Pattern>) -> PatternResult<Pattern> {
    arity(name, &args, 1)?;
    args.into_iter()
        .next()
        .ok_or_else(|| arity_error(name, "1", 0))
}

fn literal<'a>(name: &str, arg: &'a Pattern) -> PatternResult<&'a Value> {
    match arg {
        Pattern::Literal(value) => Ok(value),
        other => Err(invalid(
            name,
            format!("a literal is expected, got {}", other.describe()),
        )),
    }
}

fn bound(name: &str, arg: &Pattern) -> PatternResult<Bound> {
    Bound::from_value(name, literal(name, arg)?)
}

fn string<'a>(name: &str, arg: &'a Pattern) -> PatternResult<&'a str> {
    literal(name, arg)?
        .as_str()
        .ok_or_else(|| invalid(name, "a string is expected"))
}

fn bounds_kind(name: &str, text: &str) -> PatternResult<Bounds> {
    match text {
        "[]" => Ok(Bounds::InIn),
        "[)" => Ok(Bounds::InOut),
        "(]" => Ok(Bounds::OutIn),
        "()" => Ok(Bounds::OutOut),
        other => Err(invalid(
            name,
            format!("bounds must be one of \"[]\", \"[)\", \"(]\", \"()\", got {:?}", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lit(v: Value) -> Pattern {
        Pattern::Literal(v)
    }

    #[test]
    fn test_zero_arity_operators() {
        assert!(matches!(
            build("NotZero", vec![]),
            Ok(Pattern::Op(Operator::NotZero))
        ));
        assert!(matches!(
            build("NotZero", vec![lit(json!(1))]),
            Err(PatternError::Arity { .. })
        ));
    }

    #[test]
    fn test_between_arguments() {
        let pattern = build("Between", vec![lit(json!(40)), lit(json!(45))]).unwrap();
        assert_eq!(pattern.describe(), "Between[40, 45]");

        let pattern = build(
            "Between",
            vec![lit(json!(1)), lit(json!(2)), lit(json!("()"))],
        )
        .unwrap();
        assert_eq!(pattern.describe(), "Between(1, 2)");

        assert!(matches!(
            build("Between", vec![lit(json!(1)), lit(json!("z"))]),
            Err(PatternError::InvalidBounds { .. })
        ));
        assert!(matches!(
            build("Between", vec![lit(json!(45)), lit(json!(40))]),
            Err(PatternError::InvalidBounds { .. })
        ));
        assert!(matches!(
            build("Between", vec![ops::not_zero(), lit(json!(2))]),
            Err(PatternError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_string_arguments() {
        assert!(build("HasSuffix", vec![lit(json!("Z"))]).is_ok());
        assert!(matches!(
            build("HasSuffix", vec![lit(json!(3))]),
            Err(PatternError::InvalidArgument { .. })
        ));
        assert!(matches!(
            build("Re", vec![lit(json!("(oops"))]),
            Err(PatternError::InvalidRegex { .. })
        ));
        assert!(matches!(
            build("Isa", vec![lit(json!("date"))]),
            Err(PatternError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_map_modes() {
        let pattern = build("SuperMapOf", vec![lit(json!({"name": "Bob"}))]).unwrap();
        assert!(matches!(
            pattern,
            Pattern::Record {
                mode: RecordMode::Partial,
                ..
            }
        ));
        assert!(build("SubMapOf", vec![lit(json!([1]))]).is_err());
    }

    #[test]
    fn test_unknown_operator() {
        assert!(matches!(
            build("Smuggle", vec![]),
            Err(PatternError::UnknownOperator { .. })
        ));
    }
}
