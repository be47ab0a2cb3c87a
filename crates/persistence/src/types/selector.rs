//! Label and field selector types.
//!
//! Selectors follow the Kubernetes textual grammar:
//!
//! ```text
//! tier=front,env!=prod,zone in (a,b),track notin (canary),gpu,!legacy
//! ```
//!
//! Field selectors use the same operators over dotted paths into the object
//! payload. A segment suffixed with `[]` (or an index such as `[0]`) marks a
//! list-typed field, e.g. `spec.containers[].image=nginx`.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::ValidationError;

/// Operator of a single selector requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectorOperator {
    Equals,
    DoubleEquals,
    NotEquals,
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

impl fmt::Display for SelectorOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SelectorOperator::Equals => "=",
            SelectorOperator::DoubleEquals => "==",
            SelectorOperator::NotEquals => "!=",
            SelectorOperator::In => "in",
            SelectorOperator::NotIn => "notin",
            SelectorOperator::Exists => "exists",
            SelectorOperator::DoesNotExist => "!",
        };
        write!(f, "{}", s)
    }
}

/// One `key op values` requirement of a label selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    key: String,
    operator: SelectorOperator,
    values: BTreeSet<String>,
}

impl Requirement {
    /// Creates a requirement, checking the value count against the operator.
    pub fn new<I, S>(
        key: impl Into<String>,
        operator: SelectorOperator,
        values: I,
    ) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = key.into();
        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        check_arity("label", &key, operator, values.len())?;
        Ok(Self {
            key,
            operator,
            values,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn operator(&self) -> SelectorOperator {
        self.operator
    }

    /// Returns the values in sorted order.
    pub fn values(&self) -> Vec<String> {
        self.values.iter().cloned().collect()
    }
}

/// A conjunction of label requirements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector {
    requirements: Vec<Requirement>,
}

impl LabelSelector {
    /// Parses a textual selector. An empty string selects everything.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let requirements = split_terms(input)
            .into_iter()
            .map(|term| {
                let (key, operator, values) = parse_term("label", input, term)?;
                Requirement::new(key, operator, values)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { requirements })
    }

    /// Adds a requirement.
    pub fn with(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }
}

/// One segment of a field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSegment {
    name: String,
    list: bool,
}

impl FieldSegment {
    /// A scalar or object segment.
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            list: false,
        }
    }

    /// A list-typed segment.
    pub fn list(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            list: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_list(&self) -> bool {
        self.list
    }
}

/// A dotted path into the object payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<FieldSegment>,
}

impl FieldPath {
    pub fn new(segments: Vec<FieldSegment>) -> Self {
        Self { segments }
    }

    /// Parses `a.b[].c`.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let invalid = |message: &str| ValidationError::InvalidSelector {
            selector: "field",
            input: input.to_string(),
            message: message.to_string(),
        };

        let mut segments = Vec::new();
        for raw in input.split('.') {
            let segment = match raw.find('[') {
                Some(open) => {
                    if !raw.ends_with(']') {
                        return Err(invalid("unterminated list index"));
                    }
                    let index = &raw[open + 1..raw.len() - 1];
                    if !index.chars().all(|c| c.is_ascii_digit()) {
                        return Err(invalid("list index must be empty or numeric"));
                    }
                    FieldSegment::list(&raw[..open])
                }
                None => FieldSegment::field(raw),
            };
            if segment.name.is_empty() {
                return Err(invalid("empty path segment"));
            }
            segments.push(segment);
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[FieldSegment] {
        &self.segments
    }

    /// Returns true when any segment is list-typed.
    pub fn has_list(&self) -> bool {
        self.segments.iter().any(FieldSegment::is_list)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", segment.name)?;
            if segment.list {
                write!(f, "[]")?;
            }
        }
        Ok(())
    }
}

/// One requirement of a field selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRequirement {
    path: FieldPath,
    operator: SelectorOperator,
    values: BTreeSet<String>,
}

impl FieldRequirement {
    pub fn new<I, S>(
        path: FieldPath,
        operator: SelectorOperator,
        values: I,
    ) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        check_arity("field", &path.to_string(), operator, values.len())?;
        Ok(Self {
            path,
            operator,
            values,
        })
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    pub fn operator(&self) -> SelectorOperator {
        self.operator
    }

    pub fn values(&self) -> Vec<String> {
        self.values.iter().cloned().collect()
    }
}

/// A conjunction of field requirements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSelector {
    requirements: Vec<FieldRequirement>,
}

impl FieldSelector {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let requirements = split_terms(input)
            .into_iter()
            .map(|term| {
                let (key, operator, values) = parse_term("field", input, term)?;
                FieldRequirement::new(FieldPath::parse(&key)?, operator, values)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { requirements })
    }

    pub fn with(mut self, requirement: FieldRequirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    pub fn requirements(&self) -> &[FieldRequirement] {
        &self.requirements
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }
}

fn check_arity(
    selector: &'static str,
    key: &str,
    operator: SelectorOperator,
    count: usize,
) -> Result<(), ValidationError> {
    let ok = match operator {
        SelectorOperator::Equals | SelectorOperator::DoubleEquals | SelectorOperator::NotEquals => {
            count == 1
        }
        SelectorOperator::In | SelectorOperator::NotIn => count >= 1,
        SelectorOperator::Exists | SelectorOperator::DoesNotExist => count == 0,
    };
    if key.is_empty() {
        return Err(ValidationError::InvalidSelector {
            selector,
            input: key.to_string(),
            message: "empty key".to_string(),
        });
    }
    if !ok {
        return Err(ValidationError::InvalidSelector {
            selector,
            input: key.to_string(),
            message: format!("operator '{}' does not accept {} value(s)", operator, count),
        });
    }
    Ok(())
}

/// Splits on commas that are not inside a parenthesised value set.
fn split_terms(input: &str) -> Vec<&str> {
    let mut terms = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                terms.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    terms.push(&input[start..]);
    terms
        .into_iter()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

fn parse_term(
    selector: &'static str,
    input: &str,
    term: &str,
) -> Result<(String, SelectorOperator, Vec<String>), ValidationError> {
    let invalid = |message: String| ValidationError::InvalidSelector {
        selector,
        input: input.to_string(),
        message,
    };

    if let Some(key) = term.strip_prefix('!') {
        return Ok((key.trim().to_string(), SelectorOperator::DoesNotExist, vec![]));
    }
    for (token, operator) in [
        ("!=", SelectorOperator::NotEquals),
        ("==", SelectorOperator::DoubleEquals),
        ("=", SelectorOperator::Equals),
    ] {
        if let Some((key, value)) = term.split_once(token) {
            return Ok((
                key.trim().to_string(),
                operator,
                vec![value.trim().to_string()],
            ));
        }
    }

    match term.split_once(char::is_whitespace) {
        None => Ok((term.to_string(), SelectorOperator::Exists, vec![])),
        Some((key, rest)) => {
            let rest = rest.trim_start();
            let (operator, set) = if let Some(set) = rest.strip_prefix("notin") {
                (SelectorOperator::NotIn, set)
            } else if let Some(set) = rest.strip_prefix("in") {
                (SelectorOperator::In, set)
            } else {
                return Err(invalid(format!("unknown operator in term {:?}", term)));
            };
            let set = set
                .trim()
                .strip_prefix('(')
                .and_then(|s| s.strip_suffix(')'))
                .ok_or_else(|| invalid(format!("expected (values) in term {:?}", term)))?;
            let values = set
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect();
            Ok((key.to_string(), operator, values))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_label_selector_operators() {
        let selector =
            LabelSelector::parse("tier=front, env!=prod,zone in (b, a),track notin (canary),gpu,!legacy,app==web")
                .unwrap();
        let ops: Vec<_> = selector
            .requirements()
            .iter()
            .map(|r| (r.key().to_string(), r.operator()))
            .collect();
        assert_eq!(
            ops,
            vec![
                ("tier".to_string(), SelectorOperator::Equals),
                ("env".to_string(), SelectorOperator::NotEquals),
                ("zone".to_string(), SelectorOperator::In),
                ("track".to_string(), SelectorOperator::NotIn),
                ("gpu".to_string(), SelectorOperator::Exists),
                ("legacy".to_string(), SelectorOperator::DoesNotExist),
                ("app".to_string(), SelectorOperator::DoubleEquals),
            ]
        );
        assert_eq!(selector.requirements()[2].values(), vec!["a", "b"]);
    }

    #[test]
    fn test_parse_empty_selector() {
        assert!(LabelSelector::parse("").unwrap().is_empty());
        assert!(LabelSelector::parse("  ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_bad_set() {
        assert!(LabelSelector::parse("zone in a,b").is_err());
        assert!(LabelSelector::parse("zone in ()").is_err());
        assert!(LabelSelector::parse("zone between (a)").is_err());
    }

    #[test]
    fn test_field_path_list_segments() {
        let path = FieldPath::parse("spec.containers[].image").unwrap();
        assert!(path.has_list());
        assert_eq!(path.segments()[1].name(), "containers");
        assert_eq!(path.to_string(), "spec.containers[].image");

        let indexed = FieldPath::parse("spec.containers[0].name").unwrap();
        assert!(indexed.has_list());

        let scalar = FieldPath::parse("status.phase").unwrap();
        assert!(!scalar.has_list());

        assert!(FieldPath::parse("spec..name").is_err());
        assert!(FieldPath::parse("spec.items[x]").is_err());
    }

    #[test]
    fn test_parse_field_selector() {
        let selector = FieldSelector::parse("status.phase=Running,spec.nodeName!=n1").unwrap();
        assert_eq!(selector.requirements().len(), 2);
        assert_eq!(selector.requirements()[0].path().to_string(), "status.phase");
        assert_eq!(
            selector.requirements()[1].operator(),
            SelectorOperator::NotEquals
        );
    }

    #[test]
    fn test_requirement_arity() {
        assert!(Requirement::new("tier", SelectorOperator::Equals, ["a", "b"]).is_err());
        assert!(Requirement::new("tier", SelectorOperator::Exists, ["a"]).is_err());
        assert!(Requirement::new("", SelectorOperator::In, ["a"]).is_err());
        assert!(Requirement::new("tier", SelectorOperator::NotIn, ["v1", "v2"]).is_ok());
    }
}
