use crate::common::{SortOrder, Value};
use crate::filter::ComparisonOp;
use crate::index::{IndexKey, KeyPart};
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// Where a key component falls relative to a range, in ascending value
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RangePosition {
    Below,
    Within,
    Above,
}

/// Bounds on one index field built from `$gt`/`$gte`/`$lt`/`$lte`.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RangeBound {
    lower: Option<(Value, bool)>,
    upper: Option<(Value, bool)>,
    type_rank: u8,
    empty: bool,
}

impl RangeBound {
    /// Combines range predicates on one field into the tightest bounds.
    /// Predicates from different type brackets can never hold together and
    /// yield an empty range.
    pub(crate) fn from_predicates(predicates: &[(ComparisonOp, &Value)]) -> Option<RangeBound> {
        let (_, first) = predicates.first()?;
        let type_rank = first.type_rank();
        let mut bound = RangeBound {
            lower: None,
            upper: None,
            type_rank,
            empty: false,
        };

        for (op, value) in predicates {
            if value.type_rank() != type_rank {
                bound.empty = true;
                continue;
            }
            let value = (*value).clone();
            match op {
                ComparisonOp::Gt => bound.tighten_lower(value, false),
                ComparisonOp::Gte => bound.tighten_lower(value, true),
                ComparisonOp::Lt => bound.tighten_upper(value, false),
                ComparisonOp::Lte => bound.tighten_upper(value, true),
                _ => {}
            }
        }
        Some(bound)
    }

    fn tighten_lower(&mut self, value: Value, inclusive: bool) {
        let replace = match &self.lower {
            None => true,
            Some((current, current_inclusive)) => match value.cmp(current) {
                Ordering::Greater => true,
                Ordering::Equal => *current_inclusive && !inclusive,
                Ordering::Less => false,
            },
        };
        if replace {
            self.lower = Some((value, inclusive));
        }
    }

    fn tighten_upper(&mut self, value: Value, inclusive: bool) {
        let replace = match &self.upper {
            None => true,
            Some((current, current_inclusive)) => match value.cmp(current) {
                Ordering::Less => true,
                Ordering::Equal => *current_inclusive && !inclusive,
                Ordering::Greater => false,
            },
        };
        if replace {
            self.upper = Some((value, inclusive));
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.empty
    }

    pub(crate) fn position(&self, value: &Value) -> RangePosition {
        match value.type_rank().cmp(&self.type_rank) {
            Ordering::Less => return RangePosition::Below,
            Ordering::Greater => return RangePosition::Above,
            Ordering::Equal => {}
        }

        if let Some((lower, inclusive)) = &self.lower {
            match value.cmp(lower) {
                Ordering::Less => return RangePosition::Below,
                Ordering::Equal if !inclusive => return RangePosition::Below,
                _ => {}
            }
        }

        if let Some((upper, inclusive)) = &self.upper {
            match value.cmp(upper) {
                Ordering::Greater => return RangePosition::Above,
                Ordering::Equal if !inclusive => return RangePosition::Above,
                _ => {}
            }
        }
        RangePosition::Within
    }
}

impl Display for RangeBound {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let lower = match &self.lower {
            Some((v, true)) => format!("[{}", v),
            Some((v, false)) => format!("({}", v),
            None => "(-inf".to_string(),
        };
        let upper = match &self.upper {
            Some((v, true)) => format!("{}]", v),
            Some((v, false)) => format!("{})", v),
            None => "+inf)".to_string(),
        };
        write!(f, "{}, {}", lower, upper)
    }
}

/// Key bounds for an index scan: equality values for the leading fields,
/// then an optional range on the next field.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IndexScanBounds {
    pub(crate) equalities: Vec<Value>,
    pub(crate) range: Option<RangeBound>,
}

impl IndexScanBounds {
    /// Number of index fields the bounds constrain.
    pub fn covered_fields(&self) -> usize {
        self.equalities.len() + usize::from(self.range.is_some())
    }

    /// Number of leading fields fixed by equality.
    pub fn equality_fields(&self) -> usize {
        self.equalities.len()
    }

    pub fn is_unbounded(&self) -> bool {
        self.equalities.is_empty() && self.range.is_none()
    }

    pub(crate) fn is_empty_range(&self) -> bool {
        self.range.as_ref().is_some_and(|r| r.is_empty())
    }

    /// First key worth visiting in storage order.
    pub(crate) fn seek_key(&self, fields: &[(String, SortOrder)]) -> IndexKey {
        let mut parts: SmallVec<[KeyPart; 2]> = self
            .equalities
            .iter()
            .zip(fields)
            .map(|(value, (_, order))| KeyPart::new(value.clone(), *order))
            .collect();

        if let (Some(range), Some((_, order))) = (&self.range, fields.get(self.equalities.len())) {
            let start = match order {
                SortOrder::Ascending => range.lower.as_ref(),
                SortOrder::Descending => range.upper.as_ref(),
            };
            if let Some((value, _)) = start {
                parts.push(KeyPart::new(value.clone(), *order));
            }
        }
        IndexKey::new(parts)
    }

    /// Classifies a key visited in storage order: `Some(true)` to take it,
    /// `Some(false)` to skip it, `None` once no later key can match.
    pub(crate) fn classify(&self, key: &IndexKey, fields: &[(String, SortOrder)]) -> Option<bool> {
        if !key.starts_with_values(&self.equalities) {
            return None;
        }

        let (range, order) = match (&self.range, fields.get(self.equalities.len())) {
            (Some(range), Some((_, order))) => (range, *order),
            _ => return Some(true),
        };

        let component = key.part(self.equalities.len())?.value();
        match (range.position(component), order) {
            (RangePosition::Within, _) => Some(true),
            (RangePosition::Below, SortOrder::Ascending) => Some(false),
            (RangePosition::Above, SortOrder::Descending) => Some(false),
            _ => None,
        }
    }
}

impl Display for IndexScanBounds {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let equalities: Vec<String> = self.equalities.iter().map(|v| v.to_string()).collect();
        write!(f, "eq [{}]", equalities.join(", "))?;
        if let Some(range) = &self.range {
            write!(f, " range {}", range)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tightest_bounds_win() {
        let a = Value::I64(10);
        let b = Value::I64(20);
        let c = Value::I64(30);
        let bound = RangeBound::from_predicates(&[
            (ComparisonOp::Gt, &a),
            (ComparisonOp::Gte, &b),
            (ComparisonOp::Lt, &c),
        ])
        .unwrap();
        assert_eq!(bound.position(&Value::I64(15)), RangePosition::Below);
        assert_eq!(bound.position(&Value::I64(20)), RangePosition::Within);
        assert_eq!(bound.position(&Value::I64(30)), RangePosition::Above);
    }

    #[test]
    fn exclusive_beats_inclusive_at_same_value() {
        let v = Value::I64(10);
        let bound = RangeBound::from_predicates(&[(ComparisonOp::Gte, &v), (ComparisonOp::Gt, &v)]).unwrap();
        assert_eq!(bound.position(&Value::I64(10)), RangePosition::Below);
    }

    #[test]
    fn other_type_brackets_fall_outside() {
        let v = Value::I64(1940);
        let bound = RangeBound::from_predicates(&[(ComparisonOp::Gt, &v)]).unwrap();
        assert_eq!(bound.position(&Value::Null), RangePosition::Below);
        assert_eq!(bound.position(&Value::from("1950")), RangePosition::Above);
        assert_eq!(bound.position(&Value::F64(1940.5)), RangePosition::Within);
    }

    #[test]
    fn mixed_brackets_make_an_empty_range() {
        let a = Value::I64(1);
        let b = Value::from("z");
        let bound = RangeBound::from_predicates(&[(ComparisonOp::Gt, &a), (ComparisonOp::Lt, &b)]).unwrap();
        assert!(bound.is_empty());
    }

    #[test]
    fn classify_stops_after_range_on_ascending_field() {
        let fields = vec![
            ("author".to_string(), SortOrder::Ascending),
            ("year".to_string(), SortOrder::Ascending),
        ];
        let v = Value::I64(1940);
        let bounds = IndexScanBounds {
            equalities: vec![Value::from("Orwell")],
            range: RangeBound::from_predicates(&[(ComparisonOp::Lt, &v)]),
        };
        let key = |author: &str, year: i64| {
            IndexKey::new(
                [
                    KeyPart::new(Value::from(author), SortOrder::Ascending),
                    KeyPart::new(Value::I64(year), SortOrder::Ascending),
                ]
                .into_iter()
                .collect(),
            )
        };
        assert_eq!(bounds.classify(&key("Orwell", 1930), &fields), Some(true));
        assert_eq!(bounds.classify(&key("Orwell", 1949), &fields), None);
        assert_eq!(bounds.classify(&key("Poe", 1830), &fields), None);
    }

    #[test]
    fn seek_key_uses_lower_bound_for_ascending_field() {
        let fields = vec![("year".to_string(), SortOrder::Ascending)];
        let v = Value::I64(1940);
        let bounds = IndexScanBounds {
            equalities: vec![],
            range: RangeBound::from_predicates(&[(ComparisonOp::Gt, &v)]),
        };
        let seek = bounds.seek_key(&fields);
        assert_eq!(seek.parts().len(), 1);
        assert_eq!(seek.parts()[0].value(), &Value::I64(1940));

        let desc = vec![("year".to_string(), SortOrder::Descending)];
        assert!(bounds.seek_key(&desc).parts().is_empty());
    }
}
