use crate::aggregate::{Accumulator, AccumulatorState, Expression};
use crate::collection::{Document, Projection};
use crate::common::stream::{DocumentStream, FilteredStream, ProjectedStream, SortedStream};
use crate::common::{SortableFields, Value, DOC_ID, FIELD_SEPARATOR};
use crate::errors::{ErrorKind, FolioError, FolioResult};
use crate::filter::Filter;
use indexmap::IndexMap;
use std::fmt::{Display, Formatter};

/// `$group`: a key expression plus named accumulators.
///
/// ```rust,ignore
/// let by_genre = Group::by(field_ref("genre"))
///     .accumulate("averagePrice", avg(field_ref("price")))
///     .accumulate("count", sum(literal(1)));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    key: Expression,
    accumulators: Vec<(String, Accumulator)>,
}

impl Group {
    pub fn by(key: Expression) -> Group {
        Group {
            key,
            accumulators: Vec::new(),
        }
    }

    pub fn accumulate(mut self, output_field: &str, accumulator: Accumulator) -> Group {
        self.accumulators.push((output_field.to_string(), accumulator));
        self
    }

    pub fn key(&self) -> &Expression {
        &self.key
    }

    pub fn accumulators(&self) -> &[(String, Accumulator)] {
        &self.accumulators
    }

    fn from_document(spec: &Document) -> FolioResult<Group> {
        let key = match spec.lookup(DOC_ID)? {
            Some(key) => Expression::parse(&key)?,
            None => {
                log::error!("$group without {}: {}", DOC_ID, spec);
                return Err(FolioError::new(
                    "$group requires an _id expression",
                    ErrorKind::ValidationError,
                ));
            }
        };

        let mut group = Group::by(key);
        for (field, value) in spec.iter().filter(|(k, _)| k.as_str() != DOC_ID) {
            group = group.accumulate(field, Accumulator::from_value(value)?);
        }
        Ok(group)
    }

    fn validate(&self) -> FolioResult<()> {
        for (field, _) in &self.accumulators {
            if field.is_empty() || field.contains(FIELD_SEPARATOR) || field == DOC_ID {
                log::error!("Invalid $group output field {:?}", field);
                return Err(FolioError::new(
                    &format!("Invalid $group output field '{}'", field),
                    ErrorKind::ValidationError,
                ));
            }
        }
        Ok(())
    }

    /// Groups the whole input; output follows first-seen key order. A
    /// missing key field lands in the `Null` bucket.
    fn run(&self, input: DocumentStream) -> FolioResult<Vec<Document>> {
        let mut groups: IndexMap<Value, Vec<AccumulatorState>> = IndexMap::new();
        for document in input {
            let document = document?;
            let key = self.key.resolve(&document)?.unwrap_or(Value::Null);
            let states = groups
                .entry(key)
                .or_insert_with(|| self.accumulators.iter().map(|(_, a)| a.start()).collect());
            for ((_, accumulator), state) in self.accumulators.iter().zip(states.iter_mut()) {
                accumulator.accumulate(state, &document)?;
            }
        }

        let mut output = Vec::with_capacity(groups.len());
        for (key, states) in groups {
            let mut document = Document::new();
            document.insert_raw(DOC_ID, key);
            for ((field, _), state) in self.accumulators.iter().zip(states) {
                document.insert_raw(field, state.finish(field));
            }
            output.push(document);
        }
        Ok(output)
    }
}

/// One step of an aggregation pipeline.
#[derive(Clone, Debug, PartialEq)]
pub enum Stage {
    Match(Filter),
    AddFields(Vec<(String, Expression)>),
    Group(Group),
    Sort(SortableFields),
    Skip(u64),
    Limit(u64),
    Project(Projection),
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Match(_) => "$match",
            Stage::AddFields(_) => "$addFields",
            Stage::Group(_) => "$group",
            Stage::Sort(_) => "$sort",
            Stage::Skip(_) => "$skip",
            Stage::Limit(_) => "$limit",
            Stage::Project(_) => "$project",
        }
    }

    /// Parses a single-key stage document such as `{$match: {...}}`.
    pub fn from_document(spec: &Document) -> FolioResult<Stage> {
        let (name, operand) = match (spec.size(), spec.iter().next()) {
            (1, Some(entry)) => entry,
            _ => {
                log::error!("Stage document must have exactly one field: {}", spec);
                return Err(FolioError::new(
                    &format!("A stage must have exactly one field, found {}", spec),
                    ErrorKind::ValidationError,
                ));
            }
        };

        let stage = match name.as_str() {
            "$match" => Stage::Match(Filter::from_document(stage_document(name, operand)?)?),
            "$addFields" => {
                let fields = stage_document(name, operand)?;
                Stage::AddFields(
                    fields
                        .iter()
                        .map(|(field, value)| Ok((field.clone(), Expression::parse(value)?)))
                        .collect::<FolioResult<Vec<_>>>()?,
                )
            }
            "$group" => Stage::Group(Group::from_document(stage_document(name, operand)?)?),
            "$sort" => Stage::Sort(SortableFields::from_document(stage_document(name, operand)?)?),
            "$skip" => Stage::Skip(count_operand(name, operand)?),
            "$limit" => Stage::Limit(count_operand(name, operand)?),
            "$project" => Stage::Project(Projection::from_document(stage_document(name, operand)?)?),
            other => {
                log::error!("Unsupported pipeline stage {}", other);
                return Err(FolioError::new(
                    &format!("Unsupported pipeline stage '{}'", other),
                    ErrorKind::ValidationError,
                ));
            }
        };
        stage.validate()?;
        Ok(stage)
    }

    pub fn validate(&self) -> FolioResult<()> {
        match self {
            Stage::Match(filter) => filter.validate(),
            Stage::AddFields(fields) => {
                if fields.is_empty() {
                    log::error!("$addFields without fields");
                    return Err(FolioError::new(
                        "$addFields needs at least one field",
                        ErrorKind::ValidationError,
                    ));
                }
                for (field, _) in fields {
                    if field.is_empty() || field.split(FIELD_SEPARATOR).any(|p| p.is_empty()) {
                        log::error!("Invalid $addFields field {:?}", field);
                        return Err(FolioError::new(
                            &format!("Invalid $addFields field '{}'", field),
                            ErrorKind::ValidationError,
                        ));
                    }
                }
                Ok(())
            }
            Stage::Group(group) => group.validate(),
            Stage::Sort(fields) => fields.validate(),
            Stage::Skip(_) | Stage::Limit(_) => Ok(()),
            Stage::Project(projection) => projection.validate(),
        }
    }

    /// Chains this stage onto `input`.
    pub(crate) fn apply(&self, input: DocumentStream) -> DocumentStream {
        match self {
            Stage::Match(filter) => DocumentStream::new(FilteredStream::new(input, filter.clone())),
            Stage::AddFields(fields) => {
                let fields = fields.clone();
                DocumentStream::new(input.map(move |document| add_fields(&fields, document?)))
            }
            Stage::Group(group) => {
                let group = group.clone();
                DocumentStream::new(
                    std::iter::once_with(move || group.run(input)).flat_map(expand),
                )
            }
            Stage::Sort(fields) => DocumentStream::new(SortedStream::new(input, fields.sorting_order())),
            Stage::Skip(n) => DocumentStream::new(input.skip(usize::try_from(*n).unwrap_or(usize::MAX))),
            Stage::Limit(n) => DocumentStream::new(input.take(usize::try_from(*n).unwrap_or(usize::MAX))),
            Stage::Project(projection) => {
                DocumentStream::new(ProjectedStream::new(input, projection.clone()))
            }
        }
    }
}

/// Spreads a blocking stage's result back into a stream.
pub(crate) fn expand(result: FolioResult<Vec<Document>>) -> Vec<FolioResult<Document>> {
    match result {
        Ok(documents) => documents.into_iter().map(Ok).collect(),
        Err(e) => vec![Err(e)],
    }
}

/// Every expression sees the input document, not the fields added before it.
fn add_fields(fields: &[(String, Expression)], document: Document) -> FolioResult<Document> {
    let mut values = Vec::with_capacity(fields.len());
    for (field, expression) in fields {
        let value = expression.evaluate(&document).map_err(|e| {
            FolioError::new_with_cause(
                &format!("$addFields failed to compute '{}'", field),
                ErrorKind::EvaluationError,
                e,
            )
        })?;
        values.push(value);
    }

    let mut document = document;
    for ((field, _), value) in fields.iter().zip(values) {
        document.put(field, value)?;
    }
    Ok(document)
}

fn stage_document<'a>(name: &str, operand: &'a Value) -> FolioResult<&'a Document> {
    operand.as_document().ok_or_else(|| {
        log::error!("{} expects a document, found {}", name, operand);
        FolioError::new(
            &format!("'{}' expects a document", name),
            ErrorKind::ValidationError,
        )
    })
}

fn count_operand(name: &str, operand: &Value) -> FolioResult<u64> {
    let count = match operand {
        Value::I64(n) if *n >= 0 => Some(*n as u64),
        Value::F64(f) if *f >= 0.0 && f.fract() == 0.0 => Some(*f as u64),
        _ => None,
    };
    count.ok_or_else(|| {
        log::error!("{} expects a non-negative integer, found {}", name, operand);
        FolioError::new(
            &format!("'{}' expects a non-negative integer", name),
            ErrorKind::ValidationError,
        )
    })
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Match(filter) => write!(f, "{{$match: {}}}", filter),
            Stage::AddFields(fields) => {
                let parts: Vec<String> = fields.iter().map(|(k, e)| format!("{}: {}", k, e)).collect();
                write!(f, "{{$addFields: {{{}}}}}", parts.join(", "))
            }
            Stage::Group(group) => {
                let mut parts = vec![format!("_id: {}", group.key)];
                parts.extend(group.accumulators.iter().map(|(k, a)| format!("{}: {}", k, a)));
                write!(f, "{{$group: {{{}}}}}", parts.join(", "))
            }
            Stage::Sort(fields) => write!(f, "{{$sort: {}}}", fields),
            Stage::Skip(n) => write!(f, "{{$skip: {}}}", n),
            Stage::Limit(n) => write!(f, "{{$limit: {}}}", n),
            Stage::Project(projection) => write!(f, "{{$project: {}}}", projection),
        }
    }
}
