use crate::aggregate::{Expression, Group, Stage};
use crate::collection::{Document, Projection};
use crate::common::{paths_overlap, SortableFields, FIELD_SEPARATOR};
use crate::errors::FolioResult;
use crate::filter::Filter;
use std::fmt::{Display, Formatter};

/// Ordered list of aggregation stages.
///
/// ```rust,ignore
/// let pipeline = Pipeline::new()
///     .add_fields(vec![("decade", subtract(field_ref("published_year"),
///         modulo(field_ref("published_year"), literal(10))))])
///     .group(Group::by(field_ref("decade")).accumulate("bookCount", sum(literal(1))))
///     .sort(SortableFields::from(("_id", SortOrder::Ascending)));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Pipeline {
        Pipeline::default()
    }

    /// Parses stage documents, rejecting the whole pipeline on the first
    /// malformed stage.
    pub fn from_documents(documents: &[Document]) -> FolioResult<Pipeline> {
        let stages = documents
            .iter()
            .map(Stage::from_document)
            .collect::<FolioResult<Vec<_>>>()?;
        Ok(Pipeline { stages })
    }

    pub fn stage(mut self, stage: Stage) -> Pipeline {
        self.stages.push(stage);
        self
    }

    pub fn match_filter(self, filter: Filter) -> Pipeline {
        self.stage(Stage::Match(filter))
    }

    pub fn add_fields(self, fields: Vec<(&str, Expression)>) -> Pipeline {
        self.stage(Stage::AddFields(
            fields
                .into_iter()
                .map(|(name, expr)| (name.to_string(), expr))
                .collect(),
        ))
    }

    pub fn group(self, group: Group) -> Pipeline {
        self.stage(Stage::Group(group))
    }

    pub fn sort(self, fields: SortableFields) -> Pipeline {
        self.stage(Stage::Sort(fields))
    }

    pub fn skip(self, skip: u64) -> Pipeline {
        self.stage(Stage::Skip(skip))
    }

    pub fn limit(self, limit: u64) -> Pipeline {
        self.stage(Stage::Limit(limit))
    }

    pub fn project(self, projection: Projection) -> Pipeline {
        self.stage(Stage::Project(projection))
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn validate(&self) -> FolioResult<()> {
        self.stages.iter().try_for_each(|stage| stage.validate())
    }

    /// Moves every `$match` ahead of directly preceding `$addFields` stages
    /// that cannot fail and whose fields it does not read. Results,
    /// including evaluation errors, are unchanged.
    pub fn optimized(mut self) -> Pipeline {
        let mut moved = true;
        while moved {
            moved = false;
            for i in 1..self.stages.len() {
                if can_hoist(&self.stages[i - 1], &self.stages[i]) {
                    self.stages.swap(i - 1, i);
                    moved = true;
                    log::debug!("Moved {} before {}", self.stages[i - 1], self.stages[i]);
                }
            }
        }
        self
    }
}

fn can_hoist(previous: &Stage, current: &Stage) -> bool {
    let (fields, filter) = match (previous, current) {
        (Stage::AddFields(fields), Stage::Match(filter)) => (fields, filter),
        _ => return false,
    };
    // the $addFields must not be able to fail on a document the $match drops
    let infallible = fields
        .iter()
        .all(|(name, expr)| !name.contains(FIELD_SEPARATOR) && expr.is_constant());
    infallible
        && !filter.field_names().iter().any(|read| {
            fields
                .iter()
                .any(|(written, _)| paths_overlap(read, written))
        })
}

impl Display for Pipeline {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let stages: Vec<String> = self.stages.iter().map(|s| s.to_string()).collect();
        write!(f, "[{}]", stages.join(", "))
    }
}
