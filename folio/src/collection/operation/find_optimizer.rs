use crate::collection::{FindOptions, FindPlan, FindPlanBuilder, Projection};
use crate::common::{SortOrder, SortableFields};
use crate::filter::{ComparisonOp, Filter};
use crate::index::{IndexDescriptor, IndexScanBounds, RangeBound};
use dashmap::DashMap;
use std::sync::Arc;

/// Query shape a cached plan answers.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct PlanKey {
    catalog_version: u64,
    filter: Filter,
    sort_by: Option<SortableFields>,
    projection: Option<Projection>,
    skip: Option<u64>,
    limit: Option<u64>,
}

/// Chooses between an index walk and a collection scan.
#[derive(Clone)]
pub(crate) struct FindOptimizer {
    inner: Arc<FindOptimizerInner>,
}

impl FindOptimizer {
    pub fn new(cache_limit: usize) -> Self {
        FindOptimizer {
            inner: Arc::new(FindOptimizerInner {
                query_cache: DashMap::new(),
                cache_limit,
            }),
        }
    }

    pub fn create_find_plan(
        &self,
        filter: &Filter,
        find_options: &FindOptions,
        index_descriptors: &[IndexDescriptor],
        catalog_version: u64,
    ) -> FindPlan {
        self.inner
            .create_find_plan(filter, find_options, index_descriptors, catalog_version)
    }

    /// Drops every cached plan; called on index creation and removal.
    pub fn invalidate_cache(&self) {
        self.inner.query_cache.clear();
    }

    pub fn cached_plans(&self) -> usize {
        self.inner.query_cache.len()
    }
}

struct FindOptimizerInner {
    query_cache: DashMap<PlanKey, FindPlan>,
    cache_limit: usize,
}

/// Per-index evaluation of a filter.
struct IndexCandidate<'a> {
    descriptor: &'a IndexDescriptor,
    bounds: IndexScanBounds,
    consumed: Vec<usize>,
    sort_direction: Option<bool>,
}

impl FindOptimizerInner {
    fn create_find_plan(
        &self,
        filter: &Filter,
        find_options: &FindOptions,
        index_descriptors: &[IndexDescriptor],
        catalog_version: u64,
    ) -> FindPlan {
        if self.cache_limit == 0 {
            return plan_query(filter, find_options, index_descriptors);
        }

        let key = PlanKey {
            catalog_version,
            filter: filter.clone(),
            sort_by: find_options.sort_by.clone(),
            projection: find_options.projection.clone(),
            skip: find_options.skip,
            limit: find_options.limit,
        };
        if let Some(plan) = self.query_cache.get(&key) {
            return plan.clone();
        }

        let plan = plan_query(filter, find_options, index_descriptors);
        if self.query_cache.len() >= self.cache_limit {
            // plans built for an older catalog can never be hit again
            self.query_cache
                .retain(|cached, _| cached.catalog_version == catalog_version);
        }
        if self.query_cache.len() < self.cache_limit {
            self.query_cache.insert(key, plan.clone());
        }
        plan
    }
}

/// Builds the plan for `filter` and `find_options` over the given indexes,
/// listed in creation order.
pub(crate) fn plan_query(
    filter: &Filter,
    find_options: &FindOptions,
    index_descriptors: &[IndexDescriptor],
) -> FindPlan {
    let conjuncts = filter.conjuncts();
    let sort_by = find_options.sort_by.as_ref().filter(|s| !s.is_empty());
    let projection = find_options.projection.as_ref();

    let candidates: Vec<IndexCandidate> = index_descriptors
        .iter()
        .map(|descriptor| {
            let (bounds, consumed) = scan_bounds(descriptor.index_fields(), &conjuncts);
            let sort_direction = sort_by
                .and_then(|sort| sort_direction(descriptor.index_fields(), bounds.equality_fields(), sort, projection));
            IndexCandidate {
                descriptor,
                bounds,
                consumed,
                sort_direction,
            }
        })
        .collect();

    // most covered fields, then sort support, then creation order
    let best = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.bounds.covered_fields() > 0)
        .max_by(|(ia, a), (ib, b)| {
            a.bounds
                .covered_fields()
                .cmp(&b.bounds.covered_fields())
                .then(a.sort_direction.is_some().cmp(&b.sort_direction.is_some()))
                .then(ib.cmp(ia))
        })
        .map(|(_, c)| c)
        .or_else(|| candidates.iter().find(|c| c.sort_direction.is_some()));

    let mut builder = FindPlanBuilder {
        projection: projection.cloned(),
        skip: find_options.skip,
        limit: find_options.limit,
        ..Default::default()
    };

    match best {
        Some(candidate) => {
            let (consumed, residual): (Vec<_>, Vec<_>) = conjuncts
                .iter()
                .enumerate()
                .partition(|(i, _)| candidate.consumed.contains(i));

            log::debug!(
                "Planning {} on index {} with bounds {}",
                filter,
                candidate.descriptor.name(),
                candidate.bounds
            );
            builder.index_descriptor = Some(candidate.descriptor.clone());
            builder.index_scan_bounds = Some(candidate.bounds.clone());
            builder.index_scan_filter = if consumed.is_empty() {
                None
            } else {
                Some(Filter::from_conjuncts(
                    consumed.into_iter().map(|(_, f)| (*f).clone()).collect(),
                ))
            };
            builder.full_scan_filter =
                Filter::from_conjuncts(residual.into_iter().map(|(_, f)| (*f).clone()).collect());
            match candidate.sort_direction {
                Some(reverse) => {
                    builder.index_sorted = true;
                    builder.reverse_scan = reverse;
                }
                None => builder.blocking_sort_order = sort_by.cloned(),
            }
        }
        None => {
            log::debug!("Planning {} as a collection scan", filter);
            builder.full_scan_filter = filter.clone();
            builder.blocking_sort_order = sort_by.cloned();
        }
    }
    builder.build()
}

/// Index bounds from the top-level conjuncts: equality on leading fields,
/// then at most one range field. Returns the bounds and the positions of
/// the conjuncts they answer.
pub(crate) fn scan_bounds(fields: &SortableFields, conjuncts: &[&Filter]) -> (IndexScanBounds, Vec<usize>) {
    let mut bounds = IndexScanBounds::default();
    let mut consumed = Vec::new();

    for (field, _) in fields.sorting_order() {
        let equality = conjuncts.iter().enumerate().find_map(|(i, f)| match f {
            Filter::Compare(cmp) if cmp.field_name() == field && cmp.op() == ComparisonOp::Eq => {
                Some((i, cmp.value().clone()))
            }
            _ => None,
        });
        if let Some((i, value)) = equality {
            bounds.equalities.push(value);
            consumed.push(i);
            continue;
        }

        let mut positions = Vec::new();
        let mut predicates = Vec::new();
        for (i, f) in conjuncts.iter().enumerate() {
            if let Filter::Compare(cmp) = f {
                if cmp.field_name() == field && cmp.op().is_range() {
                    positions.push(i);
                    predicates.push((cmp.op(), cmp.value()));
                }
            }
        }
        if let Some(range) = RangeBound::from_predicates(&predicates) {
            bounds.range = Some(range);
            consumed.extend(positions);
        }
        break;
    }
    (bounds, consumed)
}

/// `Some(reverse)` when walking the index yields `sort` order.
///
/// The sort keys must be the index fields from some position `j` to the
/// end, with `j` within the equality-bound prefix, and with directions
/// either all matching (forward walk) or all opposite (reverse walk).
/// Entries with equal keys come out in id order, the tie order of a
/// stable sort over the collection. A projection that drops a sort field
/// changes what the sort sees, so it disqualifies the index.
fn sort_direction(
    index_fields: &SortableFields,
    equality_fields: usize,
    sort: &SortableFields,
    projection: Option<&Projection>,
) -> Option<bool> {
    if let Some(projection) = projection {
        if !sort.field_names().iter().all(|f| projection.keeps_field(f)) {
            return None;
        }
    }

    let index_order = index_fields.sorting_order();
    let sort_order = sort.sorting_order();
    if sort_order.len() > index_order.len() {
        return None;
    }
    let start = index_order.len() - sort_order.len();
    if start > equality_fields {
        return None;
    }

    let suffix = &index_order[start..];
    let names_match = suffix
        .iter()
        .zip(sort_order)
        .all(|((a, _), (b, _))| a == b);
    if !names_match {
        return None;
    }

    let same = |(a, b): (&(String, SortOrder), &(String, SortOrder))| a.1 == b.1;
    if suffix.iter().zip(sort_order).all(same) {
        Some(false)
    } else if suffix.iter().zip(sort_order).all(|p| !same(p)) {
        Some(true)
    } else {
        None
    }
}
