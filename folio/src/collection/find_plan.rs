use crate::collection::Projection;
use crate::common::SortableFields;
use crate::filter::Filter;
use crate::index::{IndexDescriptor, IndexScanBounds};
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// How a plan reaches its candidate documents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanPath {
    Index,
    Scan,
}

impl ScanPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanPath::Index => "index",
            ScanPath::Scan => "scan",
        }
    }
}

impl Display for ScanPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The execution plan of a find operation.
///
/// Produced by the planner and cached per query shape. A plan either scans
/// the collection in identifier order or walks one index within
/// [IndexScanBounds]; the remaining predicates run as a residual filter.
/// Execution always applies the residual filter, the projection, the
/// blocking sort, then skip and limit.
#[derive(Clone)]
pub struct FindPlan {
    inner: Arc<FindPlanInner>,
}

struct FindPlanInner {
    index_descriptor: Option<IndexDescriptor>,
    index_scan_bounds: Option<IndexScanBounds>,
    index_scan_filter: Option<Filter>,
    full_scan_filter: Filter,
    reverse_scan: bool,
    index_sorted: bool,
    blocking_sort_order: Option<SortableFields>,
    projection: Option<Projection>,
    skip: Option<u64>,
    limit: Option<u64>,
}

#[derive(Default)]
pub(crate) struct FindPlanBuilder {
    pub(crate) index_descriptor: Option<IndexDescriptor>,
    pub(crate) index_scan_bounds: Option<IndexScanBounds>,
    pub(crate) index_scan_filter: Option<Filter>,
    pub(crate) full_scan_filter: Filter,
    pub(crate) reverse_scan: bool,
    pub(crate) index_sorted: bool,
    pub(crate) blocking_sort_order: Option<SortableFields>,
    pub(crate) projection: Option<Projection>,
    pub(crate) skip: Option<u64>,
    pub(crate) limit: Option<u64>,
}

impl FindPlanBuilder {
    pub(crate) fn build(self) -> FindPlan {
        FindPlan {
            inner: Arc::new(FindPlanInner {
                index_descriptor: self.index_descriptor,
                index_scan_bounds: self.index_scan_bounds,
                index_scan_filter: self.index_scan_filter,
                full_scan_filter: self.full_scan_filter,
                reverse_scan: self.reverse_scan,
                index_sorted: self.index_sorted,
                blocking_sort_order: self.blocking_sort_order,
                projection: self.projection,
                skip: self.skip,
                limit: self.limit,
            }),
        }
    }
}

impl FindPlan {
    pub fn path(&self) -> ScanPath {
        if self.inner.index_descriptor.is_some() {
            ScanPath::Index
        } else {
            ScanPath::Scan
        }
    }

    pub fn index_descriptor(&self) -> Option<&IndexDescriptor> {
        self.inner.index_descriptor.as_ref()
    }

    pub fn index_scan_bounds(&self) -> Option<&IndexScanBounds> {
        self.inner.index_scan_bounds.as_ref()
    }

    /// Predicates answered by the index bounds.
    pub fn index_scan_filter(&self) -> Option<&Filter> {
        self.inner.index_scan_filter.as_ref()
    }

    /// Predicates checked against every candidate document.
    pub fn full_scan_filter(&self) -> &Filter {
        &self.inner.full_scan_filter
    }

    pub fn is_reverse_scan(&self) -> bool {
        self.inner.reverse_scan
    }

    /// `true` when the index walk already yields the requested sort order.
    pub fn is_index_sorted(&self) -> bool {
        self.inner.index_sorted
    }

    pub fn blocking_sort_order(&self) -> Option<&SortableFields> {
        self.inner.blocking_sort_order.as_ref()
    }

    pub fn projection(&self) -> Option<&Projection> {
        self.inner.projection.as_ref()
    }

    pub fn skip(&self) -> Option<u64> {
        self.inner.skip
    }

    pub fn limit(&self) -> Option<u64> {
        self.inner.limit
    }
}

impl Debug for FindPlan {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FindPlan")
            .field("path", &self.path())
            .field("index", &self.inner.index_descriptor.as_ref().map(|d| d.name()))
            .field("bounds", &self.inner.index_scan_bounds)
            .field("residual", &self.inner.full_scan_filter)
            .field("reverse_scan", &self.inner.reverse_scan)
            .field("index_sorted", &self.inner.index_sorted)
            .field("blocking_sort", &self.inner.blocking_sort_order)
            .field("skip", &self.inner.skip)
            .field("limit", &self.inner.limit)
            .finish()
    }
}

impl Display for FindPlan {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (&self.inner.index_descriptor, &self.inner.index_scan_bounds) {
            (Some(index), Some(bounds)) => write!(f, "index {} {}", index.name(), bounds)?,
            _ => write!(f, "scan")?,
        }
        if !self.inner.full_scan_filter.is_all() {
            write!(f, " filter {}", self.inner.full_scan_filter)?;
        }
        if let Some(sort) = &self.inner.blocking_sort_order {
            write!(f, " sort {}", sort.encoded_name())?;
        }
        Ok(())
    }
}
