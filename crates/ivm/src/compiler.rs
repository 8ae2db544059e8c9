//! Pipeline compilation: declarative stage specs into a typed plan.
//!
//! A pipeline is an ordered list of single-key stage objects. Compilation
//! validates every stage up front (nothing attaches on error), then fuses
//! adjacent `sort` / `limit` / `skip` stages into one ordered stage so the
//! top-K selector can bound its state.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use rill_core::{CompileError, CompileResult, DocValue};
use rill_expr::{parse_expr, parse_predicate, Expr, Predicate};

use crate::accumulator::AccKind;

/// One sort component: a field path plus its direction.
#[derive(Clone, Debug, PartialEq)]
pub struct SortSpec {
    pub path: String,
    pub descending: bool,
}

impl SortSpec {
    pub fn asc(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            descending: false,
        }
    }

    pub fn desc(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            descending: true,
        }
    }
}

/// One declared accumulator: output field, kind and input expression.
#[derive(Clone, Debug, PartialEq)]
pub struct AccSpec {
    pub field: String,
    pub kind: AccKind,
    pub expr: Expr,
}

/// A group stage: key expression plus declared accumulators.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupSpec {
    pub key: Expr,
    pub accumulators: Vec<AccSpec>,
}

impl GroupSpec {
    pub fn new(key: Expr) -> Self {
        Self {
            key,
            accumulators: Vec::new(),
        }
    }

    pub fn acc(mut self, field: impl Into<String>, kind: AccKind, expr: Expr) -> Self {
        self.accumulators.push(AccSpec {
            field: field.into(),
            kind,
            expr,
        });
        self
    }
}

/// A reshape stage: included or excluded paths plus computed fields.
///
/// Include mode and exclude mode are mutually exclusive; computed fields
/// combine with either.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReshapeSpec {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub computed: Vec<(String, Expr)>,
}

/// A flatten-array stage.
#[derive(Clone, Debug, PartialEq)]
pub struct FlattenSpec {
    /// Path of the array field to flatten.
    pub path: String,
    /// Optional output field receiving the element's array index.
    pub index_field: Option<String>,
    /// Emit one placeholder row for a missing/null/empty array instead of
    /// dropping the parent.
    pub keep_empty: bool,
}

impl FlattenSpec {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            index_field: None,
            keep_empty: false,
        }
    }
}

/// One declared pipeline operation, before fusion.
#[derive(Clone, Debug, PartialEq)]
pub enum StageSpec {
    Filter(Predicate),
    Reshape(ReshapeSpec),
    Compute(Vec<(String, Expr)>),
    Group(GroupSpec),
    Sort(Vec<SortSpec>),
    Limit(usize),
    Skip(usize),
    Flatten(FlattenSpec),
}

/// A fused, executable plan stage.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum PlanStage {
    Filter(Predicate),
    Reshape(ReshapeSpec),
    Compute(Vec<(String, Expr)>),
    Group(GroupSpec),
    Ordered {
        keys: Vec<SortSpec>,
        limit: Option<usize>,
        skip: usize,
    },
    Flatten(FlattenSpec),
}

/// A compiled pipeline, ready to attach under an execution strategy.
#[derive(Clone, Debug, PartialEq)]
pub struct Pipeline {
    pub(crate) plan: Vec<PlanStage>,
}

/// Operators that exist in the wider query surface but cannot be
/// maintained incrementally by this engine.
const UNSUPPORTED_OPERATORS: &[&str] = &["join", "lookup", "graphLookup", "facet", "union"];

impl Pipeline {
    /// Compiles a declarative stage list.
    ///
    /// Each stage must be a single-key object mapping an operator name to
    /// its spec value. The first invalid stage aborts compilation; nothing
    /// is partially attached.
    pub fn compile(stages: &[DocValue]) -> CompileResult<Pipeline> {
        let mut specs = Vec::with_capacity(stages.len());
        for (idx, stage) in stages.iter().enumerate() {
            specs.push(compile_stage(idx, stage)?);
        }
        Ok(Self::from_specs(specs))
    }

    /// Builds a pipeline from typed stage specs, fusing ordered stages.
    pub fn from_specs(specs: Vec<StageSpec>) -> Pipeline {
        let mut plan = Vec::with_capacity(specs.len());
        for spec in specs {
            match spec {
                StageSpec::Filter(p) => plan.push(PlanStage::Filter(p)),
                StageSpec::Reshape(r) => plan.push(PlanStage::Reshape(r)),
                StageSpec::Compute(c) => plan.push(PlanStage::Compute(c)),
                StageSpec::Group(g) => plan.push(PlanStage::Group(g)),
                StageSpec::Flatten(f) => plan.push(PlanStage::Flatten(f)),
                StageSpec::Sort(keys) => plan.push(PlanStage::Ordered {
                    keys,
                    limit: None,
                    skip: 0,
                }),
                StageSpec::Limit(n) => match plan.last_mut() {
                    Some(PlanStage::Ordered { limit, .. }) => {
                        *limit = Some(limit.map_or(n, |l| l.min(n)));
                    }
                    _ => plan.push(PlanStage::Ordered {
                        keys: Vec::new(),
                        limit: Some(n),
                        skip: 0,
                    }),
                },
                StageSpec::Skip(n) => match plan.last_mut() {
                    Some(PlanStage::Ordered { limit, skip, .. }) => {
                        // Skipping within an already-limited window shrinks it.
                        *skip += n;
                        *limit = limit.map(|l| l.saturating_sub(n));
                    }
                    _ => plan.push(PlanStage::Ordered {
                        keys: Vec::new(),
                        limit: None,
                        skip: n,
                    }),
                },
            }
        }
        Pipeline { plan }
    }

    /// Starts a programmatic pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Number of fused plan stages.
    pub fn len(&self) -> usize {
        self.plan.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plan.is_empty()
    }
}

/// Typed, order-preserving alternative to the `DocValue` spec format.
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    specs: Vec<StageSpec>,
}

impl PipelineBuilder {
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.specs.push(StageSpec::Filter(predicate));
        self
    }

    pub fn reshape(mut self, spec: ReshapeSpec) -> Self {
        self.specs.push(StageSpec::Reshape(spec));
        self
    }

    pub fn compute(mut self, fields: Vec<(String, Expr)>) -> Self {
        self.specs.push(StageSpec::Compute(fields));
        self
    }

    pub fn group(mut self, spec: GroupSpec) -> Self {
        self.specs.push(StageSpec::Group(spec));
        self
    }

    pub fn sort(mut self, keys: Vec<SortSpec>) -> Self {
        self.specs.push(StageSpec::Sort(keys));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.specs.push(StageSpec::Limit(n));
        self
    }

    pub fn skip(mut self, n: usize) -> Self {
        self.specs.push(StageSpec::Skip(n));
        self
    }

    pub fn flatten(mut self, spec: FlattenSpec) -> Self {
        self.specs.push(StageSpec::Flatten(spec));
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline::from_specs(self.specs)
    }
}

fn compile_stage(idx: usize, stage: &DocValue) -> CompileResult<StageSpec> {
    let obj = match stage.as_object() {
        Some(obj) if obj.len() == 1 => obj,
        _ => {
            return Err(CompileError::malformed(
                idx,
                "stage must be a single-key object",
            ))
        }
    };
    let (name, spec) = match obj.iter().next() {
        Some(entry) => entry,
        None => return Err(CompileError::malformed(idx, "empty stage object")),
    };

    match name {
        "filter" => {
            let predicate = parse_predicate(spec).map_err(|m| CompileError::malformed(idx, m))?;
            Ok(StageSpec::Filter(predicate))
        }
        "reshape" => Ok(StageSpec::Reshape(compile_reshape(idx, spec)?)),
        "compute" => Ok(StageSpec::Compute(compile_compute(idx, spec)?)),
        "group" => Ok(StageSpec::Group(compile_group(idx, spec)?)),
        "sort" => Ok(StageSpec::Sort(compile_sort(idx, spec)?)),
        "limit" => Ok(StageSpec::Limit(compile_count(idx, "limit", spec)?)),
        "skip" => Ok(StageSpec::Skip(compile_count(idx, "skip", spec)?)),
        "flatten" => Ok(StageSpec::Flatten(compile_flatten(idx, spec)?)),
        other if UNSUPPORTED_OPERATORS.contains(&other) => {
            Err(CompileError::unsupported(idx, other))
        }
        other => Err(CompileError::unknown_operator(idx, other)),
    }
}

fn compile_reshape(idx: usize, spec: &DocValue) -> CompileResult<ReshapeSpec> {
    let obj = spec
        .as_object()
        .ok_or_else(|| CompileError::malformed(idx, "reshape spec must be an object"))?;

    let mut out = ReshapeSpec::default();
    for (field, value) in obj.iter() {
        match value {
            DocValue::Number(n) if *n == 0.0 => out.exclude.push(field.to_string()),
            DocValue::Number(_) => out.include.push(field.to_string()),
            DocValue::Bool(true) => out.include.push(field.to_string()),
            DocValue::Bool(false) => out.exclude.push(field.to_string()),
            expr => {
                let expr = parse_expr(expr).map_err(|m| CompileError::malformed(idx, m))?;
                out.computed.push((field.to_string(), expr));
            }
        }
    }
    if !out.include.is_empty() && !out.exclude.is_empty() {
        return Err(CompileError::malformed(
            idx,
            "reshape cannot mix included and excluded fields",
        ));
    }
    Ok(out)
}

fn compile_compute(idx: usize, spec: &DocValue) -> CompileResult<Vec<(String, Expr)>> {
    let obj = spec
        .as_object()
        .ok_or_else(|| CompileError::malformed(idx, "compute spec must be an object"))?;
    let mut fields = Vec::with_capacity(obj.len());
    for (field, value) in obj.iter() {
        let expr = parse_expr(value).map_err(|m| CompileError::malformed(idx, m))?;
        fields.push((field.to_string(), expr));
    }
    Ok(fields)
}

fn compile_group(idx: usize, spec: &DocValue) -> CompileResult<GroupSpec> {
    let obj = spec
        .as_object()
        .ok_or_else(|| CompileError::malformed(idx, "group spec must be an object"))?;
    let key = match obj.get("_id") {
        Some(key) => parse_expr(key).map_err(|m| CompileError::malformed(idx, m))?,
        None => return Err(CompileError::malformed(idx, "group requires an _id key")),
    };

    let mut group = GroupSpec::new(key);
    for (field, value) in obj.iter() {
        if field == "_id" {
            continue;
        }
        let acc = match value.as_object() {
            Some(acc) if acc.len() == 1 => acc,
            _ => {
                return Err(CompileError::malformed(
                    idx,
                    "accumulator must be a single-key object",
                ))
            }
        };
        let (op, input) = match acc.iter().next() {
            Some(entry) => entry,
            None => return Err(CompileError::malformed(idx, "empty accumulator object")),
        };
        let kind = AccKind::from_name(op).ok_or_else(|| {
            CompileError::malformed(idx, alloc::format!("unknown accumulator '{}'", op))
        })?;
        let expr = parse_expr(input).map_err(|m| CompileError::malformed(idx, m))?;
        group = group.acc(field, kind, expr);
    }
    Ok(group)
}

/// Sort specs come either as a single-key field→direction object or as an
/// array of single-key objects in explicit precedence order. Multi-key
/// object specs are rejected: object entries iterate in canonical key
/// order, not declaration order.
fn compile_sort(idx: usize, spec: &DocValue) -> CompileResult<Vec<SortSpec>> {
    let mut keys = Vec::new();
    match spec {
        DocValue::Object(obj) => {
            if obj.len() > 1 {
                return Err(CompileError::malformed(
                    idx,
                    "multi-key sort must use the array form",
                ));
            }
            for (field, dir) in obj.iter() {
                keys.push(sort_key(idx, field, dir)?);
            }
        }
        DocValue::Array(entries) => {
            for entry in entries {
                let obj = match entry.as_object() {
                    Some(obj) if obj.len() == 1 => obj,
                    _ => {
                        return Err(CompileError::malformed(
                            idx,
                            "sort entries must be single-key objects",
                        ))
                    }
                };
                if let Some((field, dir)) = obj.iter().next() {
                    keys.push(sort_key(idx, field, dir)?);
                }
            }
        }
        _ => {
            return Err(CompileError::malformed(
                idx,
                "sort spec must be an object or array",
            ))
        }
    }
    if keys.is_empty() {
        return Err(CompileError::malformed(idx, "sort requires at least one key"));
    }
    Ok(keys)
}

fn sort_key(idx: usize, field: &str, dir: &DocValue) -> CompileResult<SortSpec> {
    match dir.as_i64() {
        Some(1) => Ok(SortSpec::asc(field)),
        Some(-1) => Ok(SortSpec::desc(field)),
        _ => Err(CompileError::malformed(
            idx,
            "sort direction must be 1 or -1",
        )),
    }
}

fn compile_count(idx: usize, name: &str, spec: &DocValue) -> CompileResult<usize> {
    match spec.as_i64() {
        Some(n) if n >= 0 => Ok(n as usize),
        _ => Err(CompileError::malformed(
            idx,
            alloc::format!("{} must be a non-negative integer", name),
        )),
    }
}

fn compile_flatten(idx: usize, spec: &DocValue) -> CompileResult<FlattenSpec> {
    match spec {
        DocValue::String(path) => Ok(FlattenSpec::new(strip_field_ref(path))),
        DocValue::Object(obj) => {
            let path = obj
                .get("path")
                .and_then(DocValue::as_str)
                .ok_or_else(|| CompileError::malformed(idx, "flatten requires a path"))?;
            let mut out = FlattenSpec::new(strip_field_ref(path));
            if let Some(field) = obj.get("includeIndexField") {
                let field = field.as_str().ok_or_else(|| {
                    CompileError::malformed(idx, "includeIndexField must be a string")
                })?;
                out.index_field = Some(field.to_string());
            }
            if let Some(keep) = obj.get("preserveNullAndEmpty") {
                out.keep_empty = keep.as_bool().ok_or_else(|| {
                    CompileError::malformed(idx, "preserveNullAndEmpty must be a boolean")
                })?;
            }
            Ok(out)
        }
        _ => Err(CompileError::malformed(
            idx,
            "flatten spec must be a path or options object",
        )),
    }
}

fn strip_field_ref(path: &str) -> &str {
    path.strip_prefix('$').unwrap_or(path)
}
