//! Transform pipeline harness: ordered, extensible tree-to-tree stages.
//!
//! A transform is a pure function from (tree, run context) to tree. Each
//! stage folds its registered transforms left to right; before/after
//! constraints are resolved once by a topological sort when the pipeline is
//! constructed, and an unsatisfiable ordering is a construction-time error.

use rayon::prelude::*;

use crate::error::{Error, Reporter, Result};
use crate::model::ModuleDecl;

/// Shared state every transform (and the renderer) can see during one run.
#[derive(Debug, Default)]
pub struct RunContext {
    /// Output format name, for applicability predicates.
    pub format: String,
    pub reporter: Reporter,
}

impl RunContext {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            reporter: Reporter::new(),
        }
    }
}

type TransformFn<T> = Box<dyn Fn(T, &RunContext) -> T + Send + Sync>;
type AppliesFn = Box<dyn Fn(&RunContext) -> bool + Send + Sync>;

/// One registered transform plus its ordering constraints.
pub struct Transform<T> {
    name: &'static str,
    before: Vec<&'static str>,
    after: Vec<&'static str>,
    applies: Option<AppliesFn>,
    run: TransformFn<T>,
}

impl<T> Transform<T> {
    pub fn new(
        name: &'static str,
        run: impl Fn(T, &RunContext) -> T + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            before: Vec::new(),
            after: Vec::new(),
            applies: None,
            run: Box::new(run),
        }
    }

    /// Require this transform to run before the named one.
    pub fn before(mut self, other: &'static str) -> Self {
        self.before.push(other);
        self
    }

    /// Require this transform to run after the named one.
    pub fn after(mut self, other: &'static str) -> Self {
        self.after.push(other);
        self
    }

    /// Restrict to runs where the predicate holds (e.g. one output format).
    pub fn only_when(mut self, pred: impl Fn(&RunContext) -> bool + Send + Sync + 'static) -> Self {
        self.applies = Some(Box::new(pred));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// An ordered list of transforms over trees of type `T`.
pub struct Pipeline<T> {
    transforms: Vec<Transform<T>>,
}

impl<T> std::fmt::Debug for Pipeline<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field(
                "transforms",
                &self.transforms.iter().map(|t| t.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<T> Pipeline<T> {
    /// Validate ordering constraints and fix the execution order.
    ///
    /// Ties are broken by registration order, so two unconstrained
    /// transforms always run in the order they were registered.
    pub fn new(transforms: Vec<Transform<T>>) -> Result<Self> {
        let order = topological_order(&transforms)?;
        let mut slots: Vec<Option<Transform<T>>> = transforms.into_iter().map(Some).collect();
        let transforms = order
            .into_iter()
            .map(|i| slots[i].take().expect("each index appears once"))
            .collect();
        Ok(Self { transforms })
    }

    /// Execution order, mostly useful for logging and tests.
    pub fn names(&self) -> Vec<&'static str> {
        self.transforms.iter().map(|t| t.name).collect()
    }

    /// Thread the tree through every applicable transform.
    pub fn apply(&self, input: T, ctx: &RunContext) -> T {
        self.transforms.iter().fold(input, |tree, transform| {
            if transform.applies.as_ref().is_some_and(|pred| !pred(ctx)) {
                return tree;
            }
            tracing::debug!(transform = transform.name, "applying transform");
            (transform.run)(tree, ctx)
        })
    }
}

/// Kahn's algorithm over the before/after constraint graph. Returns indices
/// into the registration list; among ready nodes the smallest registration
/// index is taken first.
fn topological_order<T>(transforms: &[Transform<T>]) -> Result<Vec<usize>> {
    let index_of = |name: &str| transforms.iter().position(|t| t.name == name);
    let n = transforms.len();
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut indegree = vec![0usize; n];

    for (i, t) in transforms.iter().enumerate() {
        for &other in &t.before {
            let j = index_of(other).ok_or(Error::UnknownTransform(t.name.into(), other.into()))?;
            successors[i].push(j);
            indegree[j] += 1;
        }
        for &other in &t.after {
            let j = index_of(other).ok_or(Error::UnknownTransform(t.name.into(), other.into()))?;
            successors[j].push(i);
            indegree[i] += 1;
        }
    }

    let mut order = Vec::with_capacity(n);
    let mut done = vec![false; n];
    while order.len() < n {
        let Some(next) = (0..n).find(|&i| !done[i] && indegree[i] == 0) else {
            let stuck = (0..n).find(|&i| !done[i]).expect("some node remains");
            return Err(Error::TransformCycle(transforms[stuck].name.into()));
        };
        done[next] = true;
        order.push(next);
        for &succ in &successors[next] {
            indegree[succ] -= 1;
        }
    }
    Ok(order)
}

/// Run the pre-merge pipeline over every per-target tree in parallel.
/// Each target's work is independent; the caller joins on the result.
pub fn apply_per_target(
    pipeline: &Pipeline<ModuleDecl>,
    inputs: Vec<ModuleDecl>,
    ctx: &RunContext,
) -> Vec<ModuleDecl> {
    inputs
        .into_par_iter()
        .map(|tree| pipeline.apply(tree, ctx))
        .collect()
}
