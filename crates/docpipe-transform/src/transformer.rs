//! Spec compilation and execution.
//!
//! Specs are compiled once, when a transformer is built, into one resolver
//! closure per target property. Running a transformer never re-inspects spec
//! kinds.

use std::fmt;
use std::sync::Arc;

use futures::future::{self, try_join_all, BoxFuture, FutureExt};
use serde_json::{Map, Value};

use crate::error::{TransformError, TransformResult};
use crate::path::{lookup_key, lookup_path};
use crate::spec::{NestedSpec, ObjectSpec, PropertySpec, TransformFn, TransformSpec};

type Resolver = Arc<dyn Fn(Arc<Value>) -> BoxFuture<'static, TransformResult<Value>> + Send + Sync>;

/// How each spec's output is combined with the document it received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransformMode {
    /// Each spec's output replaces the document.
    #[default]
    Replace,
    /// Each spec's output is merged over the document; excluded keys are deleted.
    Additive,
}

/// A compiled, reusable document transformer.
///
/// Specs run sequentially, each receiving the previous one's output. Sibling
/// properties of an object spec, and the elements of list and iterate specs,
/// are resolved concurrently; results keep their declared positions.
#[derive(Clone)]
pub struct Transformer {
    steps: Arc<[Step]>,
    mode: TransformMode,
}

impl Transformer {
    /// Build a replacing transformer from one or more specs.
    pub fn new(specs: impl IntoIterator<Item = TransformSpec>) -> Self {
        Self::compile(specs, TransformMode::Replace)
    }

    /// Build an additive transformer: outputs are overlaid onto the input.
    pub fn additive(specs: impl IntoIterator<Item = TransformSpec>) -> Self {
        Self::compile(specs, TransformMode::Additive)
    }

    /// A transformer returning its input unchanged.
    pub fn identity() -> Self {
        Self {
            steps: Arc::from(Vec::new()),
            mode: TransformMode::Replace,
        }
    }

    /// Parse, validate and compile declarative specs.
    pub fn from_json(specs: &[Value]) -> TransformResult<Self> {
        Ok(Self::new(parse_all(specs)?))
    }

    /// Parse, validate and compile declarative specs into an additive transformer.
    pub fn additive_from_json(specs: &[Value]) -> TransformResult<Self> {
        Ok(Self::additive(parse_all(specs)?))
    }

    fn compile(specs: impl IntoIterator<Item = TransformSpec>, mode: TransformMode) -> Self {
        let steps: Arc<[Step]> = specs.into_iter().map(Step::compile).collect();

        tracing::debug!(specs = steps.len(), mode = ?mode, "creating transformer");

        Self { steps, mode }
    }

    /// Combination mode.
    pub fn mode(&self) -> TransformMode {
        self.mode
    }

    /// Number of compiled specs.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether this transformer has no specs (identity).
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Thread a document through every spec in order.
    pub async fn transform(&self, mut data: Value) -> TransformResult<Value> {
        for (index, step) in self.steps.iter().enumerate() {
            tracing::trace!(index, "applying spec");

            data = match self.mode {
                TransformMode::Replace => step.apply(data).await?,
                TransformMode::Additive => step.apply_additive(data).await?,
            };
        }
        Ok(data)
    }
}

impl Default for Transformer {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<TransformSpec> for Transformer {
    fn from(spec: TransformSpec) -> Self {
        Self::new([spec])
    }
}

impl From<ObjectSpec> for Transformer {
    fn from(spec: ObjectSpec) -> Self {
        Self::new([TransformSpec::Object(spec)])
    }
}

impl fmt::Debug for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformer")
            .field("specs", &self.steps.len())
            .field("mode", &self.mode)
            .finish()
    }
}

fn parse_all(specs: &[Value]) -> TransformResult<Vec<TransformSpec>> {
    specs.iter().map(TransformSpec::from_json).collect()
}

enum Step {
    Function(TransformFn),
    Object(CompiledObject),
}

impl Step {
    fn compile(spec: TransformSpec) -> Self {
        match spec {
            TransformSpec::Function(f) => Self::Function(f),
            TransformSpec::Object(object) => Self::Object(CompiledObject::compile(&object)),
        }
    }

    async fn apply(&self, data: Value) -> TransformResult<Value> {
        match self {
            Self::Function(f) => f(data).await.map_err(TransformError::Function),
            Self::Object(object) => object.build(Arc::new(data)).await,
        }
    }

    async fn apply_additive(&self, data: Value) -> TransformResult<Value> {
        match self {
            Self::Function(f) => {
                let overlay = f(data.clone()).await.map_err(TransformError::Function)?;
                Ok(merge(data, overlay, &[]))
            }
            Self::Object(object) => {
                let shared = Arc::new(data);
                let overlay = object.build(shared.clone()).await?;
                let base = Arc::try_unwrap(shared).unwrap_or_else(|shared| (*shared).clone());
                Ok(merge(base, overlay, &object.excluded))
            }
        }
    }
}

/// Overlay `overlay` onto `base`, then delete excluded keys.
///
/// A non-object overlay cannot be merged and replaces the document.
fn merge(base: Value, overlay: Value, excluded: &[String]) -> Value {
    let Value::Object(overlay) = overlay else {
        return overlay;
    };

    let mut merged = match base {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    merged.extend(overlay);
    for name in excluded {
        merged.remove(name);
    }
    Value::Object(merged)
}

struct CompiledObject {
    properties: Vec<(String, Resolver)>,
    excluded: Vec<String>,
}

impl CompiledObject {
    fn compile(spec: &ObjectSpec) -> Self {
        let properties = spec
            .properties()
            .filter(|(_, property)| !property.is_excluded())
            .map(|(name, property)| (name.to_string(), compile_property(name, property)))
            .collect();
        let excluded = spec.excluded().map(String::from).collect();

        Self {
            properties,
            excluded,
        }
    }

    async fn build(&self, data: Arc<Value>) -> TransformResult<Value> {
        let values = try_join_all(
            self.properties
                .iter()
                .map(|(_, resolve)| resolve(data.clone())),
        )
        .await?;

        let object: Map<String, Value> = self
            .properties
            .iter()
            .map(|(name, _)| name.clone())
            .zip(values)
            .collect();

        Ok(Value::Object(object))
    }
}

fn compile_property(target: &str, spec: &PropertySpec) -> Resolver {
    match spec {
        // Inside a list, `false` is not an exclusion and copies like `true`.
        PropertySpec::Include(_) => {
            let target = target.to_string();
            Arc::new(move |data: Arc<Value>| {
                let value = lookup_key(&data, &target).cloned().unwrap_or(Value::Null);
                future::ready(Ok(value)).boxed()
            })
        }
        PropertySpec::Path(path) => {
            let path = path.clone();
            Arc::new(move |data: Arc<Value>| {
                let value = lookup_path(&data, &path).cloned().unwrap_or(Value::Null);
                future::ready(Ok(value)).boxed()
            })
        }
        PropertySpec::Function(f) => {
            let f = f.clone();
            Arc::new(move |data: Arc<Value>| {
                let pending = f(data.as_ref().clone());
                async move { pending.await.map_err(TransformError::Function) }.boxed()
            })
        }
        PropertySpec::List(specs) => {
            let resolvers: Arc<[Resolver]> = specs
                .iter()
                .map(|spec| compile_property(target, spec))
                .collect();
            Arc::new(move |data: Arc<Value>| {
                let resolvers = resolvers.clone();
                async move {
                    let values =
                        try_join_all(resolvers.iter().map(|resolve| resolve(data.clone()))).await?;
                    Ok(Value::Array(values))
                }
                .boxed()
            })
        }
        PropertySpec::Nested(nested) => compile_nested(target, nested),
    }
}

fn compile_nested(target: &str, nested: &NestedSpec) -> Resolver {
    let src = nested.src.clone().unwrap_or_else(|| target.to_string());
    let inner = match nested.transform.as_deref() {
        Some(spec) => Transformer::new([spec.clone()]),
        None => Transformer::identity(),
    };
    let iterate = nested.iterate;
    let max = nested.max;

    Arc::new(move |data: Arc<Value>| {
        let inner = inner.clone();
        let candidate = lookup_path(&data, &src).cloned();

        if !iterate {
            return async move { inner.transform(candidate.unwrap_or(Value::Null)).await }.boxed();
        }

        let mut items = match candidate {
            None => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(other) => {
                tracing::debug!(src = %src, "coerced non-array value into a sequence");
                vec![other]
            }
        };
        if let Some(max) = max {
            items.truncate(max);
        }

        async move {
            let values = try_join_all(items.into_iter().map(|item| inner.transform(item))).await?;
            Ok(Value::Array(values))
        }
        .boxed()
    })
}
