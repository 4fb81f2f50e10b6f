//! Transformation spec model and declarative (JSON) spec parsing.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use serde_json::{Map, Value};

use crate::error::{TransformError, TransformResult};

/// A user-supplied mapping from one JSON value to another.
pub type TransformFn =
    Arc<dyn Fn(Value) -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync>;

/// Wrap a synchronous function as a [`TransformFn`].
pub fn transform_fn<F>(f: F) -> TransformFn
where
    F: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
{
    Arc::new(move |value: Value| future::ready(f(value)).boxed())
}

/// Wrap an async function as a [`TransformFn`].
pub fn async_transform_fn<F, Fut>(f: F) -> TransformFn
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    Arc::new(move |value: Value| f(value).boxed())
}

/// The kinds of property spec, resolved once when a transformer is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecKind {
    /// `true` copies, `false` excludes.
    Boolean,
    /// Dot-path into the source document.
    String,
    /// Function over the whole document.
    Function,
    /// List of specs evaluated into a list.
    List,
    /// Nested `{ src, transform, iterate, max }` spec.
    Object,
}

impl SpecKind {
    /// Classify a JSON value, or return its JSON type name if it cannot be a spec.
    pub fn of_json(value: &Value) -> Result<Self, &'static str> {
        match value {
            Value::Bool(_) => Ok(Self::Boolean),
            Value::String(_) => Ok(Self::String),
            Value::Array(_) => Ok(Self::List),
            Value::Object(_) => Ok(Self::Object),
            other => Err(json_type_name(other)),
        }
    }
}

impl fmt::Display for SpecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean => write!(f, "boolean"),
            Self::String => write!(f, "string"),
            Self::Function => write!(f, "function"),
            Self::List => write!(f, "array"),
            Self::Object => write!(f, "object"),
        }
    }
}

/// One entry in a transformer's spec list.
#[derive(Clone)]
pub enum TransformSpec {
    /// Map the whole document with a function.
    Function(TransformFn),
    /// Build a new object property by property.
    Object(ObjectSpec),
}

impl TransformSpec {
    /// Function spec from a synchronous closure.
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self::Function(transform_fn(f))
    }

    /// Function spec from an async closure.
    pub fn async_function<F, Fut>(f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        Self::Function(async_transform_fn(f))
    }

    /// Parse a declarative spec. Only objects can be expressed in JSON.
    pub fn from_json(value: &Value) -> TransformResult<Self> {
        ObjectSpec::from_json(value).map(Self::Object)
    }
}

impl From<ObjectSpec> for TransformSpec {
    fn from(spec: ObjectSpec) -> Self {
        Self::Object(spec)
    }
}

impl fmt::Debug for TransformSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(_) => f.write_str("Function(..)"),
            Self::Object(spec) => f.debug_tuple("Object").field(spec).finish(),
        }
    }
}

/// Spec for a single target property.
#[derive(Clone)]
pub enum PropertySpec {
    /// `true` copies the same-named source property, `false` excludes it.
    Include(bool),
    /// Dot-path into the source document.
    Path(String),
    /// Function receiving the whole current document.
    Function(TransformFn),
    /// Each spec evaluated against the same target, results kept in order.
    List(Vec<PropertySpec>),
    /// Source selection with optional inner transform and iteration.
    Nested(NestedSpec),
}

impl PropertySpec {
    /// Function spec from a synchronous closure.
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self::Function(transform_fn(f))
    }

    /// Which kind of spec this is.
    pub fn kind(&self) -> SpecKind {
        match self {
            Self::Include(_) => SpecKind::Boolean,
            Self::Path(_) => SpecKind::String,
            Self::Function(_) => SpecKind::Function,
            Self::List(_) => SpecKind::List,
            Self::Nested(_) => SpecKind::Object,
        }
    }

    /// Whether this spec removes its property from the output.
    pub fn is_excluded(&self) -> bool {
        matches!(self, Self::Include(false))
    }

    fn from_json(property: &str, value: &Value) -> TransformResult<Self> {
        let kind = SpecKind::of_json(value).map_err(|found| TransformError::InvalidSpec {
            property: property.to_string(),
            found,
        })?;

        match (kind, value) {
            (SpecKind::Boolean, Value::Bool(include)) => Ok(Self::Include(*include)),
            (SpecKind::String, Value::String(path)) => Ok(Self::Path(path.clone())),
            (SpecKind::List, Value::Array(items)) => items
                .iter()
                .map(|item| Self::from_json(property, item))
                .collect::<TransformResult<Vec<_>>>()
                .map(Self::List),
            (SpecKind::Object, Value::Object(options)) => {
                NestedSpec::from_json(property, options).map(Self::Nested)
            }
            _ => Err(TransformError::InvalidSpec {
                property: property.to_string(),
                found: json_type_name(value),
            }),
        }
    }
}

impl From<bool> for PropertySpec {
    fn from(include: bool) -> Self {
        Self::Include(include)
    }
}

impl From<&str> for PropertySpec {
    fn from(path: &str) -> Self {
        Self::Path(path.to_string())
    }
}

impl From<String> for PropertySpec {
    fn from(path: String) -> Self {
        Self::Path(path)
    }
}

impl From<NestedSpec> for PropertySpec {
    fn from(spec: NestedSpec) -> Self {
        Self::Nested(spec)
    }
}

impl From<Vec<PropertySpec>> for PropertySpec {
    fn from(specs: Vec<PropertySpec>) -> Self {
        Self::List(specs)
    }
}

impl fmt::Debug for PropertySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Include(include) => f.debug_tuple("Include").field(include).finish(),
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
            Self::List(specs) => f.debug_tuple("List").field(specs).finish(),
            Self::Nested(spec) => f.debug_tuple("Nested").field(spec).finish(),
        }
    }
}

/// `{ src, transform, iterate, max }` property spec.
#[derive(Debug, Clone, Default)]
pub struct NestedSpec {
    /// Source path; defaults to the target property name.
    pub src: Option<String>,
    /// Inner transform; defaults to identity.
    pub transform: Option<Box<TransformSpec>>,
    /// Treat the selected value as a sequence and transform each element.
    pub iterate: bool,
    /// Maximum number of elements when iterating; defaults to all.
    pub max: Option<usize>,
}

impl NestedSpec {
    /// Create an empty nested spec (copies the same-named property).
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a source path.
    pub fn src(mut self, path: impl Into<String>) -> Self {
        self.src = Some(path.into());
        self
    }

    /// Apply an inner transform to the selected value.
    pub fn transform(mut self, spec: impl Into<TransformSpec>) -> Self {
        self.transform = Some(Box::new(spec.into()));
        self
    }

    /// Iterate over the selected value.
    pub fn iterate(mut self) -> Self {
        self.iterate = true;
        self
    }

    /// Limit iteration to the first `max` elements.
    pub fn max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    fn from_json(property: &str, options: &Map<String, Value>) -> TransformResult<Self> {
        let invalid = |option: &'static str, reason: String| TransformError::InvalidOption {
            property: property.to_string(),
            option,
            reason,
        };

        let src = match options.get("src") {
            None | Some(Value::Null) => None,
            Some(Value::String(path)) => Some(path.clone()),
            Some(other) => {
                return Err(invalid(
                    "src",
                    format!("expected a string, found {}", json_type_name(other)),
                ))
            }
        };

        let transform = match options.get("transform") {
            None | Some(Value::Null) => None,
            Some(spec @ Value::Object(_)) => Some(Box::new(TransformSpec::from_json(spec)?)),
            Some(other) => {
                return Err(invalid(
                    "transform",
                    format!("expected an object, found {}", json_type_name(other)),
                ))
            }
        };

        let max = match options.get("max") {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => match n.as_u64().map(usize::try_from) {
                Some(Ok(max)) => Some(max),
                Some(Err(_)) => {
                    return Err(invalid("max", format!("{} does not fit in usize", n)))
                }
                None => {
                    return Err(invalid(
                        "max",
                        format!("expected a non-negative integer, found {}", n),
                    ))
                }
            },
            Some(other) => {
                return Err(invalid(
                    "max",
                    format!("expected a number, found {}", json_type_name(other)),
                ))
            }
        };

        Ok(Self {
            src,
            transform,
            iterate: options.get("iterate").is_some_and(is_truthy),
            max,
        })
    }
}

/// Object spec: target property names mapped to property specs, in order.
#[derive(Debug, Clone, Default)]
pub struct ObjectSpec {
    properties: Vec<(String, PropertySpec)>,
}

impl ObjectSpec {
    /// Create an empty object spec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the spec for a target property, replacing any earlier one in place.
    pub fn property(mut self, name: impl Into<String>, spec: impl Into<PropertySpec>) -> Self {
        let name = name.into();
        let spec = spec.into();

        match self.properties.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = spec,
            None => self.properties.push((name, spec)),
        }
        self
    }

    /// Copy a property as is.
    pub fn include(self, name: impl Into<String>) -> Self {
        self.property(name, PropertySpec::Include(true))
    }

    /// Exclude a property.
    pub fn exclude(self, name: impl Into<String>) -> Self {
        self.property(name, PropertySpec::Include(false))
    }

    /// Copy the value at a dot-path into a target property.
    pub fn path(self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.property(name, PropertySpec::Path(path.into()))
    }

    /// Compute a target property from the whole document.
    pub fn function<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.property(name, PropertySpec::function(f))
    }

    /// Target properties in declaration order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &PropertySpec)> {
        self.properties.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    /// Names of the properties marked for exclusion.
    pub fn excluded(&self) -> impl Iterator<Item = &str> {
        self.properties()
            .filter(|(_, spec)| spec.is_excluded())
            .map(|(name, _)| name)
    }

    /// Number of target properties, excluded ones included.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether the spec has no properties.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Parse and validate a declarative spec.
    ///
    /// Every property value must be a boolean, string, array or object; any
    /// other JSON type fails here, naming the property, rather than at
    /// transformation time.
    pub fn from_json(value: &Value) -> TransformResult<Self> {
        let Value::Object(map) = value else {
            return Err(TransformError::InvalidTopLevel {
                found: json_type_name(value),
            });
        };

        let properties = map
            .iter()
            .map(|(name, spec)| -> TransformResult<(String, PropertySpec)> {
                Ok((name.clone(), PropertySpec::from_json(name, spec)?))
            })
            .collect::<TransformResult<Vec<_>>>()?;

        Ok(Self { properties })
    }
}

/// Check a declarative spec without keeping the parsed result.
pub fn validate_spec(value: &Value) -> TransformResult<()> {
    ObjectSpec::from_json(value).map(|_| ())
}

/// JSON type name, matching the vocabulary of error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
