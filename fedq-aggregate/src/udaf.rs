//! Bridge for user-defined aggregate functions.
//!
//! A UDAF implements [`UserDefinedAggregate`] and is registered with a
//! [`UdafSignature`] and a factory in a [`UdafRegistry`]. Each aggregate
//! instance gets its own object wrapped in a [`UdafBridge`], which adapts it
//! to the [`Accumulator`] contract.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use fedq_result::{Error, Result};
use fedq_types::{DataType, Value};

use crate::accumulator::{Accumulator, ArgRow, StatefulAccumulator};
use crate::context::EvalContext;
use crate::Aggregate;

/// Callbacks a user-defined aggregate provides.
///
/// `accept` receives the positional arguments of one row, preceded by the
/// evaluation context when the signature asks for it.
pub trait UserDefinedAggregate: Send + fmt::Debug {
    fn reset(&mut self);

    fn accept(&mut self, ctx: Option<&EvalContext>, args: &[Value]) -> Result<()>;

    fn compute_result(&mut self, ctx: &EvalContext) -> Result<Value>;

    /// Append partial state. Aggregates that cannot be split keep the default.
    fn get_state(&self, _state: &mut Vec<Value>) {}

    fn set_state(&mut self, _state: &[Value], index: usize) -> Result<usize> {
        Ok(index)
    }

    fn state_types(&self) -> Vec<DataType> {
        Vec::new()
    }
}

/// Declared shape of a user-defined aggregate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UdafSignature {
    pub name: String,
    pub arg_types: Vec<DataType>,
    pub return_type: DataType,
    /// Rows with a null argument are skipped instead of passed through.
    pub null_on_null: bool,
    /// `accept` is handed the evaluation context.
    pub uses_context: bool,
}

impl UdafSignature {
    pub fn new(name: impl Into<String>, arg_types: Vec<DataType>, return_type: DataType) -> Self {
        Self {
            name: name.into(),
            arg_types,
            return_type,
            null_on_null: true,
            uses_context: false,
        }
    }

    pub fn with_null_on_null(mut self, null_on_null: bool) -> Self {
        self.null_on_null = null_on_null;
        self
    }

    pub fn with_context(mut self, uses_context: bool) -> Self {
        self.uses_context = uses_context;
        self
    }
}

/// Adapts a [`UserDefinedAggregate`] to the accumulator contract.
#[derive(Debug)]
pub struct UdafBridge {
    signature: Arc<UdafSignature>,
    inner: Box<dyn UserDefinedAggregate>,
    args: Vec<Value>,
}

impl UdafBridge {
    pub fn new(signature: Arc<UdafSignature>, inner: Box<dyn UserDefinedAggregate>) -> Self {
        let args = Vec::with_capacity(signature.arg_types.len());
        Self {
            signature,
            inner,
            args,
        }
    }

    pub fn signature(&self) -> &UdafSignature {
        &self.signature
    }
}

impl Accumulator for UdafBridge {
    fn respects_null(&self) -> bool {
        !self.signature.null_on_null
    }

    fn add_input_direct(&mut self, args: &ArgRow<'_>, ctx: &EvalContext) -> Result<()> {
        let expected = self.signature.arg_types.len();
        if args.len() != expected {
            return Err(Error::Internal(format!(
                "{} takes {expected} arguments, {} bound",
                self.signature.name,
                args.len()
            )));
        }
        self.args.clear();
        for value in args.iter() {
            self.args.push(value?.clone());
        }
        let ctx = self.signature.uses_context.then_some(ctx);
        self.inner.accept(ctx, &self.args)
    }

    fn get_result(&mut self, ctx: &EvalContext) -> Result<Value> {
        self.inner.compute_result(ctx)
    }

    fn reset(&mut self) {
        self.args.clear();
        self.inner.reset();
    }
}

impl StatefulAccumulator for UdafBridge {
    fn get_state(&self, state: &mut Vec<Value>) {
        self.inner.get_state(state);
    }

    fn set_state(&mut self, state: &[Value], index: usize) -> Result<usize> {
        self.inner.set_state(state, index)
    }

    fn state_types(&self) -> Vec<DataType> {
        self.inner.state_types()
    }
}

type UdafFactory = Arc<dyn Fn() -> Box<dyn UserDefinedAggregate> + Send + Sync>;

struct RegisteredUdaf {
    signature: Arc<UdafSignature>,
    factory: UdafFactory,
}

/// Case-insensitive catalog of user-defined aggregates.
#[derive(Default)]
pub struct UdafRegistry {
    functions: FxHashMap<String, RegisteredUdaf>,
}

impl fmt::Debug for UdafRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.functions.keys()).finish()
    }
}

impl UdafRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, signature: UdafSignature, factory: F) -> Result<()>
    where
        F: Fn() -> Box<dyn UserDefinedAggregate> + Send + Sync + 'static,
    {
        let key = signature.name.to_ascii_uppercase();
        if self.functions.contains_key(&key) {
            return Err(Error::InvalidArgumentError(format!(
                "aggregate {} is already registered",
                signature.name
            )));
        }
        tracing::debug!("registering user-defined aggregate {}", signature.name);
        self.functions.insert(
            key,
            RegisteredUdaf {
                signature: Arc::new(signature),
                factory: Arc::new(factory),
            },
        );
        Ok(())
    }

    pub fn signature(&self, name: &str) -> Option<&UdafSignature> {
        self.functions
            .get(&name.to_ascii_uppercase())
            .map(|f| f.signature.as_ref())
    }

    /// A fresh accumulator for `name`.
    pub fn create(&self, name: &str) -> Result<UdafBridge> {
        let registered = self
            .functions
            .get(&name.to_ascii_uppercase())
            .ok_or_else(|| {
                Error::InvalidArgumentError(format!("unknown aggregate function {name}"))
            })?;
        Ok(UdafBridge::new(
            Arc::clone(&registered.signature),
            (registered.factory)(),
        ))
    }

    /// A fresh aggregate instance for `name` output as `alias`.
    pub fn create_aggregate(&self, name: &str, alias: impl Into<String>) -> Result<Aggregate> {
        Ok(Aggregate::from_accumulator(
            alias,
            self.create(name)?.into(),
        ))
    }
}
