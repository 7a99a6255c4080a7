//! Aggregate and window-function accumulators for the fedq query engine.
//!
//! The executor owns one [`Aggregate`] per (group or partition, function)
//! pair, feeds it resolved input tuples in row order, and collects the
//! result at the group boundary:
//!
//! ```
//! use fedq_aggregate::{AggregateKind, AggregateSpec, EvalContext};
//! use fedq_types::{DataType, Value};
//!
//! let ctx = EvalContext::default();
//! let spec = AggregateSpec::new("total", AggregateKind::from_name("SUM")?);
//! let mut sum = spec.build(&[DataType::Integer], vec![0])?;
//! for v in [3, 4] {
//!     sum.add_input(&[Value::Integer(v)], &ctx)?;
//! }
//! assert_eq!(sum.get_result(&ctx)?, Value::Long(7));
//! # Ok::<(), fedq_result::Error>(())
//! ```

pub mod accumulator;
mod aggregate;
pub mod concat;
pub mod config;
pub mod context;
pub mod numeric;
pub mod simple;
pub mod stream;
pub mod udaf;
pub mod window;

use fedq_result::{Error, Result};
use fedq_types::{DataType, Value};

pub use accumulator::{Accumulator, ArgRow, StatefulAccumulator};
pub use aggregate::Aggregate;
pub use concat::{JsonArrayAgg, StringAgg, TextAgg, TextColumn, TextLineFormat, XmlAgg};
pub use config::AggregateConfig;
pub use context::{EvalContext, MemTupleBuffer, TupleBatch, TupleBuffer, WindowFrame};
pub use numeric::{Avg, StatsFunction, StatsKind, Sum};
pub use simple::{ArrayAgg, BooleanAgg, BooleanMode, ConstantFunction, Count, CountBig, Extreme, MinMax};
pub use stream::AggregateStream;
pub use udaf::{UdafBridge, UdafRegistry, UdafSignature, UserDefinedAggregate};
pub use window::{
    FirstLastMode, FirstLastValue, LeadLagFact, LeadLagValue, NthValue, Ntile, NtileFact,
    RankMode, RankingFunction,
};

pub type AggregateResult<T> = Result<T>;

/// Specification for an aggregate operation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregateSpec {
    pub alias: String,
    pub kind: AggregateKind,
    pub distinct: bool,
}

impl AggregateSpec {
    pub fn new(alias: impl Into<String>, kind: AggregateKind) -> Self {
        Self {
            alias: alias.into(),
            kind,
            distinct: false,
        }
    }

    pub fn with_distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    /// Create, wire and initialize an instance for arguments of
    /// `input_types` read from tuple positions `arg_indexes`.
    pub fn build(&self, input_types: &[DataType], arg_indexes: Vec<usize>) -> Result<Aggregate> {
        let result_type = self.kind.result_type(input_types)?;
        let mut aggregate = Aggregate::new(self);
        aggregate.set_arg_indexes(arg_indexes);
        aggregate.initialize(&result_type, input_types)?;
        Ok(aggregate)
    }
}

/// Built-in aggregate and window functions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AggregateKind {
    Count,
    CountBig,
    Sum,
    Avg,
    Min,
    Max,
    Stats(StatsKind),
    Boolean(BooleanMode),
    Constant,
    ArrayAgg,
    StringAgg,
    TextAgg(TextLineFormat),
    XmlAgg,
    JsonArrayAgg,
    Ranking(RankMode),
    Ntile,
    Lead,
    Lag,
    NthValue,
    FirstLast(FirstLastMode),
}

impl AggregateKind {
    /// Resolve a SQL function name, case-insensitively.
    ///
    /// `TEXTAGG` resolves with an empty line format that must be replaced
    /// before the instance is initialized.
    pub fn from_name(name: &str) -> Result<Self> {
        Ok(match name.to_ascii_uppercase().as_str() {
            "COUNT" => AggregateKind::Count,
            "COUNT_BIG" => AggregateKind::CountBig,
            "SUM" => AggregateKind::Sum,
            "AVG" => AggregateKind::Avg,
            "MIN" => AggregateKind::Min,
            "MAX" => AggregateKind::Max,
            "STDDEV_POP" => AggregateKind::Stats(StatsKind::StddevPop),
            "STDDEV_SAMP" => AggregateKind::Stats(StatsKind::StddevSamp),
            "VAR_POP" => AggregateKind::Stats(StatsKind::VarPop),
            "VAR_SAMP" => AggregateKind::Stats(StatsKind::VarSamp),
            "EVERY" | "BOOL_AND" => AggregateKind::Boolean(BooleanMode::Every),
            "SOME" | "ANY" | "BOOL_OR" => AggregateKind::Boolean(BooleanMode::Any),
            "ARRAY_AGG" => AggregateKind::ArrayAgg,
            "STRING_AGG" => AggregateKind::StringAgg,
            "TEXTAGG" => AggregateKind::TextAgg(TextLineFormat::default()),
            "XMLAGG" => AggregateKind::XmlAgg,
            "JSON_ARRAYAGG" => AggregateKind::JsonArrayAgg,
            "RANK" => AggregateKind::Ranking(RankMode::Rank),
            "DENSE_RANK" => AggregateKind::Ranking(RankMode::DenseRank),
            "ROW_NUMBER" => AggregateKind::Ranking(RankMode::RowNumber),
            "NTILE" => AggregateKind::Ntile,
            "LEAD" => AggregateKind::Lead,
            "LAG" => AggregateKind::Lag,
            "NTH_VALUE" => AggregateKind::NthValue,
            "FIRST_VALUE" => AggregateKind::FirstLast(FirstLastMode::First),
            "LAST_VALUE" => AggregateKind::FirstLast(FirstLastMode::Last),
            _ => {
                return Err(Error::InvalidArgumentError(format!(
                    "unknown aggregate function {name}"
                )))
            }
        })
    }

    /// Whether this is a window-only function.
    pub fn is_window_function(&self) -> bool {
        matches!(
            self,
            AggregateKind::Ranking(_)
                | AggregateKind::Ntile
                | AggregateKind::Lead
                | AggregateKind::Lag
                | AggregateKind::NthValue
                | AggregateKind::FirstLast(_)
        )
    }

    /// Declared result type for arguments of `input_types`.
    pub fn result_type(&self, input_types: &[DataType]) -> Result<DataType> {
        let input = accumulator::first_input_type(input_types);
        let numeric = |input: &DataType| -> Result<()> {
            if input.is_numeric() || *input == DataType::Null {
                Ok(())
            } else {
                Err(Error::type_coercion("numeric", input.name()))
            }
        };
        Ok(match self {
            AggregateKind::Count | AggregateKind::Ranking(_) => DataType::Integer,
            AggregateKind::CountBig => DataType::Long,
            AggregateKind::Sum => {
                numeric(&input)?;
                match input {
                    DataType::Long | DataType::BigInteger => DataType::BigInteger,
                    t if t.is_integral() || t == DataType::Null => DataType::Long,
                    t if t.is_floating() => DataType::Double,
                    _ => DataType::BigDecimal,
                }
            }
            AggregateKind::Avg => {
                numeric(&input)?;
                if input.is_arbitrary_precision() {
                    DataType::BigDecimal
                } else {
                    DataType::Double
                }
            }
            AggregateKind::Stats(_) => {
                numeric(&input)?;
                DataType::Double
            }
            AggregateKind::Min
            | AggregateKind::Max
            | AggregateKind::Constant
            | AggregateKind::NthValue
            | AggregateKind::FirstLast(_) => input,
            AggregateKind::Boolean(_) => DataType::Boolean,
            AggregateKind::ArrayAgg | AggregateKind::Lead | AggregateKind::Lag => {
                DataType::Array(Box::new(input))
            }
            AggregateKind::StringAgg if input.is_binary() => DataType::Blob,
            AggregateKind::StringAgg => DataType::Clob,
            AggregateKind::TextAgg(_) => DataType::Blob,
            AggregateKind::XmlAgg => DataType::Xml,
            AggregateKind::JsonArrayAgg => DataType::Json,
            AggregateKind::Ntile => DataType::Array(Box::new(DataType::Long)),
        })
    }

    /// A fresh accumulator implementing this function.
    pub fn accumulator(&self) -> AggregateAccumulator {
        match self {
            AggregateKind::Count => Count::new().into(),
            AggregateKind::CountBig => CountBig::new().into(),
            AggregateKind::Sum => Sum::new().into(),
            AggregateKind::Avg => Avg::new().into(),
            AggregateKind::Min => MinMax::new(Extreme::Min).into(),
            AggregateKind::Max => MinMax::new(Extreme::Max).into(),
            AggregateKind::Stats(kind) => StatsFunction::new(*kind).into(),
            AggregateKind::Boolean(mode) => BooleanAgg::new(*mode).into(),
            AggregateKind::Constant => ConstantFunction::new().into(),
            AggregateKind::ArrayAgg => ArrayAgg::new().into(),
            AggregateKind::StringAgg => StringAgg::new().into(),
            AggregateKind::TextAgg(format) => TextAgg::new(format.clone()).into(),
            AggregateKind::XmlAgg => XmlAgg::new().into(),
            AggregateKind::JsonArrayAgg => JsonArrayAgg::new().into(),
            AggregateKind::Ranking(mode) => RankingFunction::new(*mode).into(),
            AggregateKind::Ntile => Ntile::new().into(),
            AggregateKind::Lead | AggregateKind::Lag => LeadLagValue::new().into(),
            AggregateKind::NthValue => NthValue::new().into(),
            AggregateKind::FirstLast(mode) => FirstLastValue::new(*mode).into(),
        }
    }
}

macro_rules! accumulator_variants {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        /// Closed set of accumulator implementations.
        #[derive(Debug)]
        pub enum AggregateAccumulator {
            $($variant($ty),)*
        }

        $(
            impl From<$ty> for AggregateAccumulator {
                fn from(acc: $ty) -> Self {
                    AggregateAccumulator::$variant(acc)
                }
            }
        )*

        impl AggregateAccumulator {
            fn contract(&self) -> &dyn Accumulator {
                match self {
                    $(AggregateAccumulator::$variant(acc) => acc,)*
                }
            }

            fn contract_mut(&mut self) -> &mut dyn Accumulator {
                match self {
                    $(AggregateAccumulator::$variant(acc) => acc,)*
                }
            }
        }
    };
}

accumulator_variants! {
    Count(Count),
    CountBig(CountBig),
    Sum(Sum),
    Avg(Avg),
    Stats(StatsFunction),
    MinMax(MinMax),
    Boolean(BooleanAgg),
    Constant(ConstantFunction),
    ArrayAgg(ArrayAgg),
    StringAgg(StringAgg),
    TextAgg(TextAgg),
    XmlAgg(XmlAgg),
    JsonArrayAgg(JsonArrayAgg),
    Ranking(RankingFunction),
    Ntile(Ntile),
    LeadLag(LeadLagValue),
    NthValue(NthValue),
    FirstLast(FirstLastValue),
    UserDefined(UdafBridge),
}

impl AggregateAccumulator {
    /// State protocol view; `None` for accumulators without exportable state.
    pub fn as_stateful(&self) -> Option<&dyn StatefulAccumulator> {
        match self {
            AggregateAccumulator::Count(acc) => Some(acc),
            AggregateAccumulator::CountBig(acc) => Some(acc),
            AggregateAccumulator::Sum(acc) => Some(acc),
            AggregateAccumulator::Avg(acc) => Some(acc),
            AggregateAccumulator::Stats(acc) => Some(acc),
            AggregateAccumulator::MinMax(acc) => Some(acc),
            AggregateAccumulator::Boolean(acc) => Some(acc),
            AggregateAccumulator::Constant(acc) => Some(acc),
            AggregateAccumulator::ArrayAgg(acc) => Some(acc),
            AggregateAccumulator::FirstLast(acc) => Some(acc),
            AggregateAccumulator::UserDefined(acc) => Some(acc),
            _ => None,
        }
    }

    pub fn as_stateful_mut(&mut self) -> Option<&mut dyn StatefulAccumulator> {
        match self {
            AggregateAccumulator::Count(acc) => Some(acc),
            AggregateAccumulator::CountBig(acc) => Some(acc),
            AggregateAccumulator::Sum(acc) => Some(acc),
            AggregateAccumulator::Avg(acc) => Some(acc),
            AggregateAccumulator::Stats(acc) => Some(acc),
            AggregateAccumulator::MinMax(acc) => Some(acc),
            AggregateAccumulator::Boolean(acc) => Some(acc),
            AggregateAccumulator::Constant(acc) => Some(acc),
            AggregateAccumulator::ArrayAgg(acc) => Some(acc),
            AggregateAccumulator::FirstLast(acc) => Some(acc),
            AggregateAccumulator::UserDefined(acc) => Some(acc),
            _ => None,
        }
    }
}

impl Accumulator for AggregateAccumulator {
    fn initialize(&mut self, result_type: &DataType, input_types: &[DataType]) -> Result<()> {
        self.contract_mut().initialize(result_type, input_types)
    }

    fn respects_null(&self) -> bool {
        self.contract().respects_null()
    }

    fn add_input_direct(&mut self, args: &ArgRow<'_>, ctx: &EvalContext) -> Result<()> {
        self.contract_mut().add_input_direct(args, ctx)
    }

    fn get_result(&mut self, ctx: &EvalContext) -> Result<Value> {
        self.contract_mut().get_result(ctx)
    }

    fn reset(&mut self) {
        self.contract_mut().reset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_resolve_case_insensitively() {
        assert_eq!(AggregateKind::from_name("count").unwrap(), AggregateKind::Count);
        assert_eq!(
            AggregateKind::from_name("Dense_Rank").unwrap(),
            AggregateKind::Ranking(RankMode::DenseRank)
        );
        assert!(matches!(
            AggregateKind::from_name("median"),
            Err(Error::InvalidArgumentError(_))
        ));
    }

    #[test]
    fn sum_result_types_follow_input_width() {
        let sum = AggregateKind::Sum;
        assert_eq!(sum.result_type(&[DataType::Short]).unwrap(), DataType::Long);
        assert_eq!(sum.result_type(&[DataType::Long]).unwrap(), DataType::BigInteger);
        assert_eq!(sum.result_type(&[DataType::Float]).unwrap(), DataType::Double);
        assert_eq!(
            sum.result_type(&[DataType::BigDecimal]).unwrap(),
            DataType::BigDecimal
        );
        assert!(sum.result_type(&[DataType::String]).is_err());
    }

    #[test]
    fn stateless_variants_have_no_state_view() {
        assert!(AggregateKind::XmlAgg.accumulator().as_stateful().is_none());
        assert!(AggregateKind::Ntile.accumulator().as_stateful().is_none());
        assert!(AggregateKind::Avg.accumulator().as_stateful().is_some());
    }
}
