use fedq_result::Result;
use fedq_types::{DataType, Value};

use super::{check_payload, write_payload, ConcatSink};
use crate::accumulator::{Accumulator, ArgRow};
use crate::context::EvalContext;

/// `STRING_AGG(value, delimiter)`.
///
/// The delimiter of the current row is written before every value except
/// the first. Binary result types produce a BLOB, everything else a CLOB.
#[derive(Debug, Default)]
pub struct StringAgg {
    sink: ConcatSink,
    binary: bool,
}

impl StringAgg {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Accumulator for StringAgg {
    fn initialize(&mut self, result_type: &DataType, _input_types: &[DataType]) -> Result<()> {
        self.binary = result_type.is_binary();
        Ok(())
    }

    fn add_input_direct(&mut self, args: &ArgRow<'_>, ctx: &EvalContext) -> Result<()> {
        let value = args.get(0)?;
        check_payload(value)?;
        let delimiter = match args.get_opt(1)? {
            Some(delimiter) if self.sink.rows_written() > 0 => Some(delimiter),
            _ => None,
        };
        if let Some(delimiter) = delimiter {
            check_payload(delimiter)?;
        }
        let out = self.sink.writer(ctx)?;
        if let Some(delimiter) = delimiter {
            write_payload(out, delimiter)?;
        }
        write_payload(out, value)?;
        self.sink.row_written();
        Ok(())
    }

    fn get_result(&mut self, _ctx: &EvalContext) -> Result<Value> {
        Ok(match self.sink.finish(b"")? {
            None => Value::Null,
            Some(lob) if self.binary => Value::Blob(lob),
            Some(lob) => Value::Clob(lob),
        })
    }

    fn reset(&mut self) {
        self.sink.release();
    }
}
