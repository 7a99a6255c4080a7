use std::io::{self, BufRead, BufReader, Read, Write};

use fedq_result::{Error, Result};
use fedq_types::Value;

use super::ConcatSink;
use crate::accumulator::{Accumulator, ArgRow};
use crate::context::EvalContext;

/// `XMLAGG`: concatenates XML fragments in arrival order.
///
/// A leading `<?xml ...?>` declaration is stripped from every fragment so
/// the result is a well-formed content sequence.
#[derive(Debug, Default)]
pub struct XmlAgg {
    sink: ConcatSink,
}

impl XmlAgg {
    pub fn new() -> Self {
        Self::default()
    }
}

const DECLARATION_START: &[u8] = b"<?xml";

/// Consume a leading XML declaration, if present.
fn skip_declaration<R: BufRead>(reader: &mut R) -> io::Result<()> {
    let head = reader.fill_buf()?;
    let is_declaration = head.starts_with(DECLARATION_START)
        && head
            .get(DECLARATION_START.len())
            .is_some_and(|b| b.is_ascii_whitespace() || *b == b'?');
    if !is_declaration {
        return Ok(());
    }
    let mut discarded = Vec::new();
    loop {
        discarded.clear();
        if reader.read_until(b'>', &mut discarded)? == 0 || discarded.ends_with(b"?>") {
            return Ok(());
        }
    }
}

fn copy_fragment<R: Read, W: Write + ?Sized>(reader: R, out: &mut W) -> Result<()> {
    let mut reader = BufReader::new(reader);
    skip_declaration(&mut reader)?;
    io::copy(&mut reader, out)?;
    Ok(())
}

impl Accumulator for XmlAgg {
    fn add_input_direct(&mut self, args: &ArgRow<'_>, ctx: &EvalContext) -> Result<()> {
        let value = args.get(0)?;
        match value {
            Value::Xml(lob) | Value::Clob(lob) => {
                copy_fragment(lob.reader()?, self.sink.writer(ctx)?)?
            }
            Value::String(s) => copy_fragment(s.as_bytes(), self.sink.writer(ctx)?)?,
            other => return Err(Error::type_coercion("xml", other.type_name())),
        }
        self.sink.row_written();
        Ok(())
    }

    fn get_result(&mut self, _ctx: &EvalContext) -> Result<Value> {
        Ok(self.sink.finish(b"")?.map_or(Value::Null, Value::Xml))
    }

    fn reset(&mut self) {
        self.sink.release();
    }
}
