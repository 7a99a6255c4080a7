//! Concatenating aggregates that stage output in a spill-capable sink.
//!
//! Each accumulator owns at most one open [`SpillBuffer`]. The first
//! `get_result` seals it into a [`LobHandle`] that later calls hand back
//! unchanged; `reset` drops both, which releases any temp file the group
//! produced once readers let go of the handle.

mod json_array_agg;
mod string_agg;
mod text_agg;
mod xml_agg;

use std::io::{self, Write};

use fedq_result::{Error, Result};
use fedq_storage::{LobHandle, SpillBuffer};
use fedq_types::Value;

use crate::context::EvalContext;

pub use json_array_agg::JsonArrayAgg;
pub use string_agg::StringAgg;
pub use text_agg::{TextAgg, TextColumn, TextLineFormat};
pub use xml_agg::XmlAgg;

/// Lazily opened sink plus the cached sealed result.
///
/// Callers validate a row before asking for the writer and report it with
/// [`ConcatSink::row_written`] once all of its bytes are in, so a rejected
/// row leaves nothing behind.
#[derive(Debug, Default)]
pub(crate) struct ConcatSink {
    sink: Option<SpillBuffer>,
    result: Option<LobHandle>,
    rows: u64,
}

impl ConcatSink {
    /// Rows completely written since the last release.
    pub(crate) fn rows_written(&self) -> u64 {
        self.rows
    }

    pub(crate) fn row_written(&mut self) {
        self.rows += 1;
    }

    pub(crate) fn writer(&mut self, ctx: &EvalContext) -> Result<&mut SpillBuffer> {
        if self.result.is_some() {
            return Err(Error::Internal(
                "input added after the result was produced; reset first".into(),
            ));
        }
        Ok(self.sink.get_or_insert_with(|| ctx.store().create_sink()))
    }

    /// Seal the sink after writing `suffix`, or return the cached handle.
    /// `None` when no row was written.
    pub(crate) fn finish(&mut self, suffix: &[u8]) -> Result<Option<LobHandle>> {
        if let Some(result) = &self.result {
            return Ok(Some(result.clone()));
        }
        if self.rows == 0 {
            self.sink = None;
            return Ok(None);
        }
        let Some(mut sink) = self.sink.take() else {
            return Err(Error::Internal(format!(
                "{} rows recorded without an open sink",
                self.rows
            )));
        };
        sink.write_all(suffix)?;
        let handle = sink.finish()?;
        self.result = Some(handle.clone());
        Ok(Some(handle))
    }

    pub(crate) fn release(&mut self) {
        self.rows = 0;
        let open = self.sink.take();
        let sealed = self.result.take();
        if let Some(sink) = &open {
            tracing::trace!("discarding open concatenation sink of {} bytes", sink.len());
        }
        if let Some(handle) = &sealed {
            tracing::trace!("releasing concatenation result of {} bytes", handle.len());
        }
    }
}

/// Reject values [`write_payload`] cannot copy, before anything is written.
pub(crate) fn check_payload(value: &Value) -> Result<()> {
    match value {
        Value::String(_)
        | Value::Char(_)
        | Value::Varbinary(_)
        | Value::Clob(_)
        | Value::Blob(_)
        | Value::Xml(_)
        | Value::Json(_) => Ok(()),
        other => Err(Error::type_coercion(
            "string, binary or large object",
            other.type_name(),
        )),
    }
}

/// Copy a character or binary payload into `out` without re-encoding.
pub(crate) fn write_payload<W: Write + ?Sized>(out: &mut W, value: &Value) -> Result<()> {
    match value {
        Value::String(s) => out.write_all(s.as_bytes())?,
        Value::Char(c) => {
            let mut buf = [0u8; 4];
            out.write_all(c.encode_utf8(&mut buf).as_bytes())?;
        }
        Value::Varbinary(bytes) => out.write_all(bytes)?,
        Value::Clob(lob) | Value::Blob(lob) | Value::Xml(lob) | Value::Json(lob) => {
            io::copy(&mut lob.reader()?, out)?;
        }
        other => check_payload(other)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn payloads_copy_verbatim() {
        let mut out = Vec::new();
        write_payload(&mut out, &Value::from("ab")).unwrap();
        write_payload(&mut out, &Value::Char('é')).unwrap();
        write_payload(&mut out, &Value::Varbinary(Bytes::from_static(b"\x00\x01"))).unwrap();
        write_payload(&mut out, &Value::Clob(LobHandle::from_string("z"))).unwrap();
        assert_eq!(out, "abé\u{0}\u{1}z".as_bytes());
        assert!(write_payload(&mut out, &Value::Integer(1)).is_err());
    }

    #[test]
    fn finish_caches_and_release_clears() {
        let ctx = EvalContext::default();
        let mut sink = ConcatSink::default();
        assert_eq!(sink.finish(b"").unwrap(), None);
        sink.writer(&ctx).unwrap().write_all(b"x").unwrap();
        sink.row_written();
        let first = sink.finish(b"!").unwrap().unwrap();
        let again = sink.finish(b"!").unwrap().unwrap();
        assert_eq!(first.to_bytes().unwrap(), Bytes::from_static(b"x!"));
        assert_eq!(first, again);
        assert!(sink.writer(&ctx).is_err());
        sink.release();
        assert_eq!(sink.rows_written(), 0);
        assert_eq!(sink.finish(b"").unwrap(), None);
    }

    #[test]
    fn opened_sink_without_rows_finishes_empty() {
        let ctx = EvalContext::default();
        let mut sink = ConcatSink::default();
        sink.writer(&ctx).unwrap();
        assert_eq!(sink.finish(b"]").unwrap(), None);
        assert!(check_payload(&Value::Integer(1)).is_err());
    }
}
