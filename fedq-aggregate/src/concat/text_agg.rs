use std::io::Write;
use std::sync::Arc;

use arrow::array::{ArrayRef, RecordBatch, StringArray};
use arrow::csv::WriterBuilder;
use arrow::datatypes::{DataType as ArrowDataType, Field, Schema, SchemaRef};
use fedq_result::{Error, Result};
use fedq_types::{DataType, Value};

use super::ConcatSink;
use crate::accumulator::{Accumulator, ArgRow};
use crate::context::EvalContext;

/// One output column of a `TEXTAGG` line.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TextColumn {
    pub name: String,
    pub width: Option<usize>,
}

impl TextColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            width: None,
        }
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }
}

/// Line layout for `TEXTAGG`.
///
/// Either every column has a width (fixed-width lines, no delimiter or
/// quoting) or none does (delimited lines written through the Arrow CSV
/// writer, which quotes a field only when it contains the delimiter, the
/// quote or a line break).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TextLineFormat {
    pub columns: Vec<TextColumn>,
    pub delimiter: char,
    pub quote: char,
    pub header: bool,
    pub line_ending: String,
}

impl Default for TextLineFormat {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            delimiter: ',',
            quote: '"',
            header: false,
            line_ending: "\n".to_string(),
        }
    }
}

/// Single-byte form of a CSV control character.
fn ascii_byte(c: char, what: &str) -> Result<u8> {
    u8::try_from(c)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| Error::InvalidArgumentError(format!("TEXTAGG {what} {c:?} is not ASCII")))
}

impl TextLineFormat {
    pub fn new(columns: Vec<TextColumn>) -> Self {
        Self {
            columns,
            ..Self::default()
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_quote(mut self, quote: char) -> Self {
        self.quote = quote;
        self
    }

    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    pub fn with_line_ending(mut self, line_ending: impl Into<String>) -> Self {
        self.line_ending = line_ending.into();
        self
    }

    pub fn is_fixed_width(&self) -> bool {
        !self.columns.is_empty() && self.columns.iter().all(|c| c.width.is_some())
    }

    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(Error::InvalidArgumentError(
                "TEXTAGG requires at least one column".into(),
            ));
        }
        let widths = self.columns.iter().filter(|c| c.width.is_some()).count();
        if widths != 0 && widths != self.columns.len() {
            return Err(Error::InvalidArgumentError(
                "TEXTAGG columns must all have widths or none".into(),
            ));
        }
        ascii_byte(self.delimiter, "delimiter")?;
        ascii_byte(self.quote, "quote")?;
        if self.quote == self.delimiter {
            return Err(Error::InvalidArgumentError(format!(
                "TEXTAGG delimiter and quote are both {:?}",
                self.delimiter
            )));
        }
        if self.line_ending.is_empty() {
            return Err(Error::InvalidArgumentError(
                "TEXTAGG line ending must not be empty".into(),
            ));
        }
        Ok(())
    }

    fn schema(&self) -> SchemaRef {
        let fields: Vec<Field> = self
            .columns
            .iter()
            .map(|c| Field::new(c.name.as_str(), ArrowDataType::Utf8, true))
            .collect();
        Arc::new(Schema::new(fields))
    }

    fn csv_builder(&self) -> Result<WriterBuilder> {
        Ok(WriterBuilder::new()
            .with_delimiter(ascii_byte(self.delimiter, "delimiter")?)
            .with_quote(ascii_byte(self.quote, "quote")?))
    }

    /// Run `batch` through the CSV writer and swap its `\n` record
    /// terminator for the configured line ending.
    fn write_csv(&self, builder: WriterBuilder, batch: &RecordBatch) -> Result<String> {
        let mut writer = builder.build(Vec::new());
        writer.write(batch)?;
        let mut out = writer.into_inner();
        if out.last() == Some(&b'\n') {
            out.pop();
        }
        out.extend_from_slice(self.line_ending.as_bytes());
        String::from_utf8(out).map_err(Error::expr_cast)
    }

    /// Render one line; `None` fields are left empty and unquoted.
    pub fn encode_line(&self, fields: &[Option<String>]) -> Result<String> {
        if fields.len() != self.columns.len() {
            return Err(Error::Internal(format!(
                "TEXTAGG line has {} fields for {} columns",
                fields.len(),
                self.columns.len()
            )));
        }
        if self.is_fixed_width() {
            return Ok(self.encode_fixed_width(fields));
        }
        let arrays: Vec<ArrayRef> = fields
            .iter()
            .map(|field| Arc::new(StringArray::from(vec![field.as_deref()])) as ArrayRef)
            .collect();
        let batch = RecordBatch::try_new(self.schema(), arrays)?;
        self.write_csv(self.csv_builder()?.with_header(false), &batch)
    }

    /// The header line naming every column.
    pub fn encode_header(&self) -> Result<String> {
        if self.is_fixed_width() {
            let names: Vec<Option<String>> =
                self.columns.iter().map(|c| Some(c.name.clone())).collect();
            return Ok(self.encode_fixed_width(&names));
        }
        let batch = RecordBatch::new_empty(self.schema());
        self.write_csv(self.csv_builder()?.with_header(true), &batch)
    }

    fn encode_fixed_width(&self, fields: &[Option<String>]) -> String {
        let mut line = String::new();
        for (column, field) in self.columns.iter().zip(fields) {
            let width = column.width.unwrap_or(0);
            let text = field.as_deref().unwrap_or("");
            let taken: String = text.chars().take(width).collect();
            let pad = width - taken.chars().count();
            line.push_str(&taken);
            line.extend(std::iter::repeat(' ').take(pad));
        }
        line.push_str(&self.line_ending);
        line
    }
}

/// `TEXTAGG`: one text line per row, optionally preceded by a header line,
/// as a UTF-8 BLOB.
#[derive(Debug, Default)]
pub struct TextAgg {
    format: TextLineFormat,
    sink: ConcatSink,
}

impl TextAgg {
    pub fn new(format: TextLineFormat) -> Self {
        Self {
            format,
            sink: ConcatSink::default(),
        }
    }

    pub fn format(&self) -> &TextLineFormat {
        &self.format
    }
}

impl Accumulator for TextAgg {
    fn initialize(&mut self, _result_type: &DataType, input_types: &[DataType]) -> Result<()> {
        self.format.validate()?;
        if !input_types.is_empty() && input_types.len() != self.format.columns.len() {
            return Err(Error::InvalidArgumentError(format!(
                "TEXTAGG has {} columns but {} arguments",
                self.format.columns.len(),
                input_types.len()
            )));
        }
        Ok(())
    }

    fn respects_null(&self) -> bool {
        true
    }

    fn add_input_direct(&mut self, args: &ArgRow<'_>, ctx: &EvalContext) -> Result<()> {
        if args.len() != self.format.columns.len() {
            return Err(Error::Internal(format!(
                "TEXTAGG row has {} arguments for {} columns",
                args.len(),
                self.format.columns.len()
            )));
        }
        let fields = args
            .iter()
            .map(|value| {
                let value = value?;
                if value.is_null() {
                    Ok(None)
                } else {
                    value.to_text().map(Some)
                }
            })
            .collect::<Result<Vec<_>>>()?;
        let header = if self.format.header && self.sink.rows_written() == 0 {
            Some(self.format.encode_header()?)
        } else {
            None
        };
        let line = self.format.encode_line(&fields)?;
        let out = self.sink.writer(ctx)?;
        if let Some(header) = header {
            out.write_all(header.as_bytes())?;
        }
        out.write_all(line.as_bytes())?;
        self.sink.row_written();
        Ok(())
    }

    fn get_result(&mut self, _ctx: &EvalContext) -> Result<Value> {
        Ok(self.sink.finish(b"")?.map_or(Value::Null, Value::Blob))
    }

    fn reset(&mut self) {
        self.sink.release();
    }
}
