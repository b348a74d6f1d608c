//! Module: db::executor::join
//! Responsibility: lookup join of an input key stream against a table index.
//! Does not own: key encoding, row decoding, output shaping.
//! Boundary: pulls key rows from a `RowSource`, reads through `KvLookup`,
//! pushes table rows into a `RowSink`.


use crate::{
    config::ExecConfig,
    db::{
        executor::{
            Processor,
            drain::drain_and_forward_metadata,
            post::{PostProcessSpec, ProcOutputHelper},
            stream::{ConsumerStatus, ProducerMetadata, RowSink, RowSource, StreamItem},
        },
        row::{EncDatum, Row},
        store::{
            IndexDescriptor, KeySpan, KvEntry, KvLookup, LookupRequest, RangeInfo, RowDecoder,
            TableDescriptor, lookup_prefix, primary_key_from_secondary,
        },
    },
    error::InternalError,
    obs::{
        MetricsEvent, OperatorKind,
        sink::{Span, record},
    },
    types::ColumnType,
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

const OPERATOR: OperatorKind = OperatorKind::JoinReader;

///
/// JoinType
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum JoinType {
    /// Input rows without a stored match produce nothing.
    #[default]
    Inner,

    /// Input rows without a stored match produce one row holding the
    /// lookup key and NULL everywhere else.
    LeftOuter,
}

///
/// JoinReaderSpec
///
/// Lookup target for a join reader. `index_id = None` reads the primary
/// index; `lookup_columns = None` uses every input column in order.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct JoinReaderSpec {
    pub table: TableDescriptor,
    #[serde(default)]
    pub index_id: Option<u32>,
    #[serde(default)]
    pub lookup_columns: Option<Vec<usize>>,
    #[serde(default)]
    pub join_type: JoinType,
}

impl JoinReaderSpec {
    #[must_use]
    pub const fn new(table: TableDescriptor) -> Self {
        Self {
            table,
            index_id: None,
            lookup_columns: None,
            join_type: JoinType::Inner,
        }
    }
}

///
/// ReadBatch
///

struct ReadBatch {
    rows: Vec<Row>,
    meta: Option<ProducerMetadata>,
    exhausted: bool,
}

///
/// JoinReader
///
/// Turns each input row into a key prefix on the target index, looks the
/// prefixes up in batches and emits the matching table rows in input
/// order, then lookup order.
///

pub struct JoinReader<I, O, L> {
    config: ExecConfig,
    index: IndexDescriptor,
    lookup_columns: Vec<usize>,
    join_type: JoinType,
    decoder: RowDecoder,
    helper: ProcOutputHelper,
    input: I,
    store: L,
    output: O,
    ranges: Vec<RangeInfo>,
    finished: bool,
}

impl<I, O, L> JoinReader<I, O, L>
where
    I: RowSource,
    O: RowSink,
    L: KvLookup,
{
    pub fn new(
        config: ExecConfig,
        spec: JoinReaderSpec,
        post: &PostProcessSpec,
        input: I,
        store: L,
        output: O,
    ) -> Result<Self, InternalError> {
        config.validate()?;
        spec.table.validate()?;

        let index = spec.table.index(spec.index_id)?.clone();
        let lookup_columns = spec
            .lookup_columns
            .unwrap_or_else(|| (0..input.types().len()).collect());
        check_lookup_columns(&spec.table, &index, &lookup_columns, input.types())?;

        let decoder = RowDecoder::new(spec.table);
        let helper = ProcOutputHelper::new(post, decoder.types(), OPERATOR)?;

        Ok(Self {
            config,
            index,
            lookup_columns,
            join_type: spec.join_type,
            decoder,
            helper,
            input,
            store,
            output,
            ranges: Vec::new(),
            finished: false,
        })
    }

    /// Column types of emitted rows, after projection.
    #[must_use]
    pub fn output_types(&self) -> &[ColumnType] {
        self.helper.output_types()
    }

    fn pump(&mut self) -> ConsumerStatus {
        loop {
            let batch = self.read_batch();

            let mut status = ConsumerStatus::NeedMoreRows;
            if !batch.rows.is_empty() {
                status = match self.process_batch(batch.rows) {
                    Ok(status) => status,
                    Err(err) => self.push_error(err),
                };
            }

            if status != ConsumerStatus::ConsumerClosed
                && let Some(meta) = batch.meta
            {
                status = status.max(self.forward_metadata(meta));
            }

            match status {
                ConsumerStatus::NeedMoreRows => {
                    if batch.exhausted {
                        return status;
                    }
                }
                ConsumerStatus::DrainRequested => {
                    if batch.exhausted {
                        return status;
                    }
                    debug!("{}: draining input", OPERATOR.label());
                    return drain_and_forward_metadata(OPERATOR, &mut self.input, &mut self.output);
                }
                ConsumerStatus::ConsumerClosed => {
                    debug!("{}: consumer closed", OPERATOR.label());
                    self.input.consumer_closed();
                    return status;
                }
            }
        }
    }

    // Pull input rows until the batch is full, metadata arrives, or the
    // input ends.
    fn read_batch(&mut self) -> ReadBatch {
        let batch_size = self.config.lookup_batch_size;
        let mut batch = ReadBatch {
            rows: Vec::with_capacity(batch_size),
            meta: None,
            exhausted: false,
        };

        while batch.rows.len() < batch_size {
            match self.input.next() {
                None => {
                    batch.exhausted = true;
                    break;
                }
                Some(StreamItem::Row(row)) => batch.rows.push(row),
                Some(StreamItem::Meta(meta)) => {
                    batch.meta = Some(meta);
                    break;
                }
            }
        }

        if !batch.rows.is_empty() {
            record(MetricsEvent::RowsRead {
                operator: OPERATOR,
                rows: u64::try_from(batch.rows.len()).unwrap_or(u64::MAX),
            });
        }

        batch
    }

    fn process_batch(&mut self, rows: Vec<Row>) -> Result<ConsumerStatus, InternalError> {
        let prefixes = rows
            .iter()
            .map(|row| self.lookup_prefix(row))
            .collect::<Result<Vec<_>, _>>()?;

        let spans = prefixes
            .iter()
            .flatten()
            .map(|prefix| KeySpan::prefix(prefix.clone()))
            .collect::<Vec<_>>();
        let mut results = self.lookup(spans)?;
        if !self.decoder.table().is_primary(&self.index) {
            results = self.fetch_primary_entries(results)?;
        }

        // realign results with inputs; NULL keys had no span
        let mut results = results.into_iter();
        let matches = prefixes
            .iter()
            .map(|prefix| match prefix {
                Some(_) => results.next().unwrap_or_default(),
                None => Vec::new(),
            })
            .collect::<Vec<_>>();

        for (input_row, entries) in rows.iter().zip(matches) {
            if entries.is_empty() {
                if self.join_type == JoinType::LeftOuter {
                    let row = self.outer_row(input_row);
                    let status = self.helper.emit_row(row, &mut self.output)?;
                    if status != ConsumerStatus::NeedMoreRows {
                        return Ok(status);
                    }
                }
                continue;
            }

            for entry in &entries {
                let row = self.decoder.decode(entry)?;
                let status = self.helper.emit_row(row, &mut self.output)?;
                if status != ConsumerStatus::NeedMoreRows {
                    return Ok(status);
                }
            }
        }

        Ok(ConsumerStatus::NeedMoreRows)
    }

    fn lookup_prefix(&self, row: &Row) -> Result<Option<Vec<u8>>, InternalError> {
        let key = self
            .lookup_columns
            .iter()
            .map(|&col| &row[col])
            .collect::<Vec<&EncDatum>>();

        lookup_prefix(self.decoder.table(), &self.index, &key)
    }

    // One batched read; results line up with `spans`.
    fn lookup(&mut self, spans: Vec<KeySpan>) -> Result<Vec<Vec<KvEntry>>, InternalError> {
        if spans.is_empty() {
            return Ok(Vec::new());
        }

        let span_count = spans.len();
        let response = self.store.lookup(&LookupRequest { spans })?;
        if response.results.len() != span_count {
            return Err(InternalError::executor_invariant(format!(
                "lookup answered {} spans, expected {span_count}",
                response.results.len()
            )));
        }

        let entries = response.results.iter().map(Vec::len).sum::<usize>();
        record(MetricsEvent::LookupBatch {
            keys: u64::try_from(span_count).unwrap_or(u64::MAX),
            entries: u64::try_from(entries).unwrap_or(u64::MAX),
        });
        for range in response.ranges {
            if !self.ranges.contains(&range) {
                self.ranges.push(range);
            }
        }

        Ok(response.results)
    }

    // Index join: resolve secondary entries to primary entries with a
    // second batched read, keeping the per-span grouping and order.
    fn fetch_primary_entries(
        &mut self,
        secondary: Vec<Vec<KvEntry>>,
    ) -> Result<Vec<Vec<KvEntry>>, InternalError> {
        let table = self.decoder.table();
        let mut spans = Vec::new();
        let mut counts = Vec::with_capacity(secondary.len());
        for entries in &secondary {
            counts.push(entries.len());
            for entry in entries {
                let key = primary_key_from_secondary(table, &self.index, &entry.key)?;
                spans.push(KeySpan::point(key));
            }
        }

        let mut primary = self.lookup(spans)?.into_iter();
        let mut out = Vec::with_capacity(counts.len());
        for count in counts {
            let mut entries = Vec::with_capacity(count);
            for found in primary.by_ref().take(count) {
                if found.len() != 1 {
                    return Err(InternalError::store_corruption(format!(
                        "secondary entry of index '{}' resolves to {} primary entries",
                        self.index.name,
                        found.len()
                    )));
                }
                entries.extend(found);
            }
            out.push(entries);
        }

        Ok(out)
    }

    // Table-shaped row for an unmatched input: lookup key columns copied
    // from the input, everything else NULL.
    fn outer_row(&self, input_row: &Row) -> Row {
        let mut datums = vec![EncDatum::null(); self.decoder.types().len()];
        for (&input_col, &table_col) in self.lookup_columns.iter().zip(&self.index.column_ids) {
            datums[table_col] = input_row[input_col].clone();
        }

        Row::new(datums)
    }

    fn forward_metadata(&mut self, meta: ProducerMetadata) -> ConsumerStatus {
        let is_error = meta.is_error();
        let status = self.output.push(StreamItem::Meta(meta));
        if is_error {
            return status.max(ConsumerStatus::DrainRequested);
        }

        status
    }

    fn push_error(&mut self, err: InternalError) -> ConsumerStatus {
        warn!(
            "{}: forwarding error as metadata: {}",
            OPERATOR.label(),
            err.display_with_class()
        );
        let status = self
            .output
            .push(StreamItem::Meta(ProducerMetadata::from_error(err)));

        status.max(ConsumerStatus::DrainRequested)
    }

    fn finish(&mut self, status: ConsumerStatus) {
        if status != ConsumerStatus::ConsumerClosed && !self.ranges.is_empty() {
            let ranges = std::mem::take(&mut self.ranges);
            self.output
                .push(StreamItem::Meta(ProducerMetadata::from_ranges(ranges)));
        }
        self.output.producer_done();
        self.finished = true;

        debug!(
            "{}: finished with {status:?}, {} rows emitted",
            OPERATOR.label(),
            self.helper.emitted()
        );
    }
}

impl<I, O, L> Processor for JoinReader<I, O, L>
where
    I: RowSource,
    O: RowSink,
    L: KvLookup,
{
    fn run(&mut self) {
        if self.finished {
            debug!("{}: run called after finish", OPERATOR.label());
            return;
        }

        let _span = Span::new(OPERATOR);
        let status = self.pump();
        self.finish(status);
    }
}

fn check_lookup_columns(
    table: &TableDescriptor,
    index: &IndexDescriptor,
    lookup_columns: &[usize],
    input_types: &[ColumnType],
) -> Result<(), InternalError> {
    if lookup_columns.is_empty() || lookup_columns.len() > index.column_ids.len() {
        return Err(InternalError::executor_unsupported(format!(
            "{} lookup columns cannot address index '{}' of {} columns",
            lookup_columns.len(),
            index.name,
            index.column_ids.len()
        )));
    }

    let index_types = table.index_column_types(index);
    for (&col, expected) in lookup_columns.iter().zip(index_types) {
        let Some(&found) = input_types.get(col) else {
            return Err(InternalError::executor_unsupported(format!(
                "lookup column {col} out of range for {} input columns",
                input_types.len()
            )));
        };
        if found != expected {
            return Err(InternalError::executor_unsupported(format!(
                "lookup column {col} is {found} but index '{}' expects {expected}",
                index.name
            )));
        }
    }

    Ok(())
}
