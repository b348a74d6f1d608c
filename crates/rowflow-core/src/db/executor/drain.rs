use crate::{
    db::executor::stream::{ConsumerStatus, RowSink, RowSource, StreamItem},
    obs::{MetricsEvent, OperatorKind, sink::record},
};
use log::debug;

/// Pull `input` to exhaustion after a drain request, discarding rows and
/// forwarding every metadata item to `output`.
///
/// Stops early and tells the input `consumer_closed` if the output closes.
/// Returns the last status seen from the output.
pub fn drain_and_forward_metadata<I, O>(
    operator: OperatorKind,
    input: &mut I,
    output: &mut O,
) -> ConsumerStatus
where
    I: RowSource + ?Sized,
    O: RowSink + ?Sized,
{
    input.consumer_done();

    let mut status = ConsumerStatus::DrainRequested;
    let mut discarded = 0u64;
    while let Some(item) = input.next() {
        match item {
            StreamItem::Row(_) => discarded += 1,
            StreamItem::Meta(meta) => {
                status = output.push(StreamItem::Meta(meta));
                if status == ConsumerStatus::ConsumerClosed {
                    input.consumer_closed();
                    debug!("{}: consumer closed while draining", operator.label());
                    break;
                }
            }
        }
    }

    debug!(
        "{}: drained input, {discarded} rows discarded",
        operator.label()
    );
    record(MetricsEvent::Drained {
        operator,
        rows_discarded: discarded,
    });

    status
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::executor::{
            buffer::{RowBuffer, RowBufferArgs},
            stream::ProducerMetadata,
        },
        error::InternalError,
        test_support::{ONE_INT, int_row},
    };

    fn input_with_meta() -> RowBuffer {
        let mut input = RowBuffer::new(
            ONE_INT.to_vec(),
            vec![int_row(&[1]), int_row(&[2])],
            RowBufferArgs::default(),
        );
        input.push(StreamItem::Meta(ProducerMetadata::from_error(
            InternalError::store_internal("dummy"),
        )));
        input.push(StreamItem::Row(int_row(&[3])));
        input
    }

    #[test]
    fn drain_discards_rows_and_forwards_metadata() {
        let mut input = input_with_meta();
        let mut output = RowBuffer::sink();

        let status =
            drain_and_forward_metadata(OperatorKind::JoinReader, &mut input, &mut output);

        assert_eq!(status, ConsumerStatus::NeedMoreRows);
        assert!(input.is_done());
        let (rows, metadata) = output.split_records();
        assert!(rows.is_empty());
        assert_eq!(metadata.len(), 1);
        assert_eq!(metadata[0].err.as_ref().unwrap().message, "dummy");
    }

    #[test]
    fn drain_stops_when_output_closes() {
        let mut input = input_with_meta();
        let mut output = RowBuffer::sink();
        output.consumer_closed();

        let status =
            drain_and_forward_metadata(OperatorKind::JoinReader, &mut input, &mut output);

        assert_eq!(status, ConsumerStatus::ConsumerClosed);
        assert!(!input.is_done());
        assert_eq!(input.consumer_status(), ConsumerStatus::ConsumerClosed);
    }
}
