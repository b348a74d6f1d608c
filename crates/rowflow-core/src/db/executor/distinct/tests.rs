use super::*;
use crate::{
    db::{
        executor::buffer::{RowBuffer, RowBufferArgs},
        row::{ColumnOrderInfo, render_rows},
        store::RangeInfo,
    },
    test_support::{ONE_INT, TWO_INTS, int_row, int_rows},
};

fn run_distinct(
    ordering: ColumnOrdering,
    post: &PostProcessSpec,
    input: &mut RowBuffer,
    out: &mut RowBuffer,
) -> Vec<ColumnType> {
    let mut distinct =
        SortedDistinct::new(ExecConfig::default(), ordering, post, &mut *input, &mut *out)
            .unwrap();
    distinct.run();

    distinct.output_types().to_vec()
}

#[test]
fn keeps_first_row_of_each_run() {
    let mut input = RowBuffer::new(
        TWO_INTS.to_vec(),
        int_rows(&[&[1, 1], &[1, 2], &[2, 5], &[3, 0], &[3, 3]]),
        RowBufferArgs::default(),
    );
    let mut out = RowBuffer::sink();

    let types = run_distinct(
        ColumnOrdering::asc(&[0]),
        &PostProcessSpec::default(),
        &mut input,
        &mut out,
    );

    assert!(input.is_done());
    assert!(out.is_producer_closed());
    let (rows, metadata) = out.split_records();
    assert!(metadata.is_empty());
    assert_eq!(render_rows(&rows, &types), "[[1 1] [2 5] [3 0]]");
}

#[test]
fn distinct_on_all_columns_with_descending_key() {
    let mut input = RowBuffer::new(
        TWO_INTS.to_vec(),
        int_rows(&[&[9, 1], &[9, 1], &[9, 2], &[4, 2]]),
        RowBufferArgs::default(),
    );
    let mut out = RowBuffer::sink();
    let ordering = ColumnOrdering::new(vec![ColumnOrderInfo::desc(0), ColumnOrderInfo::asc(1)]);
    let post = PostProcessSpec {
        projection: Some(vec![1]),
        ..PostProcessSpec::default()
    };

    let types = run_distinct(ordering, &post, &mut input, &mut out);

    let (rows, _) = out.split_records();
    assert_eq!(render_rows(&rows, &types), "[[1] [2] [2]]");
}

#[test]
fn forwards_range_metadata_in_order() {
    let range = RangeInfo {
        start_key: vec![1],
        end_key: Some(vec![2]),
        lease_holder: 4,
    };
    let mut input = RowBuffer::new(ONE_INT.to_vec(), int_rows(&[&[1]]), RowBufferArgs::default());
    input.push(StreamItem::Meta(ProducerMetadata::from_ranges(vec![
        range.clone(),
    ])));
    input.push(StreamItem::Row(int_row(&[2])));
    let mut out = RowBuffer::sink();

    let types = run_distinct(
        ColumnOrdering::asc(&[0]),
        &PostProcessSpec::default(),
        &mut input,
        &mut out,
    );

    let records = out.take_records();
    assert_eq!(records.len(), 3);
    assert!(matches!(&records[0], StreamItem::Row(row) if row.render(&types) == "[1]"));
    assert!(matches!(&records[1], StreamItem::Meta(meta) if meta.ranges == vec![range.clone()]));
    assert!(matches!(&records[2], StreamItem::Row(row) if row.render(&types) == "[2]"));
}

#[test]
fn metadata_before_a_group_precedes_its_row() {
    let range = RangeInfo {
        start_key: Vec::new(),
        end_key: None,
        lease_holder: 2,
    };
    let mut input = RowBuffer::new(ONE_INT.to_vec(), Vec::new(), RowBufferArgs::default());
    input.push(StreamItem::Meta(ProducerMetadata::from_ranges(vec![
        range.clone(),
    ])));
    input.push(StreamItem::Row(int_row(&[1])));
    input.push(StreamItem::Row(int_row(&[2])));
    let mut out = RowBuffer::sink();

    let types = run_distinct(
        ColumnOrdering::asc(&[0]),
        &PostProcessSpec::default(),
        &mut input,
        &mut out,
    );

    let records = out.take_records();
    assert_eq!(records.len(), 3);
    assert!(matches!(&records[0], StreamItem::Meta(meta) if meta.ranges == vec![range.clone()]));
    assert!(matches!(&records[1], StreamItem::Row(row) if row.render(&types) == "[1]"));
    assert!(matches!(&records[2], StreamItem::Row(row) if row.render(&types) == "[2]"));
}

#[test]
fn ordering_violation_becomes_error_metadata() {
    let mut input = RowBuffer::new(
        ONE_INT.to_vec(),
        int_rows(&[&[1], &[3], &[2], &[5]]),
        RowBufferArgs::default(),
    );
    let mut out = RowBuffer::sink();

    let types = run_distinct(
        ColumnOrdering::asc(&[0]),
        &PostProcessSpec::default(),
        &mut input,
        &mut out,
    );

    assert!(input.is_done());
    let (rows, metadata) = out.split_records();
    assert_eq!(render_rows(&rows, &types), "[[1]]");
    assert_eq!(metadata.len(), 1);
    let err = metadata[0].err.as_ref().unwrap();
    assert!(err.is_ordering_violation());
    assert_eq!(
        err.message,
        "detected badly ordered input: [3] > [2], but expected '<'"
    );
}

#[test]
fn consumer_closed_stops_pulling() {
    let mut input = RowBuffer::new(
        ONE_INT.to_vec(),
        int_rows(&[&[1], &[2], &[3], &[4]]),
        RowBufferArgs::default(),
    );
    let mut out = RowBuffer::sink();
    out.consumer_closed();

    run_distinct(
        ColumnOrdering::asc(&[0]),
        &PostProcessSpec::default(),
        &mut input,
        &mut out,
    );

    // seed row plus the row that closed the first group
    assert_eq!(input.pulls(), 2);
    assert_eq!(input.consumer_status(), ConsumerStatus::ConsumerClosed);
    assert!(out.is_producer_closed());
    let (rows, metadata) = out.split_records();
    assert!(rows.is_empty());
    assert!(metadata.is_empty());
}

#[test]
fn consumer_done_relays_upstream_error() {
    let mut input = RowBuffer::new(ONE_INT.to_vec(), Vec::new(), RowBufferArgs::default());
    input.push(StreamItem::Row(int_row(&[1])));
    input.push(StreamItem::Meta(ProducerMetadata::from_error(
        InternalError::store_internal("dummy"),
    )));
    let mut out = RowBuffer::sink();
    out.consumer_done();

    run_distinct(
        ColumnOrdering::asc(&[0]),
        &PostProcessSpec::default(),
        &mut input,
        &mut out,
    );

    assert!(out.is_producer_closed());
    let (rows, metadata) = out.split_records();
    assert!(rows.is_empty());
    assert_eq!(metadata.len(), 1);
    assert_eq!(metadata[0].err.as_ref().unwrap().message, "dummy");
}

#[test]
fn limit_drains_remaining_input() {
    let mut input = RowBuffer::new(
        ONE_INT.to_vec(),
        int_rows(&[&[1], &[1], &[2], &[3], &[3]]),
        RowBufferArgs::default(),
    );
    let mut out = RowBuffer::sink();
    let post = PostProcessSpec {
        limit: 1,
        ..PostProcessSpec::default()
    };

    let types = run_distinct(ColumnOrdering::asc(&[0]), &post, &mut input, &mut out);

    assert!(input.is_done());
    assert_eq!(input.consumer_status(), ConsumerStatus::DrainRequested);
    let (rows, _) = out.split_records();
    assert_eq!(render_rows(&rows, &types), "[[1]]");
}

#[test]
fn out_of_range_distinct_column_is_rejected() {
    let mut input = RowBuffer::new(ONE_INT.to_vec(), Vec::new(), RowBufferArgs::default());
    let mut out = RowBuffer::sink();

    let result = SortedDistinct::new(
        ExecConfig::default(),
        ColumnOrdering::asc(&[1]),
        &PostProcessSpec::default(),
        &mut input,
        &mut out,
    );

    assert!(result.is_err());
}
