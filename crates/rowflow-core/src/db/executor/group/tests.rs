use super::*;
use crate::{
    db::{
        executor::{
            buffer::{RowBuffer, RowBufferArgs},
            stream::{MetadataStash, ProducerMetadata, RowSink, StreamItem},
        },
        row::{ColumnOrderInfo, render_rows},
    },
    error::{ErrorClass, ErrorOrigin},
    test_support::{TWO_INTS, int_row, int_rows},
    value::Value,
};
use proptest::prelude::*;

fn accumulator(
    rows: Vec<Row>,
    ordering: ColumnOrdering,
) -> StreamGroupAccumulator<MetadataStash<RowBuffer>> {
    let input = RowBuffer::new(TWO_INTS.to_vec(), rows, RowBufferArgs::default());

    StreamGroupAccumulator::new(MetadataStash::new(input), ordering, 4)
}

fn collect_groups(
    acc: &mut StreamGroupAccumulator<MetadataStash<RowBuffer>>,
) -> Result<Vec<String>, InternalError> {
    let mut groups = Vec::new();
    while let Some(group) = acc.advance_group()? {
        groups.push(render_rows(&group, &TWO_INTS));
    }

    Ok(groups)
}

#[test]
fn groups_split_on_ordering_columns() {
    let rows = int_rows(&[&[1, 1], &[1, 2], &[2, 1], &[3, 0], &[3, 9], &[3, 4]]);
    let mut acc = accumulator(rows, ColumnOrdering::asc(&[0]));

    let groups = collect_groups(&mut acc).unwrap();

    assert_eq!(
        groups,
        vec!["[[1 1] [1 2]]", "[[2 1]]", "[[3 0] [3 9] [3 4]]"]
    );
    assert!(acc.advance_group().unwrap().is_none());
    assert!(acc.peek_at_current_group().unwrap().is_none());
}

#[test]
fn peek_is_idempotent_and_sees_next_group_after_advance() {
    let rows = int_rows(&[&[1, 0], &[1, 1], &[5, 0]]);
    let mut acc = accumulator(rows, ColumnOrdering::asc(&[0]));

    let first = acc.peek_at_current_group().unwrap().unwrap().render(&TWO_INTS);
    let again = acc.peek_at_current_group().unwrap().unwrap().render(&TWO_INTS);
    assert_eq!(first, "[1 0]");
    assert_eq!(again, "[1 0]");

    let group = acc.advance_group().unwrap().unwrap();
    assert_eq!(group.len(), 2);

    let next = acc.peek_at_current_group().unwrap().unwrap().render(&TWO_INTS);
    assert_eq!(next, "[5 0]");
}

#[test]
fn empty_source_yields_no_group() {
    let mut acc = accumulator(Vec::new(), ColumnOrdering::asc(&[0]));

    assert!(acc.peek_at_current_group().unwrap().is_none());
    assert!(acc.advance_group().unwrap().is_none());
}

#[test]
fn descending_ordering_groups_descending_input() {
    let rows = int_rows(&[&[3, 0], &[3, 1], &[1, 0]]);
    let ordering = ColumnOrdering::new(vec![ColumnOrderInfo::desc(0)]);
    let mut acc = accumulator(rows, ordering);

    let groups = collect_groups(&mut acc).unwrap();

    assert_eq!(groups, vec!["[[3 0] [3 1]]", "[[1 0]]"]);
}

#[test]
fn badly_ordered_input_is_rejected_before_mis_merging() {
    let rows = int_rows(&[&[1, 0], &[2, 0], &[2, 1], &[1, 5]]);
    let mut acc = accumulator(rows, ColumnOrdering::asc(&[0]));

    let first = acc.advance_group().unwrap().unwrap();
    assert_eq!(render_rows(&first, &TWO_INTS), "[[1 0]]");

    let err = acc.advance_group().unwrap_err();
    assert!(err.is_ordering_violation());
    assert_eq!(err.class, ErrorClass::InvariantViolation);
    assert_eq!(
        err.message,
        "detected badly ordered input: [2 0] > [1 5], but expected '<'"
    );
    assert!(acc.is_exhausted());
    assert!(acc.advance_group().unwrap().is_none());
}

#[test]
fn source_error_propagates() {
    let mut input = RowBuffer::new(
        TWO_INTS.to_vec(),
        vec![int_row(&[1, 0])],
        RowBufferArgs::default(),
    );
    input.push(StreamItem::Meta(ProducerMetadata::from_error(
        InternalError::store_internal("upstream failed"),
    )));
    let mut acc = StreamGroupAccumulator::new(
        MetadataStash::new(&mut input),
        ColumnOrdering::asc(&[0]),
        4,
    );

    let err = acc.advance_group().unwrap_err();

    assert_eq!(err.origin, ErrorOrigin::Store);
    assert_eq!(err.message, "upstream failed");
}

#[test]
fn handoff_keeps_buffer_capacity() {
    let rows = int_rows(&[&[1, 0], &[1, 1], &[2, 0]]);
    let mut acc = accumulator(rows, ColumnOrdering::asc(&[0]));

    let group = acc.advance_group().unwrap().unwrap();

    assert_eq!(group.len(), group.capacity());
    assert!(acc.cur_group.capacity() >= 4);
}

proptest! {
    #[test]
    fn groups_partition_sorted_input(mut keys in prop::collection::vec((0i64..6, any::<i64>()), 0..40)) {
        keys.sort_by_key(|(key, _)| *key);
        let rows = keys
            .iter()
            .map(|(key, payload)| int_row(&[*key, *payload]))
            .collect::<Vec<_>>();
        let mut acc = accumulator(rows, ColumnOrdering::asc(&[0]));

        let mut flattened = Vec::new();
        let mut previous_key = None;
        while let Some(group) = acc.advance_group().unwrap() {
            prop_assert!(!group.is_empty());

            let values = group
                .iter()
                .map(|row| row.values(&TWO_INTS).unwrap())
                .collect::<Vec<_>>();
            let key = values[0][0].clone();
            prop_assert!(values.iter().all(|row| row[0] == key));
            prop_assert_ne!(Some(key.clone()), previous_key.clone());
            previous_key = Some(key);

            flattened.extend(values);
        }

        let expected = keys
            .iter()
            .map(|(key, payload)| vec![Value::Int(*key), Value::Int(*payload)])
            .collect::<Vec<_>>();
        prop_assert_eq!(flattened, expected);
    }
}
