use crate::{
    db::{
        codec::encode_value_columns,
        row::render_rows,
        store::{
            ColumnDescriptor, IndexDescriptor, KeySpan, KvLookup, LookupRequest, MemoryStore,
            RowDecoder, TableDescriptor,
            key::{index_prefix, primary_key, primary_key_from_secondary, secondary_key},
            prefix_end,
        },
    },
    error::{ErrorClass, ErrorOrigin},
    test_support::{BS_INDEX_ID, int_to_english, sum_row, sum_store, sum_table},
    types::ColumnType,
    value::Value,
};

#[test]
fn english_numerals_spell_each_digit() {
    assert_eq!(int_to_english(5), "five");
    assert_eq!(int_to_english(21), "two-one");
    assert_eq!(int_to_english(50), "five-zero");
}

#[test]
fn prefix_end_skips_trailing_max_bytes() {
    assert_eq!(prefix_end(&[1, 2]), Some(vec![1, 3]));
    assert_eq!(prefix_end(&[1, 0xFF]), Some(vec![2]));
    assert_eq!(prefix_end(&[0xFF, 0xFF]), None);
}

#[test]
fn prefix_lookup_returns_entries_in_key_order() {
    let (table, store) = sum_store();
    let mut prefix = index_prefix(table.id, table.primary_index.id);
    crate::db::codec::encode_key_segment(&Value::Int(1), crate::types::ColumnType::Int, &mut prefix)
        .unwrap();

    let response = store
        .lookup(&LookupRequest {
            spans: vec![KeySpan::prefix(prefix)],
        })
        .unwrap();
    assert_eq!(response.results.len(), 1);

    let decoder = RowDecoder::new(table);
    let rows = response.results[0]
        .iter()
        .map(|entry| decoder.decode(entry).unwrap())
        .collect::<Vec<_>>();
    assert_eq!(rows.len(), 10);
    assert_eq!(rows[0].render(decoder.types()), "[1 0 1 'one-zero']");
    assert_eq!(rows[9].render(decoder.types()), "[1 9 10 'one-nine']");
}

#[test]
fn decoded_key_columns_stay_lazy() {
    let (table, store) = sum_store();
    let key = primary_key(&table, &sum_row(34)).unwrap();
    let response = store
        .lookup(&LookupRequest {
            spans: vec![KeySpan::point(key)],
        })
        .unwrap();

    let decoder = RowDecoder::new(table);
    let row = decoder.decode(&response.results[0][0]).unwrap();
    assert!(row[0].is_undecoded());
    assert!(!row[2].is_undecoded());
    assert_eq!(render_rows(&[row], decoder.types()), "[[3 4 7 'three-four']]");
}

#[test]
fn secondary_entry_points_at_primary_key() {
    let table = sum_table();
    let index = table.index(Some(BS_INDEX_ID)).unwrap();
    let values = sum_row(42);

    let secondary = secondary_key(&table, index, &values).unwrap();
    assert_eq!(
        primary_key_from_secondary(&table, index, &secondary).unwrap(),
        primary_key(&table, &values).unwrap()
    );
}

#[test]
fn insert_rejects_mistyped_rows() {
    let table = sum_table();
    let mut store = MemoryStore::new();

    let mut values = sum_row(1);
    values[2] = Value::Text("x".into());
    let err = store.insert_row(&table, &values).unwrap_err();
    assert_eq!(err.origin, ErrorOrigin::Store);

    assert!(store.insert_row(&table, &values[..2]).is_err());
    assert!(store.is_empty());
}

#[test]
fn corrupted_value_payload_fails_decoding() {
    let (table, mut store) = sum_store();
    let key = primary_key(&table, &sum_row(7)).unwrap();
    store.put(key.clone(), vec![0xFF, 0x00]);

    let response = store
        .lookup(&LookupRequest {
            spans: vec![KeySpan::point(key)],
        })
        .unwrap();
    let err = RowDecoder::new(table)
        .decode(&response.results[0][0])
        .unwrap_err();
    assert_eq!(err.class, ErrorClass::Corruption);
    assert_eq!(err.origin, ErrorOrigin::Codec);
}

#[test]
fn mistyped_stored_value_is_codec_corruption() {
    let (table, mut store) = sum_store();
    let key = primary_key(&table, &sum_row(7)).unwrap();
    let payload = encode_value_columns(&[Value::Text("seven".into()), Value::Int(7)]).unwrap();
    store.put(key.clone(), payload);

    let response = store
        .lookup(&LookupRequest {
            spans: vec![KeySpan::point(key)],
        })
        .unwrap();
    let err = RowDecoder::new(table)
        .decode(&response.results[0][0])
        .unwrap_err();
    assert_eq!(err.class, ErrorClass::Corruption);
    assert_eq!(err.origin, ErrorOrigin::Codec);
}

#[test]
fn lookups_report_touched_ranges_once() {
    let (table, mut store) = sum_store();
    let split = primary_key(&table, &sum_row(50)).unwrap();
    store.split_range(split.clone(), 2);

    let prefix = index_prefix(table.id, table.primary_index.id);
    let response = store
        .lookup(&LookupRequest {
            spans: vec![KeySpan::prefix(prefix.clone()), KeySpan::prefix(prefix)],
        })
        .unwrap();

    assert_eq!(response.ranges.len(), 2);
    assert_eq!(response.ranges[0].end_key.as_deref(), Some(split.as_slice()));
    assert_eq!(response.ranges[1].start_key, split);
}

#[test]
fn unsplit_store_reports_no_ranges() {
    let (table, store) = sum_store();
    let response = store
        .lookup(&LookupRequest {
            spans: vec![KeySpan::prefix(index_prefix(table.id, 1))],
        })
        .unwrap();

    assert_eq!(response.results[0].len(), 99);
    assert!(response.ranges.is_empty());
}

#[test]
fn table_validation_rejects_bad_indexes() {
    let mut table = sum_table();
    assert!(table.validate().is_ok());

    table.indexes[0].column_ids.push(9);
    assert!(table.validate().is_err());

    let mut table = sum_table();
    table.columns[0].nullable = true;
    assert!(table.validate().is_err());
}

#[test]
fn replacing_a_row_drops_its_old_index_entries() {
    let table = sum_table();
    let mut store = MemoryStore::new();
    let old = sum_row(11);
    let mut new = sum_row(11);
    new[2] = Value::Int(3);
    new[3] = Value::Text("eleven".into());

    store.insert_row(&table, &old).unwrap();
    store.insert_row(&table, &new).unwrap();

    let index = table.index(Some(BS_INDEX_ID)).unwrap();
    let response = store
        .lookup(&LookupRequest {
            spans: vec![KeySpan::prefix(index_prefix(table.id, BS_INDEX_ID))],
        })
        .unwrap();
    let entries = &response.results[0];
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].key, secondary_key(&table, index, &new).unwrap());
    assert_eq!(store.len(), 2);

    let key = primary_key(&table, &new).unwrap();
    let response = store
        .lookup(&LookupRequest {
            spans: vec![KeySpan::point(key)],
        })
        .unwrap();
    let row = RowDecoder::new(table.clone())
        .decode(&response.results[0][0])
        .unwrap();
    assert_eq!(render_rows(&[row], &table.column_types()), "[[1 1 3 'eleven']]");
}

#[test]
fn table_validation_rejects_nullable_index_columns() {
    let table = TableDescriptor {
        id: 60,
        name: "p".to_string(),
        columns: vec![
            ColumnDescriptor::new("a", ColumnType::Int),
            ColumnDescriptor::new("b", ColumnType::Int).nullable(),
        ],
        primary_index: IndexDescriptor::new(1, "primary", vec![0]),
        indexes: vec![IndexDescriptor::new(2, "b", vec![1])],
    };
    assert_eq!(
        table.validate().unwrap_err().class,
        ErrorClass::InvariantViolation
    );

    let mut store = MemoryStore::new();
    assert!(
        store
            .insert_row(&table, &[Value::Int(1), Value::Null])
            .is_err()
    );
    assert!(store.is_empty());
}

#[test]
fn insert_into_invalid_table_fails_without_writing() {
    let mut table = sum_table();
    table.indexes[0].column_ids.push(9);

    let mut store = MemoryStore::new();
    assert!(store.insert_row(&table, &sum_row(1)).is_err());
    assert!(store.is_empty());
}
