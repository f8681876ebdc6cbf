//! Whole queries: load, generate, register, run, decode.

use std::sync::Arc;

use querygen_buffer::{ColumnStore, MemoryBudgetImpl, ParBuffer, ParMemoryBuffer, Partition};
use querygen_codegen::kernels::GroupTable;
use querygen_codegen::{
    builtin, instantiate, Annotation, AttributeBinding, Binding, Error as CodegenError,
    ExecContext, LifecycleViolation, Registry,
};
use querygen_core::prelude::{
    BufferBackend, ColumnType, EngineConfig, LogicalType, PartitionId, Scalar,
};
use querygen_encoding::{ColumnEncoder, Dictionaries, HashKind};
use querygen_exec::{ExecError, Host, LoadedTable, RawColumn, RawTable, TableLoader};
use querygen_trie::SurrogateKey;

const WORDS: [&str; 6] = ["a", "b", "a", "c", "b", "a"];

fn utf8() -> ColumnType {
    ColumnType::of(LogicalType::Utf8)
}

fn count_binding(hash: HashKind) -> Binding {
    Binding::new()
        .attribute("KEY", AttributeBinding::new("word", utf8(), hash))
        .annotation("AGG", Annotation::Count)
}

/// Encode `WORDS` by hand into a single sealed partition.
fn word_context() -> ExecContext {
    let budget = MemoryBudgetImpl::new(1 << 16);
    let mut enc = ColumnEncoder::new(utf8());
    let encoded: Vec<_> = WORDS
        .iter()
        .map(|w| enc.encode(&Scalar::Str(w.to_string())).unwrap())
        .collect();
    let dict = enc.finish().unwrap();
    assert_eq!(dict.len(), 3);

    let buf = ParMemoryBuffer::from_values(&budget, utf8().physical(), &encoded).unwrap();
    let mut part = Partition::new(PartitionId::new(0));
    part.add_column("word", Box::new(buf)).unwrap();
    let mut store = ColumnStore::new();
    store.push(part);
    store.seal_all().unwrap();

    let mut dicts = Dictionaries::new();
    dicts.insert("word", dict);
    ExecContext::new(Arc::new(store), dicts).unwrap()
}

fn word_table() -> RawTable {
    RawTable::new(vec![
        RawColumn::new(
            "word",
            utf8(),
            WORDS.iter().map(|w| Scalar::Str(w.to_string())).collect(),
        ),
        RawColumn::new(
            "score",
            ColumnType::of(LogicalType::Int64),
            vec![
                Scalar::I64(1),
                Scalar::I64(10),
                Scalar::I64(2),
                Scalar::I64(100),
                Scalar::I64(20),
                Scalar::I64(-3),
            ],
        ),
    ])
    .unwrap()
}

fn load(cfg: &EngineConfig) -> LoadedTable {
    TableLoader::new(cfg.load_config(), MemoryBudgetImpl::new(cfg.mem_cap_bytes))
        .unwrap()
        .load(&word_table())
        .unwrap()
}

#[test]
fn word_counts_decode_through_the_dictionary() {
    let ctx = word_context();
    let dict = Arc::clone(ctx.dictionaries().require("word").unwrap());

    let unit = instantiate(&builtin("group_count").unwrap(), &count_binding(HashKind::Fx)).unwrap();
    let mut registry = Registry::new();
    registry.register(&unit).unwrap();

    let mut app = registry.init_app(unit.unit_name(), ctx).unwrap();
    app.run().unwrap();
    let table = app
        .take_result()
        .unwrap()
        .downcast::<GroupTable<u32, u64>>()
        .unwrap();

    assert_eq!(table.len(), 3);
    let mut decoded: Vec<(String, u64)> = table
        .iter()
        .map(|(k, n)| (dict.lookup(SurrogateKey::new(u64::from(*k))).unwrap(), *n))
        .collect();
    decoded.sort();
    assert_eq!(
        decoded,
        vec![("a".to_string(), 3), ("b".to_string(), 2), ("c".to_string(), 1)]
    );
}

#[test]
fn a_unit_runs_once_and_hands_its_result_out_once() {
    let unit = instantiate(&builtin("group_count").unwrap(), &count_binding(HashKind::Mix64)).unwrap();
    let mut registry = Registry::new();
    registry.register(&unit).unwrap();

    let mut app = registry.init_app(unit.unit_name(), word_context()).unwrap();
    assert!(app.take_result().is_none());
    app.run().unwrap();
    assert!(matches!(
        app.run(),
        Err(CodegenError::Lifecycle {
            violation: LifecycleViolation::AlreadyRun,
            ..
        })
    ));
    assert!(app.take_result().is_some());
    assert!(app.take_result().is_none());
}

#[test]
fn unknown_unit_cannot_be_initialized() {
    let registry = Registry::new();
    assert!(matches!(
        registry.init_app("QueryNope", word_context()),
        Err(CodegenError::UnknownUnit(_))
    ));
}

#[test]
fn every_hash_strategy_gives_the_same_counts() {
    let cfg = EngineConfig {
        rows_per_partition: 4,
        ..EngineConfig::default()
    };
    let loaded = load(&cfg);
    let mut host = Host::new(cfg).unwrap();
    let t = builtin("group_count").unwrap();

    let outputs: Vec<_> = HashKind::ALL
        .iter()
        .map(|&h| host.execute(&t, &count_binding(h), loaded.context(2).unwrap()).unwrap())
        .collect();

    for out in &outputs {
        assert_eq!(out.get(&Scalar::Str("a".into())), Some(&Scalar::U64(3)));
        assert_eq!(out.get(&Scalar::Str("b".into())), Some(&Scalar::U64(2)));
        assert_eq!(out.get(&Scalar::Str("c".into())), Some(&Scalar::U64(1)));
        assert_eq!(out.rows(), outputs[0].rows());
    }
    assert_eq!(host.registry().len(), HashKind::ALL.len());
}

#[test]
fn group_sum_over_mmap_partitions_matches_memory() {
    let dir = tempfile::tempdir().unwrap();
    let binding = Binding::new()
        .attribute("KEY", AttributeBinding::new("word", utf8(), HashKind::Fx))
        .attribute(
            "VAL",
            AttributeBinding::new("score", ColumnType::of(LogicalType::Int64), HashKind::Fx),
        )
        .annotation("AGG", Annotation::SumI64);
    let t = builtin("group_sum").unwrap();

    let mem_cfg = EngineConfig {
        rows_per_partition: 2,
        ..EngineConfig::default()
    };
    let mmap_cfg = EngineConfig {
        default_backend: BufferBackend::Mmap,
        mmap_dir: dir.path().to_string_lossy().into_owned(),
        ..mem_cfg.clone()
    };

    let mem_loaded = load(&mem_cfg);
    let mmap_loaded = load(&mmap_cfg);
    let mem = Host::new(mem_cfg)
        .unwrap()
        .execute(&t, &binding, mem_loaded.context(3).unwrap())
        .unwrap();
    let mapped = Host::new(mmap_cfg)
        .unwrap()
        .execute(&t, &binding, mmap_loaded.context(3).unwrap())
        .unwrap();

    assert_eq!(mem.rows(), mapped.rows());
    assert_eq!(mem.get(&Scalar::Str("a".into())), Some(&Scalar::I64(0)));
    assert_eq!(mem.get(&Scalar::Str("b".into())), Some(&Scalar::I64(30)));
    assert_eq!(mem.get(&Scalar::Str("c".into())), Some(&Scalar::I64(100)));

    let backends: Vec<BufferBackend> = mmap_loaded
        .store
        .partitions()
        .iter()
        .map(|p| p.column("word").unwrap().backend())
        .collect();
    assert_eq!(backends, vec![BufferBackend::Mmap; 3]);
}

#[test]
fn prefix_count_counts_only_matching_groups() {
    let table = RawTable::new(vec![RawColumn::new(
        "word",
        utf8(),
        ["apple", "apply", "banana", "apple", "ape", "b"]
            .iter()
            .map(|w| Scalar::Str(w.to_string()))
            .collect(),
    )])
    .unwrap();
    let cfg = EngineConfig::default();
    let loaded = TableLoader::new(cfg.load_config(), MemoryBudgetImpl::new(cfg.mem_cap_bytes))
        .unwrap()
        .load(&table)
        .unwrap();

    let mut host = Host::new(cfg).unwrap();
    let t = builtin("prefix_count").unwrap();
    let out = host
        .execute(
            &t,
            &count_binding(HashKind::Fx).literal("PREFIX", "app"),
            loaded.context(1).unwrap(),
        )
        .unwrap();

    let rows: Vec<(Scalar, Scalar)> = out
        .rows()
        .iter()
        .map(|r| (r.key.clone(), r.value.clone()))
        .collect();
    assert_eq!(
        rows,
        vec![
            (Scalar::Str("apple".into()), Scalar::U64(2)),
            (Scalar::Str("apply".into()), Scalar::U64(1)),
        ]
    );

    // Same unit name, new literal: a second factory, registered alongside.
    let out = host
        .execute(
            &t,
            &count_binding(HashKind::Fx).literal("PREFIX", "b"),
            loaded.context(1).unwrap(),
        )
        .unwrap();
    assert!(!out.manifest().cache_hit);
    assert_eq!(out.num_rows(), 2);
    assert_eq!(host.registry().len(), 2);

    let again = host
        .execute(
            &t,
            &count_binding(HashKind::Fx).literal("PREFIX", "app"),
            loaded.context(1).unwrap(),
        )
        .unwrap();
    assert!(again.manifest().cache_hit);
    assert_eq!(again.num_rows(), 2);
    assert_eq!(again.get(&Scalar::Str("apple".into())), Some(&Scalar::U64(2)));
}

#[test]
fn unbound_slot_fails_before_anything_runs() {
    let cfg = EngineConfig::default();
    let loaded = load(&cfg);
    let mut host = Host::new(cfg).unwrap();
    let partial = Binding::new().attribute("KEY", AttributeBinding::new("word", utf8(), HashKind::Fx));
    let err = host
        .execute(&builtin("group_count").unwrap(), &partial, loaded.context(1).unwrap())
        .unwrap_err();
    assert!(matches!(
        err,
        ExecError::Codegen(CodegenError::UnboundPlaceholder { .. })
    ));
    assert!(host.registry().is_empty());
}

fn places() -> RawTable {
    let strs = |ws: &[&str]| -> Vec<Scalar> {
        ws.iter().map(|w| Scalar::Str(w.to_string())).collect()
    };
    RawTable::new(vec![
        RawColumn::new("city", utf8(), strs(&["paris", "rome", "paris", "lyon"])),
        RawColumn::new("country", utf8(), strs(&["fr", "it", "it", "it"])),
    ])
    .unwrap()
}

fn count_on(column: &str) -> Binding {
    Binding::new()
        .attribute("KEY", AttributeBinding::new(column, utf8(), HashKind::Mix64))
        .annotation("AGG", Annotation::Count)
}

#[test]
fn loaded_units_sharing_a_name_run_independently() {
    let cfg = EngineConfig {
        rows_per_partition: 3,
        ..EngineConfig::default()
    };
    let loaded = TableLoader::new(cfg.load_config(), MemoryBudgetImpl::new(cfg.mem_cap_bytes))
        .unwrap()
        .load(&places())
        .unwrap();
    let mut host = Host::new(cfg).unwrap();
    let t = builtin("group_count").unwrap();

    let city_unit = host.generate(&t, &count_on("city")).unwrap();
    let country_unit = host.generate(&t, &count_on("country")).unwrap();
    let by_city = host.load(city_unit).unwrap();
    let by_country = host.load(country_unit).unwrap();
    assert_eq!(by_city.unit().unit_name(), by_country.unit().unit_name());

    let cities = host
        .run(by_city, loaded.context(2).unwrap())
        .unwrap()
        .consume()
        .unwrap();
    let countries = host
        .run(by_country, loaded.context(2).unwrap())
        .unwrap()
        .consume()
        .unwrap();

    let pairs = |out: &querygen_exec::QueryOutput| -> Vec<(Scalar, Scalar)> {
        out.rows().iter().map(|r| (r.key.clone(), r.value.clone())).collect()
    };
    assert_eq!(
        pairs(&cities),
        vec![
            (Scalar::Str("lyon".into()), Scalar::U64(1)),
            (Scalar::Str("paris".into()), Scalar::U64(2)),
            (Scalar::Str("rome".into()), Scalar::U64(1)),
        ]
    );
    assert_eq!(
        pairs(&countries),
        vec![
            (Scalar::Str("fr".into()), Scalar::U64(1)),
            (Scalar::Str("it".into()), Scalar::U64(3)),
        ]
    );
    assert_ne!(cities.manifest().fingerprint, countries.manifest().fingerprint);
}

#[test]
fn mmap_loads_in_one_directory_do_not_disturb_each_other() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = EngineConfig {
        rows_per_partition: 2,
        default_backend: BufferBackend::Mmap,
        mmap_dir: dir.path().to_string_lossy().into_owned(),
        ..EngineConfig::default()
    };
    let loader =
        TableLoader::new(cfg.load_config(), MemoryBudgetImpl::new(cfg.mem_cap_bytes)).unwrap();
    let words = loader.load(&word_table()).unwrap();
    let place_table = loader.load(&places()).unwrap();
    let again = loader.load(&word_table()).unwrap();
    assert_ne!(words.mmap_dir(), again.mmap_dir());

    let mut host = Host::new(cfg).unwrap();
    let t = builtin("group_count").unwrap();
    let first = host
        .execute(&t, &count_binding(HashKind::Fx), words.context(2).unwrap())
        .unwrap();
    let second = host
        .execute(&t, &count_binding(HashKind::Fx), again.context(2).unwrap())
        .unwrap();
    assert_eq!(first.rows(), second.rows());
    assert_eq!(first.get(&Scalar::Str("a".into())), Some(&Scalar::U64(3)));

    let cities = host
        .execute(&t, &count_on("city"), place_table.context(1).unwrap())
        .unwrap();
    assert_eq!(cities.get(&Scalar::Str("paris".into())), Some(&Scalar::U64(2)));
}
