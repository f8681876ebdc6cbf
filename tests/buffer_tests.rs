//! Partitioned buffers: both backends expose identical contents.

use querygen_buffer::{
    typed_values, Error, MemoryBudgetImpl, ParBuffer, ParMMapBuffer, ParMemoryBuffer,
};
use querygen_core::config::SyncPolicy;
use querygen_core::schema::PhysicalType;
use querygen_core::types::PhysicalValue;

fn fill(buf: &mut dyn ParBuffer, values: &[PhysicalValue]) {
    for v in values {
        buf.append(*v).unwrap();
    }
    buf.seal().unwrap();
}

fn samples(ty: PhysicalType, n: usize) -> Vec<PhysicalValue> {
    (0..n)
        .map(|i| match ty {
            PhysicalType::U8 => PhysicalValue::U8((i % 2) as u8),
            PhysicalType::I32 => PhysicalValue::I32(i as i32 - 50),
            PhysicalType::I64 => PhysicalValue::I64((i as i64) * -1_000_000_007),
            PhysicalType::U32 => PhysicalValue::U32(i as u32 * 3),
            PhysicalType::U64 => PhysicalValue::U64(u64::MAX - i as u64),
            PhysicalType::F32 => PhysicalValue::F32(i as f32 * 0.5),
            PhysicalType::F64 => PhysicalValue::F64(i as f64 / 7.0),
        })
        .collect()
}

#[test]
fn memory_and_mmap_hold_identical_values() {
    let dir = tempfile::tempdir().unwrap();
    let budget = MemoryBudgetImpl::new(1 << 20);

    for ty in PhysicalType::ALL {
        let values = samples(ty, 100);

        let mut mem = ParMemoryBuffer::new(&budget, ty, values.len()).unwrap();
        let path = dir.path().join(format!("{}.qgc", ty.tag()));
        let mut map = ParMMapBuffer::create(&path, ty, values.len(), SyncPolicy::OnSeal).unwrap();
        fill(&mut mem, &values);
        fill(&mut map, &values);

        assert_eq!(mem.len(), values.len());
        assert_eq!(map.len(), values.len());
        for (i, v) in values.iter().enumerate() {
            assert_eq!(mem.at(i).unwrap(), *v);
            assert_eq!(map.at(i).unwrap(), *v);
        }
        assert_eq!(mem.as_bytes(), map.as_bytes());

        let reopened = ParMMapBuffer::open(&path).unwrap();
        assert_eq!(reopened.as_bytes(), mem.as_bytes());
        assert!(reopened.is_sealed());
    }
}

#[test]
fn typed_reads_match_on_both_backends() {
    let dir = tempfile::tempdir().unwrap();
    let budget = MemoryBudgetImpl::new(1 << 16);
    let values = samples(PhysicalType::I64, 33);

    let mut mem = ParMemoryBuffer::from_values(&budget, PhysicalType::I64, &values).unwrap();
    mem.seal().unwrap();
    let mut map = ParMMapBuffer::create(
        dir.path().join("i64.qgc"),
        PhysicalType::I64,
        values.len(),
        SyncPolicy::EveryRows(8),
    )
    .unwrap();
    fill(&mut map, &values);

    let a: Vec<i64> = typed_values::<i64>(&mem).unwrap().collect();
    let b: Vec<i64> = typed_values::<i64>(&map).unwrap().collect();
    assert_eq!(a, b);
    assert_eq!(a.len(), 33);
    assert!(typed_values::<u32>(&mem).is_err());
}

#[test]
fn reading_past_the_end_is_out_of_range() {
    let dir = tempfile::tempdir().unwrap();
    let budget = MemoryBudgetImpl::new(1 << 16);
    let values = samples(PhysicalType::U32, 5);

    let mut mem = ParMemoryBuffer::new(&budget, PhysicalType::U32, 8).unwrap();
    let mut map =
        ParMMapBuffer::create(dir.path().join("u32.qgc"), PhysicalType::U32, 8, SyncPolicy::Manual)
            .unwrap();
    fill(&mut mem, &values);
    fill(&mut map, &values);

    for buf in [&mem as &dyn ParBuffer, &map] {
        assert!(matches!(buf.at(5), Err(Error::OutOfRange { row: 5, len: 5 })));
        assert!(buf.at(4).is_ok());
    }
}

#[test]
fn sealed_buffers_reject_appends() {
    let budget = MemoryBudgetImpl::new(1 << 10);
    let mut mem = ParMemoryBuffer::new(&budget, PhysicalType::U8, 4).unwrap();
    mem.append(PhysicalValue::U8(1)).unwrap();
    mem.seal().unwrap();
    assert!(matches!(
        mem.append(PhysicalValue::U8(2)),
        Err(Error::SealedBuffer)
    ));
    assert_eq!(mem.len(), 1);
}

#[test]
fn memory_buffers_are_charged_to_the_budget() {
    let budget = MemoryBudgetImpl::new(64);
    let held = ParMemoryBuffer::new(&budget, PhysicalType::U64, 6).unwrap();
    assert_eq!(budget.remaining_bytes(), 16);
    assert!(matches!(
        ParMemoryBuffer::new(&budget, PhysicalType::U64, 3),
        Err(Error::BudgetExceeded { .. })
    ));
    drop(held);
    assert_eq!(budget.remaining_bytes(), 64);
}
