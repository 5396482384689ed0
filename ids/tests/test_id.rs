#![allow(missing_docs)] // test only
use keyset_ids::*;

use rand::{rngs::SmallRng, Rng, SeedableRng};

#[cfg(miri)]
const N: usize = 32;
#[cfg(not(miri))]
const N: usize = 1024;

#[derive(Id, Debug)]
#[repr(transparent)]
struct SmallId(u8);

#[derive(Id, Debug)]
#[repr(transparent)]
struct NamedId {
    raw: u32,
}

#[derive(Id, Debug)]
#[repr(transparent)]
struct NestedId(SmallId);

fn basic_tests<T: Id>() {
    for index in 0..=T::MAX_ID_INDEX.min(N) {
        let id = T::from_id_index(index);
        assert_eq!(id.id_index(), index);
        assert_eq!(T::try_from_id_index(index), Some(id));
    }

    for index in T::MAX_ID_INDEX.saturating_sub(N)..=T::MAX_ID_INDEX {
        assert_eq!(T::from_id_index(index).id_index(), index);
    }

    if let Some(beyond) = T::MAX_ID_INDEX.checked_add(1) {
        assert_eq!(T::try_from_id_index(beyond), None);
    }

    assert_eq!(T::MIN_ID.id_index(), 0);
    assert_eq!(T::MAX_ID.id_index(), T::MAX_ID_INDEX);

    let mut rng = SmallRng::seed_from_u64(0x5eed);
    for _ in 0..N {
        let i = rng.gen_range(0..=T::MAX_ID_INDEX.min(1 << 20));
        let j = rng.gen_range(0..=T::MAX_ID_INDEX.min(1 << 20));
        let (id_i, id_j) = (T::from_id_index(i), T::from_id_index(j));
        assert_eq!(i < j, id_i < id_j);
        assert_eq!(i == j, id_i == id_j);
        assert_eq!(i.cmp(&j), id_i.cmp(&id_j));
    }
}

#[test]
fn primitive_ids() {
    basic_tests::<u8>();
    basic_tests::<u16>();
    basic_tests::<u32>();
    basic_tests::<u64>();
    basic_tests::<usize>();
}

#[test]
fn derived_ids() {
    basic_tests::<SmallId>();
    basic_tests::<NamedId>();
    basic_tests::<NestedId>();

    assert_eq!(SmallId::MAX_ID_INDEX, 255);
    assert_eq!(NestedId::MAX_ID, NestedId(SmallId(255)));
    assert_eq!(NamedId::from_id_index(7), NamedId { raw: 7 });
}

#[test]
#[should_panic]
fn out_of_range_index_panics() {
    SmallId::from_id_index(256);
}

#[test]
fn alloc_is_strictly_increasing() {
    let alloc = IdAlloc::<NamedId>::new();
    let mut last = alloc.alloc().unwrap();
    for _ in 0..N {
        let next = alloc.alloc().unwrap();
        assert!(next > last);
        last = next;
    }
    let range = alloc.alloc_range(4).unwrap();
    assert_eq!(range.start, last.id_index() + 1);
    assert_eq!(alloc.peek().unwrap().id_index(), range.end);
    assert_eq!(alloc.allocated(), N + 5);
}

#[test]
fn alloc_reports_exhaustion() {
    let alloc = IdAlloc::<SmallId>::new();
    for index in 0..=255 {
        assert_eq!(alloc.alloc().unwrap().id_index(), index);
    }
    assert_eq!(alloc.alloc(), Err(IdAllocError));
    assert_eq!(alloc.alloc(), Err(IdAllocError));
}

#[test]
fn alloc_shared_between_threads() {
    let alloc = IdAlloc::<u64>::new();
    let alloc = &alloc;
    let mut all = std::thread::scope(|scope| {
        let workers: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(move || (0..N).map(|_| alloc.alloc().unwrap()).collect::<Vec<_>>())
            })
            .collect();
        workers
            .into_iter()
            .flat_map(|worker| worker.join().unwrap())
            .collect::<Vec<_>>()
    });
    all.sort_unstable();
    all.dedup();
    assert_eq!(all.len(), 4 * N);
}

#[test]
fn id_vec_indexing() {
    let mut vec: IdVec<SmallId, &str> = IdVec::default();
    assert!(vec.is_empty());
    assert_eq!(vec.next_key(), Some(SmallId(0)));

    let (a, _) = vec.push("a");
    let (b, value) = vec.push("b");
    *value = "bee";

    assert_eq!(vec.len(), 2);
    assert_eq!(vec[a], "a");
    assert_eq!(vec.get(b), Some(&"bee"));
    assert_eq!(vec.get(SmallId(2)), None);
    assert_eq!(vec.keys().collect::<Vec<_>>(), [a, b]);

    {
        let (value_b, value_a) = vec.get_pair_mut(b, a).unwrap();
        std::mem::swap(value_a, value_b);
    }
    assert_eq!(vec.values(), ["bee", "a"]);
    assert!(vec.get_pair_mut(a, a).is_none());

    for (key, value) in vec.iter_mut() {
        if key == a {
            *value = "first";
        }
    }
    assert_eq!(vec.iter().next(), Some((a, &"first")));

    vec.clear();
    assert!(vec.is_empty());
}

#[test]
#[should_panic]
fn id_vec_push_beyond_key_range_panics() {
    let mut vec: IdVec<SmallId, ()> = IdVec::with_capacity(256);
    for _ in 0..=256 {
        vec.push(());
    }
}
