#![cfg(test)]

// Property tests for GraphemeHash kept inside the crate so they can check
// the bucket structure through `assert_invariants` and `stats`.

use crate::error::KeyTypeError;
use crate::gc::Worklist;
use crate::grapheme::GraphemeString;
use crate::linear_hash::{GraphemeHash, KeyRef, TableConfig};
use proptest::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

// Stand-in for a managed reference: either a string or some other object.
#[derive(Clone, Debug, PartialEq)]
enum Obj {
    Str(Rc<GraphemeString>),
    Int(i64),
}

impl KeyRef for Obj {
    fn as_grapheme_str(&self) -> Option<&GraphemeString> {
        match self {
            Obj::Str(s) => Some(s),
            Obj::Int(_) => None,
        }
    }
}

fn key(s: &str) -> Obj {
    Obj::Str(Rc::new(GraphemeString::from_codepoints(s.chars().map(u32::from))))
}

// Pool-indexed operations so shrinking walks toward earlier keys.
#[derive(Clone, Debug)]
enum OpI {
    Bind(usize, i64),
    Lookup(usize),
    Delete(usize),
    BindInt(i64),
    Copy,
    Mark,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-d]{0,4}", 1..=12).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            4 => (idx.clone(), any::<i64>()).prop_map(|(i, v)| OpI::Bind(i, v)),
            2 => idx.clone().prop_map(OpI::Lookup),
            2 => idx.clone().prop_map(OpI::Delete),
            1 => any::<i64>().prop_map(OpI::BindInt),
            1 => Just(OpI::Copy),
            1 => Just(OpI::Mark),
        ];
        proptest::collection::vec(op, 1..120).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Property: state-machine equivalence against std::collections::HashMap.
// - bind returns the previous value exactly when the model had one.
// - lookup/delete parity; non-string keys are always TypeErrors.
// - at most one split per operation; every entry stays in its home bucket.
// - deep copies match the source and stay independent of later mutation.
// - mark reports 2 * count references.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario(), bits in 1u32..4) {
        let mut sut: GraphemeHash<Obj> = GraphemeHash::with_config(TableConfig { initial_bits: bits, max_load: 1 });
        let mut model: HashMap<String, i64> = HashMap::new();
        let mut snapshots: Vec<(GraphemeHash<Obj>, HashMap<String, i64>)> = Vec::new();

        for op in ops {
            let splits_before = sut.stats().splits;
            match op {
                OpI::Bind(i, v) => {
                    let k = &pool[i];
                    let old = sut.insert_or_update(key(k), Obj::Int(v)).unwrap();
                    prop_assert_eq!(old, model.insert(k.clone(), v).map(Obj::Int));
                }
                OpI::Lookup(i) => {
                    let k = &pool[i];
                    let got = sut.lookup(&key(k)).unwrap().cloned();
                    prop_assert_eq!(got, model.get(k).copied().map(Obj::Int));
                    prop_assert_eq!(sut.contains(&key(k)).unwrap(), model.contains_key(k));
                }
                OpI::Delete(i) => {
                    let k = &pool[i];
                    let got = sut.delete(&key(k)).unwrap().map(|(_, v)| v);
                    prop_assert_eq!(got, model.remove(k).map(Obj::Int));
                }
                OpI::BindInt(n) => {
                    prop_assert_eq!(sut.insert_or_update(Obj::Int(n), Obj::Int(n)), Err(KeyTypeError));
                    prop_assert_eq!(sut.lookup(&Obj::Int(n)), Err(KeyTypeError));
                    prop_assert_eq!(sut.delete(&Obj::Int(n)), Err(KeyTypeError));
                }
                OpI::Copy => {
                    let copy = sut.deep_copy();
                    copy.assert_invariants();
                    snapshots.push((copy, model.clone()));
                }
                OpI::Mark => {
                    let mut wl = Worklist::new();
                    sut.mark(&mut wl);
                    prop_assert_eq!(wl.len(), 2 * sut.count());
                }
            }
            prop_assert!(sut.stats().splits - splits_before <= 1);
            prop_assert_eq!(sut.count(), model.len());
            sut.assert_invariants();
        }

        let contents = |t: &GraphemeHash<Obj>| -> BTreeMap<Vec<i32>, Obj> {
            t.iter()
                .map(|(k, v)| {
                    let s = k.as_grapheme_str().expect("keys are strings");
                    (s.codes().collect(), v.clone())
                })
                .collect()
        };
        for (copy, expected) in &snapshots {
            let got = contents(copy);
            prop_assert_eq!(got.len(), expected.len());
            for (k, v) in expected {
                let codes: Vec<i32> = k.chars().map(|c| c as i32).collect();
                let want = Obj::Int(*v);
                prop_assert_eq!(got.get(&codes), Some(&want));
            }
        }
    }
}
