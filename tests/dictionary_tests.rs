//! Trie dictionary behavior through the public API.

use std::collections::HashSet;

use querygen_trie::{Error, SurrogateKey, Trie};

#[test]
fn interned_strings_round_trip_and_get_distinct_keys() {
    let words = ["", "a", "ab", "abc", "b", "ba", "über", "日本", "a b", "ab"];
    let mut trie = Trie::new();

    let keys: Vec<SurrogateKey> = words.iter().map(|w| trie.intern(w).unwrap()).collect();

    for (w, k) in words.iter().zip(&keys) {
        assert_eq!(trie.lookup(*k).unwrap(), *w);
    }

    let distinct: HashSet<&str> = words.iter().copied().collect();
    let distinct_keys: HashSet<SurrogateKey> = keys.iter().copied().collect();
    assert_eq!(distinct.len(), distinct_keys.len());
    assert_eq!(trie.len(), distinct.len());

    // "ab" appears twice and must map to the same key both times.
    assert_eq!(keys[2], keys[9]);
}

#[test]
fn lookup_of_unissued_key_fails() {
    let mut trie = Trie::new();
    let k = trie.intern("only").unwrap();

    let never = SurrogateKey::new(k.get() + 1000);
    assert_eq!(trie.lookup(never), Err(Error::UnknownKey(never)));

    let empty = Trie::new();
    assert!(matches!(
        empty.lookup(SurrogateKey::new(0)),
        Err(Error::UnknownKey(_))
    ));
}

#[test]
fn sealed_dictionary_still_resolves_known_values() {
    let mut trie = Trie::from_strings(["x", "y", "x"]).unwrap();
    trie.seal();

    assert!(trie.is_sealed());
    assert_eq!(trie.len(), 2);
    let y = trie.get("y").unwrap();
    assert_eq!(trie.lookup(y).unwrap(), "y");
    assert!(matches!(trie.intern("y"), Err(Error::Sealed(_))));
    assert!(trie.get("z").is_none());
}

#[test]
fn prefix_search_is_sorted_and_complete() {
    let trie = Trie::from_strings(["apple", "b", "app", "apply", "ape", "banana"]).unwrap();
    let found: Vec<String> = trie.prefix_search("ap").map(|(s, _)| s).collect();
    assert_eq!(found, vec!["ape", "app", "apple", "apply"]);
    assert_eq!(trie.prefix_search("zz").count(), 0);
}
