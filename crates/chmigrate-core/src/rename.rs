//! Generic rename detection (§4.4), parameterized over any object type
//! that exposes name/cluster/equality-modulo-name — rather than one
//! hand-written rename pass per object type (§9 "Generic algorithms
//! across object types").

use std::collections::BTreeMap;

/// The capability set an object type exposes to participate in rename
/// detection: a qualified name, a cluster (used by callers that need to
/// validate renamed pairs, not by the algorithm itself), and a predicate
/// for "identical but for the name".
pub trait Renamable {
    fn qualified_name(&self) -> &str;
    fn cluster(&self) -> Option<&str>;
    fn properties_match(&self, other: &Self) -> bool;
}

/// The result of running [`detect_renames`]: matched pairs plus whatever
/// is left over for the create/drop passes.
pub struct RenameResult<'a, T> {
    pub renames: Vec<(String, String)>,
    pub remaining_current: BTreeMap<String, &'a T>,
    pub remaining_target: BTreeMap<String, &'a T>,
}

/// Implements §4.4 exactly: for every `current` key absent from `target`
/// (sorted), scan the `target` keys absent from `current` (sorted, not yet
/// matched) and pair the first one whose properties match. Both inputs are
/// the full maps; only the unmatched subsets actually participate.
#[must_use]
pub fn detect_renames<'a, T: Renamable>(
    current: &'a BTreeMap<String, T>,
    target: &'a BTreeMap<String, T>,
) -> RenameResult<'a, T> {
    let mut remaining_current: BTreeMap<String, &T> = current
        .iter()
        .filter(|(name, _)| !target.contains_key(*name))
        .map(|(name, info)| (name.clone(), info))
        .collect();
    let mut remaining_target: BTreeMap<String, &T> = target
        .iter()
        .filter(|(name, _)| !current.contains_key(*name))
        .map(|(name, info)| (name.clone(), info))
        .collect();

    let mut renames = Vec::new();
    let current_only: Vec<String> = remaining_current.keys().cloned().collect();
    for from in current_only {
        let Some(current_info) = remaining_current.get(&from).copied() else {
            continue;
        };
        let target_only: Vec<String> = remaining_target.keys().cloned().collect();
        let mut matched_to = None;
        for to in target_only {
            if let Some(target_info) = remaining_target.get(&to).copied() {
                if current_info.properties_match(target_info) {
                    matched_to = Some(to);
                    break;
                }
            }
        }
        if let Some(to) = matched_to {
            renames.push((from.clone(), to.clone()));
            remaining_current.remove(&from);
            remaining_target.remove(&to);
        }
    }

    RenameResult { renames, remaining_current, remaining_target }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Obj {
        name: String,
        payload: u32,
    }

    impl Renamable for Obj {
        fn qualified_name(&self) -> &str {
            &self.name
        }
        fn cluster(&self) -> Option<&str> {
            None
        }
        fn properties_match(&self, other: &Self) -> bool {
            self.payload == other.payload
        }
    }

    #[test]
    fn rename_preference_s5() {
        let mut current = BTreeMap::new();
        current.insert("t.a".to_string(), Obj { name: "t.a".into(), payload: 1 });
        let mut target = BTreeMap::new();
        target.insert("t.b".to_string(), Obj { name: "t.b".into(), payload: 1 });

        let result = detect_renames(&current, &target);
        assert_eq!(result.renames, vec![("t.a".to_string(), "t.b".to_string())]);
        assert!(result.remaining_current.is_empty());
        assert!(result.remaining_target.is_empty());
    }

    #[test]
    fn mismatched_properties_fall_through_to_create_drop() {
        let mut current = BTreeMap::new();
        current.insert("t.a".to_string(), Obj { name: "t.a".into(), payload: 1 });
        let mut target = BTreeMap::new();
        target.insert("t.b".to_string(), Obj { name: "t.b".into(), payload: 2 });

        let result = detect_renames(&current, &target);
        assert!(result.renames.is_empty());
        assert_eq!(result.remaining_current.len(), 1);
        assert_eq!(result.remaining_target.len(), 1);
    }
}
