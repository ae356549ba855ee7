use impact_map::{ResolveOptions, resolve_mapping};
use impact_model::{Approval, FieldMapping, MappingEntry};
use proptest::prelude::*;

fn mapping_strategy() -> impl Strategy<Value = FieldMapping> {
    proptest::collection::vec(
        ("[a-e]{1,2}", proptest::option::of("[A-Z]{1,3}"), any::<bool>()),
        0..12,
    )
    .prop_map(|entries| {
        entries
            .into_iter()
            .map(|(input, output, approved)| {
                let approval = if approved {
                    Approval::Approved
                } else {
                    Approval::NotApproved
                };
                (input, MappingEntry::new(output, approval))
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn stored_entries_win_without_overwrite(new in mapping_strategy(), source in mapping_strategy()) {
        let options = ResolveOptions::default().with_remove_unapproved_source(false);
        let resolved = resolve_mapping(&new, &source, options);
        for (input, entry) in resolved.iter() {
            let expected = source.get(input).or_else(|| new.get(input)).unwrap();
            prop_assert_eq!(entry, expected);
        }
        prop_assert!(new.iter().all(|(input, _)| resolved.contains(input)));
        prop_assert!(source.iter().all(|(input, _)| resolved.contains(input)));
    }

    #[test]
    fn new_entries_win_with_overwrite(new in mapping_strategy(), source in mapping_strategy()) {
        let options = ResolveOptions::default()
            .with_overwrite(true)
            .with_remove_unapproved_source(false);
        let resolved = resolve_mapping(&new, &source, options);
        for (input, entry) in resolved.iter() {
            let expected = new.get(input).or_else(|| source.get(input)).unwrap();
            prop_assert_eq!(entry, expected);
        }
    }
}

#[test]
fn approved_stored_value_survives_fresh_guess() {
    let source: FieldMapping = [(
        "Yess".to_string(),
        MappingEntry::new(Some("Y".into()), Approval::Approved),
    )]
    .into_iter()
    .collect();
    let new: FieldMapping = [
        ("Yess".to_string(), MappingEntry::new(Some("yes".into()), Approval::NotApproved)),
        ("Nah".to_string(), MappingEntry::new(None, Approval::NotApproved)),
    ]
    .into_iter()
    .collect();

    let kept = resolve_mapping(&new, &source, ResolveOptions::default());
    assert_eq!(kept.get("Yess").unwrap().output.as_deref(), Some("Y"));
    assert_eq!(kept.unapproved_inputs(), vec!["Nah"]);

    let replaced = resolve_mapping(&new, &source, ResolveOptions::default().with_overwrite(true));
    assert_eq!(replaced.get("Yess").unwrap().output.as_deref(), Some("yes"));
}
