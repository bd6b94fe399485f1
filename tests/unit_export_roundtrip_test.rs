use admind::model::export::{Export, ExportList, IscsiAclEntry, IscsiFilterPolicy};
use proptest::prelude::*;
use uuid::Uuid;

fn uuid_strategy() -> impl Strategy<Value = Uuid> {
    any::<[u8; 16]>().prop_map(Uuid::from_bytes)
}

fn policy_strategy() -> impl Strategy<Value = IscsiFilterPolicy> {
    prop_oneof![
        Just(IscsiFilterPolicy::AcceptAll),
        Just(IscsiFilterPolicy::RejectAll),
        Just(IscsiFilterPolicy::List),
    ]
}

fn acl_entry_strategy() -> impl Strategy<Value = IscsiAclEntry> {
    ("[a-z.:0-9]{1,20}", any::<bool>())
        .prop_map(|(iqn_pattern, accept)| IscsiAclEntry { iqn_pattern, accept })
}

fn export_strategy() -> impl Strategy<Value = Export> {
    prop_oneof![
        (uuid_strategy(), "[a-zA-Z0-9/_-]{1,32}").prop_map(|(volume_uuid, path)| Export::Bdev {
            volume_uuid,
            path,
        }),
        (
            uuid_strategy(),
            any::<u32>(),
            "iqn\\.[a-z0-9.-]{1,20}",
            policy_strategy(),
            prop::collection::vec(acl_entry_strategy(), 0..4),
        )
            .prop_map(|(volume_uuid, lun, iqn, policy, acl)| Export::Iscsi {
                volume_uuid,
                lun,
                iqn,
                policy,
                acl,
            }),
    ]
}

fn export_list_strategy() -> impl Strategy<Value = ExportList> {
    prop::collection::vec(export_strategy(), 0..6).prop_map(|exports| {
        let mut list = ExportList::new();
        for e in exports {
            list.push(e);
        }
        list
    })
}

proptest! {
    #[test]
    fn export_list_round_trips_through_json(list in export_list_strategy()) {
        let text = list.to_json().expect("serialization must not fail");
        let parsed = ExportList::from_json(&text).expect("a just-serialized document must parse");
        prop_assert_eq!(parsed, list);
    }
}

#[test]
fn push_and_remove_bump_the_version_monotonically() {
    let mut list = ExportList::new();
    assert_eq!(list.version, 0);
    let uuid = Uuid::from_bytes([7; 16]);
    list.push(Export::Bdev {
        volume_uuid: uuid,
        path: "/dev/exa/g0/v0".into(),
    });
    assert_eq!(list.version, 1);
    assert!(list.remove_for_volume(uuid));
    assert_eq!(list.version, 2);
    assert!(!list.remove_for_volume(uuid), "removing twice is a no-op");
    assert_eq!(list.version, 2);
}
