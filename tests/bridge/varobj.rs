use crate::common::Bridge;
use mibridge::error::Error;
use mibridge::varobj::handle::{DisplayFormat, VarScope};
use mibridge::varobj::{VarCache, VarChange};

#[test]
fn test_variable_tree() {
    let bridge = Bridge::start(vec![
        (
            r#"-var-create --thread 1 --frame 0 var1 * "list""#,
            vec![
                r#"^done,name="var1",numchild="2",value="{...}",type="struct list",thread-id="1",has_more="0""#,
            ],
        ),
        (
            r#"-var-list-children --all-values "var1""#,
            vec![
                r#"^done,numchild="2",children=[child={name="var1.head",exp="head",numchild="1",value="0x4052a0",type="struct node *",thread-id="1"},child={name="var1.len",exp="len",numchild="0",value="3",type="size_t",thread-id="1"}],has_more="0""#,
            ],
        ),
        (
            "-var-set-format var1.len binary",
            vec![r#"^done,format="binary",value="11""#],
        ),
        (
            "-var-update --all-values *",
            vec![
                r#"^done,changelist=[{name="var1.len",value="100",in_scope="true",type_changed="false",has_more="0"}]"#,
            ],
        ),
    ]);
    let session = bridge.session.as_ref();
    let mut cache = VarCache::new(1000);

    let list = cache
        .create(session, "var1", "list", VarScope::new(1, 0))
        .unwrap();
    assert_eq!(list.reference_number(), 1000);
    assert_eq!(list.thread_id, Some(1));

    let children = cache.list_children(session, "var1").unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].display_name, "head");
    assert_eq!(children[0].value, "0x4052A0");
    assert_eq!(children[0].reference_number(), 1001);
    assert_eq!(children[1].display_name, "len");
    assert_eq!(children[1].reference_number(), 0);
    assert_eq!(cache.by_reference(1001).unwrap().name, "var1.head");

    assert_eq!(
        cache
            .set_format(session, "var1.len", DisplayFormat::Binary)
            .unwrap(),
        "0b11"
    );

    let changes = cache.bulk_update(session).unwrap();
    assert_eq!(
        changes,
        vec![VarChange {
            name: "var1.len".to_string(),
            value: Some("0b100".to_string()),
            in_scope: true,
            type_changed: false,
        }]
    );

    let names: Vec<_> = cache.handles().map(|h| h.name.as_str()).collect();
    assert_eq!(names, vec!["var1", "var1.head", "var1.len"]);
    assert_eq!(bridge.commands().len(), 4);
    assert!(bridge.commands()[3].starts_with("4-var-update"));
}

#[test]
fn test_access_specifiers_are_transparent() {
    let bridge = Bridge::start(vec![
        (
            r#"-var-create var1 * "shape""#,
            vec![r#"^done,name="var1",numchild="2",value="{...}",type="Circle""#],
        ),
        (
            r#"-var-list-children --all-values "var1""#,
            vec![
                r#"^done,numchild="2",children=[child={name="var1.Shape",exp="Shape",numchild="1",value="{...}",type="Shape"},child={name="var1.protected",exp="protected",numchild="1"}]"#,
            ],
        ),
        (
            r#"-var-list-children --all-values "var1.protected""#,
            vec![
                r#"^done,numchild="1",children=[child={name="var1.protected.radius",exp="radius",numchild="0",value="2.5",type="double"}]"#,
            ],
        ),
    ]);
    let session = bridge.session.as_ref();
    let mut cache = VarCache::default();

    cache
        .create(session, "var1", "shape", VarScope::default())
        .unwrap();
    let children = cache.list_children(session, "var1").unwrap();

    let names: Vec<_> = children.iter().map(|c| c.display_name.as_str()).collect();
    assert_eq!(names, vec!["Shape", "radius"]);
    assert!(cache.by_name("var1.protected").is_none());
    assert_eq!(cache.by_name("var1.protected.radius").unwrap().value, "2.5");
}

#[test]
fn test_backend_failures() {
    let bridge = Bridge::start(vec![(
        r#"-var-create var1 * "missing""#,
        vec![r#"^error,msg="-var-create: unable to create variable object""#],
    )]);
    let session = bridge.session.as_ref();
    let mut cache = VarCache::default();

    let err = cache
        .create(session, "var1", "missing", VarScope::default())
        .unwrap_err();
    assert!(matches!(err, Error::Backend(_)));
    assert!(cache.is_empty());

    // not scripted, the debugger goes away
    let err = cache
        .create(session, "var2", "other", VarScope::default())
        .unwrap_err();
    assert!(matches!(err, Error::SessionClosed));
    assert!(err.is_fatal());
}
