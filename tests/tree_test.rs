// ==========================================
// 配置树集成测试
// ==========================================
// 测试目标: 插槽挂树、后代遍历、重新赋值与句柄生命周期
// ==========================================

use kamayan_config::params::ParamWriter;
use kamayan_config::{ConfigError, ConfigNode, ConfigResult, ConfigTree, NodeRef, Slot};

struct Parent {
    c1: Slot<Child>,
    c2: Slot<Child>,
}

impl Parent {
    fn new() -> Self {
        Self {
            c1: Slot::new("Parent", "c1"),
            c2: Slot::new("Parent", "c2"),
        }
    }
}

impl ConfigNode for Parent {
    fn export_settings(&self, _writer: &mut ParamWriter<'_>) -> ConfigResult<()> {
        Ok(())
    }
}

struct Child {
    grandchild: Slot<Grandchild>,
}

impl Child {
    fn new() -> Self {
        Self {
            grandchild: Slot::new("Child", "grandchild"),
        }
    }
}

impl ConfigNode for Child {}

struct Grandchild;

impl ConfigNode for Grandchild {}

fn set_c1(parent: &NodeRef<Parent>, child: &NodeRef<Child>) -> ConfigResult<()> {
    parent.assign_slot(child, |p| &mut p.c1)
}

#[test]
fn test_descendants_follow_slot_assignments() {
    let tree = ConfigTree::new();
    let parent = tree.insert(Parent::new()).unwrap();
    let c1 = tree.insert(Child::new()).unwrap();
    let c2 = tree.insert(Child::new()).unwrap();
    let g1 = tree.insert(Grandchild).unwrap();

    set_c1(&parent, &c1).unwrap();
    parent.assign_slot(&c2, |p| &mut p.c2).unwrap();
    c1.assign_slot(&g1, |c| &mut c.grandchild).unwrap();

    let mut found = parent.descendants().unwrap();
    found.sort();
    let mut expected = vec![c1.id(), c2.id(), g1.id()];
    expected.sort();
    assert_eq!(found, expected);
    assert!(!found.contains(&parent.id()));

    assert_eq!(g1.parent().unwrap(), Some(c1.id()));
    assert_eq!(c1.parent().unwrap(), Some(parent.id()));
}

#[test]
fn test_reassigned_value_stays_while_held() {
    let tree = ConfigTree::new();
    let parent = tree.insert(Parent::new()).unwrap();
    let first = tree.insert(Child::new()).unwrap();
    let second = tree.insert(Child::new()).unwrap();
    let first_id = first.id();

    set_c1(&parent, &first).unwrap();
    set_c1(&parent, &second).unwrap();

    // 旧值仍被外部句柄持有，仍在父节点之下
    let found = parent.descendants().unwrap();
    assert!(found.contains(&first_id));
    assert!(found.contains(&second.id()));

    drop(first);
    let found = parent.descendants().unwrap();
    assert!(!found.contains(&first_id));
    assert!(found.contains(&second.id()));
    assert!(!tree.contains(first_id));
}

#[test]
fn test_slot_holds_value_after_handle_dropped() {
    let tree = ConfigTree::new();
    let parent = tree.insert(Parent::new()).unwrap();
    let child = tree.insert(Child::new()).unwrap();
    let child_id = child.id();
    set_c1(&parent, &child).unwrap();
    drop(child);

    assert!(tree.contains(child_id));
    let held = parent.with(|p| p.c1.get().cloned()).unwrap().unwrap();
    assert_eq!(held.id(), child_id);
}

#[test]
fn test_unset_slot_is_not_configured() {
    let tree = ConfigTree::new();
    let parent = tree.insert(Parent::new()).unwrap();

    let err = parent.with(|p| p.c2.get().map(|_| ())).unwrap().unwrap_err();
    match err {
        ConfigError::NotConfigured { owner, slot } => {
            assert_eq!(owner, "Parent");
            assert_eq!(slot, "c2");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_describe_indents_two_spaces_per_level() {
    let tree = ConfigTree::new();
    let parent = tree.insert_under(tree.root_id(), Parent::new()).unwrap();
    let child = tree.insert(Child::new()).unwrap();
    let grandchild = tree.insert(Grandchild).unwrap();
    set_c1(&parent, &child).unwrap();
    child.assign_slot(&grandchild, |c| &mut c.grandchild).unwrap();

    assert_eq!(
        tree.describe(tree.root_id()).unwrap(),
        "RootNode\n  Parent\n    Child\n      Grandchild"
    );
}

#[test]
fn test_anchor_redirects_slot_children() {
    let tree = ConfigTree::new();
    let root = tree.root();
    let parent = tree.insert(Parent::new()).unwrap();
    let child = tree.insert(Child::new()).unwrap();
    parent.set_anchor(Some(root.id())).unwrap();

    set_c1(&parent, &child).unwrap();
    assert_eq!(child.parent().unwrap(), Some(root.id()));
}

#[test]
fn test_anchor_reaches_subtree_assigned_earlier() {
    let tree = ConfigTree::new();
    let root = tree.root();
    tree.set_anchor(root.id(), Some(root.id())).unwrap();

    let parent = tree.insert(Parent::new()).unwrap();
    let child = tree.insert(Child::new()).unwrap();
    let grandchild = tree.insert(Grandchild).unwrap();
    set_c1(&parent, &child).unwrap();
    child.assign_slot(&grandchild, |c| &mut c.grandchild).unwrap();
    assert_eq!(grandchild.parent().unwrap(), Some(child.id()));

    tree.adopt(root.id(), parent.id()).unwrap();
    assert_eq!(parent.parent().unwrap(), Some(root.id()));
    assert_eq!(child.parent().unwrap(), Some(root.id()));
    assert_eq!(grandchild.parent().unwrap(), Some(root.id()));
    assert_eq!(
        tree.descendants(root.id()).unwrap(),
        vec![parent.id(), child.id(), grandchild.id()]
    );

    // 之后再赋值的插槽同样直接挂到根下
    let late = tree.insert(Child::new()).unwrap();
    parent.assign_slot(&late, |p| &mut p.c2).unwrap();
    assert_eq!(late.parent().unwrap(), Some(root.id()));
}

#[test]
fn test_attach_rejects_cycles() {
    let tree = ConfigTree::new();
    let parent = tree.insert(Parent::new()).unwrap();
    let child = tree.insert(Child::new()).unwrap();
    set_c1(&parent, &child).unwrap();

    assert!(matches!(
        parent.attach_to(child.id()),
        Err(ConfigError::InvalidConfiguration(_))
    ));
}

#[test]
fn test_default_export_names_concrete_type() {
    let tree = ConfigTree::new();
    let child = tree.insert(Child::new()).unwrap();
    let err = child
        .with(|c| {
            let mut router = kamayan_config::ParameterRouter::new(Box::new(
                kamayan_config::UnitCollection::new(),
            ));
            let mut writer = router.writer(c.type_name());
            c.export_settings(&mut writer)
        })
        .unwrap()
        .unwrap_err();

    match err {
        ConfigError::NotImplemented { type_name } => assert_eq!(type_name, "Child"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_finalize_invalidates_handles() {
    let tree = ConfigTree::new();
    let child = tree.insert(Child::new()).unwrap();
    tree.finalize();
    assert!(!child.is_live());
    assert!(matches!(child.with(|_| ()), Err(ConfigError::StaleNode { .. })));
}
