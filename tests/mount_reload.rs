//! End-to-end: descriptor tree → engine → mount → reload continuity.
//!
//! Exercises the full data flow from the public surface only: a
//! descriptor tree is built into host nodes, refs are harvested, the
//! root is mounted through a starter, and the reload coordinator carries
//! the instance across cold restarts and a warm resume.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;

use sprig_ui::{
    AttrValue, Child, Disposer, Engine, Host, ManualScheduler, MemoryChannel, MemoryHost, Props,
    ReloadCoordinator, Snapshot, Tag, fragment, hmr, mount,
};

fn counter_snapshot(count: i64) -> Snapshot {
    let mut map = Snapshot::new();
    map.insert("count".to_string(), json!(count));
    map
}

/// A small app view: a header component wrapped around a list fragment.
fn build_app(engine: &Engine<MemoryHost>) -> sprig_ui::MemoryNode {
    let header = engine.build(
        Tag::component(|props| fragment(props)),
        Props::new()
            .child(Child::Built(engine.build(
                "h1".into(),
                Props::new().attr("ref", "title").child("sprig"),
                None,
            )))
            .child(Child::Built(engine.build(
                "p".into(),
                Props::new()
                    .attr("class", AttrValue::List(vec![
                        AttrValue::from("intro"),
                        AttrValue::Null,
                        AttrValue::from("lead"),
                    ]))
                    .child("hello"),
                None,
            ))),
        None,
    );

    engine
        .build(
            "div".into(),
            Props::new()
                .attr("id", "root")
                .child(Child::Built(header)),
            None,
        )
        .into_node()
        .unwrap()
}

#[test]
fn test_build_mount_and_query_refs() {
    let host = Rc::new(MemoryHost::new());
    let engine = Rc::new(Engine::new(Rc::clone(&host)));

    let app = host.detached("body");
    host.register("#app", app.clone());

    let mounts = Rc::new(RefCell::new(0u32));
    let mounts2 = mounts.clone();
    let engine2 = Rc::clone(&engine);
    let host2 = Rc::clone(&host);
    let starter = mount(Rc::clone(&host), "#app".into(), move |target| {
        mounts2.replace_with(|n| *n + 1);
        let root = build_app(&engine2);
        host2.append_child(&target, &root);
        Box::new(|| {}) as Disposer
    });

    let disposer = starter().expect("mount target registered");
    assert_eq!(*mounts.borrow(), 1);

    // tree shape: body > div#root > (h1, p)
    let root = &app.children()[0];
    assert_eq!(root.attr("id").as_deref(), Some("root"));
    assert_eq!(root.children().len(), 2);
    assert_eq!(root.text_content(), "sprighello");
    assert_eq!(
        root.children()[1].attr("class").as_deref(),
        Some("intro lead")
    );

    // ref harvested during the build pass
    let titles = engine.ref_nodes("title");
    assert_eq!(titles.len(), 1);
    assert_eq!(titles[0].text_content(), "sprig");

    disposer();
}

#[test]
fn test_reload_cycles_across_instances() {
    let host = Rc::new(MemoryHost::new());
    let app = host.detached("body");
    host.register("#app", app.clone());

    let scheduler = Rc::new(ManualScheduler::new());
    let channel = Rc::new(MemoryChannel::new());
    let coordinator = ReloadCoordinator::new(Some(channel.clone()), scheduler.clone());

    let log: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));

    let make_starter = |name: &'static str| {
        let log = log.clone();
        let host = Rc::clone(&host);
        mount(Rc::clone(&host), "#app".into(), move |_target| {
            log.borrow_mut().push(format!("start:{name}"));
            let log = log.clone();
            Box::new(move || log.borrow_mut().push(format!("dispose:{name}"))) as Disposer
        })
    };

    // first instantiation: cold start
    hmr(&coordinator, make_starter("v1"), counter_snapshot(0), |_| {
        panic!("first cycle must not warm-resume")
    });
    scheduler.fire_all();
    assert_eq!(*log.borrow(), vec!["start:v1"]);

    // state shape changed: cold restart, teardown first
    hmr(&coordinator, make_starter("v2"), counter_snapshot(7), |_| {
        panic!("changed snapshot must not warm-resume")
    });
    scheduler.fire_all();
    assert_eq!(*log.borrow(), vec!["start:v1", "dispose:v1", "start:v2"]);

    // unrelated edit: same shape as the very first observation, so the
    // current in-memory state is re-applied and nothing restarts
    let resumed = Rc::new(RefCell::new(None));
    let resumed2 = resumed.clone();
    hmr(
        &coordinator,
        make_starter("v3"),
        counter_snapshot(0),
        move |stored| *resumed2.borrow_mut() = Some(stored),
    );
    scheduler.fire_all();
    assert_eq!(
        resumed.borrow().as_ref().unwrap().get("count"),
        Some(&json!(7))
    );
    assert_eq!(*log.borrow(), vec!["start:v1", "dispose:v1", "start:v2"]);

    // host swaps modules: one-shot teardown
    channel.notify_before_reload();
    assert_eq!(
        *log.borrow(),
        vec!["start:v1", "dispose:v1", "start:v2", "dispose:v2"]
    );
}
