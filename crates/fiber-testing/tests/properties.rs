use std::cell::RefCell;

use fiber_core::{
    element, CommitSummary, EffectTag, Element, EventHandler, Fiber, Hooks, Mutation, Props,
    PropValue, Setter,
};
use fiber_macros::component;
use fiber_testing::{ExhaustedDeadline, TestRenderer};

fn childless_list(items: usize) -> Element {
    element("ul")
        .children((0..items).map(|index| element("li").prop("index", index as i64)))
        .build()
}

fn child_tags(renderer: &TestRenderer) -> Vec<(String, EffectTag)> {
    let scheduler = renderer.scheduler();
    let tree = scheduler.fibers();
    let list = scheduler
        .committed_root()
        .and_then(|root| tree.get(root))
        .and_then(Fiber::child)
        .expect("list fiber");
    tree.children(list)
        .filter_map(|id| tree.get(id))
        .map(|fiber| {
            let name = fiber.ty().map(|ty| ty.name().to_owned()).unwrap_or_default();
            (name, fiber.effect_tag())
        })
        .collect()
}

#[test]
fn re_rendering_the_same_element_touches_nothing() {
    let mut renderer = TestRenderer::new();
    let root = element("form")
        .prop("id", "signup")
        .child(element("input").prop("value", "a").prop("disabled", false))
        .child(element("button").listener("onClick", |_| {}).text("go"))
        .build();

    renderer.render(root.clone()).expect("mount");
    let summary = renderer.render(root).expect("re-render").expect("committed");

    assert!(renderer.mutations().is_empty());
    assert_eq!(summary.placements, 0);
    assert_eq!(summary.deletions, 0);
}

#[test]
fn rebuilding_equal_scalar_props_touches_nothing() {
    let mut renderer = TestRenderer::new();
    let build = || {
        element("section")
            .prop("title", "t")
            .prop("tabIndex", 2)
            .child(element("p").text("body"))
            .build()
    };

    renderer.render(build()).expect("mount");
    renderer.render(build()).expect("re-render");

    assert!(renderer.mutations().is_empty());
}

#[test]
fn type_change_replaces_instead_of_updating() {
    let mut renderer = TestRenderer::new();
    renderer.render(element("span").text("x").build()).expect("mount");

    let summary = renderer
        .render(element("p").text("x").build())
        .expect("swap")
        .expect("committed");

    assert_eq!(
        summary,
        CommitSummary {
            placements: 2,
            updates: 0,
            deletions: 1
        }
    );
    let counts = renderer.counts();
    assert_eq!(counts.removed, 1);
    assert_eq!(counts.props_set, 0);
    assert_eq!(renderer.dump(), "#root\n  <p>\n    \"x\"\n");
}

#[test]
fn shrinking_three_children_to_one() {
    let mut renderer = TestRenderer::new();
    renderer.render(childless_list(3)).expect("mount");
    let removed: Vec<_> = renderer
        .host()
        .node(renderer.host().find_first(renderer.container(), "ul").expect("ul"))
        .expect("ul node")
        .children()[1..]
        .to_vec();

    let summary = renderer.render(childless_list(1)).expect("shrink").expect("committed");

    assert_eq!(summary.deletions, 2);
    // the list itself plus the surviving item
    assert_eq!(summary.updates, 2);
    assert_eq!(summary.placements, 0);
    assert_eq!(child_tags(&renderer), [("li".to_owned(), EffectTag::Update)]);
    let detached: Vec<_> = renderer
        .mutations()
        .iter()
        .filter_map(|mutation| match mutation {
            Mutation::RemoveChild { child, .. } => Some(*child),
            _ => None,
        })
        .collect();
    assert_eq!(detached, removed);
}

#[test]
fn growing_one_child_to_three() {
    let mut renderer = TestRenderer::new();
    renderer.render(childless_list(1)).expect("mount");

    let summary = renderer.render(childless_list(3)).expect("grow").expect("committed");

    assert_eq!(summary.placements, 2);
    assert_eq!(summary.updates, 2);
    assert_eq!(summary.deletions, 0);
    assert_eq!(
        child_tags(&renderer),
        [
            ("li".to_owned(), EffectTag::Update),
            ("li".to_owned(), EffectTag::Placement),
            ("li".to_owned(), EffectTag::Placement),
        ]
    );
    assert_eq!(renderer.counts().appended, 2);
}

#[test]
fn swapping_a_handler_detaches_once_and_attaches_once() {
    let mut renderer = TestRenderer::new();
    let first = EventHandler::new(|_| {});
    let second = EventHandler::new(|_| {});
    let button = |handler: &EventHandler| {
        element("button")
            .prop("title", "save")
            .handler("onClick", handler.clone())
            .text("Save")
            .build()
    };

    renderer.render(button(&first)).expect("mount");
    renderer.render(button(&second)).expect("swap");

    let mutations = renderer.mutations();
    assert_eq!(mutations.len(), 2);
    assert!(matches!(&mutations[0], Mutation::RemoveListener { event_type, .. } if &**event_type == "click"));
    assert!(matches!(&mutations[1], Mutation::AddListener { event_type, .. } if &**event_type == "click"));
    let node = renderer
        .host()
        .node(renderer.host().find_first(renderer.container(), "button").expect("button"))
        .expect("node");
    assert_eq!(node.listener_count("click"), 1);
    assert_eq!(node.prop("title"), Some(&PropValue::from("save")));
}

thread_local! {
    static SETTERS: RefCell<Option<(Setter<i32>, Setter<String>)>> = const { RefCell::new(None) };
}

#[component]
fn Profile(props: &Props, hooks: &mut Hooks<'_>) -> Element {
    let (visits, set_visits) = hooks.use_state(0);
    let (name, set_name) = hooks.use_state_with(|| {
        props
            .get("name")
            .and_then(PropValue::as_str)
            .unwrap_or("anon")
            .to_owned()
    });
    SETTERS.with(|slot| *slot.borrow_mut() = Some((set_visits, set_name)));
    element("div")
        .child(element("b").text(name))
        .child(element("i").text(visits))
        .build()
}

fn setters() -> (Setter<i32>, Setter<String>) {
    SETTERS.with(|slot| slot.borrow().clone()).expect("profile rendered")
}

#[test]
fn hook_slots_survive_many_setter_driven_renders() {
    let mut renderer = TestRenderer::new();
    renderer
        .render(element(Profile()).prop("name", "ada").build())
        .expect("mount");
    assert_eq!(renderer.text(), "ada0");

    let mut expected_name = String::from("ada");
    for round in 1..=6 {
        let (set_visits, set_name) = setters();
        set_visits.update(|visits| visits + 1);
        if round % 3 == 0 {
            expected_name.push('!');
            set_name.update(|name| format!("{name}!"));
        }
        renderer.take_mutations();
        let summary = renderer.flush().expect("re-render").expect("committed");

        assert_eq!(renderer.text(), format!("{expected_name}{round}"));
        assert_eq!(summary.placements, 0);
        assert_eq!(summary.deletions, 0);
    }
}

#[test]
fn batched_setter_calls_fold_into_one_render() {
    let mut renderer = TestRenderer::new();
    renderer.render(element(Profile()).build()).expect("mount");

    let (set_visits, _) = setters();
    set_visits.update(|visits| visits + 2);
    set_visits.update(|visits| visits * 10);
    set_visits.set(7);
    set_visits.update(|visits| visits + 1);
    let (commits, _) = renderer.run_in_slices(100).expect("re-render");

    assert_eq!(commits.len(), 1);
    assert_eq!(renderer.text(), "anon8");
}

fn dashboard(revision: i64) -> Element {
    element("main")
        .child(element("h1").text(format!("rev {revision}")))
        .children((0..revision).map(|row| {
            element("div")
                .prop("row", row)
                .listener("onClick", |_| {})
                .child(element("span").text(row * revision))
        }))
        .build()
}

fn mutation_log(drive: impl Fn(&mut TestRenderer)) -> (String, Vec<Vec<Mutation>>) {
    let mut renderer = TestRenderer::new();
    let mut log = Vec::new();
    for revision in [3, 5, 2] {
        renderer.start(dashboard(revision));
        drive(&mut renderer);
        log.push(renderer.take_mutations());
    }
    (renderer.dump(), log)
}

#[test]
fn yielding_and_resuming_matches_an_unbudgeted_run() {
    let baseline = mutation_log(|renderer| {
        renderer.flush().expect("flush");
    });
    let sliced = mutation_log(|renderer| {
        renderer.run_in_slices(2).expect("slices");
    });
    let stepped = mutation_log(|renderer| {
        while renderer.step(&ExhaustedDeadline).expect("step") != fiber_core::WorkStatus::Idle {}
    });

    assert_eq!(sliced, baseline);
    assert_eq!(stepped, baseline);
    assert!(baseline.0.contains("rev 2"));
}
