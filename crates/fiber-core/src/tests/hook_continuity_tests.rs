use crate::runtime::TestScheduler;
use crate::*;
use fiber_macros::component;
use std::cell::{Cell, RefCell};
use std::sync::Arc;
use std::time::Duration;

thread_local! {
    static COUNT_SETTER: RefCell<Option<Setter<i32>>> = RefCell::new(None);
    static LABEL_SETTER: RefCell<Option<Setter<String>>> = RefCell::new(None);
    static RENDERS: Cell<usize> = Cell::new(0);
}

#[component]
fn Counter(props: &Props, hooks: &mut Hooks<'_>) -> Element {
    RENDERS.with(|renders| renders.set(renders.get() + 1));
    let step = match props.get("step") {
        Some(PropValue::Int(step)) => *step as i32,
        _ => 1,
    };
    let (count, set_count) = hooks.use_state(0);
    let (label, set_label) = hooks.use_state_with(|| String::from("clicks"));
    COUNT_SETTER.with(|slot| *slot.borrow_mut() = Some(set_count.clone()));
    LABEL_SETTER.with(|slot| *slot.borrow_mut() = Some(set_label));

    element("button")
        .listener("onClick", move |_| set_count.update(move |n| n + step))
        .text(format!("{label}: {count}"))
        .build()
}

#[component("Static")]
fn Banner() -> Element {
    element("h1").text("hi").build()
}

struct Spent;

impl Deadline for Spent {
    fn time_remaining(&self) -> Duration {
        Duration::ZERO
    }
}

fn count_setter() -> Setter<i32> {
    COUNT_SETTER.with(|slot| slot.borrow().clone()).expect("counter rendered")
}

fn label_setter() -> Setter<String> {
    LABEL_SETTER.with(|slot| slot.borrow().clone()).expect("counter rendered")
}

fn mount(root: Element) -> (Scheduler<MemoryHost>, NodeId, Arc<TestScheduler>) {
    let idle = Arc::new(TestScheduler::default());
    let mut host = MemoryHost::new();
    let container = host.create_container();
    let mut scheduler = Scheduler::with_runtime(host, Runtime::new(idle.clone()));
    scheduler.render(root, container);
    scheduler.flush().expect("initial render");
    (scheduler, container, idle)
}

#[test]
fn component_handles_are_cached_per_thread() {
    assert_eq!(Counter(), Counter());
    assert_eq!(Counter().name(), "Counter");
    assert_eq!(Banner().name(), "Static");
    assert_ne!(Counter(), Banner());
}

#[test]
fn setters_drive_re_renders_with_folded_state() {
    let (mut scheduler, container, idle) = mount(element(Counter()).build());
    assert_eq!(scheduler.host().text_content(container), "clicks: 0");

    let set_count = count_setter();
    let requests = idle.requests();
    set_count.update(|n| n + 1);
    set_count.update(|n| n + 1);
    assert!(idle.requests() > requests);
    assert!(scheduler.has_pending_work());

    let summary = scheduler.flush().expect("re-render").expect("committed");
    assert_eq!(scheduler.host().text_content(container), "clicks: 2");
    assert_eq!(summary.deletions, 0);
    assert_eq!(summary.placements, 0);
}

#[test]
fn two_slots_stay_independent_across_renders() {
    let (mut scheduler, container, _) = mount(element(Counter()).build());

    for round in 1..=3 {
        count_setter().update(|n| n + 1);
        scheduler.flush().expect("count");
        assert_eq!(
            scheduler.host().text_content(container),
            format!("clicks: {round}")
        );
    }

    label_setter().set(String::from("taps"));
    scheduler.flush().expect("label");
    assert_eq!(scheduler.host().text_content(container), "taps: 3");

    count_setter().set(10);
    scheduler.flush().expect("count again");
    assert_eq!(scheduler.host().text_content(container), "taps: 10");
}

#[test]
fn click_handlers_close_over_the_latest_setter() {
    let (mut scheduler, container, _) =
        mount(element(Counter()).prop("step", 5).build());

    for expected in [5, 10] {
        let button = scheduler.host().find_first(container, "button").expect("button");
        assert_eq!(scheduler.host().dispatch(button, "click"), Ok(1));
        scheduler.flush().expect("click");
        assert_eq!(
            scheduler.host().text_content(container),
            format!("clicks: {expected}")
        );
    }
    let button = scheduler.host().find_first(container, "button").expect("button");
    let node = scheduler.host().node(button).expect("node");
    assert_eq!(node.listener_count("click"), 1);
}

#[test]
fn updates_before_the_first_commit_apply_after_it() {
    let idle = Arc::new(TestScheduler::default());
    let mut host = MemoryHost::new();
    let container = host.create_container();
    let mut scheduler = Scheduler::with_runtime(host, Runtime::new(idle));
    scheduler.render(element(Counter()).build(), container);

    // root and the component fiber
    assert_eq!(scheduler.work_loop(&Spent), Ok(WorkStatus::Yielded));
    assert_eq!(scheduler.work_loop(&Spent), Ok(WorkStatus::Yielded));
    count_setter().update(|n| n + 7);
    assert_eq!(scheduler.committed_root(), None);
    assert!(scheduler.runtime().has_rerender_request());

    scheduler.flush().expect("flush");
    assert_eq!(scheduler.host().text_content(container), "clicks: 7");
}

#[test]
fn component_type_change_replaces_the_subtree() {
    let (mut scheduler, container, _) = mount(element("main").child(element(Counter())).build());
    RENDERS.with(|renders| renders.set(0));

    scheduler.render(element("main").child(element(Banner())).build(), container);
    let summary = scheduler.flush().expect("swap").expect("committed");

    assert_eq!(summary.deletions, 1);
    assert_eq!(RENDERS.with(Cell::get), 0);
    assert_eq!(
        scheduler.host().dump_tree(container),
        "#root\n  <main>\n    <h1>\n      \"hi\"\n"
    );
}

#[test]
fn hook_state_lives_on_the_committed_fiber() {
    let (scheduler, _, _) = mount(element(Counter()).build());
    let tree = scheduler.fibers();
    let root = scheduler.committed_root().expect("committed");
    let component = tree
        .descendants(root)
        .find(|id| tree.get(*id).is_some_and(Fiber::is_component))
        .and_then(|id| tree.get(id))
        .expect("component fiber");

    assert_eq!(component.hooks().len(), 2);
    assert_eq!(component.hooks()[0].state::<i32>(), Some(&0));
    assert_eq!(component.host_node(), None);
    assert!(scheduler.dump_fibers().contains("Counter Placement hooks=2"));
}

#[test]
fn render_after_a_setter_call_wins() {
    let (mut scheduler, container, _) = mount(element(Counter()).build());

    count_setter().update(|n| n + 1);
    scheduler.render(element("p").text("replaced").build(), container);
    assert!(!scheduler.runtime().has_rerender_request());
    scheduler.flush().expect("render");

    assert_eq!(scheduler.host().text_content(container), "replaced");
}

#[test]
fn render_after_a_setter_call_still_folds_the_update() {
    let (mut scheduler, container, _) = mount(element(Counter()).build());

    count_setter().update(|n| n + 1);
    scheduler.render(element(Counter()).prop("step", 3).build(), container);
    let summary = scheduler.flush().expect("render").expect("committed");

    assert_eq!(scheduler.host().text_content(container), "clicks: 1");
    assert_eq!(summary.placements, 0);
}
