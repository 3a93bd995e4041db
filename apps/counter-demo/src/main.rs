use std::time::Duration;

use fiber_core::{
    element, Element, Event, HostError, Hooks, MemoryHost, NodeId, Props, PropValue, Scheduler,
};
use fiber_macros::component;
use fiber_runtime_std::StdRuntime;

const IDLE_BUDGET: Duration = Duration::from_millis(8);
const CLICKS: usize = 3;

#[component]
fn Counter(props: &Props, hooks: &mut Hooks<'_>) -> Element {
    let title = props
        .get("title")
        .and_then(PropValue::as_str)
        .unwrap_or("Counter")
        .to_owned();
    let (count, set_count) = hooks.use_state(0_i64);
    let (history, set_history) = hooks.use_state(Vec::<i64>::new());

    let increment = {
        let set_count = set_count.clone();
        move |_: &Event| {
            set_count.update(|n| n + 1);
            let seen = count;
            set_history.update(move |history| {
                let mut next = history.clone();
                next.push(seen);
                next
            });
        }
    };

    element("div")
        .prop("class", "counter")
        .child(element("h1").text(title))
        .child(element("p").prop("class", "value").text(format!("Count: {count}")))
        .child(
            element("button")
                .prop("class", if count % 2 == 0 { "even" } else { "odd" })
                .listener("onClick", increment)
                .text("Increment"),
        )
        .child(element("button").listener("onClick", move |_| set_count.set(0)).text("Reset"))
        .children(history.iter().map(|value| element("li").text(*value)))
        .build()
}

fn run_until_idle(runtime: &StdRuntime, scheduler: &mut Scheduler<MemoryHost>) -> Result<(), HostError> {
    while let Some(status) = runtime.run_idle_callback(scheduler, IDLE_BUDGET)? {
        log::debug!("idle period ended with {status:?}");
    }
    Ok(())
}

fn click(scheduler: &Scheduler<MemoryHost>, container: NodeId, label: &str) -> Result<usize, HostError> {
    let host = scheduler.host();
    let button = collect_buttons(host, container)
        .into_iter()
        .find(|&id| host.text_content(id) == label)
        .ok_or(HostError::Missing { id: container })?;
    host.dispatch(button, "click")
}

fn collect_buttons(host: &MemoryHost, root: NodeId) -> Vec<NodeId> {
    let mut found = Vec::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let Some(node) = host.node(id) else {
            continue;
        };
        if node.tag() == Some("button") {
            found.push(id);
        }
        stack.extend(node.children().iter().rev());
    }
    found
}

fn run() -> Result<(), HostError> {
    let runtime = StdRuntime::new();
    let mut host = MemoryHost::new();
    let container = host.create_container();
    let mut scheduler = Scheduler::with_runtime(host, runtime.runtime());

    scheduler.render(element(Counter()).prop("title", "Fiber Counter").build(), container);
    run_until_idle(&runtime, &mut scheduler)?;
    println!("{}", scheduler.host().dump_tree(container));

    for round in 1..=CLICKS {
        scheduler.host_mut().take_mutations();
        let fired = click(&scheduler, container, "Increment")?;
        run_until_idle(&runtime, &mut scheduler)?;
        let counts = scheduler.host().counts();
        println!(
            "click {round}: {fired} listener(s), {} host mutation(s)",
            counts.total()
        );
    }
    println!("{}", scheduler.host().dump_tree(container));

    click(&scheduler, container, "Reset")?;
    run_until_idle(&runtime, &mut scheduler)?;
    println!("{}", scheduler.host().dump_tree(container));
    print!("{}", scheduler.dump_fibers());
    Ok(())
}

fn main() {
    env_logger::init();

    println!("=== Fiber Counter Example ===");
    println!("Clicks are simulated against the in-memory host.");
    println!();

    if let Err(err) = run() {
        log::error!("counter demo failed: {err}");
        std::process::exit(1);
    }
}
