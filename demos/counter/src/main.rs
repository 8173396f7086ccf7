use std::rc::Rc;

use futures::executor::LocalPool;
use rehook_core::*;
use rehook_kit::{
    CounterActions, next_due, run_due_timers, use_counter, use_debug_value, use_interval,
};
use web_time::Duration;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Theme {
    Light,
    Dark,
}

struct Frame {
    count: i64,
    theme: Theme,
    greeting: Option<Rc<String>>,
    loading: bool,
    counter: CounterActions,
}

fn counter_view(theme: &Context<Theme>) -> Result<Frame, HookError> {
    let (count, counter) = use_counter(0, 1)?;
    let theme = use_context(theme)?;
    let greeting = use_async(
        |name: String| async move { Ok::<_, String>(format!("hello, {name}")) },
        AsyncOptions::immediate("rehook".to_string()),
    )?;

    let tick = counter.clone();
    use_interval(move || tick.inc(), Duration::from_millis(40))?;
    use_debug_value(count)?;

    Ok(Frame {
        count,
        theme,
        greeting: greeting.data,
        loading: greeting.loading,
        counter,
    })
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut pool = LocalPool::new();
    set_local_spawner(pool.spawner());

    let theme = create_context(Theme::Light);
    let mut view = Instance::new({
        let theme = theme.clone();
        move || counter_view(&theme)
    });

    let started = rehook_kit::now();
    let mut frames = 0;
    while rehook_kit::now() - started < Duration::from_millis(300) {
        pool.run_until_stalled();
        run_due_timers();

        if let Some(frame) = view.flush()? {
            frames += 1;
            log::info!(
                "count={} theme={:?} loading={} greeting={:?}",
                frame.count,
                frame.theme,
                frame.loading,
                frame.greeting.as_deref()
            );
            if frame.count >= 3 && frame.theme == Theme::Light {
                theme.provide(Theme::Dark);
            }
            if frame.count >= 5 {
                frame.counter.reset();
            }
        }

        if let Some(due) = next_due() {
            std::thread::sleep(due.saturating_duration_since(rehook_kit::now()));
        }
    }

    view.teardown();
    rehook_kit::clear_all_timers();
    clear_local_spawner();
    println!("rendered {frames} frames");
    Ok(())
}
