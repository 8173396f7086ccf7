#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use futures::channel::oneshot;
    use futures::executor::LocalPool;
    use futures::task::LocalSpawnExt;

    use crate::*;

    #[test]
    fn test_swapped_hook_order_is_misaligned() {
        let swap = Rc::new(Cell::new(false));
        let mut instance = Instance::new({
            let swap = swap.clone();
            move || {
                if swap.get() {
                    use_ref(|| 0)?;
                    use_state(|| 0)?;
                } else {
                    use_state(|| 0)?;
                    use_ref(|| 0)?;
                }
                Ok(())
            }
        });
        instance.render().unwrap();
        swap.set(true);
        assert_eq!(
            instance.render(),
            Err(HookError::SlotMisaligned {
                index: 0,
                expected: SlotKind::Ref,
                found: SlotKind::State,
            })
        );
    }

    #[test]
    fn test_changed_payload_type_is_reported() {
        let flip = Rc::new(Cell::new(false));
        let mut instance = Instance::new({
            let flip = flip.clone();
            move || {
                if flip.get() {
                    use_state(|| String::new())?;
                } else {
                    use_state(|| 0u32)?;
                }
                Ok(())
            }
        });
        instance.render().unwrap();
        flip.set(true);
        assert!(matches!(
            instance.render(),
            Err(HookError::SlotTypeMismatch { index: 0, .. })
        ));
    }

    #[test]
    fn test_hook_count_changes_are_reported() {
        let count = Rc::new(Cell::new(2));
        let mut instance = Instance::new({
            let count = count.clone();
            move || {
                for _ in 0..count.get() {
                    use_state(|| 0)?;
                }
                Ok(())
            }
        });
        instance.render().unwrap();

        count.set(1);
        assert_eq!(
            instance.render(),
            Err(HookError::HookCountChanged {
                expected: 2,
                actual: 1
            })
        );

        count.set(3);
        assert_eq!(
            instance.render(),
            Err(HookError::HookCountChanged {
                expected: 2,
                actual: 3
            })
        );

        count.set(2);
        assert_eq!(instance.render(), Ok(()));
    }

    #[test]
    fn test_equal_write_requests_nothing() {
        let mut instance = Instance::new(|| use_state(|| 5));
        let (_, set) = instance.render().unwrap();
        set.set(5);
        set.update(|n| *n);
        assert_eq!(instance.rerender_requests(), 0);
        assert!(!instance.needs_render());

        set.set(6);
        assert_eq!(instance.rerender_requests(), 1);
        let (n, _) = instance.flush().unwrap().unwrap();
        assert_eq!(n, 6);
    }

    #[test]
    fn test_lazy_state_init_runs_once() {
        let inits = Rc::new(Cell::new(0));
        let mut instance = Instance::new({
            let inits = inits.clone();
            move || {
                use_state(|| {
                    inits.set(inits.get() + 1);
                    vec![1, 2, 3]
                })
            }
        });
        for _ in 0..4 {
            instance.render().unwrap();
        }
        assert_eq!(inits.get(), 1);
    }

    #[test]
    fn test_setter_outlives_its_render() {
        let mut instance = Instance::new(|| use_state(|| 0));
        let (_, stale) = instance.render().unwrap();
        instance.render().unwrap();
        stale.update(|n| n + 10);
        stale.update(|n| n + 1);
        assert_eq!(stale.get(), 11);
        assert_eq!(instance.flush().unwrap().map(|(n, _)| n), Some(11));
    }

    #[derive(Clone, PartialEq, Debug)]
    enum Action {
        Add(i32),
        Reset,
    }

    #[test]
    fn test_reducer_and_merge_state() {
        #[derive(Clone, PartialEq, Debug, Default)]
        struct Form {
            name: String,
            age: u32,
        }

        let mut instance = Instance::new(|| {
            let (total, dispatch) = use_reducer(
                |s: &i32, a: Action| match a {
                    Action::Add(n) => s + n,
                    Action::Reset => 0,
                },
                0,
            )?;
            let (form, merge) = use_set_state(Form::default())?;
            Ok((total, dispatch, form, merge))
        });

        let (_, dispatch, _, merge) = instance.render().unwrap();
        dispatch.dispatch(Action::Add(2));
        dispatch.dispatch(Action::Add(3));
        merge.merge(|f| f.name = "ada".into());
        merge.merge(|f| f.age = 36);
        let (total, dispatch, form, _) = instance.flush().unwrap().unwrap();
        assert_eq!(total, 5);
        assert_eq!(
            form,
            Form {
                name: "ada".into(),
                age: 36
            }
        );

        dispatch.dispatch(Action::Reset);
        let (total, ..) = instance.flush().unwrap().unwrap();
        assert_eq!(total, 0);
    }

    #[test]
    fn test_previous_and_latest() {
        let value = Rc::new(Cell::new(1));
        let mut instance = Instance::new({
            let value = value.clone();
            move || {
                let v = value.get();
                let previous = use_previous(v)?;
                let latest = use_latest(v)?;
                Ok((previous, latest))
            }
        });
        let (previous, latest) = instance.render().unwrap();
        assert_eq!(previous, None);
        value.set(2);
        let (previous, _) = instance.render().unwrap();
        assert_eq!(previous, Some(1));
        assert_eq!(*latest.borrow(), 2);
    }

    #[test]
    fn test_teardown_runs_cleanups_in_slot_order_once() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut instance = Instance::new({
            let log = log.clone();
            move || {
                for name in ["c1", "c2", "c3"] {
                    let log = log.clone();
                    use_effect(move || on_cleanup(move || log.borrow_mut().push(name)), deps![])?;
                }
                Ok(())
            }
        });
        instance.render().unwrap();
        instance.render().unwrap();
        assert!(log.borrow().is_empty());

        instance.teardown();
        instance.teardown();
        drop(instance);
        assert_eq!(*log.borrow(), vec!["c1", "c2", "c3"]);
    }

    #[test]
    fn test_nested_render_restores_outer_container() {
        let inner = Rc::new(RefCell::new(Instance::new(|| use_state(|| "inner"))));
        let mut outer = Instance::new({
            let inner = inner.clone();
            move || {
                let (a, _) = use_state(|| "outer")?;
                let outer_container = current_container()?;
                let (b, _) = inner.borrow_mut().render()?;
                assert!(current_container()?.ptr_eq(&outer_container));
                let (c, _) = use_state(|| "second")?;
                Ok(format!("{a}/{b}/{c}"))
            }
        });
        assert_eq!(outer.render().unwrap(), "outer/inner/second");
        assert_eq!(outer.container().slot_count(), 2);
        assert_eq!(inner.borrow().container().slot_count(), 1);
        assert!(!has_active_container());
    }

    #[test]
    fn test_active_container_restored_after_panic() {
        let container = Container::new(|| {});
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            with_active_container(&container, || -> Result<(), HookError> {
                panic!("render failed")
            })
        }));
        assert!(outcome.is_err());
        assert!(!has_active_container());
        assert_eq!(use_state(|| 0).err(), Some(HookError::NoActiveContainer));
    }

    #[test]
    fn test_manual_host_protocol() {
        let requested = Rc::new(Cell::new(0));
        let container = Container::new({
            let requested = requested.clone();
            move || requested.set(requested.get() + 1)
        });
        let pass = |container: &Container| {
            with_active_container(container, || {
                reset_cursor(container);
                let (n, set) = use_state(|| 1)?;
                container.finish_pass()?;
                Ok::<_, HookError>((n, set))
            })
        };
        let (n, set) = pass(&container).unwrap();
        assert_eq!(n, 1);
        set.set(2);
        assert_eq!(requested.get(), 1);
        assert_eq!(pass(&container).unwrap().0, 2);
        assert!(container.is_mounted());

        container.teardown();
        set.set(3);
        assert_eq!(requested.get(), 1);
    }

    #[test]
    fn test_context_isolation() {
        let a = create_context(0);
        let b = create_context(0);
        let mut sub_a = Instance::new({
            let a = a.clone();
            move || use_context(&a)
        });
        let mut sub_b = Instance::new({
            let b = b.clone();
            move || use_context(&b)
        });
        sub_a.render().unwrap();
        sub_b.render().unwrap();

        b.provide(9);
        assert_eq!(sub_a.rerender_requests(), 0);
        assert!(sub_a.flush().unwrap().is_none());
        assert_eq!(sub_b.flush().unwrap(), Some(9));

        a.provider_props(ProviderProps {
            value: 4,
            children: Children::from(()),
        });
        assert_eq!(sub_a.flush().unwrap(), Some(4));
        assert_eq!(sub_b.rerender_requests(), 1);
    }

    #[test]
    fn test_context_reaches_every_subscriber_before_provide_returns() {
        let ctx = create_context('a');
        let mut subscribers: Vec<_> = (0..3)
            .map(|_| {
                let ctx = ctx.clone();
                Instance::new(move || use_context(&ctx))
            })
            .collect();
        for s in &mut subscribers {
            s.render().unwrap();
        }
        ctx.provide('b');
        assert!(subscribers.iter().all(|s| s.needs_render()));
        for s in &mut subscribers {
            assert_eq!(s.flush().unwrap(), Some('b'));
        }
    }

    type Pending = Rc<RefCell<Vec<oneshot::Receiver<&'static str>>>>;

    fn channel_backed_instance(pending: Pending) -> Instance<UseAsync<(), &'static str, ()>> {
        Instance::new(move || {
            let pending = pending.clone();
            use_async(
                move |_: ()| {
                    let rx = pending.borrow_mut().remove(0);
                    async move { rx.await.map_err(|_| ()) }
                },
                AsyncOptions::manual(),
            )
        })
    }

    #[test]
    fn test_async_latest_call_wins() {
        let mut pool = LocalPool::new();
        let (tx_a, rx_a) = oneshot::channel();
        let (tx_b, rx_b) = oneshot::channel();
        let pending: Pending = Rc::new(RefCell::new(vec![rx_a, rx_b]));
        let mut instance = channel_backed_instance(pending);

        let snap = instance.render().unwrap();
        let outcomes = Rc::new(RefCell::new(Vec::new()));
        for label in ["first", "second"] {
            let call = snap.run(());
            let outcomes = outcomes.clone();
            pool.spawner()
                .spawn_local(async move {
                    let outcome = call.await;
                    outcomes.borrow_mut().push((label, outcome.is_ok()));
                })
                .unwrap();
        }
        assert!(instance.flush().unwrap().is_some_and(|s| s.loading));

        // second call settles first
        tx_b.send("B").unwrap();
        pool.run_until_stalled();
        let _ = tx_a.send("A");
        pool.run_until_stalled();

        let snap = instance.flush().unwrap().unwrap();
        assert!(!snap.loading);
        assert_eq!(snap.data.as_deref(), Some(&"B"));
        assert!(snap.error.is_none());
        assert_eq!(snap.handle.last_call_id(), 2);

        let mut outcomes = outcomes.borrow().clone();
        outcomes.sort();
        assert_eq!(outcomes, vec![("first", false), ("second", true)]);
    }

    #[test]
    fn test_async_superseded_failure_leaves_no_error() {
        let mut pool = LocalPool::new();
        let (tx_a, rx_a) = oneshot::channel();
        let (tx_b, rx_b) = oneshot::channel();
        let pending: Pending = Rc::new(RefCell::new(vec![rx_a, rx_b]));
        let mut instance = channel_backed_instance(pending);

        let snap = instance.render().unwrap();
        let first = Rc::new(RefCell::new(None));
        let call = snap.run(());
        let sink = first.clone();
        pool.spawner()
            .spawn_local(async move { *sink.borrow_mut() = Some(call.await) })
            .unwrap();
        let second = pool.spawner().spawn_local_with_handle(snap.run(())).unwrap();

        tx_b.send("B").unwrap();
        pool.run_until_stalled();
        assert_eq!(*pool.run_until(second).unwrap(), "B");

        // dropping the sender fails the first call
        drop(tx_a);
        pool.run_until_stalled();

        let outcome = first.borrow_mut().take().unwrap();
        assert!(outcome.unwrap_err().is_cancelled());
        let snap = instance.flush().unwrap().unwrap();
        assert!(!snap.loading);
        assert!(snap.error.is_none());
        assert_eq!(snap.data.as_deref(), Some(&"B"));
    }

    #[test]
    fn test_async_reset_before_settle() {
        let mut pool = LocalPool::new();
        let (tx, rx) = oneshot::channel();
        let pending: Pending = Rc::new(RefCell::new(vec![rx]));
        let mut instance = channel_backed_instance(pending);

        let snap = instance.render().unwrap();
        let call = snap.run(());
        let cancelled = Rc::new(Cell::new(false));
        let flag = cancelled.clone();
        pool.spawner()
            .spawn_local(async move { flag.set(call.await.is_err_and(|e| e.is_cancelled())) })
            .unwrap();
        pool.run_until_stalled();

        snap.reset();
        let _ = tx.send("late");
        pool.run_until_stalled();

        let snap = instance.flush().unwrap().unwrap();
        assert!(!snap.loading);
        assert!(snap.data.is_none());
        assert!(snap.error.is_none());
        assert_eq!(snap.handle.last_call_id(), 0);
        assert!(cancelled.get());
    }

    #[test]
    fn test_async_handle_is_stable() {
        let mut instance = channel_backed_instance(Rc::new(RefCell::new(Vec::new())));
        let first = instance.render().unwrap();
        let second = instance.render().unwrap();
        assert!(first.handle.ptr_eq(&second.handle));
        assert_eq!(instance.container().slot_count(), 3);
    }
}
