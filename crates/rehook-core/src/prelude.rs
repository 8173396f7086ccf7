pub use crate::async_op::{AsyncHandle, AsyncOptions, UseAsync, use_async};
pub use crate::boundary::{LazyFallback, lazy};
pub use crate::bus::{EventBus, ListenerId};
pub use crate::context::{
    Children, Context, ContextProxy, ProviderProps, create_context, create_context_with_proxy,
    use_context, use_emitter, use_event_bus,
};
pub use crate::deps;
pub use crate::deps::{Dep, Deps, Identity};
pub use crate::effects::{Dispose, on_cleanup, use_effect, use_layout_effect, use_update_effect};
pub use crate::error::*;
pub use crate::instance::{AdoptedCallback, Instance, on_adopted};
pub use crate::memo::{Callback, use_callback, use_memo, use_memoized_fn};
pub use crate::state::{
    Dispatch, MergeState, SetState, use_latest, use_previous, use_reducer, use_ref, use_set_state,
    use_state,
};
