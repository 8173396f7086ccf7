use std::fmt;

use crate::runtime::current_container;

/// Output substituted by [`lazy`] together with the error that caused it.
#[derive(Debug, Clone, PartialEq)]
pub struct LazyFallback<R, E> {
    pub output: R,
    pub error: E,
}

impl<R, E> LazyFallback<R, E> {
    /// The fallback output, dropping the error.
    pub fn into_output(self) -> R {
        self.output
    }
}

/// Local failure boundary around part of a render pass.
///
/// Runs `content`; on error, logs it, renders `fallback` in its place and,
/// when called inside a render pass, requests another pass so `content` is
/// retried later. The caller decides whether the fallback is acceptable:
/// `lazy(..).unwrap_or_else(LazyFallback::into_output)` renders through it.
pub fn lazy<R, E: fmt::Display>(
    content: impl FnOnce() -> Result<R, E>,
    fallback: impl FnOnce(&E) -> R,
) -> Result<R, LazyFallback<R, E>> {
    match content() {
        Ok(output) => Ok(output),
        Err(error) => {
            log::error!("lazy content failed: {error}");
            if let Ok(container) = current_container() {
                container.rerender_handle().request();
            }
            Err(LazyFallback {
                output: fallback(&error),
                error,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Instance, use_ref};

    #[test]
    fn outside_render_just_substitutes() {
        let out = lazy(|| Err::<&str, _>("boom"), |e| if *e == "boom" { "fallback" } else { "?" });
        assert_eq!(
            out,
            Err(LazyFallback {
                output: "fallback",
                error: "boom"
            })
        );
        assert_eq!(lazy(|| Ok::<_, &str>(1), |_| 0), Ok(1));
    }

    #[test]
    fn failure_schedules_a_retry() {
        let mut instance = Instance::new(|| {
            let attempts = use_ref(|| 0)?;
            *attempts.borrow_mut() += 1;
            let n = *attempts.borrow();
            Ok(lazy(
                || if n < 2 { Err(format!("attempt {n}")) } else { Ok(n) },
                |_| -1,
            )
            .unwrap_or_else(LazyFallback::into_output))
        });

        assert_eq!(instance.render().unwrap(), -1);
        assert!(instance.needs_render());
        assert_eq!(instance.flush().unwrap(), Some(2));
        assert!(!instance.needs_render());
    }
}
